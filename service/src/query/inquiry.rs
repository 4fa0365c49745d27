//! [`Query`] collection related to [`Inquiry`]s.

use common::operations::By;

use crate::domain::{inquiry, listing, Inquiry};
#[cfg(doc)]
use crate::Query;

use super::DatabaseQuery;

/// Queries an [`Inquiry`] by its [`inquiry::Id`].
pub type ById = DatabaseQuery<By<Option<Inquiry>, inquiry::Id>>;

/// Queries all the [`Inquiry`]s about a listing.
pub type ByListing = DatabaseQuery<By<Vec<Inquiry>, listing::Id>>;
