//! [`Query`] collection related to [`Offer`]s.

use common::operations::By;

use crate::domain::{listing, offer, Offer};
#[cfg(doc)]
use crate::Query;

use super::DatabaseQuery;

/// Queries an [`Offer`] by its [`offer::Id`].
pub type ById = DatabaseQuery<By<Option<Offer>, offer::Id>>;

/// Queries all the [`Offer`]s made on a listing.
pub type ByListing = DatabaseQuery<By<Vec<Offer>, listing::Id>>;
