//! [`Query`] collection related to [`nda::Signature`]s.

use common::operations::By;

use crate::domain::{listing, nda, user};
#[cfg(doc)]
use crate::Query;

use super::DatabaseQuery;

/// Queries an [`nda::Signature`] of a user for a listing.
pub type BySigner =
    DatabaseQuery<By<Option<nda::Signature>, (user::Id, listing::Id)>>;

/// Queries all the [`nda::Signature`]s of a listing.
pub type ByListing = DatabaseQuery<By<Vec<nda::Signature>, listing::Id>>;
