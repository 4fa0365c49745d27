//! [`Query`] collection related to [`Transaction`]s.

use common::operations::By;

use crate::{
    domain::{listing, offer, transaction, Transaction},
    read,
};
#[cfg(doc)]
use crate::Query;

use super::DatabaseQuery;

/// Queries a [`Transaction`] by its [`transaction::Id`].
pub type ById = DatabaseQuery<By<Option<Transaction>, transaction::Id>>;

/// Queries a [`Transaction`] spawned by the accepted offer.
pub type ByOffer = DatabaseQuery<By<Option<Transaction>, offer::Id>>;

/// Queries all the [`Transaction`]s of a listing.
pub type ByListing = DatabaseQuery<By<Vec<Transaction>, listing::Id>>;

/// Queries [`read::transaction::Stranded`] [`Transaction`]s, detecting them
/// without repairing.
pub type Stranded =
    DatabaseQuery<By<Vec<read::transaction::Stranded<Transaction>>, ()>>;
