//! [`Query`] collection related to [`Listing`]s.
//!
//! These read raw records, so must not be exposed to buyers directly. Use
//! [`VisibleFields`] instead.
//!
//! [`VisibleFields`]: super::VisibleFields

use common::operations::By;

use crate::domain::{listing, user, Listing};
#[cfg(doc)]
use crate::Query;

use super::DatabaseQuery;

/// Queries a [`Listing`] by its [`listing::Id`].
pub type ById = DatabaseQuery<By<Option<Listing>, listing::Id>>;

/// Queries a [`Listing`] by its [`listing::Slug`].
pub type BySlug = DatabaseQuery<By<Option<Listing>, listing::Slug>>;

/// Queries all the [`Listing`]s of a seller.
pub type BySeller = DatabaseQuery<By<Vec<Listing>, user::Id>>;
