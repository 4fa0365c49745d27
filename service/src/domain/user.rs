//! Platform user definitions.
//!
//! Users are owned by the authentication collaborator, so only their
//! identity is modeled here.

use derive_more::{Display, From, FromStr, Into};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// ID of a platform user.
#[derive(
    Clone,
    Copy,
    Debug,
    Deserialize,
    Display,
    Eq,
    From,
    FromStr,
    Hash,
    Into,
    PartialEq,
    Serialize,
)]
#[cfg_attr(feature = "postgres", derive(ToSql, FromSql), postgres(transparent))]
pub struct Id(Uuid);

impl Id {
    /// Creates a new random [`Id`].
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

/// Caller of an operation, as resolved by the authentication collaborator.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Viewer {
    /// Not authenticated visitor.
    Anonymous,

    /// Authenticated user.
    User(Id),

    /// Authenticated platform administrator.
    Admin(Id),
}

impl Viewer {
    /// Returns [`Id`] of the authenticated user, if any.
    #[must_use]
    pub fn user_id(&self) -> Option<Id> {
        match self {
            Self::Anonymous => None,
            Self::User(id) | Self::Admin(id) => Some(*id),
        }
    }

    /// Indicates whether this [`Viewer`] is a platform administrator.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        matches!(self, Self::Admin(_))
    }

    /// Indicates whether this [`Viewer`] is the user with the provided [`Id`].
    #[must_use]
    pub fn is(&self, id: Id) -> bool {
        self.user_id() == Some(id)
    }
}
