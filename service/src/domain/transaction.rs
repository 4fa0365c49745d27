//! [`Transaction`] definitions.

#[cfg(doc)]
use common::DateTime;
use common::{define_kind, ident::OpaqueId, unit, DateTimeOf, Money};
use derive_more::{Display, Error, From, FromStr, Into};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use serde::{Deserialize, Serialize};

use crate::domain::{listing, offer, user};

/// Execution of an accepted offer, moving through the [`Stage`]s of a deal.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    /// ID of this [`Transaction`].
    pub id: Id,

    /// ID of the listing being sold.
    pub listing_id: listing::Id,

    /// ID of the accepted offer this [`Transaction`] executes.
    pub offer_id: offer::Id,

    /// ID of the buyer.
    pub buyer_id: user::Id,

    /// ID of the seller.
    pub seller_id: user::Id,

    /// Agreed price, copied from the accepted offer.
    pub amount: Money,

    /// Current [`Stage`] of this [`Transaction`].
    pub stage: Stage,

    /// [`DateTime`] when this [`Transaction`] was created.
    pub created_at: CreationDateTime,

    /// [`DateTime`] when this [`Transaction`] was modified last time.
    pub updated_at: ModificationDateTime,

    /// [`DateTime`] when this [`Transaction`] fell through, if it did.
    pub cancelled_at: Option<CancellationDateTime>,
}

impl Transaction {
    /// Indicates whether this [`Transaction`] may still reach
    /// [`Stage::Completed`].
    #[must_use]
    pub fn is_live(&self) -> bool {
        self.cancelled_at.is_none() && self.stage != Stage::Completed
    }

    /// Advances this [`Transaction`] to the provided [`Stage`].
    ///
    /// Only the immediate successor is allowed, unless `fast_track`ing, which
    /// allows skipping forward.
    ///
    /// # Errors
    ///
    /// - [`AdvanceError::InvalidTransition`] if the [`Transaction`] is
    ///   cancelled or completed, or the `target` is not ahead;
    /// - [`AdvanceError::GuardFailed`] if the `target` skips stages without
    ///   `fast_track`ing.
    pub fn advance(
        &mut self,
        target: Stage,
        fast_track: bool,
    ) -> Result<(), AdvanceError> {
        let from = self.stage;
        if self.cancelled_at.is_some() || target <= from {
            return Err(AdvanceError::InvalidTransition { from, to: target });
        }
        if !fast_track && from.next() != Some(target) {
            return Err(AdvanceError::GuardFailed { from, to: target });
        }
        self.stage = target;
        Ok(())
    }
}

/// ID of a [`Transaction`].
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
pub struct Id(OpaqueId);

impl Id {
    /// Generates a new random [`Id`].
    #[must_use]
    pub fn new() -> Self {
        Self(OpaqueId::generate())
    }
}

define_kind! {
    #[doc = "Stage of a [`Transaction`], in the order they are passed."]
    enum Stage {
        #[doc = "Parties get to know each other."]
        Inquiry = 1,

        #[doc = "Terms are being negotiated."]
        Negotiation = 2,

        #[doc = "Letter of intent is signed."]
        Loi = 3,

        #[doc = "Buyer verifies the business."]
        Diligence = 4,

        #[doc = "Funds are held by the escrow provider."]
        Escrow = 5,

        #[doc = "Assets are being transferred."]
        Closing = 6,

        #[doc = "Deal is done."]
        Completed = 7,
    }
}

impl Stage {
    /// Returns the immediate successor of this [`Stage`], if any.
    #[must_use]
    pub fn next(self) -> Option<Self> {
        Self::ALL.iter().copied().find(|s| *s > self)
    }
}

/// Error of advancing a [`Transaction`].
#[derive(Clone, Copy, Debug, Display, Error, Eq, PartialEq)]
pub enum AdvanceError {
    /// [`Transaction`] can't move to the [`Stage`] at all.
    #[display("cannot move a transaction from `{from}` to `{to}`")]
    InvalidTransition {
        /// [`Stage`] the advance was attempted from.
        from: Stage,

        /// [`Stage`] the advance was attempted to.
        to: Stage,
    },

    /// [`Stage`] is ahead, but not the immediate successor.
    #[display("cannot skip stages from `{from}` to `{to}` without fast-track")]
    GuardFailed {
        /// [`Stage`] the advance was attempted from.
        from: Stage,

        /// [`Stage`] the advance was attempted to.
        to: Stage,
    },
}

/// [`DateTime`] when a [`Transaction`] was created.
pub type CreationDateTime = DateTimeOf<(Transaction, unit::Creation)>;

/// [`DateTime`] when a [`Transaction`] was modified last time.
pub type ModificationDateTime = DateTimeOf<(Transaction, unit::Modification)>;

/// [`DateTime`] when a [`Transaction`] was cancelled.
pub type CancellationDateTime = DateTimeOf<(Transaction, unit::Cancellation)>;
