//! Domain [`Event`] definitions.
//!
//! Events are appended to an outbox in the same storage transaction as the
//! state change they describe, and read by the notification collaborator.

#[cfg(doc)]
use common::DateTime;
use common::{define_kind, unit, DateTimeOf, Money};
use derive_more::{Display, From, Into};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use serde::{Deserialize, Serialize};

use crate::domain::{inquiry, listing, nda, offer, transaction, user};

/// Fact that happened in the marketplace.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase", tag = "type")]
pub enum Event {
    /// A listing is sold.
    #[serde(rename_all = "camelCase")]
    ListingSold {
        /// ID of the sold listing.
        listing_id: listing::Id,

        /// ID of the completed transaction.
        transaction_id: transaction::Id,

        /// ID of the buyer.
        buyer_id: user::Id,

        /// ID of the seller.
        seller_id: user::Id,

        /// Final price.
        amount: Money,
    },

    /// An offer is accepted.
    #[serde(rename_all = "camelCase")]
    OfferAccepted {
        /// ID of the accepted offer.
        offer_id: offer::Id,

        /// ID of the listing the offer is made on.
        listing_id: listing::Id,

        /// ID of the spawned transaction.
        transaction_id: transaction::Id,

        /// ID of the buyer.
        buyer_id: user::Id,

        /// ID of the seller.
        seller_id: user::Id,
    },

    /// An NDA is signed.
    #[serde(rename_all = "camelCase")]
    NdaSigned {
        /// ID of the signature.
        signature_id: nda::Id,

        /// ID of the listing the NDA covers.
        listing_id: listing::Id,

        /// ID of the signer.
        user_id: user::Id,
    },

    /// An inquiry is created.
    #[serde(rename_all = "camelCase")]
    InquiryCreated {
        /// ID of the created inquiry.
        inquiry_id: inquiry::Id,

        /// ID of the listing inquired about.
        listing_id: listing::Id,

        /// ID of the inquiring buyer.
        buyer_id: user::Id,

        /// ID of the seller to notify.
        seller_id: user::Id,
    },
}

impl Event {
    /// Returns [`Kind`] of this [`Event`].
    #[must_use]
    pub fn kind(&self) -> Kind {
        match self {
            Self::ListingSold { .. } => Kind::ListingSold,
            Self::OfferAccepted { .. } => Kind::OfferAccepted,
            Self::NdaSigned { .. } => Kind::NdaSigned,
            Self::InquiryCreated { .. } => Kind::InquiryCreated,
        }
    }
}

define_kind! {
    #[doc = "Kind of an [`Event`]."]
    enum Kind {
        #[doc = "[`Event::ListingSold`]."]
        ListingSold = 1,

        #[doc = "[`Event::OfferAccepted`]."]
        OfferAccepted = 2,

        #[doc = "[`Event::NdaSigned`]."]
        NdaSigned = 3,

        #[doc = "[`Event::InquiryCreated`]."]
        InquiryCreated = 4,
    }
}

/// [`Event`] stored in the outbox.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    /// Position of this [`Record`] in the outbox.
    pub seq: Sequence,

    /// Stored [`Event`].
    pub event: Event,

    /// [`DateTime`] when the [`Event`] occurred.
    pub occurred_at: OccurrenceDateTime,
}

/// Position of a [`Record`] in the outbox, strictly increasing.
#[derive(
    Clone,
    Copy,
    Debug,
    Deserialize,
    Display,
    Eq,
    From,
    Hash,
    Into,
    Ord,
    PartialEq,
    PartialOrd,
    Serialize,
)]
#[cfg_attr(feature = "postgres", derive(ToSql, FromSql), postgres(transparent))]
pub struct Sequence(i64);

/// [`DateTime`] when an [`Event`] occurred.
pub type OccurrenceDateTime = DateTimeOf<(Event, unit::Creation)>;

#[cfg(test)]
mod spec {
    use serde_json::json;

    use crate::domain::{listing, nda, user};

    use super::{Event, Kind};

    #[test]
    fn serializes_tagged() {
        let listing_id = listing::Id::new();
        let user_id = user::Id::new();
        let signature_id = nda::Id::new();
        let event = Event::NdaSigned {
            signature_id,
            listing_id,
            user_id,
        };

        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(
            value,
            json!({
                "type": "ndaSigned",
                "signatureId": signature_id.to_string(),
                "listingId": listing_id.to_string(),
                "userId": user_id.to_string(),
            }),
        );
        assert_eq!(serde_json::from_value::<Event>(value).unwrap(), event);
        assert_eq!(event.kind(), Kind::NdaSigned);
    }
}
