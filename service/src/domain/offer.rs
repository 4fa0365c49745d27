//! [`Offer`] definitions.

#[cfg(doc)]
use common::DateTime;
use common::{
    define_kind, define_text, ident, ident::OpaqueId, unit, DateTimeOf, Money,
};
use derive_more::{Display, Error, From, FromStr, Into};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use serde::{Deserialize, Serialize};

use crate::domain::{listing, user, Transaction};

/// Terms a buyer proposes for acquiring a listing.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Offer {
    /// ID of this [`Offer`].
    pub id: Id,

    /// Human-friendly [`Reference`] of this [`Offer`].
    pub reference: Reference,

    /// ID of the listing this [`Offer`] is made on.
    pub listing_id: listing::Id,

    /// ID of the buyer making this [`Offer`].
    pub buyer_id: user::Id,

    /// Offered price, always positive.
    pub amount: Money,

    /// Optional [`Message`] of the buyer.
    pub message: Option<Message>,

    /// [`Status`] of this [`Offer`].
    pub status: Status,

    /// Price the seller countered with, if any.
    pub counter_amount: Option<Money>,

    /// [`DateTime`] when this [`Offer`] was created.
    pub created_at: CreationDateTime,

    /// [`DateTime`] when this [`Offer`] was modified last time.
    pub updated_at: ModificationDateTime,
}

impl Offer {
    /// Returns the price both parties agree on, if this [`Offer`] is
    /// accepted.
    ///
    /// A countered [`Offer`] is agreed on the counter price.
    #[must_use]
    pub fn agreed_amount(&self) -> Money {
        self.counter_amount.unwrap_or(self.amount)
    }

    /// Counters this pending [`Offer`] with the provided price.
    ///
    /// # Errors
    ///
    /// If this [`Offer`] is not [`Status::Pending`].
    pub fn counter(&mut self, amount: Money) -> Result<(), TransitionError> {
        self.move_to(Status::Countered, &[Status::Pending])?;
        self.counter_amount = Some(amount);
        Ok(())
    }

    /// Accepts this open [`Offer`].
    ///
    /// # Errors
    ///
    /// If this [`Offer`] is not [`Status::is_open()`].
    pub fn accept(&mut self) -> Result<(), TransitionError> {
        self.move_to(Status::Accepted, &[Status::Pending, Status::Countered])
    }

    /// Closes this [`Offer`] with the provided [`Closure`].
    ///
    /// # Errors
    ///
    /// If this [`Offer`] is already closed.
    pub fn close(&mut self, closure: Closure) -> Result<(), TransitionError> {
        self.move_to(
            closure.into(),
            &[Status::Pending, Status::Countered, Status::Accepted],
        )
    }

    /// Moves this [`Offer`] into the provided [`Status`], if it's in one of
    /// the `allowed` ones.
    fn move_to(
        &mut self,
        to: Status,
        allowed: &[Status],
    ) -> Result<(), TransitionError> {
        if !allowed.contains(&self.status) {
            return Err(TransitionError {
                from: self.status,
                to,
            });
        }
        self.status = to;
        Ok(())
    }
}

/// Counts the [`Status::Accepted`] [`Offer`]s whose [`Transaction`] may
/// still complete.
///
/// An accepted [`Offer`] with no [`Transaction`] found is counted as live.
#[must_use]
pub fn count_live_accepted<'a>(
    offers: impl IntoIterator<Item = &'a Offer>,
    transactions: &[Transaction],
) -> usize {
    offers
        .into_iter()
        .filter(|o| o.status == Status::Accepted)
        .filter(|o| {
            transactions
                .iter()
                .find(|t| t.offer_id == o.id)
                .is_none_or(Transaction::is_live)
        })
        .count()
}

/// ID of an [`Offer`].
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

define_text! {
    #[doc = "Reference code of an [`Offer`], like `OFF-A1B2C3`."]
    struct Reference(max_len = 16);
}

impl Reference {
    /// Generates a new random [`Reference`].
    #[must_use]
    pub fn generate() -> Self {
        Self(ident::reference_code(Some("OFF")))
    }
}

define_text! {
    #[doc = "Message attached to an [`Offer`]."]
    struct Message(max_len = 5000);
}

define_kind! {
    #[doc = "Status of an [`Offer`]."]
    enum Status {
        #[doc = "Awaiting the seller's answer."]
        Pending = 1,

        #[doc = "Accepted, with a transaction spawned."]
        Accepted = 2,

        #[doc = "Rejected by either party."]
        Rejected = 3,

        #[doc = "Seller proposed a different price."]
        Countered = 4,

        #[doc = "Lapsed without an agreement."]
        Expired = 5,
    }
}

impl Status {
    /// Indicates whether an [`Offer`] in this [`Status`] still awaits an
    /// answer.
    #[must_use]
    pub fn is_open(self) -> bool {
        matches!(self, Self::Pending | Self::Countered)
    }
}

/// Way an [`Offer`] is closed without a deal.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Closure {
    /// [`Offer`] is rejected.
    Reject,

    /// [`Offer`] is expired.
    Expire,
}

impl From<Closure> for Status {
    fn from(closure: Closure) -> Self {
        match closure {
            Closure::Reject => Self::Rejected,
            Closure::Expire => Self::Expired,
        }
    }
}

/// Error of moving an [`Offer`] into a disallowed [`Status`].
#[derive(Clone, Copy, Debug, Display, Error, Eq, PartialEq)]
#[display("cannot move a `{from}` offer to `{to}`")]
pub struct TransitionError {
    /// [`Status`] the move was attempted from.
    pub from: Status,

    /// [`Status`] the move was attempted to.
    pub to: Status,
}

/// [`DateTime`] when an [`Offer`] was created.
pub type CreationDateTime = DateTimeOf<(Offer, unit::Creation)>;

/// [`DateTime`] when an [`Offer`] was modified last time.
pub type ModificationDateTime = DateTimeOf<(Offer, unit::Modification)>;

#[cfg(test)]
mod spec {
    use common::{DateTime, Money};

    use crate::domain::{listing, transaction, user, Transaction};

    use super::{count_live_accepted, Closure, Id, Offer, Reference, Status};

    fn offer(status: Status) -> Offer {
        let now = DateTime::now();
        Offer {
            id: Id::new(),
            reference: Reference::generate(),
            listing_id: listing::Id::new(),
            buyer_id: user::Id::new(),
            amount: Money::from_dollars(2_600_000),
            message: None,
            status,
            counter_amount: None,
            created_at: now.coerce(),
            updated_at: now.coerce(),
        }
    }

    #[test]
    fn counters_and_accepts_on_counter_price() {
        let mut o = offer(Status::Pending);
        o.counter(Money::from_dollars(2_700_000)).unwrap();
        assert_eq!(o.status, Status::Countered);

        o.accept().unwrap();
        assert_eq!(o.status, Status::Accepted);
        assert_eq!(o.agreed_amount(), Money::from_dollars(2_700_000));
    }

    #[test]
    fn closes_any_live_offer_once() {
        for status in [Status::Pending, Status::Countered, Status::Accepted] {
            let mut o = offer(status);
            o.close(Closure::Reject).unwrap();
            assert_eq!(o.status, Status::Rejected);
            assert!(o.close(Closure::Expire).is_err());
        }
    }

    #[test]
    fn rejects_illegal_moves() {
        assert!(offer(Status::Accepted).accept().is_err());
        assert!(offer(Status::Countered)
            .counter(Money::from_dollars(1))
            .is_err());
        assert!(offer(Status::Expired).accept().is_err());
    }

    #[test]
    fn counts_only_live_accepted() {
        let (live, done, pending) = (
            offer(Status::Accepted),
            offer(Status::Accepted),
            offer(Status::Pending),
        );
        let now = DateTime::now();
        let transaction = |o: &Offer, stage| Transaction {
            id: transaction::Id::new(),
            listing_id: o.listing_id,
            offer_id: o.id,
            buyer_id: o.buyer_id,
            seller_id: user::Id::new(),
            amount: o.amount,
            stage,
            created_at: now.coerce(),
            updated_at: now.coerce(),
            cancelled_at: None,
        };
        let transactions = [
            transaction(&live, transaction::Stage::Diligence),
            transaction(&done, transaction::Stage::Completed),
        ];

        assert_eq!(
            count_live_accepted([&live, &done, &pending], &transactions),
            1,
        );
        assert_eq!(count_live_accepted([&done], &transactions), 0);
    }

    #[test]
    fn generates_prefixed_reference() {
        assert!(Reference::generate().as_str().starts_with("OFF-"));
    }
}
