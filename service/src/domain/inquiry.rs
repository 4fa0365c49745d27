//! [`Inquiry`] definitions.

#[cfg(doc)]
use common::DateTime;
use common::{define_kind, define_text, ident::OpaqueId, unit, DateTimeOf};
use derive_more::{Display, Error, From, FromStr, Into};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use serde::{Deserialize, Serialize};

use crate::domain::{listing, user};

/// Interest expressed by a buyer in a listing.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Inquiry {
    /// ID of this [`Inquiry`].
    pub id: Id,

    /// ID of the listing this [`Inquiry`] is about.
    pub listing_id: listing::Id,

    /// ID of the inquiring buyer.
    pub buyer_id: user::Id,

    /// ID of the listing seller at the moment of inquiring.
    pub seller_id: user::Id,

    /// [`Message`] of the buyer.
    pub message: Message,

    /// [`Status`] of this [`Inquiry`].
    pub status: Status,

    /// [`DateTime`] when this [`Inquiry`] was created.
    pub created_at: CreationDateTime,

    /// [`DateTime`] when this [`Inquiry`] was modified last time.
    pub updated_at: ModificationDateTime,
}

impl Inquiry {
    /// Moves this [`Inquiry`] into the provided [`Status`].
    ///
    /// # Errors
    ///
    /// If the move regresses or leaves the [`Status::Archived`] one.
    pub fn mark(&mut self, to: Status) -> Result<(), TransitionError> {
        use Status as S;

        let allowed = match (self.status, to) {
            (S::New, S::Read | S::Replied) | (S::Read, S::Replied) => true,
            (S::New | S::Read | S::Replied, S::Archived) => true,
            (S::New | S::Read | S::Replied | S::Archived, _) => false,
        };
        if !allowed {
            return Err(TransitionError {
                from: self.status,
                to,
            });
        }
        self.status = to;
        Ok(())
    }
}

/// ID of an [`Inquiry`].
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
    #[doc = "Message of an [`Inquiry`]."]
    struct Message(max_len = 5000);
}

define_kind! {
    #[doc = "Status of an [`Inquiry`]."]
    enum Status {
        #[doc = "Not seen by the seller yet."]
        New = 1,

        #[doc = "Seen by the seller."]
        Read = 2,

        #[doc = "Answered by the seller."]
        Replied = 3,

        #[doc = "Put away for good."]
        Archived = 4,
    }
}

/// Error of moving an [`Inquiry`] into a disallowed [`Status`].
#[derive(Clone, Copy, Debug, Display, Error, Eq, PartialEq)]
#[display("cannot mark a `{from}` inquiry as `{to}`")]
pub struct TransitionError {
    /// [`Status`] the move was attempted from.
    pub from: Status,

    /// [`Status`] the move was attempted to.
    pub to: Status,
}

/// [`DateTime`] when an [`Inquiry`] was created.
pub type CreationDateTime = DateTimeOf<(Inquiry, unit::Creation)>;

/// [`DateTime`] when an [`Inquiry`] was modified last time.
pub type ModificationDateTime = DateTimeOf<(Inquiry, unit::Modification)>;

#[cfg(test)]
mod spec {
    use common::DateTime;

    use crate::domain::{listing, user};

    use super::{Id, Inquiry, Message, Status};

    fn inquiry(status: Status) -> Inquiry {
        let now = DateTime::now();
        Inquiry {
            id: Id::new(),
            listing_id: listing::Id::new(),
            buyer_id: user::Id::new(),
            seller_id: user::Id::new(),
            message: Message::new("Is the revenue recurring?").unwrap(),
            status,
            created_at: now.coerce(),
            updated_at: now.coerce(),
        }
    }

    #[test]
    fn advances_forward() {
        let mut i = inquiry(Status::New);
        i.mark(Status::Read).unwrap();
        i.mark(Status::Replied).unwrap();
        i.mark(Status::Archived).unwrap();

        assert_eq!(i.status, Status::Archived);
        assert!(inquiry(Status::New).mark(Status::Replied).is_ok());
    }

    #[test]
    fn never_regresses() {
        for (from, to) in [
            (Status::Replied, Status::New),
            (Status::Replied, Status::Read),
            (Status::Read, Status::New),
            (Status::Read, Status::Read),
            (Status::Archived, Status::New),
            (Status::Archived, Status::Archived),
        ] {
            let mut i = inquiry(from);
            let err = i.mark(to).unwrap_err();

            assert_eq!((err.from, err.to), (from, to));
            assert_eq!(i.status, from);
        }
    }
}
