//! [`Command`] for creating a new [`Inquiry`].

use common::{
    operations::{By, Commit, Insert, Lock, Select, Transact, Transacted},
    DateTime,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;
use tracing as log;

use crate::{
    domain::{inquiry, listing, user, Event, Inquiry, Listing},
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for creating a new [`Inquiry`] about a [`Listing`].
#[derive(Clone, Debug)]
pub struct CreateInquiry {
    /// ID of the inquiring buyer.
    pub buyer_id: user::Id,

    /// ID of the [`Listing`] to inquire about.
    pub listing_id: listing::Id,

    /// [`inquiry::Message`] of the buyer.
    pub message: inquiry::Message,
}

impl<Db> Command<CreateInquiry> for Service<Db>
where
    Db: Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<
            Lock<By<Listing, listing::Id>>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Listing>, listing::Id>>,
            Ok = Option<Listing>,
            Err = Traced<database::Error>,
        > + Database<Insert<Inquiry>, Err = Traced<database::Error>>
        + Database<Insert<Event>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = Inquiry;
    type Err = Traced<ExecutionError>;

    async fn execute(&self, cmd: CreateInquiry) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let CreateInquiry {
            buyer_id,
            listing_id,
            message,
        } = cmd;

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        // Avoid racing with a concurrent status change.
        tx.execute(Lock(By::new(listing_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        let listing = tx
            .execute(Select(By::<Option<Listing>, _>::new(listing_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::ListingNotExists(listing_id))
            .map_err(tracerr::wrap!())?;
        if listing.seller_id == buyer_id {
            return Err(tracerr::new!(E::OwnListing(listing_id)));
        }
        if !listing.status.accepts_inquiries() {
            return Err(tracerr::new!(E::ListingNotInquirable(listing_id)));
        }

        let now = DateTime::now();
        let inquiry = Inquiry {
            id: inquiry::Id::new(),
            listing_id,
            buyer_id,
            seller_id: listing.seller_id,
            message,
            status: inquiry::Status::New,
            created_at: now.coerce(),
            updated_at: now.coerce(),
        };

        tx.execute(Insert(inquiry.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        tx.execute(Insert(Event::InquiryCreated {
            inquiry_id: inquiry.id,
            listing_id,
            buyer_id,
            seller_id: inquiry.seller_id,
        }))
        .await
        .map_err(tracerr::map_from_and_wrap!(=> E))
        .map(drop)?;

        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        log::info!(
            "`Inquiry(id: {})` created on `Listing(id: {listing_id})`",
            inquiry.id,
        );

        Ok(inquiry)
    }
}

/// Error of [`CreateInquiry`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// [`Listing`] is not in a status accepting inquiries.
    #[display("`Listing(id: {_0})` does not accept inquiries")]
    ListingNotInquirable(#[error(not(source))] listing::Id),

    /// [`Listing`] with the provided ID does not exist.
    #[display("`Listing(id: {_0})` does not exist")]
    ListingNotExists(#[error(not(source))] listing::Id),

    /// Seller inquires about their own [`Listing`].
    #[display("`Listing(id: {_0})` belongs to the inquirer")]
    OwnListing(#[error(not(source))] listing::Id),
}
