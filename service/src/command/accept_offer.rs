//! [`Command`] for accepting an [`Offer`].

use common::{
    operations::{
        By, Commit, Insert, Lock, Select, Transact, Transacted, Update,
    },
    DateTime,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;
use tracing as log;

use crate::{
    domain::{
        listing, offer, transaction, user, Event, Listing, Offer, Transaction,
    },
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for accepting an open [`Offer`], spawning a [`Transaction`].
///
/// A pending [`Offer`] is accepted by the seller, while a countered one is
/// accepted by the buyer on the counter price.
#[derive(Clone, Copy, Debug)]
pub struct AcceptOffer {
    /// ID of the user accepting the [`Offer`].
    pub initiator_id: user::Id,

    /// ID of the [`Offer`] to accept.
    pub offer_id: offer::Id,
}

impl<Db> Command<AcceptOffer> for Service<Db>
where
    Db: Database<Transact, Err = Traced<database::Error>>
        + Database<
            Select<By<Option<Offer>, offer::Id>>,
            Ok = Option<Offer>,
            Err = Traced<database::Error>,
        >,
    Transacted<Db>: Database<
            Lock<By<Listing, listing::Id>>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Listing>, listing::Id>>,
            Ok = Option<Listing>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Offer>, offer::Id>>,
            Ok = Option<Offer>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Vec<Offer>, listing::Id>>,
            Ok = Vec<Offer>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Vec<Transaction>, listing::Id>>,
            Ok = Vec<Transaction>,
            Err = Traced<database::Error>,
        > + Database<Update<Listing>, Err = Traced<database::Error>>
        + Database<Update<Offer>, Err = Traced<database::Error>>
        + Database<Insert<Transaction>, Err = Traced<database::Error>>
        + Database<Insert<Event>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = Transaction;
    type Err = Traced<ExecutionError>;

    async fn execute(&self, cmd: AcceptOffer) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let AcceptOffer {
            initiator_id,
            offer_id,
        } = cmd;

        let offer = self
            .database()
            .execute(Select(By::<Option<Offer>, _>::new(offer_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::OfferNotExists(offer_id))
            .map_err(tracerr::wrap!())?;
        let listing_id = offer.listing_id;

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        // Avoid accepting several offers on the same `Listing` at once.
        tx.execute(Lock(By::new(listing_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        let listing = tx
            .execute(Select(By::<Option<Listing>, _>::new(listing_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::OfferNotExists(offer_id))
            .map_err(tracerr::wrap!())?;
        let mut offer = tx
            .execute(Select(By::<Option<Offer>, _>::new(offer_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::OfferNotExists(offer_id))
            .map_err(tracerr::wrap!())?;

        let acceptor = match offer.status {
            offer::Status::Countered => offer.buyer_id,
            offer::Status::Pending
            | offer::Status::Accepted
            | offer::Status::Rejected
            | offer::Status::Expired => listing.seller_id,
        };
        if acceptor != initiator_id {
            return Err(tracerr::new!(E::NotAcceptor(initiator_id)));
        }

        let offers = tx
            .execute(Select(By::<Vec<Offer>, _>::new(listing_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        let transactions = tx
            .execute(Select(By::<Vec<Transaction>, _>::new(listing_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        let others = offers.iter().filter(|o| o.id != offer_id);
        if offer::count_live_accepted(others, &transactions) > 0 {
            return Err(tracerr::new!(E::MultipleAcceptedOffers(listing_id)));
        }

        offer.accept().map_err(tracerr::from_and_wrap!(=> E))?;
        let mut listing = listing
            .transition(listing::Event::AcceptOffer { accepted_offers: 1 })
            .map_err(tracerr::from_and_wrap!(=> E))?;

        let now = DateTime::now();
        offer.updated_at = now.coerce();
        listing.updated_at = now.coerce();
        let transaction = Transaction {
            id: transaction::Id::new(),
            listing_id,
            offer_id,
            buyer_id: offer.buyer_id,
            seller_id: listing.seller_id,
            amount: offer.agreed_amount(),
            stage: transaction::Stage::Inquiry,
            created_at: now.coerce(),
            updated_at: now.coerce(),
            cancelled_at: None,
        };

        tx.execute(Update(offer))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        tx.execute(Update(listing))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        tx.execute(Insert(transaction.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        tx.execute(Insert(Event::OfferAccepted {
            offer_id,
            listing_id,
            transaction_id: transaction.id,
            buyer_id: transaction.buyer_id,
            seller_id: transaction.seller_id,
        }))
        .await
        .map_err(tracerr::map_from_and_wrap!(=> E))
        .map(drop)?;

        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        log::info!(
            "`Offer(id: {offer_id})` accepted, `Transaction(id: {})` started \
             for {}",
            transaction.id,
            transaction.amount,
        );

        Ok(transaction)
    }
}

/// Error of [`AcceptOffer`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// [`offer::Status`] move is not allowed.
    #[display("Invalid offer transition: {_0}")]
    #[from]
    InvalidTransition(offer::TransitionError),

    /// [`Listing`] cannot go under offer.
    #[display("Invalid listing transition: {_0}")]
    #[from]
    ListingTransition(listing::TransitionError),

    /// Another [`Offer`] on the [`Listing`] is accepted and its
    /// [`Transaction`] is still live.
    #[display("`Listing(id: {_0})` already has an accepted offer")]
    MultipleAcceptedOffers(#[error(not(source))] listing::Id),

    /// [`Offer`] is accepted by someone not allowed to.
    #[display("`User(id: {_0})` cannot accept the offer")]
    NotAcceptor(#[error(not(source))] user::Id),

    /// [`Offer`] with the provided ID does not exist.
    #[display("`Offer(id: {_0})` does not exist")]
    OfferNotExists(#[error(not(source))] offer::Id),
}
