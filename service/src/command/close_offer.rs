//! [`Command`] for rejecting or expiring an [`Offer`].

use common::{
    operations::{By, Commit, Lock, Select, Transact, Transacted, Update},
    DateTime,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;
use tracing as log;

use crate::{
    domain::{
        listing, offer, transaction, user, Listing, Offer, Transaction, Viewer,
    },
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for closing an [`Offer`] without a deal.
///
/// Closing an accepted [`Offer`] cancels its [`Transaction`], and puts the
/// [`Listing`] back on the market once no other live accepted [`Offer`]
/// remains.
#[derive(Clone, Copy, Debug)]
pub struct CloseOffer {
    /// [`Viewer`] closing the [`Offer`].
    ///
    /// Rejection is allowed to the seller and the buyer, expiry to the seller
    /// and admins.
    pub viewer: Viewer,

    /// ID of the [`Offer`] to close.
    pub offer_id: offer::Id,

    /// [`offer::Closure`] to apply.
    pub closure: offer::Closure,
}

impl<Db> Command<CloseOffer> for Service<Db>
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
        + Database<Update<Transaction>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = Offer;
    type Err = Traced<ExecutionError>;

    async fn execute(&self, cmd: CloseOffer) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let CloseOffer {
            viewer,
            offer_id,
            closure,
        } = cmd;

        let user_id = viewer
            .user_id()
            .ok_or(E::Unauthenticated)
            .map_err(tracerr::wrap!())?;

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

        let allowed = match closure {
            offer::Closure::Reject => {
                user_id == listing.seller_id || user_id == offer.buyer_id
            }
            offer::Closure::Expire => {
                viewer.is_admin() || user_id == listing.seller_id
            }
        };
        if !allowed {
            return Err(tracerr::new!(E::NotAllowed(user_id)));
        }

        let was_accepted = offer.status == offer::Status::Accepted;
        offer
            .close(closure)
            .map_err(tracerr::from_and_wrap!(=> E))?;

        let now = DateTime::now();
        offer.updated_at = now.coerce();

        tx.execute(Update(offer.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        if was_accepted {
            let mut transactions = tx
                .execute(Select(By::<Vec<Transaction>, _>::new(listing_id)))
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))?;
            if let Some(t) =
                transactions.iter_mut().find(|t| t.offer_id == offer_id)
            {
                if t.stage == transaction::Stage::Completed {
                    return Err(tracerr::new!(E::TransactionCompleted(t.id)));
                }
                if t.cancelled_at.is_none() {
                    t.cancelled_at = Some(now.coerce());
                    t.updated_at = now.coerce();
                    tx.execute(Update(t.clone()))
                        .await
                        .map_err(tracerr::map_from_and_wrap!(=> E))
                        .map(drop)?;
                }
            }

            let offers = tx
                .execute(Select(By::<Vec<Offer>, _>::new(listing_id)))
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))?;
            let live = offer::count_live_accepted(&offers, &transactions);
            if live == 0 && listing.status == listing::Status::UnderOffer {
                let mut listing = listing
                    .transition(listing::Event::OfferFellThrough)
                    .map_err(tracerr::from_and_wrap!(=> E))?;
                listing.updated_at = now.coerce();

                tx.execute(Update(listing))
                    .await
                    .map_err(tracerr::map_from_and_wrap!(=> E))
                    .map(drop)?;

                log::info!(
                    "`Listing(id: {listing_id})` is back on the market after \
                     `Offer(id: {offer_id})` fell through",
                );
            }
        }

        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        Ok(offer)
    }
}

/// Error of [`CloseOffer`] [`Command`] execution.
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

    /// [`Listing`] cannot go back on the market.
    #[display("Invalid listing transition: {_0}")]
    #[from]
    ListingTransition(listing::TransitionError),

    /// [`Offer`] is closed by someone not allowed to.
    #[display("`User(id: {_0})` cannot close the offer")]
    NotAllowed(#[error(not(source))] user::Id),

    /// [`Offer`] with the provided ID does not exist.
    #[display("`Offer(id: {_0})` does not exist")]
    OfferNotExists(#[error(not(source))] offer::Id),

    /// [`Transaction`] of the accepted [`Offer`] is already completed.
    #[display("`Transaction(id: {_0})` is already completed")]
    TransactionCompleted(#[error(not(source))] transaction::Id),

    /// [`Viewer`] is not authenticated.
    #[display("Viewer is not authenticated")]
    Unauthenticated,
}
