//! [`Command`] for countering an [`Offer`].

use common::{
    operations::{By, Commit, Lock, Select, Transact, Transacted, Update},
    DateTime, Money,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{listing, offer, user, Listing, Offer},
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for countering a pending [`Offer`] with a different price.
///
/// The [`Listing`] must still accept offers.
#[derive(Clone, Copy, Debug)]
pub struct CounterOffer {
    /// ID of the seller countering the [`Offer`].
    pub seller_id: user::Id,

    /// ID of the [`Offer`] to counter.
    pub offer_id: offer::Id,

    /// Price the seller is ready to accept.
    pub amount: Money,
}

impl<Db> Command<CounterOffer> for Service<Db>
where
    Db: Database<Transact, Err = Traced<database::Error>>
        + Database<
            Select<By<Option<Offer>, offer::Id>>,
            Ok = Option<Offer>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Listing>, listing::Id>>,
            Ok = Option<Listing>,
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
        > + Database<Update<Offer>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = Offer;
    type Err = Traced<ExecutionError>;

    async fn execute(&self, cmd: CounterOffer) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let CounterOffer {
            seller_id,
            offer_id,
            amount,
        } = cmd;

        if amount.is_zero() {
            return Err(tracerr::new!(E::ZeroAmount));
        }

        let offer = self
            .database()
            .execute(Select(By::<Option<Offer>, _>::new(offer_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::OfferNotExists(offer_id))
            .map_err(tracerr::wrap!())?;
        let listing = self
            .database()
            .execute(Select(By::<Option<Listing>, _>::new(offer.listing_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::OfferNotExists(offer_id))
            .map_err(tracerr::wrap!())?;
        if listing.seller_id != seller_id {
            return Err(tracerr::new!(E::NotSeller(seller_id)));
        }

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        tx.execute(Lock(By::new(listing.id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        let listing = tx
            .execute(Select(By::<Option<Listing>, _>::new(listing.id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::OfferNotExists(offer_id))
            .map_err(tracerr::wrap!())?;
        if !listing.status.accepts_offers() {
            return Err(tracerr::new!(E::ListingNotOfferable(listing.id)));
        }

        let mut offer = tx
            .execute(Select(By::<Option<Offer>, _>::new(offer_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::OfferNotExists(offer_id))
            .map_err(tracerr::wrap!())?;

        offer
            .counter(amount)
            .map_err(tracerr::from_and_wrap!(=> E))?;
        offer.updated_at = DateTime::now().coerce();

        tx.execute(Update(offer.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        Ok(offer)
    }
}

/// Error of [`CounterOffer`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// [`offer::Status`] move is not allowed.
    #[display("Invalid transition: {_0}")]
    #[from]
    InvalidTransition(offer::TransitionError),

    /// [`Listing`] is not in a status accepting offers.
    #[display("`Listing(id: {_0})` does not accept offers")]
    ListingNotOfferable(#[error(not(source))] listing::Id),

    /// [`Offer`] is countered by someone other than the seller.
    #[display("`User(id: {_0})` is not the seller of the listing")]
    NotSeller(#[error(not(source))] user::Id),

    /// [`Offer`] with the provided ID does not exist.
    #[display("`Offer(id: {_0})` does not exist")]
    OfferNotExists(#[error(not(source))] offer::Id),

    /// Counter price is zero.
    #[display("Counter amount must be positive")]
    ZeroAmount,
}
