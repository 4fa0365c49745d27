//! [`Command`] for submitting a new [`Offer`].

use common::{
    operations::{By, Commit, Insert, Lock, Select, Transact, Transacted},
    DateTime, Money,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;
use tracing as log;

use crate::{
    domain::{listing, offer, user, Listing, Offer},
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for submitting a new [`Offer`] on a [`Listing`].
#[derive(Clone, Debug)]
pub struct SubmitOffer {
    /// ID of the buyer making the [`Offer`].
    pub buyer_id: user::Id,

    /// ID of the [`Listing`] to make the [`Offer`] on.
    pub listing_id: listing::Id,

    /// Offered price.
    pub amount: Money,

    /// Optional [`offer::Message`] to the seller.
    pub message: Option<offer::Message>,
}

impl<Db> Command<SubmitOffer> for Service<Db>
where
    Db: Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<
            Lock<By<Listing, listing::Id>>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Listing>, listing::Id>>,
            Ok = Option<Listing>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Vec<Offer>, listing::Id>>,
            Ok = Vec<Offer>,
            Err = Traced<database::Error>,
        > + Database<Insert<Offer>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = Offer;
    type Err = Traced<ExecutionError>;

    async fn execute(&self, cmd: SubmitOffer) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let SubmitOffer {
            buyer_id,
            listing_id,
            amount,
            message,
        } = cmd;

        if amount.is_zero() {
            return Err(tracerr::new!(E::ZeroAmount));
        }

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        // Avoid duplicate offers submitted concurrently.
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
        if !listing.status.accepts_offers() {
            return Err(tracerr::new!(E::ListingNotOfferable(listing_id)));
        }

        let duplicate = tx
            .execute(Select(By::<Vec<Offer>, _>::new(listing_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .into_iter()
            .find(|o| o.buyer_id == buyer_id && o.status.is_open());
        if let Some(o) = duplicate {
            return Err(tracerr::new!(E::DuplicatePendingOffer(o.id)));
        }

        let now = DateTime::now();
        let offer = Offer {
            id: offer::Id::new(),
            reference: offer::Reference::generate(),
            listing_id,
            buyer_id,
            amount,
            message,
            status: offer::Status::Pending,
            counter_amount: None,
            created_at: now.coerce(),
            updated_at: now.coerce(),
        };

        tx.execute(Insert(offer.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        log::info!(
            "`Offer(id: {}, ref: {})` of {amount} submitted on \
             `Listing(id: {listing_id})`",
            offer.id,
            offer.reference,
        );

        Ok(offer)
    }
}

/// Error of [`SubmitOffer`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// Buyer already has an open [`Offer`] on the [`Listing`].
    #[display("`Offer(id: {_0})` is still open")]
    DuplicatePendingOffer(#[error(not(source))] offer::Id),

    /// [`Listing`] with the provided ID does not exist.
    #[display("`Listing(id: {_0})` does not exist")]
    ListingNotExists(#[error(not(source))] listing::Id),

    /// [`Listing`] is not in a status accepting offers.
    #[display("`Listing(id: {_0})` does not accept offers")]
    ListingNotOfferable(#[error(not(source))] listing::Id),

    /// Seller makes an [`Offer`] on their own [`Listing`].
    #[display("`Listing(id: {_0})` belongs to the buyer")]
    OwnListing(#[error(not(source))] listing::Id),

    /// Offered price is zero.
    #[display("Offered amount must be positive")]
    ZeroAmount,
}
