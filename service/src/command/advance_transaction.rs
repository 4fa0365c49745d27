//! [`Command`] for advancing a [`Transaction`] to its next stage.

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
    domain::{listing, transaction, user, Event, Listing, Transaction, Viewer},
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for advancing a [`Transaction`] to the provided
/// [`transaction::Stage`].
///
/// Completing a [`Transaction`] sells its [`Listing`].
#[derive(Clone, Copy, Debug)]
pub struct AdvanceTransaction {
    /// [`Viewer`] advancing the [`Transaction`]: its buyer, seller or an
    /// admin.
    pub viewer: Viewer,

    /// ID of the [`Transaction`] to advance.
    pub transaction_id: transaction::Id,

    /// [`transaction::Stage`] to advance to.
    pub stage: transaction::Stage,

    /// Allows skipping stages. Admins only.
    pub fast_track: bool,
}

impl<Db> Command<AdvanceTransaction> for Service<Db>
where
    Db: Database<Transact, Err = Traced<database::Error>>
        + Database<
            Select<By<Option<Transaction>, transaction::Id>>,
            Ok = Option<Transaction>,
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
            Select<By<Option<Transaction>, transaction::Id>>,
            Ok = Option<Transaction>,
            Err = Traced<database::Error>,
        > + Database<Update<Listing>, Err = Traced<database::Error>>
        + Database<Update<Transaction>, Err = Traced<database::Error>>
        + Database<Insert<Event>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = Transaction;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: AdvanceTransaction,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let AdvanceTransaction {
            viewer,
            transaction_id,
            stage,
            fast_track,
        } = cmd;

        let user_id = viewer
            .user_id()
            .ok_or(E::Unauthenticated)
            .map_err(tracerr::wrap!())?;
        if fast_track && !viewer.is_admin() {
            return Err(tracerr::new!(E::NotAdmin(user_id)));
        }

        let transaction = self
            .database()
            .execute(Select(By::<Option<Transaction>, _>::new(transaction_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::TransactionNotExists(transaction_id))
            .map_err(tracerr::wrap!())?;
        if !viewer.is_admin()
            && user_id != transaction.buyer_id
            && user_id != transaction.seller_id
        {
            return Err(tracerr::new!(E::NotParticipant(user_id)));
        }
        let listing_id = transaction.listing_id;

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        // Avoid racing with offer closures of the same `Listing`.
        tx.execute(Lock(By::new(listing_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        let mut transaction = tx
            .execute(Select(By::<Option<Transaction>, _>::new(transaction_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::TransactionNotExists(transaction_id))
            .map_err(tracerr::wrap!())?;

        let from = transaction.stage;
        transaction
            .advance(stage, fast_track)
            .map_err(tracerr::from_and_wrap!(=> E))?;
        if fast_track {
            log::warn!(
                "`Transaction(id: {transaction_id})` fast-tracked from \
                 `{from}` to `{stage}` by `{user_id}`",
            );
        }

        let now = DateTime::now();
        transaction.updated_at = now.coerce();

        tx.execute(Update(transaction.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        if transaction.stage == transaction::Stage::Completed {
            let mut listing = tx
                .execute(Select(By::<Option<Listing>, _>::new(listing_id)))
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))?
                .ok_or(E::TransactionNotExists(transaction_id))
                .map_err(tracerr::wrap!())?
                .transition(listing::Event::CompleteTransaction)
                .map_err(tracerr::from_and_wrap!(=> E))?;
            listing.updated_at = now.coerce();

            tx.execute(Update(listing))
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))
                .map(drop)?;

            tx.execute(Insert(Event::ListingSold {
                listing_id,
                transaction_id,
                buyer_id: transaction.buyer_id,
                seller_id: transaction.seller_id,
                amount: transaction.amount,
            }))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;
        }

        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        if transaction.stage == transaction::Stage::Completed {
            log::info!(
                "`Listing(id: {listing_id})` sold for {}",
                transaction.amount,
            );
        }

        Ok(transaction)
    }
}

/// Error of [`AdvanceTransaction`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Transaction`] cannot move to the requested stage.
    #[display("Cannot advance: {_0}")]
    #[from]
    Advance(transaction::AdvanceError),

    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// [`Listing`] cannot be sold.
    #[display("Invalid listing transition: {_0}")]
    #[from]
    ListingTransition(listing::TransitionError),

    /// Fast-track is requested by a non-admin.
    #[display("`User(id: {_0})` is not an admin")]
    NotAdmin(#[error(not(source))] user::Id),

    /// [`Transaction`] is advanced by someone not involved in it.
    #[display("`User(id: {_0})` is not a party of the transaction")]
    NotParticipant(#[error(not(source))] user::Id),

    /// [`Transaction`] with the provided ID does not exist.
    #[display("`Transaction(id: {_0})` does not exist")]
    TransactionNotExists(#[error(not(source))] transaction::Id),

    /// [`Viewer`] is not authenticated.
    #[display("Viewer is not authenticated")]
    Unauthenticated,
}
