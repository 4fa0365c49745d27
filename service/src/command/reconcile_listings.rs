//! [`Command`] for repairing [`Listing`]s left unsold by completed
//! [`Transaction`]s.

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
    domain::{listing, Event, Listing, Transaction},
    infra::{database, Database},
    read::transaction::Stranded,
    Service,
};

use super::Command;

/// [`Command`] for selling every [`Listing`] whose [`Transaction`] is
/// completed, while the [`Listing`] itself is not sold.
///
/// Each [`Listing`] is repaired in its own storage transaction, so a failure
/// doesn't roll back the already repaired ones.
#[derive(Clone, Copy, Debug, Default)]
pub struct ReconcileListings;

/// Output of the [`ReconcileListings`] [`Command`].
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Output {
    /// [`Listing`]s moved to [`listing::Status::Sold`].
    pub repaired: Vec<listing::Id>,

    /// [`Listing`]s that couldn't be sold from their current
    /// [`listing::Status`].
    pub skipped: Vec<listing::Id>,
}

impl<Db> Command<ReconcileListings> for Service<Db>
where
    Db: Database<Transact, Err = Traced<database::Error>>
        + Database<
            Select<By<Vec<Stranded<Transaction>>, ()>>,
            Ok = Vec<Stranded<Transaction>>,
            Err = Traced<database::Error>,
        >,
    Transacted<Db>: Database<
            Lock<By<Listing, listing::Id>>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Listing>, listing::Id>>,
            Ok = Option<Listing>,
            Err = Traced<database::Error>,
        > + Database<Update<Listing>, Err = Traced<database::Error>>
        + Database<Insert<Event>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = Output;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        _: ReconcileListings,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let stranded = self
            .database()
            .execute(Select(By::<Vec<Stranded<Transaction>>, _>::new(())))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        let mut out = Output::default();
        for Stranded(transaction) in stranded {
            let listing_id = transaction.listing_id;

            let tx = self
                .database()
                .execute(Transact)
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))?;

            tx.execute(Lock(By::new(listing_id)))
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))
                .map(drop)?;

            let Some(listing) = tx
                .execute(Select(By::<Option<Listing>, _>::new(listing_id)))
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))?
            else {
                continue;
            };
            if listing.status == listing::Status::Sold {
                // Repaired concurrently.
                continue;
            }

            let mut listing =
                match listing.transition(listing::Event::CompleteTransaction) {
                    Ok(l) => l,
                    Err(e) => {
                        log::error!(
                            "cannot sell `Listing(id: {listing_id})` of \
                             completed `Transaction(id: {})`: {e}",
                            transaction.id,
                        );
                        out.skipped.push(listing_id);
                        continue;
                    }
                };
            listing.updated_at = DateTime::now().coerce();

            tx.execute(Update(listing))
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))
                .map(drop)?;

            tx.execute(Insert(Event::ListingSold {
                listing_id,
                transaction_id: transaction.id,
                buyer_id: transaction.buyer_id,
                seller_id: transaction.seller_id,
                amount: transaction.amount,
            }))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

            tx.execute(Commit)
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))
                .map(drop)?;

            log::warn!(
                "`Listing(id: {listing_id})` reconciled as sold by completed \
                 `Transaction(id: {})`",
                transaction.id,
            );
            out.repaired.push(listing_id);
        }

        Ok(out)
    }
}

/// Error of [`ReconcileListings`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),
}
