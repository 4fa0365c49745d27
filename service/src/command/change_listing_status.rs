//! [`Command`] for moving a [`Listing`] through its lifecycle.

use common::{
    operations::{By, Commit, Lock, Select, Transact, Transacted, Update},
    DateTime,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;
use tracing as log;

use crate::{
    domain::{listing, user, Listing, Viewer},
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for changing [`listing::Status`] of a [`Listing`] on behalf of
/// its seller or an admin.
///
/// Offer and transaction driven changes are made by the corresponding
/// commands only.
#[derive(Clone, Debug)]
pub struct ChangeListingStatus {
    /// [`Viewer`] requesting the change.
    pub viewer: Viewer,

    /// ID of the [`Listing`] to change.
    pub listing_id: listing::Id,

    /// [`Change`] to apply.
    pub change: Change,
}

/// Change of a [`listing::Status`] requested directly.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Change {
    /// Seller submits the [`Listing`] for review.
    Submit,

    /// Admin approves the [`Listing`] after verification.
    Approve,

    /// Admin rejects the [`Listing`] with a reason.
    Reject(listing::RejectionReason),

    /// Seller pauses the [`Listing`].
    Pause,

    /// Seller resumes the paused [`Listing`].
    Resume,

    /// Seller withdraws the [`Listing`] from the marketplace.
    Withdraw,
}

impl Change {
    /// Indicates whether this [`Change`] is made by the verification
    /// collaborator rather than the seller.
    #[must_use]
    pub fn is_verification(&self) -> bool {
        matches!(self, Self::Approve | Self::Reject(_))
    }
}

impl From<Change> for listing::Event {
    fn from(change: Change) -> Self {
        match change {
            Change::Submit => Self::SubmitForReview,
            Change::Approve => Self::ApproveVerification,
            Change::Reject(reason) => Self::RejectVerification(reason),
            Change::Pause => Self::Pause,
            Change::Resume => Self::Resume,
            Change::Withdraw => Self::Withdraw,
        }
    }
}

impl<Db> Command<ChangeListingStatus> for Service<Db>
where
    Db: Database<Transact, Err = Traced<database::Error>>
        + Database<
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
        > + Database<Update<Listing>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = Listing;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: ChangeListingStatus,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let ChangeListingStatus {
            viewer,
            listing_id,
            change,
        } = cmd;

        let user_id = viewer
            .user_id()
            .ok_or(E::Unauthenticated)
            .map_err(tracerr::wrap!())?;

        let listing = self
            .database()
            .execute(Select(By::<Option<Listing>, _>::new(listing_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .filter(|l| {
                viewer.is_admin()
                    || l.seller_id == user_id
                    || l.status.is_published()
            })
            .ok_or(E::ListingNotExists(listing_id))
            .map_err(tracerr::wrap!())?;

        if change.is_verification() {
            if !viewer.is_admin() {
                return Err(tracerr::new!(E::NotAdmin(user_id)));
            }
        } else if listing.seller_id != user_id {
            return Err(tracerr::new!(E::NotSeller(user_id)));
        }

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        // Avoid concurrent lifecycle changes of the same `Listing`.
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

        let from = listing.status;
        let mut listing = listing
            .transition(change.into())
            .map_err(tracerr::from_and_wrap!(=> E))?;

        let now = DateTime::now();
        if listing.status == listing::Status::Active {
            _ = listing.listed_at.get_or_insert(now.coerce());
        }
        listing.updated_at = now.coerce();

        tx.execute(Update(listing.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        log::info!(
            "`Listing(id: {listing_id})` moved from `{from}` to `{}` by \
             `{user_id}`",
            listing.status,
        );

        Ok(listing)
    }
}

/// Error of [`ChangeListingStatus`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// [`Listing`] with the provided ID does not exist.
    #[display("`Listing(id: {_0})` does not exist")]
    ListingNotExists(#[error(not(source))] listing::Id),

    /// Verification [`Change`] is requested by a non-admin.
    #[display("`User(id: {_0})` is not an admin")]
    NotAdmin(#[error(not(source))] user::Id),

    /// Seller [`Change`] is requested by someone else.
    #[display("`User(id: {_0})` is not the seller of the listing")]
    NotSeller(#[error(not(source))] user::Id),

    /// [`listing::Event`] is not applicable to the [`Listing`].
    #[display("Lifecycle transition failed: {_0}")]
    #[from]
    Transition(listing::TransitionError),

    /// [`Viewer`] is not authenticated.
    #[display("Viewer is not authenticated")]
    Unauthenticated,
}
