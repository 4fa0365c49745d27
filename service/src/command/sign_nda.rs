//! [`Command`] for signing an NDA of a [`Listing`].

use common::{
    operations::{By, Commit, Insert, Select, Transact, Transacted},
    DateTime,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;
use tracing as log;

use crate::{
    domain::{listing, nda, user, Event, Listing, Viewer},
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for signing an NDA of a [`Listing`].
///
/// Signing is idempotent: an active [`nda::Signature`] of the same user is
/// returned as is.
#[derive(Clone, Debug)]
pub struct SignNda {
    /// [`Viewer`] signing the NDA.
    pub viewer: Viewer,

    /// ID of the [`Listing`] the NDA covers.
    pub listing_id: listing::Id,

    /// Full name typed by the signer, validated into an
    /// [`nda::SignatureName`].
    pub signature_name: String,
}

impl<Db> Command<SignNda> for Service<Db>
where
    Db: Database<Transact, Err = Traced<database::Error>>
        + Database<
            Select<By<Option<Listing>, listing::Id>>,
            Ok = Option<Listing>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<nda::Signature>, (user::Id, listing::Id)>>,
            Ok = Option<nda::Signature>,
            Err = Traced<database::Error>,
        >,
    Transacted<Db>: Database<
            Insert<nda::Signature>,
            Ok = nda::Signature,
            Err = Traced<database::Error>,
        > + Database<Insert<Event>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = nda::Signature;
    type Err = Traced<ExecutionError>;

    async fn execute(&self, cmd: SignNda) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let SignNda {
            viewer,
            listing_id,
            signature_name,
        } = cmd;

        let user_id = viewer
            .user_id()
            .ok_or(E::Unauthenticated)
            .map_err(tracerr::wrap!())?;
        let signature_name = nda::SignatureName::new(signature_name)
            .ok_or(E::InvalidSignatureName)
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
        if listing.status.is_terminal() {
            return Err(tracerr::new!(E::ListingClosed(listing_id)));
        }

        let existing = self
            .database()
            .execute(Select(By::<Option<nda::Signature>, _>::new((
                user_id, listing_id,
            ))))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        if let Some(sig) = existing {
            if sig.status(listing.status, DateTime::now())
                == nda::Status::Active
            {
                return Ok(sig);
            }
        }

        let signature = nda::Signature::new(
            user_id,
            listing_id,
            signature_name,
            self.config().nda_term,
        );

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        // Concurrent signer may have won the race, so its record is kept.
        let stored = tx
            .execute(Insert(signature.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        if stored.id != signature.id {
            return Ok(stored);
        }

        tx.execute(Insert(Event::NdaSigned {
            signature_id: stored.id,
            listing_id,
            user_id,
        }))
        .await
        .map_err(tracerr::map_from_and_wrap!(=> E))
        .map(drop)?;

        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        log::info!(
            "`User(id: {user_id})` signed NDA of `Listing(id: {listing_id})`",
        );

        Ok(stored)
    }
}

/// Error of [`SignNda`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// Signature name is not a full name.
    #[display("Signature name must contain at least two words with letters")]
    InvalidSignatureName,

    /// [`Listing`] is sold or withdrawn.
    #[display("`Listing(id: {_0})` is closed")]
    ListingClosed(#[error(not(source))] listing::Id),

    /// [`Listing`] with the provided ID does not exist.
    #[display("`Listing(id: {_0})` does not exist")]
    ListingNotExists(#[error(not(source))] listing::Id),

    /// [`Viewer`] is not authenticated.
    #[display("Viewer is not authenticated")]
    Unauthenticated,
}
