//! [`VisibleFields`] definition.

use common::{
    operations::{By, Select},
    DateTime,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{listing, nda, user, Listing, Viewer},
    infra::{database, Database},
    read::listing::{FieldSet, Visibility},
    Query, Service,
};

/// [`Query`] of the [`Listing`] fields the [`Viewer`] is allowed to see.
///
/// A missing or lapsed NDA is not an error, but results in a redacted
/// [`FieldSet`].
#[derive(Clone, Copy, Debug)]
pub struct VisibleFields {
    /// [`Viewer`] looking at the [`Listing`].
    pub viewer: Viewer,

    /// ID of the [`Listing`] to look at.
    pub listing_id: listing::Id,
}

impl<Db> Query<VisibleFields> for Service<Db>
where
    Db: Database<
            Select<By<Option<Listing>, listing::Id>>,
            Ok = Option<Listing>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<nda::Signature>, (user::Id, listing::Id)>>,
            Ok = Option<nda::Signature>,
            Err = Traced<database::Error>,
        >,
{
    type Ok = FieldSet;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        VisibleFields { viewer, listing_id }: VisibleFields,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let listing = self
            .database()
            .execute(Select(By::<Option<Listing>, _>::new(listing_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .filter(|l| {
                l.status.is_published()
                    || viewer.is_admin()
                    || viewer.is(l.seller_id)
            })
            .ok_or(E::ListingNotExists(listing_id))
            .map_err(tracerr::wrap!())?;

        let signature = match viewer {
            Viewer::User(user_id)
                if listing.nda_required && listing.seller_id != user_id =>
            {
                self.database()
                    .execute(Select(By::<Option<nda::Signature>, _>::new((
                        user_id, listing_id,
                    ))))
                    .await
                    .map_err(tracerr::map_from_and_wrap!(=> E))?
            }
            Viewer::User(_) | Viewer::Admin(_) | Viewer::Anonymous => None,
        };

        let visibility = Visibility::of(
            &viewer,
            &listing,
            signature.as_ref(),
            DateTime::now(),
        );
        Ok(FieldSet::new(&listing, visibility))
    }
}

/// Error of [`VisibleFields`] [`Query`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// [`Listing`] with the provided ID does not exist, or is not published
    /// yet.
    #[display("`Listing(id: {_0})` does not exist")]
    ListingNotExists(#[error(not(source))] listing::Id),
}
