//! [`ListingPerformance`] definition.

use common::{
    operations::{By, Select},
    DateTime, Money,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{
        listing, nda, transaction, user, Inquiry, Listing, Offer,
        Transaction, Viewer,
    },
    infra::{database, Database},
    Query, Service,
};

/// [`Query`] of the engagement metrics of a single [`Listing`], available
/// to its seller and admins.
#[derive(Clone, Copy, Debug)]
pub struct ListingPerformance {
    /// [`Viewer`] requesting the metrics.
    pub viewer: Viewer,

    /// ID of the [`Listing`].
    pub listing_id: listing::Id,
}

/// Output of the [`ListingPerformance`] [`Query`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Output {
    /// Current [`listing::Status`].
    pub status: listing::Status,

    /// Whole days since the [`Listing`] went live, if it did.
    pub days_listed: Option<u64>,

    /// Number of NDAs ever signed.
    pub nda_signatures: usize,

    /// Number of NDAs granting access right now.
    pub active_ndas: usize,

    /// Number of [`Inquiry`]s received.
    pub inquiries: usize,

    /// Number of [`Offer`]s received.
    pub offers: usize,

    /// Highest offered price.
    pub highest_offer: Option<Money>,

    /// [`transaction::Stage`] of the [`Transaction`] in progress, if any.
    pub live_stage: Option<transaction::Stage>,
}

impl<Db> Query<ListingPerformance> for Service<Db>
where
    Db: Database<
            Select<By<Option<Listing>, listing::Id>>,
            Ok = Option<Listing>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Vec<nda::Signature>, listing::Id>>,
            Ok = Vec<nda::Signature>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Vec<Inquiry>, listing::Id>>,
            Ok = Vec<Inquiry>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Vec<Offer>, listing::Id>>,
            Ok = Vec<Offer>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Vec<Transaction>, listing::Id>>,
            Ok = Vec<Transaction>,
            Err = Traced<database::Error>,
        >,
{
    type Ok = Output;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        ListingPerformance { viewer, listing_id }: ListingPerformance,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let user_id = viewer
            .user_id()
            .ok_or(E::Unauthenticated)
            .map_err(tracerr::wrap!())?;

        let listing = self
            .database()
            .execute(Select(By::<Option<Listing>, _>::new(listing_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::ListingNotExists(listing_id))
            .map_err(tracerr::wrap!())?;
        if !viewer.is_admin() && listing.seller_id != user_id {
            return Err(tracerr::new!(E::NotSeller(user_id)));
        }

        let now = DateTime::now();
        let signatures = self
            .database()
            .execute(Select(By::<Vec<nda::Signature>, _>::new(listing_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        let inquiries = self
            .database()
            .execute(Select(By::<Vec<Inquiry>, _>::new(listing_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        let offers = self
            .database()
            .execute(Select(By::<Vec<Offer>, _>::new(listing_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        let transactions = self
            .database()
            .execute(Select(By::<Vec<Transaction>, _>::new(listing_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        Ok(Output {
            status: listing.status,
            days_listed: listing.days_listed(now),
            nda_signatures: signatures.len(),
            active_ndas: signatures
                .iter()
                .filter(|s| {
                    s.status(listing.status, now) == nda::Status::Active
                })
                .count(),
            inquiries: inquiries.len(),
            offers: offers.len(),
            highest_offer: offers.iter().map(|o| o.amount).max(),
            live_stage: transactions
                .iter()
                .find(|t| t.is_live())
                .map(|t| t.stage),
        })
    }
}

/// Error of [`ListingPerformance`] [`Query`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// [`Listing`] with the provided ID does not exist.
    #[display("`Listing(id: {_0})` does not exist")]
    ListingNotExists(#[error(not(source))] listing::Id),

    /// Metrics are requested by someone other than the seller or an admin.
    #[display("`User(id: {_0})` is not the seller of the listing")]
    NotSeller(#[error(not(source))] user::Id),

    /// [`Viewer`] is not authenticated.
    #[display("Viewer is not authenticated")]
    Unauthenticated,
}
