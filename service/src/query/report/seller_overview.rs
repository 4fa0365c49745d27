//! [`SellerOverview`] definition.

use std::collections::BTreeMap;

use common::{
    operations::{By, Select},
    Money,
};
use tracerr::Traced;

use crate::{
    domain::{
        inquiry, listing, transaction, user, Inquiry, Listing, Offer,
        Transaction,
    },
    infra::{database, Database},
    Query, Service,
};

/// [`Query`] summarizing all the [`Listing`]s of a seller.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct SellerOverview {
    /// ID of the seller.
    pub seller_id: user::Id,
}

/// Output of the [`SellerOverview`] [`Query`].
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Output {
    /// Number of [`Listing`]s in each [`listing::Status`].
    pub listings: BTreeMap<listing::Status, usize>,

    /// Number of [`Inquiry`]s not read yet.
    pub new_inquiries: usize,

    /// Number of [`Offer`]s awaiting an answer.
    pub open_offers: usize,

    /// Number of [`Transaction`]s in progress.
    pub live_transactions: usize,

    /// Total price of the completed [`Transaction`]s.
    pub sold_amount: Money,
}

impl<Db> Query<SellerOverview> for Service<Db>
where
    Db: Database<
            Select<By<Vec<Listing>, user::Id>>,
            Ok = Vec<Listing>,
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
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        SellerOverview { seller_id }: SellerOverview,
    ) -> Result<Self::Ok, Self::Err> {
        let listings = self
            .database()
            .execute(Select(By::<Vec<Listing>, _>::new(seller_id)))
            .await
            .map_err(tracerr::wrap!())?;

        let mut out = Output::default();
        for listing in listings {
            *out.listings.entry(listing.status).or_default() += 1;

            out.new_inquiries += self
                .database()
                .execute(Select(By::<Vec<Inquiry>, _>::new(listing.id)))
                .await
                .map_err(tracerr::wrap!())?
                .iter()
                .filter(|i| i.status == inquiry::Status::New)
                .count();

            out.open_offers += self
                .database()
                .execute(Select(By::<Vec<Offer>, _>::new(listing.id)))
                .await
                .map_err(tracerr::wrap!())?
                .iter()
                .filter(|o| o.status.is_open())
                .count();

            let transactions = self
                .database()
                .execute(Select(By::<Vec<Transaction>, _>::new(listing.id)))
                .await
                .map_err(tracerr::wrap!())?;
            out.live_transactions +=
                transactions.iter().filter(|t| t.is_live()).count();
            out.sold_amount = out.sold_amount
                + transactions
                    .iter()
                    .filter(|t| t.stage == transaction::Stage::Completed)
                    .map(|t| t.amount)
                    .sum::<Money>();
        }

        Ok(out)
    }
}
