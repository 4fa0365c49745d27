use common::{operations::Insert, DateTime, Money};

use crate::{
    command::ReconcileListings,
    domain::{
        listing::{self, spec::draft},
        offer, transaction, user, Listing, Transaction,
    },
    infra::{Database as _, Memory},
    query, Command as _, Config, Service,
};

/// Stores a [`Listing`] in the provided [`listing::Status`] along with a
/// completed [`Transaction`] of it, as if the sale was cut off halfway.
async fn strand(db: &Memory, status: listing::Status) -> listing::Id {
    let listing = Listing { status, ..draft() };
    let now = DateTime::now();
    let transaction = Transaction {
        id: transaction::Id::new(),
        listing_id: listing.id,
        offer_id: offer::Id::new(),
        buyer_id: user::Id::new(),
        seller_id: listing.seller_id,
        amount: Money::from_dollars(2_600_000),
        stage: transaction::Stage::Completed,
        created_at: now.coerce(),
        updated_at: now.coerce(),
        cancelled_at: None,
    };
    let id = listing.id;
    db.execute(Insert(listing)).await.unwrap();
    db.execute(Insert(transaction)).await.unwrap();
    id
}

#[tokio::test]
async fn sells_listings_of_completed_transactions() {
    let db = Memory::new();
    let stranded = strand(&db, listing::Status::UnderOffer).await;
    let svc = Service::new(Config::default(), db);

    let before = svc
        .execute(query::transaction::Stranded::by(()))
        .await
        .unwrap();
    assert_eq!(before.len(), 1);

    let out = svc.execute(ReconcileListings).await.unwrap();
    assert_eq!(out.repaired, [stranded]);
    assert!(out.skipped.is_empty());

    let listing = svc
        .execute(query::listing::ById::by(stranded))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(listing.status, listing::Status::Sold);

    let again = svc.execute(ReconcileListings).await.unwrap();
    assert!(again.repaired.is_empty());
}

#[tokio::test]
async fn skips_listings_that_cannot_be_sold() {
    let db = Memory::new();
    let withdrawn = strand(&db, listing::Status::Withdrawn).await;
    let svc = Service::new(Config::default(), db);

    let out = svc.execute(ReconcileListings).await.unwrap();
    assert!(out.repaired.is_empty());
    assert_eq!(out.skipped, [withdrawn]);

    let listing = svc
        .execute(query::listing::ById::by(withdrawn))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(listing.status, listing::Status::Withdrawn);
}
