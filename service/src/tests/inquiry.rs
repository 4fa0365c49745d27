use common::Money;

use crate::{
    command::{
        create_inquiry, mark_inquiry, AcceptOffer, AdvanceTransaction,
        ChangeListingStatus, CreateInquiry, ListingChange, MarkInquiry,
        SubmitOffer,
    },
    domain::{inquiry, listing, transaction, user, Inquiry, Viewer},
    infra::Memory,
    Command as _, Service,
};

use super::{active_listing, saas_listing, service};

/// Sends an [`Inquiry`] of the `buyer` about the [`Listing`].
///
/// [`Listing`]: crate::domain::Listing
async fn inquire(
    svc: &Service<Memory>,
    buyer_id: user::Id,
    listing_id: listing::Id,
) -> Result<Inquiry, create_inquiry::ExecutionError> {
    svc.execute(CreateInquiry {
        buyer_id,
        listing_id,
        message: inquiry::Message::new("Is churn low?").unwrap(),
    })
    .await
    .map_err(tracerr::Traced::into_inner)
}

fn assert_not_inquirable(
    res: Result<Inquiry, create_inquiry::ExecutionError>,
    listing_id: listing::Id,
) {
    assert!(matches!(
        res,
        Err(create_inquiry::ExecutionError::ListingNotInquirable(id))
            if id == listing_id,
    ));
}

#[tokio::test]
async fn refuses_inquiry_on_unpublished_listing() {
    let svc = service();
    let seller = user::Id::new();
    let buyer = user::Id::new();
    let draft = svc.execute(saas_listing(seller)).await.unwrap();

    assert_not_inquirable(inquire(&svc, buyer, draft.id).await, draft.id);

    _ = svc
        .execute(ChangeListingStatus {
            viewer: Viewer::User(seller),
            listing_id: draft.id,
            change: ListingChange::Submit,
        })
        .await
        .unwrap();

    assert_not_inquirable(inquire(&svc, buyer, draft.id).await, draft.id);
}

#[tokio::test]
async fn refuses_inquiry_on_closed_listing() {
    let svc = service();
    let seller = user::Id::new();
    let buyer = user::Id::new();

    let withdrawn = active_listing(&svc, seller).await;
    _ = svc
        .execute(ChangeListingStatus {
            viewer: Viewer::User(seller),
            listing_id: withdrawn.id,
            change: ListingChange::Withdraw,
        })
        .await
        .unwrap();
    assert_not_inquirable(
        inquire(&svc, buyer, withdrawn.id).await,
        withdrawn.id,
    );

    let sold = active_listing(&svc, seller).await;
    let offer = svc
        .execute(SubmitOffer {
            buyer_id: buyer,
            listing_id: sold.id,
            amount: Money::from_dollars(2_800_000),
            message: None,
        })
        .await
        .unwrap();
    let deal = svc
        .execute(AcceptOffer {
            initiator_id: seller,
            offer_id: offer.id,
        })
        .await
        .unwrap();

    // Under offer is still open for questions.
    assert!(inquire(&svc, user::Id::new(), sold.id).await.is_ok());

    _ = svc
        .execute(AdvanceTransaction {
            viewer: Viewer::Admin(user::Id::new()),
            transaction_id: deal.id,
            stage: transaction::Stage::Completed,
            fast_track: true,
        })
        .await
        .unwrap();
    assert_not_inquirable(
        inquire(&svc, user::Id::new(), sold.id).await,
        sold.id,
    );
}

#[tokio::test]
async fn refuses_inquiry_on_own_listing() {
    let svc = service();
    let seller = user::Id::new();
    let listing = active_listing(&svc, seller).await;

    assert!(matches!(
        inquire(&svc, seller, listing.id).await,
        Err(create_inquiry::ExecutionError::OwnListing(id)) if id == listing.id,
    ));
}

#[tokio::test]
async fn marks_inquiry_forward_only() {
    let svc = service();
    let seller = user::Id::new();
    let buyer = user::Id::new();
    let listing = active_listing(&svc, seller).await;
    let inquiry = inquire(&svc, buyer, listing.id).await.unwrap();
    assert_eq!(inquiry.status, inquiry::Status::New);

    let mark = |seller_id, status| MarkInquiry {
        seller_id,
        inquiry_id: inquiry.id,
        status,
    };

    let err = svc
        .execute(mark(buyer, inquiry::Status::Read))
        .await
        .unwrap_err()
        .into_inner();
    assert!(matches!(
        err,
        mark_inquiry::ExecutionError::NotSeller(id) if id == buyer,
    ));

    let replied = svc
        .execute(mark(seller, inquiry::Status::Replied))
        .await
        .unwrap();
    assert_eq!(replied.status, inquiry::Status::Replied);

    let err = svc
        .execute(mark(seller, inquiry::Status::Read))
        .await
        .unwrap_err()
        .into_inner();
    assert!(matches!(err, mark_inquiry::ExecutionError::InvalidTransition(_)));

    let archived = svc
        .execute(mark(seller, inquiry::Status::Archived))
        .await
        .unwrap();
    assert_eq!(archived.status, inquiry::Status::Archived);

    let err = svc
        .execute(mark(seller, inquiry::Status::Replied))
        .await
        .unwrap_err()
        .into_inner();
    assert!(matches!(err, mark_inquiry::ExecutionError::InvalidTransition(_)));
}
