use common::Money;
use rust_decimal::Decimal;

use crate::{
    command::{change_listing_status, ChangeListingStatus, ListingChange},
    domain::{listing, user, Viewer},
    query::{self, VisibleFields},
    Command as _,
};

use super::{saas_listing, service};

#[tokio::test]
async fn goes_live_after_verification() {
    let svc = service();
    let seller = user::Id::new();

    let draft = svc.execute(saas_listing(seller)).await.unwrap();
    assert_eq!(draft.status, listing::Status::Draft);
    assert!(draft.slug.is_some());
    assert!(draft.listed_at.is_none());

    let pending = svc
        .execute(ChangeListingStatus {
            viewer: Viewer::User(seller),
            listing_id: draft.id,
            change: ListingChange::Submit,
        })
        .await
        .unwrap();
    assert_eq!(pending.status, listing::Status::Pending);

    let active = svc
        .execute(ChangeListingStatus {
            viewer: Viewer::Admin(user::Id::new()),
            listing_id: draft.id,
            change: ListingChange::Approve,
        })
        .await
        .unwrap();
    assert_eq!(active.status, listing::Status::Active);
    assert!(active.is_verified);
    assert!(active.listed_at.is_some());

    let by_slug = svc
        .execute(query::listing::BySlug::by(draft.slug.unwrap()))
        .await
        .unwrap();
    assert_eq!(by_slug.map(|l| l.id), Some(draft.id));
}

#[tokio::test]
async fn keeps_rejection_reason_on_draft() {
    let svc = service();
    let seller = user::Id::new();
    let draft = svc.execute(saas_listing(seller)).await.unwrap();
    _ = svc
        .execute(ChangeListingStatus {
            viewer: Viewer::User(seller),
            listing_id: draft.id,
            change: ListingChange::Submit,
        })
        .await
        .unwrap();

    let reason = listing::RejectionReason::new("Revenue is unproven").unwrap();
    let rejected = svc
        .execute(ChangeListingStatus {
            viewer: Viewer::Admin(user::Id::new()),
            listing_id: draft.id,
            change: ListingChange::Reject(reason.clone()),
        })
        .await
        .unwrap();

    assert_eq!(rejected.status, listing::Status::Draft);
    assert_eq!(rejected.rejection_reason, Some(reason));
}

#[tokio::test]
async fn refuses_verification_by_seller() {
    let svc = service();
    let seller = user::Id::new();
    let draft = svc.execute(saas_listing(seller)).await.unwrap();
    _ = svc
        .execute(ChangeListingStatus {
            viewer: Viewer::User(seller),
            listing_id: draft.id,
            change: ListingChange::Submit,
        })
        .await
        .unwrap();

    let err = svc
        .execute(ChangeListingStatus {
            viewer: Viewer::User(seller),
            listing_id: draft.id,
            change: ListingChange::Approve,
        })
        .await
        .unwrap_err()
        .into_inner();

    assert!(matches!(
        err,
        change_listing_status::ExecutionError::NotAdmin(id) if id == seller,
    ));
}

#[tokio::test]
async fn refuses_incomplete_submission() {
    let svc = service();
    let seller = user::Id::new();
    let mut cmd = saas_listing(seller);
    cmd.revenue = None;
    cmd.asking_price = Money::ZERO;
    let draft = svc.execute(cmd).await.unwrap();

    let err = svc
        .execute(ChangeListingStatus {
            viewer: Viewer::User(seller),
            listing_id: draft.id,
            change: ListingChange::Submit,
        })
        .await
        .unwrap_err()
        .into_inner();

    let missing = match err {
        change_listing_status::ExecutionError::Transition(
            listing::TransitionError::GuardFailed(
                listing::Guard::MissingFields(missing),
            ),
        ) => missing,
        e => panic!("unexpected error: {e}"),
    };
    assert_eq!(
        missing,
        [listing::RequiredField::AskingPrice, listing::RequiredField::Revenue],
    );
}

#[tokio::test]
async fn hides_drafts_from_strangers() {
    let svc = service();
    let seller = user::Id::new();
    let draft = svc.execute(saas_listing(seller)).await.unwrap();

    for viewer in [Viewer::Anonymous, Viewer::User(user::Id::new())] {
        assert!(svc
            .execute(VisibleFields {
                viewer,
                listing_id: draft.id,
            })
            .await
            .is_err());
    }
    assert!(svc
        .execute(VisibleFields {
            viewer: Viewer::User(seller),
            listing_id: draft.id,
        })
        .await
        .is_ok());
}

#[tokio::test]
async fn derives_ratios_of_extreme_financials() {
    let svc = service();
    let seller = user::Id::new();
    let cent = Money::new(Decimal::new(1, 2)).unwrap();
    let mut cmd = saas_listing(seller);
    cmd.asking_price = cent;
    cmd.revenue = Some(cent);
    cmd.profit = Some(Money::MAX);
    let draft = svc.execute(cmd).await.unwrap();

    let fields = svc
        .execute(VisibleFields {
            viewer: Viewer::User(seller),
            listing_id: draft.id,
        })
        .await
        .unwrap();

    let confidential = fields.confidential.unwrap();
    assert_eq!(
        confidential.margin.map(|m| m.value()),
        Some(Decimal::from(9_999_999_999_999_900_i64)),
    );
    assert_eq!(
        confidential.multiple.map(|m| m.value()),
        Some(Decimal::ZERO),
    );
}

#[tokio::test]
async fn withdraws_for_good() {
    let svc = service();
    let seller = user::Id::new();
    let listing = super::active_listing(&svc, seller).await;

    let withdrawn = svc
        .execute(ChangeListingStatus {
            viewer: Viewer::User(seller),
            listing_id: listing.id,
            change: ListingChange::Withdraw,
        })
        .await
        .unwrap();
    assert_eq!(withdrawn.status, listing::Status::Withdrawn);

    let err = svc
        .execute(ChangeListingStatus {
            viewer: Viewer::User(seller),
            listing_id: listing.id,
            change: ListingChange::Resume,
        })
        .await
        .unwrap_err()
        .into_inner();
    assert!(matches!(
        err,
        change_listing_status::ExecutionError::Transition(
            listing::TransitionError::InvalidTransition { .. },
        ),
    ));
}
