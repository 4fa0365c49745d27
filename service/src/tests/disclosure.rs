use common::Money;

use crate::{
    command::{sign_nda, SignNda},
    domain::{user, Event, Viewer},
    query::{self, VisibleFields},
    read::{
        event::{After, Limit},
        listing::Visibility,
    },
    Command as _,
};

use super::{active_listing, publish, saas_listing, service};

#[tokio::test]
async fn reveals_confidential_fields_once_signed() {
    let svc = service();
    let seller = user::Id::new();
    let listing = active_listing(&svc, seller).await;
    let buyer = Viewer::User(user::Id::new());

    let before = svc
        .execute(VisibleFields {
            viewer: buyer,
            listing_id: listing.id,
        })
        .await
        .unwrap();
    assert_eq!(before.visibility(), Visibility::Redacted);
    assert!(before.confidential.is_none());
    let json = serde_json::to_value(&before).unwrap();
    assert!(json.get("title").is_some());
    assert!(json.get("revenue").is_none());
    assert!(json.get("sellerContact").is_none());

    let signature = svc
        .execute(SignNda {
            viewer: buyer,
            listing_id: listing.id,
            signature_name: "Jane Doe".into(),
        })
        .await
        .unwrap();
    assert_eq!(Some(signature.user_id), buyer.user_id());

    let after = svc
        .execute(VisibleFields {
            viewer: buyer,
            listing_id: listing.id,
        })
        .await
        .unwrap();
    assert_eq!(after.visibility(), Visibility::Full);
    let confidential = after.confidential.unwrap();
    assert_eq!(confidential.revenue, Some(Money::from_dollars(840_000)));
    assert!(confidential.seller_contact.is_some());
    assert!(after.ownership.is_none());
}

#[tokio::test]
async fn shows_everything_to_owners() {
    let svc = service();
    let seller = user::Id::new();
    let listing = active_listing(&svc, seller).await;

    for viewer in [Viewer::User(seller), Viewer::Admin(user::Id::new())] {
        let fields = svc
            .execute(VisibleFields {
                viewer,
                listing_id: listing.id,
            })
            .await
            .unwrap();
        assert_eq!(fields.visibility(), Visibility::Owner);
        assert!(fields.ownership.is_some());
    }

    let anonymous = svc
        .execute(VisibleFields {
            viewer: Viewer::Anonymous,
            listing_id: listing.id,
        })
        .await
        .unwrap();
    assert_eq!(anonymous.visibility(), Visibility::Redacted);
}

#[tokio::test]
async fn discloses_listing_without_nda() {
    let svc = service();
    let seller = user::Id::new();
    let mut cmd = saas_listing(seller);
    cmd.is_confidential = false;
    cmd.nda_required = false;
    let draft = svc.execute(cmd).await.unwrap();
    let listing = publish(&svc, seller, draft.id).await;
    assert!(!listing.nda_required);

    let fields = svc
        .execute(VisibleFields {
            viewer: Viewer::Anonymous,
            listing_id: listing.id,
        })
        .await
        .unwrap();
    assert_eq!(fields.visibility(), Visibility::Full);
    assert!(fields.confidential.is_some());
}

#[tokio::test]
async fn signs_idempotently() {
    let svc = service();
    let listing = active_listing(&svc, user::Id::new()).await;
    let sign = SignNda {
        viewer: Viewer::User(user::Id::new()),
        listing_id: listing.id,
        signature_name: "Jane Doe".into(),
    };

    let first = svc.execute(sign.clone()).await.unwrap();
    let second = svc.execute(sign).await.unwrap();
    assert_eq!(first.id, second.id);

    let records = svc
        .execute(query::event::Events::by(After {
            seq: None,
            limit: Limit::default(),
        }))
        .await
        .unwrap();
    let signed = records
        .iter()
        .filter(|r| matches!(r.event, Event::NdaSigned { .. }))
        .count();
    assert_eq!(signed, 1);
}

#[tokio::test]
async fn keeps_single_signature_under_concurrency() {
    let svc = service();
    let listing = active_listing(&svc, user::Id::new()).await;
    let sign = SignNda {
        viewer: Viewer::User(user::Id::new()),
        listing_id: listing.id,
        signature_name: "Jane Doe".into(),
    };

    let (a, b) =
        tokio::join!(svc.execute(sign.clone()), svc.execute(sign.clone()));
    assert_eq!(a.unwrap().id, b.unwrap().id);

    let all = svc
        .execute(query::nda::ByListing::by(listing.id))
        .await
        .unwrap();
    assert_eq!(all.len(), 1);
}

#[tokio::test]
async fn rejects_invalid_signers() {
    let svc = service();
    let listing = active_listing(&svc, user::Id::new()).await;

    let err = svc
        .execute(SignNda {
            viewer: Viewer::Anonymous,
            listing_id: listing.id,
            signature_name: "Jane Doe".into(),
        })
        .await
        .unwrap_err()
        .into_inner();
    assert!(matches!(err, sign_nda::ExecutionError::Unauthenticated));

    let err = svc
        .execute(SignNda {
            viewer: Viewer::User(user::Id::new()),
            listing_id: listing.id,
            signature_name: "Jane".into(),
        })
        .await
        .unwrap_err()
        .into_inner();
    assert!(matches!(err, sign_nda::ExecutionError::InvalidSignatureName));
}
