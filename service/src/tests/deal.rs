use common::Money;

use crate::{
    command::{
        accept_offer, advance_transaction, close_offer, counter_offer,
        submit_offer, AcceptOffer, AdvanceTransaction, CloseOffer,
        CounterOffer, SubmitOffer,
    },
    domain::{listing, offer, transaction, user, Event, Offer, Viewer},
    infra::Memory,
    query,
    read::event::{After, Limit},
    Command as _, Service,
};

use super::{active_listing, service};

/// Submits an [`Offer`] of the provided `dollars` on behalf of the `buyer`.
async fn offer(
    svc: &Service<Memory>,
    buyer_id: user::Id,
    listing_id: listing::Id,
    dollars: u64,
) -> Offer {
    svc.execute(SubmitOffer {
        buyer_id,
        listing_id,
        amount: Money::from_dollars(dollars),
        message: None,
    })
    .await
    .unwrap()
}

async fn listing_status(
    svc: &Service<Memory>,
    id: listing::Id,
) -> listing::Status {
    svc.execute(query::listing::ById::by(id))
        .await
        .unwrap()
        .unwrap()
        .status
}

#[tokio::test]
async fn accepts_countered_offer_on_counter_price() {
    let svc = service();
    let seller = user::Id::new();
    let buyer = user::Id::new();
    let listing = active_listing(&svc, seller).await;

    let offer = offer(&svc, buyer, listing.id, 2_500_000).await;
    assert_eq!(offer.status, offer::Status::Pending);

    let countered = svc
        .execute(CounterOffer {
            seller_id: seller,
            offer_id: offer.id,
            amount: Money::from_dollars(2_600_000),
        })
        .await
        .unwrap();
    assert_eq!(countered.status, offer::Status::Countered);

    // Countered offer is the buyer's to accept.
    let err = svc
        .execute(AcceptOffer {
            initiator_id: seller,
            offer_id: offer.id,
        })
        .await
        .unwrap_err()
        .into_inner();
    assert!(matches!(err, accept_offer::ExecutionError::NotAcceptor(_)));

    let deal = svc
        .execute(AcceptOffer {
            initiator_id: buyer,
            offer_id: offer.id,
        })
        .await
        .unwrap();
    assert_eq!(deal.stage, transaction::Stage::Inquiry);
    assert_eq!(deal.amount, Money::from_dollars(2_600_000));
    assert_eq!(deal.buyer_id, buyer);
    assert_eq!(deal.seller_id, seller);
    assert_eq!(
        listing_status(&svc, listing.id).await,
        listing::Status::UnderOffer,
    );
}

#[tokio::test]
async fn advances_stage_by_stage_until_sold() {
    let svc = service();
    let seller = user::Id::new();
    let buyer = user::Id::new();
    let listing = active_listing(&svc, seller).await;
    let offer = offer(&svc, buyer, listing.id, 2_700_000).await;
    let deal = svc
        .execute(AcceptOffer {
            initiator_id: seller,
            offer_id: offer.id,
        })
        .await
        .unwrap();

    let advance = |viewer, stage| AdvanceTransaction {
        viewer,
        transaction_id: deal.id,
        stage,
        fast_track: false,
    };

    let deal = svc
        .execute(advance(Viewer::User(buyer), transaction::Stage::Negotiation))
        .await
        .unwrap();
    assert_eq!(deal.stage, transaction::Stage::Negotiation);

    let err = svc
        .execute(advance(Viewer::User(buyer), transaction::Stage::Escrow))
        .await
        .unwrap_err()
        .into_inner();
    assert!(matches!(
        err,
        advance_transaction::ExecutionError::Advance(
            transaction::AdvanceError::GuardFailed { .. },
        ),
    ));

    let err = svc
        .execute(advance(
            Viewer::User(user::Id::new()),
            transaction::Stage::Loi,
        ))
        .await
        .unwrap_err()
        .into_inner();
    assert!(matches!(
        err,
        advance_transaction::ExecutionError::NotParticipant(_),
    ));

    for stage in [
        transaction::Stage::Loi,
        transaction::Stage::Diligence,
        transaction::Stage::Escrow,
        transaction::Stage::Closing,
    ] {
        let deal = svc
            .execute(advance(Viewer::User(seller), stage))
            .await
            .unwrap();
        assert_eq!(deal.stage, stage);
        assert_eq!(
            listing_status(&svc, listing.id).await,
            listing::Status::UnderOffer,
        );
    }

    let deal = svc
        .execute(advance(Viewer::User(seller), transaction::Stage::Completed))
        .await
        .unwrap();
    assert_eq!(deal.stage, transaction::Stage::Completed);
    assert_eq!(listing_status(&svc, listing.id).await, listing::Status::Sold);

    let records = svc
        .execute(query::event::Events::by(After {
            seq: None,
            limit: Limit::default(),
        }))
        .await
        .unwrap();
    assert!(records.iter().any(|r| matches!(
        r.event,
        Event::ListingSold { listing_id, .. } if listing_id == listing.id,
    )));
    assert!(records.windows(2).all(|w| w[0].seq < w[1].seq));
}

#[tokio::test]
async fn fast_tracks_by_admin_only() {
    let svc = service();
    let seller = user::Id::new();
    let listing = active_listing(&svc, seller).await;
    let offer = offer(&svc, user::Id::new(), listing.id, 2_800_000).await;
    let deal = svc
        .execute(AcceptOffer {
            initiator_id: seller,
            offer_id: offer.id,
        })
        .await
        .unwrap();

    let err = svc
        .execute(AdvanceTransaction {
            viewer: Viewer::User(seller),
            transaction_id: deal.id,
            stage: transaction::Stage::Completed,
            fast_track: true,
        })
        .await
        .unwrap_err()
        .into_inner();
    assert!(matches!(err, advance_transaction::ExecutionError::NotAdmin(_)));

    let deal = svc
        .execute(AdvanceTransaction {
            viewer: Viewer::Admin(user::Id::new()),
            transaction_id: deal.id,
            stage: transaction::Stage::Completed,
            fast_track: true,
        })
        .await
        .unwrap();
    assert_eq!(deal.stage, transaction::Stage::Completed);
    assert_eq!(listing_status(&svc, listing.id).await, listing::Status::Sold);
}

#[tokio::test]
async fn keeps_listing_under_offer_on_competing_rejection() {
    let svc = service();
    let seller = user::Id::new();
    let (first, second) = (user::Id::new(), user::Id::new());
    let listing = active_listing(&svc, seller).await;
    let winner = offer(&svc, first, listing.id, 2_700_000).await;
    let loser = offer(&svc, second, listing.id, 2_400_000).await;

    let deal = svc
        .execute(AcceptOffer {
            initiator_id: seller,
            offer_id: winner.id,
        })
        .await
        .unwrap();

    let rejected = svc
        .execute(CloseOffer {
            viewer: Viewer::User(seller),
            offer_id: loser.id,
            closure: offer::Closure::Reject,
        })
        .await
        .unwrap();
    assert_eq!(rejected.status, offer::Status::Rejected);
    assert_eq!(
        listing_status(&svc, listing.id).await,
        listing::Status::UnderOffer,
    );

    // Buyer walks away from the deal.
    _ = svc
        .execute(CloseOffer {
            viewer: Viewer::User(first),
            offer_id: winner.id,
            closure: offer::Closure::Reject,
        })
        .await
        .unwrap();
    assert_eq!(
        listing_status(&svc, listing.id).await,
        listing::Status::Active,
    );
    let cancelled = svc
        .execute(query::transaction::ById::by(deal.id))
        .await
        .unwrap()
        .unwrap();
    assert!(cancelled.cancelled_at.is_some());
    assert!(!cancelled.is_live());
}

#[tokio::test]
async fn accepts_single_offer_under_concurrency() {
    let svc = service();
    let seller = user::Id::new();
    let listing = active_listing(&svc, seller).await;
    let a = offer(&svc, user::Id::new(), listing.id, 2_700_000).await;
    let b = offer(&svc, user::Id::new(), listing.id, 2_750_000).await;

    let (ra, rb) = tokio::join!(
        svc.execute(AcceptOffer {
            initiator_id: seller,
            offer_id: a.id,
        }),
        svc.execute(AcceptOffer {
            initiator_id: seller,
            offer_id: b.id,
        }),
    );

    let errs = [ra.err(), rb.err()]
        .into_iter()
        .flatten()
        .map(tracerr::Traced::into_inner)
        .collect::<Vec<_>>();
    assert_eq!(errs.len(), 1);
    assert!(matches!(
        errs[0],
        accept_offer::ExecutionError::MultipleAcceptedOffers(id)
            if id == listing.id,
    ));

    let transactions = svc
        .execute(query::transaction::ByListing::by(listing.id))
        .await
        .unwrap();
    assert_eq!(transactions.len(), 1);

    let offers = svc
        .execute(query::offer::ByListing::by(listing.id))
        .await
        .unwrap();
    let accepted = offers
        .iter()
        .filter(|o| o.status == offer::Status::Accepted)
        .collect::<Vec<_>>();
    assert_eq!(accepted.len(), 1);
    assert_eq!(accepted[0].id, transactions[0].offer_id);
    assert_eq!(
        listing_status(&svc, listing.id).await,
        listing::Status::UnderOffer,
    );
}

#[tokio::test]
async fn refuses_second_open_offer_of_buyer() {
    let svc = service();
    let seller = user::Id::new();
    let buyer = user::Id::new();
    let listing = active_listing(&svc, seller).await;
    let first = offer(&svc, buyer, listing.id, 2_500_000).await;

    let err = svc
        .execute(SubmitOffer {
            buyer_id: buyer,
            listing_id: listing.id,
            amount: Money::from_dollars(2_550_000),
            message: None,
        })
        .await
        .unwrap_err()
        .into_inner();
    assert!(matches!(
        err,
        submit_offer::ExecutionError::DuplicatePendingOffer(id)
            if id == first.id,
    ));

    let err = svc
        .execute(SubmitOffer {
            buyer_id: seller,
            listing_id: listing.id,
            amount: Money::from_dollars(1),
            message: None,
        })
        .await
        .unwrap_err()
        .into_inner();
    assert!(matches!(err, submit_offer::ExecutionError::OwnListing(_)));

    let err = svc
        .execute(SubmitOffer {
            buyer_id: user::Id::new(),
            listing_id: listing.id,
            amount: Money::ZERO,
            message: None,
        })
        .await
        .unwrap_err()
        .into_inner();
    assert!(matches!(err, submit_offer::ExecutionError::ZeroAmount));
}

#[tokio::test]
async fn refuses_offers_once_listing_is_taken() {
    let svc = service();
    let seller = user::Id::new();
    let listing = active_listing(&svc, seller).await;
    let winner = offer(&svc, user::Id::new(), listing.id, 2_700_000).await;
    let deal = svc
        .execute(AcceptOffer {
            initiator_id: seller,
            offer_id: winner.id,
        })
        .await
        .unwrap();

    let submit = || SubmitOffer {
        buyer_id: user::Id::new(),
        listing_id: listing.id,
        amount: Money::from_dollars(2_900_000),
        message: None,
    };

    let err = svc.execute(submit()).await.unwrap_err().into_inner();
    assert!(matches!(
        err,
        submit_offer::ExecutionError::ListingNotOfferable(id)
            if id == listing.id,
    ));

    _ = svc
        .execute(AdvanceTransaction {
            viewer: Viewer::Admin(user::Id::new()),
            transaction_id: deal.id,
            stage: transaction::Stage::Completed,
            fast_track: true,
        })
        .await
        .unwrap();
    assert_eq!(listing_status(&svc, listing.id).await, listing::Status::Sold);

    let err = svc.execute(submit()).await.unwrap_err().into_inner();
    assert!(matches!(
        err,
        submit_offer::ExecutionError::ListingNotOfferable(id)
            if id == listing.id,
    ));
}

#[tokio::test]
async fn refuses_counter_while_listing_under_offer() {
    let svc = service();
    let seller = user::Id::new();
    let listing = active_listing(&svc, seller).await;
    let winner = offer(&svc, user::Id::new(), listing.id, 2_700_000).await;
    let waiting = offer(&svc, user::Id::new(), listing.id, 2_400_000).await;
    _ = svc
        .execute(AcceptOffer {
            initiator_id: seller,
            offer_id: winner.id,
        })
        .await
        .unwrap();

    let err = svc
        .execute(CounterOffer {
            seller_id: seller,
            offer_id: waiting.id,
            amount: Money::from_dollars(2_650_000),
        })
        .await
        .unwrap_err()
        .into_inner();
    assert!(matches!(
        err,
        counter_offer::ExecutionError::ListingNotOfferable(id)
            if id == listing.id,
    ));

    let untouched = svc
        .execute(query::offer::ById::by(waiting.id))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(untouched.status, offer::Status::Pending);
    assert_eq!(untouched.counter_amount, None);
}

#[tokio::test]
async fn lets_only_seller_or_admin_expire() {
    let svc = service();
    let seller = user::Id::new();
    let buyer = user::Id::new();
    let listing = active_listing(&svc, seller).await;
    let offer = offer(&svc, buyer, listing.id, 2_500_000).await;

    let err = svc
        .execute(CloseOffer {
            viewer: Viewer::User(buyer),
            offer_id: offer.id,
            closure: offer::Closure::Expire,
        })
        .await
        .unwrap_err()
        .into_inner();
    assert!(matches!(
        err,
        close_offer::ExecutionError::NotAllowed(id) if id == buyer,
    ));

    let expired = svc
        .execute(CloseOffer {
            viewer: Viewer::User(seller),
            offer_id: offer.id,
            closure: offer::Closure::Expire,
        })
        .await
        .unwrap();
    assert_eq!(expired.status, offer::Status::Expired);
}

#[tokio::test]
async fn refuses_rejecting_completed_deal() {
    let svc = service();
    let seller = user::Id::new();
    let buyer = user::Id::new();
    let listing = active_listing(&svc, seller).await;
    let offer = offer(&svc, buyer, listing.id, 2_800_000).await;
    let deal = svc
        .execute(AcceptOffer {
            initiator_id: seller,
            offer_id: offer.id,
        })
        .await
        .unwrap();
    _ = svc
        .execute(AdvanceTransaction {
            viewer: Viewer::Admin(user::Id::new()),
            transaction_id: deal.id,
            stage: transaction::Stage::Completed,
            fast_track: true,
        })
        .await
        .unwrap();

    let err = svc
        .execute(CloseOffer {
            viewer: Viewer::User(buyer),
            offer_id: offer.id,
            closure: offer::Closure::Reject,
        })
        .await
        .unwrap_err()
        .into_inner();
    assert!(matches!(
        err,
        close_offer::ExecutionError::TransactionCompleted(id) if id == deal.id,
    ));

    let kept = svc
        .execute(query::offer::ById::by(offer.id))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(kept.status, offer::Status::Accepted);
    assert_eq!(listing_status(&svc, listing.id).await, listing::Status::Sold);
}
