//! Scenarios driving the [`Service`] over the in-memory database.

mod deal;
mod disclosure;
mod inquiry;
mod lifecycle;
mod reconciliation;

use common::Money;

use crate::{
    command::{ChangeListingStatus, CreateListing, ListingChange},
    domain::{listing, user, Listing, Viewer},
    infra::Memory,
    Command as _, Config, Service,
};

/// Creates a new [`Service`] over an empty [`Memory`] database.
fn service() -> Service<Memory> {
    Service::new(Config::default(), Memory::new())
}

/// Returns a [`CreateListing`] of an NDA-protected SaaS business.
fn saas_listing(seller_id: user::Id) -> CreateListing {
    CreateListing {
        seller_id,
        title: listing::Title::new("Profitable SaaS Business").unwrap(),
        summary: listing::Summary::new("B2B analytics tool"),
        description: listing::Description::new("Churn analytics for teams"),
        category: listing::Category::Saas,
        business_model: listing::BusinessModel::Subscription,
        asking_price: Money::from_dollars(2_800_000),
        revenue: Some(Money::from_dollars(840_000)),
        profit: Some(Money::from_dollars(420_000)),
        founded_year: None,
        monthly_visitors: None,
        website_url: listing::WebsiteUrl::new("https://acme.example.com"),
        seller_contact: listing::SellerContact::new("owner@acme.example.com"),
        confidential_notes: listing::ConfidentialNotes::new("Key client"),
        is_confidential: true,
        nda_required: true,
    }
}

/// Creates a [`Listing`] and walks it through verification.
async fn active_listing(svc: &Service<Memory>, seller_id: user::Id) -> Listing {
    let listing = svc.execute(saas_listing(seller_id)).await.unwrap();
    publish(svc, seller_id, listing.id).await
}

/// Submits the draft [`Listing`] and approves it.
async fn publish(
    svc: &Service<Memory>,
    seller_id: user::Id,
    listing_id: listing::Id,
) -> Listing {
    _ = svc
        .execute(ChangeListingStatus {
            viewer: Viewer::User(seller_id),
            listing_id,
            change: ListingChange::Submit,
        })
        .await
        .unwrap();
    svc.execute(ChangeListingStatus {
        viewer: Viewer::Admin(user::Id::new()),
        listing_id,
        change: ListingChange::Approve,
    })
    .await
    .unwrap()
}
