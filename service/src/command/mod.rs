//! [`Command`] definition.

pub mod accept_offer;
pub mod advance_transaction;
pub mod change_listing_status;
pub mod close_offer;
pub mod counter_offer;
pub mod create_inquiry;
pub mod create_listing;
pub mod mark_inquiry;
pub mod reconcile_listings;
pub mod sign_nda;
pub mod submit_offer;

/// [`Command`] of the [`Service`].
///
/// [`Service`]: crate::Service
pub use common::Handler as Command;

pub use self::{
    accept_offer::AcceptOffer,
    advance_transaction::AdvanceTransaction,
    change_listing_status::{Change as ListingChange, ChangeListingStatus},
    close_offer::CloseOffer,
    counter_offer::CounterOffer,
    create_inquiry::CreateInquiry,
    create_listing::CreateListing,
    mark_inquiry::MarkInquiry,
    reconcile_listings::ReconcileListings,
    sign_nda::SignNda,
    submit_offer::SubmitOffer,
};
