//! Dashboard reports, derived from the stored records without mutating
//! them.

pub mod listing_performance;
pub mod seller_overview;

pub use self::{
    listing_performance::ListingPerformance, seller_overview::SellerOverview,
};
