//! Domain definitions.

pub mod event;
pub mod inquiry;
pub mod listing;
pub mod nda;
pub mod offer;
pub mod transaction;
pub mod user;

pub use self::{
    event::Event, inquiry::Inquiry, listing::Listing, offer::Offer,
    transaction::Transaction, user::Viewer,
};
