//! Read entities definitions.

pub mod event;
pub mod listing;
pub mod transaction;

pub use self::listing::FieldSet;
