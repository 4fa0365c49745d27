//! Marker types tagging a [`DateTimeOf`] with the event it marks.
//!
//! [`DateTimeOf`]: crate::DateTimeOf

/// Marker type describing an entity creation.
#[derive(Clone, Copy, Debug)]
pub struct Creation;

/// Marker type describing the last modification of an entity.
#[derive(Clone, Copy, Debug)]
pub struct Modification;

/// Marker type describing an entity expiration.
#[derive(Clone, Copy, Debug)]
pub struct Expiration;

/// Marker type describing an entity cancellation.
#[derive(Clone, Copy, Debug)]
pub struct Cancellation;

/// Marker type describing the first activation of an entity.
#[derive(Clone, Copy, Debug)]
pub struct Activation;

/// Marker type describing an agreement signing.
#[derive(Clone, Copy, Debug)]
pub struct Signing;
