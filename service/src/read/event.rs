//! [`Event`] read model definition.

use crate::domain::event;
#[cfg(doc)]
use crate::domain::Event;

/// Selector of [`event::Record`]s following the provided position in the
/// outbox.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct After {
    /// Position to read after, or [`None`] to read from the very start.
    pub seq: Option<event::Sequence>,

    /// Maximum number of [`event::Record`]s to read.
    pub limit: Limit,
}

/// Maximum number of [`Event`]s read at once.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Limit(u16);

impl Limit {
    /// Largest allowed [`Limit`].
    pub const MAX: Self = Self(1000);

    /// Creates a new [`Limit`], clamping the provided `n` into `1..=1000`.
    #[must_use]
    pub fn new(n: u16) -> Self {
        Self(n.clamp(1, Self::MAX.0))
    }

    /// Returns this [`Limit`] as a number.
    #[must_use]
    pub fn get(self) -> usize {
        usize::from(self.0)
    }
}

impl Default for Limit {
    fn default() -> Self {
        Self(100)
    }
}
