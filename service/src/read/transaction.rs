//! [`Transaction`] read model definition.

#[cfg(doc)]
use crate::domain::{listing::Status, Transaction};

/// Wrapper around a [`Transaction`] reached [`Stage::Completed`] while its
/// listing is not [`Status::Sold`].
///
/// [`Stage::Completed`]: crate::domain::transaction::Stage::Completed
#[derive(Clone, Debug)]
pub struct Stranded<T>(pub T);
