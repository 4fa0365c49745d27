//! [`Query`] of the [`Event`] outbox.

use common::operations::By;

#[cfg(doc)]
use crate::{domain::Event, Query};
use crate::{domain::event, read};

use super::DatabaseQuery;

/// Queries [`event::Record`]s following the provided position, oldest
/// first.
pub type Events = DatabaseQuery<By<Vec<event::Record>, read::event::After>>;
