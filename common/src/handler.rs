//! [`Handler`] abstraction shared by commands, queries and storage operations.

use std::future::Future;

/// Asynchronous handler of `Args`.
///
/// The same trait backs every layer: a service handles commands and queries,
/// and a storage backend handles typed operations (see [`operations`]). A type
/// supports an operation exactly when it implements [`Handler`] for it, so
/// missing capabilities are reported at compile time.
///
/// [`operations`]: crate::operations
pub trait Handler<Args = ()> {
    /// Type of successful [`Handler`] result.
    type Ok;

    /// Type of this [`Handler`] error.
    type Err;

    /// Executes this [`Handler`] with the provided arguments.
    fn execute(
        &self,
        args: Args,
    ) -> impl Future<Output = Result<Self::Ok, Self::Err>>;
}
