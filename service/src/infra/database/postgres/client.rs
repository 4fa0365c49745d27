//! Postgres database clients, lazily acquiring their [`Connection`]s.

use std::sync::Arc;

use tokio::sync::{RwLock, RwLockReadGuard};
use tokio_postgres::{types::ToSql, Row, ToStatement};
use tracerr::Traced;

use crate::infra::database::{
    self,
    postgres::{self, connection, Connection},
};

/// Implements [`Connection`] for a client by forwarding every call to the
/// [`Connection`] returned by its `connection()` method.
macro_rules! forward_connection {
    ($client:ty) => {
        impl Connection for $client {
            async fn query<T>(
                &self,
                stmt: &T,
                params: &[&(dyn ToSql + Sync)],
            ) -> Result<Vec<Row>, Traced<database::Error>>
            where
                T: ToStatement + ?Sized,
            {
                self.connection()
                    .await
                    .map_err(tracerr::wrap!())?
                    .query(stmt, params)
                    .await
                    .map_err(tracerr::wrap!())
            }

            async fn query_opt<T>(
                &self,
                stmt: &T,
                params: &[&(dyn ToSql + Sync)],
            ) -> Result<Option<Row>, Traced<database::Error>>
            where
                T: ToStatement + ?Sized,
            {
                self.connection()
                    .await
                    .map_err(tracerr::wrap!())?
                    .query_opt(stmt, params)
                    .await
                    .map_err(tracerr::wrap!())
            }

            async fn exec<T>(
                &self,
                stmt: &T,
                params: &[&(dyn ToSql + Sync)],
            ) -> Result<u64, Traced<database::Error>>
            where
                T: ToStatement + ?Sized,
            {
                self.connection()
                    .await
                    .map_err(tracerr::wrap!())?
                    .exec(stmt, params)
                    .await
                    .map_err(tracerr::wrap!())
            }
        }
    };
}

/// Non-transactional Postgres database client.
#[derive(Clone, Debug)]
pub struct NonTx {
    /// [`connection::Pool`] to acquire [`Connection`]s from.
    pub(crate) pool: connection::Pool,

    /// [`Connection`] acquired on first use.
    connection: Arc<RwLock<Option<connection::NonTx>>>,
}

impl NonTx {
    /// Creates a new [`NonTx`] client over the provided [`connection::Pool`].
    #[must_use]
    pub(crate) fn from_pool(pool: connection::Pool) -> Self {
        Self {
            pool,
            connection: Arc::new(RwLock::new(None)),
        }
    }

    /// Returns the [`Connection`] of this [`NonTx`] client, acquiring it
    /// from the [`connection::Pool`] if there is none yet.
    async fn connection(
        &self,
    ) -> Result<RwLockReadGuard<'_, connection::NonTx>, Traced<database::Error>>
    {
        {
            let mut slot = self.connection.write().await;
            if slot.is_none() {
                *slot = Some(
                    self.pool
                        .get()
                        .await
                        .map_err(tracerr::from_and_wrap!(=> postgres::Error))
                        .map_err(tracerr::map_from)?,
                );
            }
        }
        RwLockReadGuard::try_map(self.connection.read().await, Option::as_ref)
            .map_err(|_| {
                tracerr::new!(database::Error::from(
                    postgres::Error::ConnectionLost
                ))
            })
    }

    /// Takes the [`Connection`] out of this [`NonTx`] client, so the next
    /// use acquires a new one.
    async fn take_connection(&self) -> Option<connection::NonTx> {
        self.connection.write().await.take()
    }
}

forward_connection!(NonTx);

/// Transactional Postgres database client.
///
/// The transaction is opened on the first statement, reusing the
/// [`Connection`] of the [`NonTx`] client it was created from, if any.
#[derive(Clone, Debug)]
pub struct Tx {
    /// [`NonTx`] client to take the [`Connection`] from.
    origin: NonTx,

    /// Lazily opened [`connection::Tx`].
    tx: Arc<RwLock<Option<connection::Tx>>>,
}

impl Tx {
    /// Creates a new [`Tx`] client out of the provided [`NonTx`] one.
    #[must_use]
    pub fn from_non_tx(origin: NonTx) -> Self {
        Self {
            origin,
            tx: Arc::new(RwLock::new(None)),
        }
    }

    /// Returns the [`connection::Tx`] of this [`Tx`] client, opening it if
    /// there is none yet.
    async fn connection(
        &self,
    ) -> Result<RwLockReadGuard<'_, connection::Tx>, Traced<database::Error>>
    {
        {
            let mut slot = self.tx.write().await;
            if slot.is_none() {
                let conn = match self.origin.take_connection().await {
                    Some(conn) => conn,
                    None => self
                        .origin
                        .pool
                        .get()
                        .await
                        .map_err(tracerr::from_and_wrap!(=> postgres::Error))
                        .map_err(tracerr::map_from)?,
                };
                *slot = Some(
                    connection::Tx::from_non_tx(conn)
                        .await
                        .map_err(tracerr::wrap!())?,
                );
            }
        }
        RwLockReadGuard::try_map(self.tx.read().await, Option::as_ref).map_err(
            |_| {
                tracerr::new!(database::Error::from(
                    postgres::Error::ConnectionLost
                ))
            },
        )
    }

    /// Commits the transaction of this [`Tx`] client, if it was opened.
    ///
    /// # Errors
    ///
    /// If failed to commit the transaction.
    pub async fn commit(&self) -> Result<(), Traced<database::Error>> {
        match self.tx.write().await.take() {
            Some(tx) => tx.commit().await.map_err(tracerr::wrap!()),
            None => Ok(()),
        }
    }
}

forward_connection!(Tx);
