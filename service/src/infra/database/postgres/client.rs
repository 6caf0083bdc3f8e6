//! Postgres clients handed to the [`Postgres`] database.
//!
//! [`Postgres`]: super::Postgres

use std::sync::Arc;

use tokio::sync::{MappedMutexGuard, Mutex, MutexGuard};
use tokio_postgres::{types::ToSql, Row, ToStatement};
use tracerr::Traced;

use crate::infra::database::{
    self,
    postgres::{self, connection, Connection},
};

/// Client running every statement on its own pooled connection, outside of
/// any transaction.
#[derive(Clone, Debug)]
pub struct NonTx {
    /// [`connection::Pool`] the connections are checked out from.
    pool: connection::Pool,
}

impl NonTx {
    /// Wraps the provided [`connection::Pool`].
    #[must_use]
    pub(crate) const fn new(pool: connection::Pool) -> Self {
        Self { pool }
    }

    /// Checks out a connection from the pool.
    pub(crate) async fn checkout(
        &self,
    ) -> Result<connection::NonTx, Traced<database::Error>> {
        self.pool
            .get()
            .await
            .map_err(tracerr::from_and_wrap!(=> postgres::Error))
            .map_err(tracerr::map_from)
    }
}

impl Connection for NonTx {
    async fn query<T>(
        &self,
        stmt: &T,
        params: &[&(dyn ToSql + Sync)],
    ) -> Result<Vec<Row>, Traced<database::Error>>
    where
        T: ToStatement + ?Sized,
    {
        let conn = self.checkout().await.map_err(tracerr::wrap!())?;
        conn.query(stmt, params).await.map_err(tracerr::wrap!())
    }

    async fn query_opt<T>(
        &self,
        stmt: &T,
        params: &[&(dyn ToSql + Sync)],
    ) -> Result<Option<Row>, Traced<database::Error>>
    where
        T: ToStatement + ?Sized,
    {
        let conn = self.checkout().await.map_err(tracerr::wrap!())?;
        conn.query_opt(stmt, params).await.map_err(tracerr::wrap!())
    }

    async fn exec<T>(
        &self,
        stmt: &T,
        params: &[&(dyn ToSql + Sync)],
    ) -> Result<u64, Traced<database::Error>>
    where
        T: ToStatement + ?Sized,
    {
        let conn = self.checkout().await.map_err(tracerr::wrap!())?;
        conn.exec(stmt, params).await.map_err(tracerr::wrap!())
    }

    async fn batch_exec(
        &self,
        stmts: &str,
    ) -> Result<(), Traced<database::Error>> {
        let conn = self.checkout().await.map_err(tracerr::wrap!())?;
        conn.batch_exec(stmts).await.map_err(tracerr::wrap!())
    }
}

/// Client running every statement inside a single transaction.
///
/// `BEGIN` is issued lazily, on the first statement. Clones share the same
/// transaction, so row locks taken through one clone are held until
/// [`Tx::commit()`] or until the last clone is dropped (which rolls back).
#[derive(Clone, Debug)]
pub struct Tx {
    /// [`NonTx`] client to check out the transaction connection from.
    origin: NonTx,

    /// Transaction, once begun.
    open: Arc<Mutex<Option<connection::Tx>>>,
}

impl Tx {
    /// Creates a new [`Tx`] client which hasn't begun its transaction yet.
    #[must_use]
    pub fn new(origin: NonTx) -> Self {
        Self {
            origin,
            open: Arc::new(Mutex::new(None)),
        }
    }

    /// Returns the open transaction, beginning it if necessary.
    ///
    /// Statements of the same transaction are run one at a time, as the
    /// returned guard is held while a statement runs.
    async fn begun(
        &self,
    ) -> Result<MappedMutexGuard<'_, connection::Tx>, Traced<database::Error>>
    {
        let mut open = self.open.lock().await;
        let tx = match open.take() {
            Some(tx) => tx,
            None => {
                let conn =
                    self.origin.checkout().await.map_err(tracerr::wrap!())?;
                connection::Tx::begin(conn).await.map_err(tracerr::wrap!())?
            }
        };
        Ok(MutexGuard::map(open, |slot| slot.insert(tx)))
    }

    /// Commits the transaction of this [`Tx`] client, if it has begun.
    ///
    /// The next statement run through this client begins a new transaction.
    ///
    /// # Errors
    ///
    /// If the database fails to commit.
    pub async fn commit(&self) -> Result<(), Traced<database::Error>> {
        let Some(tx) = self.open.lock().await.take() else {
            return Ok(());
        };
        tx.commit().await.map_err(tracerr::wrap!())
    }
}

impl Connection for Tx {
    async fn query<T>(
        &self,
        stmt: &T,
        params: &[&(dyn ToSql + Sync)],
    ) -> Result<Vec<Row>, Traced<database::Error>>
    where
        T: ToStatement + ?Sized,
    {
        let tx = self.begun().await.map_err(tracerr::wrap!())?;
        tx.query(stmt, params).await.map_err(tracerr::wrap!())
    }

    async fn query_opt<T>(
        &self,
        stmt: &T,
        params: &[&(dyn ToSql + Sync)],
    ) -> Result<Option<Row>, Traced<database::Error>>
    where
        T: ToStatement + ?Sized,
    {
        let tx = self.begun().await.map_err(tracerr::wrap!())?;
        tx.query_opt(stmt, params).await.map_err(tracerr::wrap!())
    }

    async fn exec<T>(
        &self,
        stmt: &T,
        params: &[&(dyn ToSql + Sync)],
    ) -> Result<u64, Traced<database::Error>>
    where
        T: ToStatement + ?Sized,
    {
        let tx = self.begun().await.map_err(tracerr::wrap!())?;
        tx.exec(stmt, params).await.map_err(tracerr::wrap!())
    }

    async fn batch_exec(
        &self,
        stmts: &str,
    ) -> Result<(), Traced<database::Error>> {
        let tx = self.begun().await.map_err(tracerr::wrap!())?;
        tx.batch_exec(stmts).await.map_err(tracerr::wrap!())
    }
}
