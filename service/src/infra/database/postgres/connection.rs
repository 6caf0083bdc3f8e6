//! Raw Postgres connections: a pooled one and a transaction started on it.

use std::{fmt, future::Future};

use futures::{FutureExt as _, TryFutureExt as _};
use ouroboros::self_referencing;
use tokio_postgres::{types::ToSql, Row, ToStatement};
use tracerr::Traced;

use crate::infra::database::{self, postgres};

pub use deadpool_postgres::{
    Client as NonTx, CreatePoolError as PoolCreationError, Pool, PoolError,
};
pub use tokio_postgres::Error;

/// Statements execution over some Postgres connection.
///
/// Implemented by the raw connections of this module, as well as by the
/// [`client`]s wrapping them.
///
/// [`client`]: super::client
pub trait Connection {
    /// Runs the `stmt` returning all the selected rows.
    ///
    /// # Errors
    ///
    /// If the statement fails or no connection can be obtained.
    fn query<T>(
        &self,
        stmt: &T,
        params: &[&(dyn ToSql + Sync)],
    ) -> impl Future<Output = Result<Vec<Row>, Traced<database::Error>>>
    where
        T: ToStatement + ?Sized;

    /// Runs the `stmt` returning at most one selected row.
    ///
    /// # Errors
    ///
    /// If the statement fails, selects more than one row, or no connection
    /// can be obtained.
    fn query_opt<T>(
        &self,
        stmt: &T,
        params: &[&(dyn ToSql + Sync)],
    ) -> impl Future<Output = Result<Option<Row>, Traced<database::Error>>>
    where
        T: ToStatement + ?Sized;

    /// Runs the `stmt` returning the number of rows it touched.
    ///
    /// # Errors
    ///
    /// If the statement fails or no connection can be obtained.
    fn exec<T>(
        &self,
        stmt: &T,
        params: &[&(dyn ToSql + Sync)],
    ) -> impl Future<Output = Result<u64, Traced<database::Error>>>
    where
        T: ToStatement + ?Sized;

    /// Runs several `;`-separated statements without parameters.
    ///
    /// # Errors
    ///
    /// If any of the statements fails or no connection can be obtained.
    fn batch_exec(
        &self,
        stmts: &str,
    ) -> impl Future<Output = Result<(), Traced<database::Error>>>;
}

/// Traces a raw driver error as a [`database::Error`].
fn traced(e: Error) -> Traced<database::Error> {
    tracerr::map_from(tracerr::new!(postgres::Error::from(e)))
}

/// Implements [`Connection`] for a raw connection type by delegating to the
/// `tokio_postgres` methods of the expression bound to `$this`.
macro_rules! delegate_to_driver {
    ($ty:ty, |$this:ident| $driver:expr) => {
        impl Connection for $ty {
            async fn query<T>(
                &self,
                stmt: &T,
                params: &[&(dyn ToSql + Sync)],
            ) -> Result<Vec<Row>, Traced<database::Error>>
            where
                T: ToStatement + ?Sized,
            {
                let $this = self;
                $driver.query(stmt, params).await.map_err(traced)
            }

            async fn query_opt<T>(
                &self,
                stmt: &T,
                params: &[&(dyn ToSql + Sync)],
            ) -> Result<Option<Row>, Traced<database::Error>>
            where
                T: ToStatement + ?Sized,
            {
                let $this = self;
                $driver.query_opt(stmt, params).await.map_err(traced)
            }

            async fn exec<T>(
                &self,
                stmt: &T,
                params: &[&(dyn ToSql + Sync)],
            ) -> Result<u64, Traced<database::Error>>
            where
                T: ToStatement + ?Sized,
            {
                let $this = self;
                $driver.execute(stmt, params).await.map_err(traced)
            }

            async fn batch_exec(
                &self,
                stmts: &str,
            ) -> Result<(), Traced<database::Error>> {
                let $this = self;
                $driver.batch_execute(stmts).await.map_err(traced)
            }
        }
    };
}

delegate_to_driver!(NonTx, |conn| (**conn));
delegate_to_driver!(Tx, |conn| conn.transaction());

/// Open transaction owning the pooled connection it runs on.
///
/// Rolled back on drop unless [`Tx::commit()`]ed.
#[self_referencing]
pub struct Tx {
    /// Pooled connection the transaction runs on.
    conn: NonTx,

    /// Transaction itself, taken out only to be committed.
    #[borrows(mut conn)]
    #[not_covariant]
    open: Option<deadpool_postgres::Transaction<'this>>,
}

impl fmt::Debug for Tx {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tx")
            .field("open", &self.with_open(|tx| tx.is_some()))
            .finish_non_exhaustive()
    }
}

impl Tx {
    /// Issues `BEGIN` on the provided pooled connection.
    ///
    /// # Errors
    ///
    /// If the database refuses to start a transaction.
    pub async fn begin(conn: NonTx) -> Result<Self, Traced<database::Error>> {
        Self::try_new_async_send(conn, |c| c.transaction().map_ok(Some).boxed())
            .await
            .map_err(traced)
    }

    /// Open transaction of this [`Tx`].
    fn transaction(&self) -> &deadpool_postgres::Transaction<'_> {
        self.with_open(|tx| tx.as_ref().expect("taken only by `commit()`"))
    }

    /// Issues `COMMIT` and returns the connection to its pool.
    ///
    /// # Errors
    ///
    /// If the database fails to commit.
    #[expect(clippy::missing_panics_doc, reason = "infallible")]
    pub async fn commit(mut self) -> Result<(), Traced<database::Error>> {
        #[expect(
            clippy::redundant_closure_for_method_calls,
            reason = "`Option::take` has the wrong variance here"
        )]
        let tx = self.with_open_mut(|tx| tx.take());
        tx.expect("taken only once").commit().await.map_err(traced)
    }
}
