//! [`Database`] backed by PostgreSQL.
//!
//! Row locks ([`Lock`]) are `SELECT ... FOR [NO KEY] UPDATE` statements, so
//! they only hold inside a [`Transact`]ed [`Postgres<Tx>`].
//!
//! [`Lock`]: common::operations::Lock
//! [`Transact`]: common::operations::Transact

pub mod client;
pub mod connection;
mod impls;

use deadpool_postgres::Runtime;
use derive_more::{Display, Error as StdError, From};
use tokio_postgres::{
    error::SqlState, types::ToSql, NoTls, Row, ToStatement,
};
use tracerr::Traced;

use crate::infra::database;
#[cfg(doc)]
use crate::infra::Database;

pub use deadpool_postgres::Config;
pub use refinery::embed_migrations;

pub use self::{
    client::{NonTx, Tx},
    connection::Connection,
};

/// PostgreSQL [`Database`] over the client `C`.
#[derive(Clone, Debug)]
pub struct Postgres<C = NonTx>(C);

impl Postgres {
    /// Creates a connection pool out of the provided [`Config`].
    ///
    /// No connection is opened until the first statement runs.
    ///
    /// # Errors
    ///
    /// If the [`Config`] doesn't describe a usable pool.
    pub fn new(conf: &Config) -> Result<Self, Traced<database::Error>> {
        conf.create_pool(Some(Runtime::Tokio1), NoTls)
            .map(|pool| Self(NonTx::new(pool)))
            .map_err(tracerr::from_and_wrap!(=> Error))
            .map_err(tracerr::map_from)
    }
}

impl<C: Connection> Connection for Postgres<C> {
    async fn query<T>(
        &self,
        stmt: &T,
        params: &[&(dyn ToSql + Sync)],
    ) -> Result<Vec<Row>, Traced<database::Error>>
    where
        T: ToStatement + ?Sized,
    {
        self.0.query(stmt, params).await
    }

    async fn query_opt<T>(
        &self,
        stmt: &T,
        params: &[&(dyn ToSql + Sync)],
    ) -> Result<Option<Row>, Traced<database::Error>>
    where
        T: ToStatement + ?Sized,
    {
        self.0.query_opt(stmt, params).await
    }

    async fn exec<T>(
        &self,
        stmt: &T,
        params: &[&(dyn ToSql + Sync)],
    ) -> Result<u64, Traced<database::Error>>
    where
        T: ToStatement + ?Sized,
    {
        self.0.exec(stmt, params).await
    }

    async fn batch_exec(
        &self,
        stmts: &str,
    ) -> Result<(), Traced<database::Error>> {
        self.0.batch_exec(stmts).await
    }
}

/// Error of the [`Postgres`] database.
#[derive(Debug, Display, StdError, From)]
pub enum Error {
    /// Statement failed on the database side.
    #[display("Statement failed: {_0}")]
    Connection(connection::Error),

    /// [`Config`] doesn't describe a usable pool.
    #[display("Failed to create `connection::Pool`: {_0}")]
    PoolCreationError(connection::PoolCreationError),

    /// No connection could be checked out of the pool.
    #[display("`connection::Pool` checkout failed: {_0}")]
    PoolError(connection::PoolError),
}

impl Error {
    /// Checks whether a statement was rejected by a unique constraint, e.g.
    /// when a car gets listed for sale twice.
    ///
    /// Any unique constraint matches if no `constraint` name is provided.
    #[must_use]
    pub fn is_unique_violation(&self, constraint: Option<&str>) -> bool {
        let Self::Connection(e) = self else {
            return false;
        };
        e.code() == Some(&SqlState::UNIQUE_VIOLATION)
            && constraint.map_or(true, |name| {
                e.as_db_error().and_then(|db| db.constraint()) == Some(name)
            })
    }
}
