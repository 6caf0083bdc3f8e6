//! Infrastructure the [`Service`] runs on.
//!
//! [`Service`]: crate::Service

pub mod database;

pub use self::database::Database;
#[cfg(any(test, feature = "memory"))]
pub use self::database::{memory, Memory};
#[cfg(feature = "postgres")]
pub use self::database::{postgres, Postgres};
