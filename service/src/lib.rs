//! Business logic of the car dealership: sale listings and their bookings,
//! rent windows and their days, contracts, and payments.
//!
//! Everything is driven through the [`Command`]s and [`Query`]s executed by
//! a [`Service`] over some [`Database`].
//!
//! List of available Cargo features:
#![doc = document_features::document_features!()]
#![deny(
    nonstandard_style,
    rust_2018_idioms,
    rustdoc::all,
    trivial_casts,
    trivial_numeric_casts,
    unsafe_code
)]
#![forbid(non_ascii_idents)]
#![warn(
    clippy::allow_attributes,
    clippy::allow_attributes_without_reason,
    clippy::pedantic,
    clippy::wildcard_enum_match_arm,
    deprecated_in_future,
    missing_copy_implementations,
    missing_debug_implementations,
    missing_docs,
    unreachable_pub,
    unused_crate_dependencies,
    unused_import_braces,
    unused_labels,
    unused_lifetimes,
    unused_qualifications,
    unused_results
)]

pub mod command;
pub mod domain;
pub mod infra;
pub mod query;
pub mod read;

use common::money;
use smart_default::SmartDefault;

#[cfg(doc)]
use infra::Database;

pub use self::{command::Command, query::Query};

/// Settings of a [`Service`].
#[derive(Clone, Copy, Debug, SmartDefault)]
pub struct Config {
    /// [`money::Currency`] every price and payment amount is denominated in.
    #[default(money::Currency::Thb)]
    pub currency: money::Currency,
}

/// Entry point executing [`Command`]s and [`Query`]s over the `Db`.
#[derive(Clone, Debug)]
pub struct Service<Db> {
    /// Settings shared by all the executed operations.
    config: Config,

    /// Storage of the dealership data.
    database: Db,
}

impl<Db> Service<Db> {
    /// Creates a [`Service`] over the provided `database`.
    #[must_use]
    pub fn new(config: Config, database: Db) -> Self {
        Self { config, database }
    }

    /// Settings of this [`Service`].
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Storage this [`Service`] operates on.
    #[must_use]
    pub fn database(&self) -> &Db {
        &self.database
    }
}
