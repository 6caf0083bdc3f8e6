//! [`Query`] of an issued [`Contract`].

use common::operations::By;

use crate::domain::{contract, Contract};
#[cfg(doc)]
use crate::Query;

use super::DatabaseQuery;

/// Looks up a sale or rent [`Contract`] by its [`contract::Id`].
pub type ById = DatabaseQuery<By<Option<Contract>, contract::Id>>;
