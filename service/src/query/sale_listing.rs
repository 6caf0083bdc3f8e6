//! [`Query`] collection related to a single [`SaleList`].

use common::operations::By;

use crate::{
    domain::{car, sale_list, SaleList},
    read::sale_list::Available,
};
#[cfg(doc)]
use crate::{domain::Car, Query};

use super::DatabaseQuery;

/// Queries a [`SaleList`] by its [`sale_list::Id`].
pub type ById = DatabaseQuery<By<Option<SaleList>, sale_list::Id>>;

/// Queries the available [`SaleList`] of a [`Car`].
pub type AvailableByCar =
    DatabaseQuery<By<Option<Available<SaleList>>, car::Id>>;
