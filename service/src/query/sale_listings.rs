//! [`Query`] collection related to the multiple [`SaleList`]s.

use common::operations::By;

use crate::read;
#[cfg(doc)]
use crate::{domain::SaleList, Query};

use super::DatabaseQuery;

/// Queries a list of [`SaleList`]s.
pub type List = DatabaseQuery<
    By<read::sale_list::list::Page, read::sale_list::list::Selector>,
>;
