//! [`Query`] collection related to the multiple [`Payment`]s.

use common::operations::By;

use crate::read;
#[cfg(doc)]
use crate::{domain::Payment, Query};

use super::DatabaseQuery;

/// Queries a list of [`Payment`]s.
pub type List =
    DatabaseQuery<By<read::payment::list::Page, read::payment::list::Selector>>;
