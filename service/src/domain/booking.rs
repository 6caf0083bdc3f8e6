//! [`Booking`] definitions.

use common::{unit, DateTimeOf};
use derive_more::{Display, From, FromStr, Into};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{customer, sale_list};
#[cfg(doc)]
use crate::domain::{Customer, SaleList};

/// Interest of a [`Customer`] in buying a [`SaleList`].
///
/// Advisory only: it neither changes the [`SaleList`] status, nor prevents
/// other [`Customer`]s from booking the same [`SaleList`]. There is at most one
/// [`Booking`] per [`Customer`] and [`SaleList`].
#[derive(Clone, Debug)]
pub struct Booking {
    /// ID of this [`Booking`].
    pub id: Id,

    /// ID of the interested [`Customer`].
    pub customer_id: customer::Id,

    /// ID of the [`SaleList`] the [`Customer`] is interested in.
    pub sale_list_id: sale_list::Id,

    /// [`DateTime`] when this [`Booking`] was created.
    ///
    /// [`DateTime`]: common::DateTime
    pub created_at: CreationDateTime,
}

/// ID of a [`Booking`].
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    Deserialize,
    Display,
    Eq,
    From,
    FromStr,
    Hash,
    Into,
    PartialEq,
    Serialize,
)]
#[cfg_attr(feature = "postgres", derive(ToSql, FromSql), postgres(transparent))]
pub struct Id(Uuid);

impl Id {
    /// Creates a new random [`Id`].
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

/// [`DateTime`] when a [`Booking`] was created.
///
/// [`DateTime`]: common::DateTime
pub type CreationDateTime = DateTimeOf<(Booking, unit::Creation)>;
