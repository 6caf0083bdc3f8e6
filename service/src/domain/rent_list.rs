//! [`RentList`] definitions.

use common::{define_kind, unit, DateTimeOf};
use derive_more::{Display, From, FromStr, Into};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[cfg(doc)]
use crate::domain::{Car, RentDate};
use crate::domain::{car, manager, rent_date};

/// Rental listing of a [`Car`].
///
/// Every [`Car`] has at most one [`RentList`], aggregating the [`RentDate`]s
/// the [`Car`] may be rented on via [`RentableDate`] links.
#[derive(Clone, Debug)]
pub struct RentList {
    /// ID of this [`RentList`].
    pub id: Id,

    /// ID of the [`Car`] being rented out.
    pub car_id: car::Id,

    /// ID of the manager owning this [`RentList`].
    pub manager_id: manager::Id,

    /// [`Status`] of this [`RentList`].
    pub status: Status,

    /// [`DateTime`] when this [`RentList`] was created.
    ///
    /// [`DateTime`]: common::DateTime
    pub created_at: CreationDateTime,
}

/// Link between a [`RentList`] and one of its [`RentDate`]s.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct RentableDate {
    /// ID of the [`RentList`] owning the [`RentDate`].
    pub rent_list_id: Id,

    /// ID of the linked [`RentDate`].
    pub date_id: rent_date::Id,
}

/// ID of a [`RentList`].
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

define_kind! {
    #[doc = "Status of a [`RentList`]."]
    enum Status {
        #[doc = "[`Car`] is offered for rent."]
        ForRent = 1,

        #[doc = "[`Car`] is not offered for rent at the moment."]
        NotForRent = 2,
    }
}

impl Status {
    /// Indicates whether a [`RentList`] in this [`Status`] may be moved to the
    /// `next` one.
    ///
    /// Managers may list and unlist [`Car`]s at will.
    #[must_use]
    pub fn can_become(self, next: Self) -> bool {
        use Status as S;

        matches!(
            (self, next),
            (S::ForRent | S::NotForRent, S::ForRent | S::NotForRent)
        )
    }
}

/// [`DateTime`] when a [`RentList`] was created.
///
/// [`DateTime`]: common::DateTime
pub type CreationDateTime = DateTimeOf<(RentList, unit::Creation)>;
