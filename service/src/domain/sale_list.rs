//! [`SaleList`] definitions.

use common::{define_kind, unit, DateTimeOf, Money};
use derive_more::{AsRef, Display, From, FromStr, Into};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[cfg(doc)]
use crate::domain::Car;
use crate::domain::{car, employee, manager};

/// Offer to sell a [`Car`].
///
/// A [`Car`] may have many [`SaleList`]s over its lifetime, but at most one of
/// them is [`Status::Available`] at a time.
#[derive(Clone, Debug)]
pub struct SaleList {
    /// ID of this [`SaleList`].
    pub id: Id,

    /// ID of the [`Car`] being sold.
    pub car_id: car::Id,

    /// Asked price.
    pub price: Money,

    /// [`Description`] of this offer, if any.
    pub description: Option<Description>,

    /// [`Status`] of this [`SaleList`].
    pub status: Status,

    /// ID of the manager owning this [`SaleList`].
    pub manager_id: manager::Id,

    /// ID of the employee assigned to close the deal, if any.
    pub employee_id: Option<employee::Id>,

    /// [`DateTime`] when this [`SaleList`] was created.
    ///
    /// [`DateTime`]: common::DateTime
    pub created_at: CreationDateTime,

    /// [`DateTime`] when this [`SaleList`] was modified the last time.
    ///
    /// [`DateTime`]: common::DateTime
    pub updated_at: ModificationDateTime,
}

impl SaleList {
    /// Indicates whether this [`SaleList`] can still be bought.
    #[must_use]
    pub fn is_available(&self) -> bool {
        self.status == Status::Available
    }
}

/// ID of a [`SaleList`].
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
    Ord,
    PartialEq,
    PartialOrd,
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

/// Free-form description of a [`SaleList`].
#[derive(AsRef, Clone, Debug, Display, Eq, PartialEq)]
#[as_ref(str, String)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Description(String);

impl Description {
    /// Creates a new [`Description`] if the given `text` is valid.
    #[must_use]
    pub fn new(text: impl Into<String>) -> Option<Self> {
        let text = text.into();
        Self::check(&text).then_some(Self(text))
    }

    /// Checks whether the given `text` is a valid [`Description`].
    fn check(text: impl AsRef<str>) -> bool {
        let text = text.as_ref();
        text.trim() == text && !text.is_empty() && text.len() <= 4096
    }
}

define_kind! {
    #[doc = "Status of a [`SaleList`]."]
    enum Status {
        #[doc = "[`Car`] may be bought."]
        Available = 1,

        #[doc = "[`Car`] is held for some customer."]
        Reserved = 2,

        #[doc = "[`Car`] is sold, final."]
        Sold = 3,

        #[doc = "Offer is taken off the market."]
        Withdrawn = 4,
    }
}

impl Status {
    /// Indicates whether a [`SaleList`] in this [`Status`] may be moved to the
    /// `next` one.
    #[must_use]
    pub fn can_become(self, next: Self) -> bool {
        use Status as S;

        self == next
            || matches!(
                (self, next),
                (S::Available, S::Reserved | S::Sold | S::Withdrawn)
                    | (S::Reserved, S::Available | S::Sold | S::Withdrawn)
                    | (S::Withdrawn, S::Available)
            )
    }
}

/// [`DateTime`] when a [`SaleList`] was created.
///
/// [`DateTime`]: common::DateTime
pub type CreationDateTime = DateTimeOf<(SaleList, unit::Creation)>;

/// [`DateTime`] when a [`SaleList`] was modified.
///
/// [`DateTime`]: common::DateTime
pub type ModificationDateTime = DateTimeOf<(SaleList, unit::Modification)>;

#[cfg(test)]
mod spec {
    use super::Status;

    #[test]
    fn parses_status_ignoring_case() {
        for s in ["Available", "available", "AVAILABLE"] {
            assert_eq!(s.parse::<Status>().unwrap(), Status::Available);
        }
        assert_eq!("withdrawn".parse::<Status>().unwrap(), Status::Withdrawn);
        assert!("forSale".parse::<Status>().is_err());

        assert_eq!(Status::Sold.to_string(), "SOLD");
    }

    #[test]
    fn sold_is_final() {
        for &next in Status::ALL {
            assert_eq!(Status::Sold.can_become(next), next == Status::Sold);
        }
    }

    #[test]
    fn withdrawn_only_reopens() {
        assert!(Status::Withdrawn.can_become(Status::Available));
        assert!(!Status::Withdrawn.can_become(Status::Sold));
        assert!(!Status::Withdrawn.can_become(Status::Reserved));
    }

    #[test]
    fn available_and_reserved_move_freely() {
        for from in [Status::Available, Status::Reserved] {
            for &next in Status::ALL {
                assert!(from.can_become(next), "{from} -> {next}");
            }
        }
    }
}
