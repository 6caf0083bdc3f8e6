//! [`RentDate`] definitions.

use common::{define_kind, unit, Date, DateTimeOf, Money};
use derive_more::{AsRef, Display, From, FromStr, Into};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::customer;
#[cfg(doc)]
use crate::domain::{Customer, RentList};

/// Range of days a [`Car`] may be rented for, at a fixed price.
///
/// Belongs to a single [`RentList`] through a [`RentableDate`] link.
///
/// [`Car`]: crate::domain::Car
/// [`RentableDate`]: crate::domain::rent_list::RentableDate
#[derive(Clone, Debug)]
pub struct RentDate {
    /// ID of this [`RentDate`].
    pub id: Id,

    /// First day of the range.
    pub open_date: Date,

    /// Last day of the range, inclusive.
    pub close_date: Date,

    /// Price of renting for the whole range.
    pub price: Money,

    /// [`Status`] of this [`RentDate`].
    pub status: Status,

    /// ID of the [`Customer`] who booked this [`RentDate`].
    ///
    /// Only meaningful while [`Status::Booked`].
    pub booked_by: Option<customer::Id>,

    /// [`Description`] of this [`RentDate`], if any.
    pub description: Option<Description>,

    /// [`DateTime`] when this [`RentDate`] was created.
    ///
    /// [`DateTime`]: common::DateTime
    pub created_at: CreationDateTime,

    /// [`DateTime`] when this [`RentDate`] was modified the last time.
    ///
    /// [`DateTime`]: common::DateTime
    pub updated_at: ModificationDateTime,
}

impl RentDate {
    /// Indicates whether this [`RentDate`] may be booked.
    #[must_use]
    pub fn is_available(&self) -> bool {
        self.status == Status::Available
    }

    /// Marks this [`RentDate`] as booked by the provided [`Customer`].
    pub fn book(&mut self, by: customer::Id) {
        self.status = Status::Booked;
        self.booked_by = Some(by);
        self.updated_at = DateTimeOf::now();
    }

    /// Makes this [`RentDate`] available again, dropping any booking.
    pub fn reopen(&mut self) {
        self.status = Status::Available;
        self.booked_by = None;
        self.updated_at = DateTimeOf::now();
    }

    /// Indicates whether the provided `day` falls into this [`RentDate`].
    #[must_use]
    pub fn covers(&self, day: Date) -> bool {
        self.open_date <= day && day <= self.close_date
    }
}

/// ID of a [`RentDate`].
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

/// Free-form description of a [`RentDate`].
#[derive(AsRef, Clone, Debug, Display, Eq, PartialEq)]
#[as_ref(str, String)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Description(String);

impl Description {
    /// Creates a new [`Description`] if the given `text` is valid.
    #[must_use]
    pub fn new(text: impl Into<String>) -> Option<Self> {
        let text = text.into();
        (!text.trim().is_empty() && text.len() <= 1024).then_some(Self(text))
    }
}

define_kind! {
    #[doc = "Status of a [`RentDate`]."]
    enum Status {
        #[doc = "[`RentDate`] may be booked."]
        Available = 1,

        #[doc = "[`RentDate`] is booked by some [`Customer`]."]
        Booked = 2,
    }
}

impl Status {
    /// Indicates whether a [`RentDate`] in this [`Status`] may be moved to the
    /// `next` one.
    ///
    /// Any [`RentDate`] may be re-opened by its manager.
    #[must_use]
    pub fn can_become(self, next: Self) -> bool {
        matches!(
            (self, next),
            (_, Self::Available) | (Self::Available, Self::Booked)
        )
    }
}

/// [`DateTime`] when a [`RentDate`] was created.
///
/// [`DateTime`]: common::DateTime
pub type CreationDateTime = DateTimeOf<(RentDate, unit::Creation)>;

/// [`DateTime`] when a [`RentDate`] was modified.
///
/// [`DateTime`]: common::DateTime
pub type ModificationDateTime = DateTimeOf<(RentDate, unit::Modification)>;

#[cfg(test)]
mod spec {
    use common::{money::Currency, Date, DateTimeOf, Money};

    use super::{Id, RentDate, Status};
    use crate::domain::customer;

    fn date(s: &str) -> Date {
        s.parse().unwrap()
    }

    fn rent_date() -> RentDate {
        RentDate {
            id: Id::new(),
            open_date: date("2024-05-01"),
            close_date: date("2024-05-03"),
            price: Money::from_f64(900.0, Currency::Thb).unwrap(),
            status: Status::Available,
            booked_by: None,
            description: None,
            created_at: DateTimeOf::now(),
            updated_at: DateTimeOf::now(),
        }
    }

    #[test]
    fn covers_inclusive_range() {
        let d = rent_date();

        assert!(!d.covers(date("2024-04-30")));
        assert!(d.covers(date("2024-05-01")));
        assert!(d.covers(date("2024-05-03")));
        assert!(!d.covers(date("2024-05-04")));
    }

    #[test]
    fn booking_and_reopening() {
        let mut d = rent_date();
        let customer = customer::Id::new();

        d.book(customer);
        assert_eq!(d.status, Status::Booked);
        assert_eq!(d.booked_by, Some(customer));
        assert!(!d.is_available());

        d.reopen();
        assert_eq!(d.status, Status::Available);
        assert_eq!(d.booked_by, None);
    }

    #[test]
    fn transitions() {
        assert!(Status::Available.can_become(Status::Booked));
        assert!(Status::Booked.can_become(Status::Available));
        assert!(!Status::Booked.can_become(Status::Booked));
        assert_eq!("booked".parse::<Status>().unwrap(), Status::Booked);
    }
}
