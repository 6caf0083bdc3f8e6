//! [`Rent`] [`Contract`] definition.

use common::{Date, Money};

#[cfg(doc)]
use crate::domain::{Car, Contract, RentList};
use crate::domain::{customer, rent_list};

use super::{CreationDateTime, Id};

/// [`Contract`] about a customer renting a [`Car`] listed in a [`RentList`].
#[derive(Clone, Debug)]
pub struct Rent {
    /// ID of this [`Contract`].
    pub id: Id,

    /// ID of the [`RentList`] the [`Car`] is rented by.
    pub rent_list_id: rent_list::Id,

    /// ID of the customer renting the [`Car`].
    pub customer_id: customer::Id,

    /// First day of the rent.
    pub start_date: Date,

    /// Last day of the rent, inclusive.
    pub end_date: Date,

    /// Price of the whole rent.
    pub total_price: Money,

    /// [`DateTime`] when this [`Contract`] was issued.
    ///
    /// [`DateTime`]: common::DateTime
    pub created_at: CreationDateTime,
}
