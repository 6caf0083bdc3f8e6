//! [`Sale`] [`Contract`] definition.

use common::Money;

#[cfg(doc)]
use crate::domain::{Car, Contract, SaleList};
use crate::domain::{customer, employee, sale_list};

use super::{CreationDateTime, Id};

/// [`Contract`] about a customer buying a [`Car`] offered by a [`SaleList`].
#[derive(Clone, Debug)]
pub struct Sale {
    /// ID of this [`Contract`].
    pub id: Id,

    /// ID of the [`SaleList`] the [`Car`] was bought by.
    pub sale_list_id: sale_list::Id,

    /// ID of the customer who bought the [`Car`].
    pub customer_id: customer::Id,

    /// ID of the employee who closed the deal.
    pub employee_id: employee::Id,

    /// Price the [`Car`] was sold for.
    pub price: Money,

    /// [`DateTime`] when this [`Contract`] was issued.
    ///
    /// [`DateTime`]: common::DateTime
    pub created_at: CreationDateTime,
}
