//! [`RentList`] read model definition.

use crate::domain::{RentDate, RentList};

/// [`RentList`] along with all its [`RentDate`]s, ordered by their open dates.
#[derive(Clone, Debug)]
pub struct Schedule {
    /// [`RentList`] itself.
    pub list: RentList,

    /// [`RentDate`]s of the [`RentList`].
    pub dates: Vec<RentDate>,
}
