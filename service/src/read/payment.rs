//! [`Payment`] read model definition.

#[cfg(doc)]
use crate::domain::Payment;

pub mod list {
    //! [`Payment`]s list definitions.

    use common::define_pagination;

    use crate::domain::{customer, payment, Payment};

    define_pagination!(Cursor, Payment, Filter);

    /// Cursor pointing to a specific [`Payment`] in a list.
    pub type Cursor = payment::Id;

    /// Filter for [`Selector`].
    #[derive(Clone, Copy, Debug, Default)]
    pub struct Filter {
        /// ID of the customer to select [`Payment`]s of.
        pub customer_id: Option<customer::Id>,
    }
}
