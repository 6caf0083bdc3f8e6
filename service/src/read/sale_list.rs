//! [`SaleList`] read model definition.

#[cfg(doc)]
use crate::domain::SaleList;

/// Wrapper around [`SaleList`] indicating that it [`is_available()`].
///
/// [`is_available()`]: SaleList::is_available
#[derive(Clone, Copy, Debug)]
pub struct Available<T>(pub T);

pub mod list {
    //! [`SaleList`]s list definitions.

    use common::define_pagination;

    use crate::domain::{sale_list, SaleList};

    define_pagination!(Cursor, SaleList, Filter);

    /// Cursor pointing to a specific [`SaleList`] in a list.
    pub type Cursor = sale_list::Id;

    /// Filter for [`Selector`].
    #[derive(Clone, Copy, Debug)]
    pub struct Filter {
        /// [`sale_list::Status`] to select [`SaleList`]s in.
        pub status: sale_list::Status,
    }

    impl Default for Filter {
        fn default() -> Self {
            Self {
                status: sale_list::Status::Available,
            }
        }
    }
}
