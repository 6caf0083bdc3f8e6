//! Keyset pagination abstractions.

/// Default number of items on a [`Page`].
pub const DEFAULT_LIMIT: usize = 20;

/// Maximum number of items on a [`Page`].
pub const MAX_LIMIT: usize = 100;

/// Arguments of a forward pagination.
#[derive(Clone, Copy, Debug)]
pub struct Arguments<C> {
    /// Number of items to return.
    first: usize,

    /// Cursor after which to return items.
    after: Option<C>,
}

impl<C> Arguments<C> {
    /// Creates new [`Arguments`].
    ///
    /// Missing `first` falls back to [`DEFAULT_LIMIT`]. [`None`] is returned
    /// if `first` is zero or exceeds [`MAX_LIMIT`].
    #[must_use]
    pub fn new(first: Option<usize>, after: Option<C>) -> Option<Self> {
        let first = first.unwrap_or(DEFAULT_LIMIT);
        (1..=MAX_LIMIT)
            .contains(&first)
            .then_some(Self { first, after })
    }

    /// Returns the cursor after which items are requested.
    #[must_use]
    pub fn cursor(&self) -> Option<&C> {
        self.after.as_ref()
    }

    /// Returns the maximum number of items requested.
    #[must_use]
    pub fn limit(&self) -> usize {
        self.first
    }
}

impl<C> Default for Arguments<C> {
    fn default() -> Self {
        Self {
            first: DEFAULT_LIMIT,
            after: None,
        }
    }
}

/// Single page of a list.
#[derive(Clone, Debug)]
pub struct Page<C, I> {
    /// Items on this [`Page`] along with their cursors.
    pub edges: Vec<(C, I)>,

    /// Indicator whether there are more items after this [`Page`].
    pub has_more: bool,
}

impl<C, I> Page<C, I> {
    /// Builds a [`Page`] out of the `rows` fetched with a limit of
    /// [`Arguments::limit()`] + 1.
    #[must_use]
    pub fn from_overfetched(
        args: &Arguments<C>,
        rows: impl IntoIterator<Item = (C, I)>,
    ) -> Self {
        let mut edges = rows.into_iter().collect::<Vec<_>>();
        let has_more = edges.len() > args.limit();
        edges.truncate(args.limit());
        Self { edges, has_more }
    }

    /// Returns the cursor of the last item on this [`Page`].
    #[must_use]
    pub fn end_cursor(&self) -> Option<&C> {
        self.edges.last().map(|(c, _)| c)
    }

    /// Returns the items of this [`Page`] without their cursors.
    pub fn into_nodes(self) -> impl Iterator<Item = I> {
        self.edges.into_iter().map(|(_, n)| n)
    }
}

/// Pagination [`Arguments`] along with a filter.
#[derive(Clone, Copy, Debug)]
pub struct Selector<C, F> {
    /// Pagination [`Arguments`].
    pub arguments: Arguments<C>,

    /// Filter being applied to the result.
    pub filter: F,
}

/// Defines pagination types for a list.
#[expect(clippy::module_name_repetitions, reason = "more readable")]
#[macro_export]
macro_rules! define_pagination {
    ($cursor:ty, $node:ty, $filter:ty) => {
        #[doc = "A page of the list."]
        pub type Page = $crate::pagination::Page<$cursor, $node>;

        #[doc = "Arguments for selecting a [`Page`]."]
        pub type Arguments = $crate::pagination::Arguments<$cursor>;

        #[doc = "[`Page`] selector."]
        pub type Selector = $crate::pagination::Selector<$cursor, $filter>;
    };
}

#[cfg(test)]
mod spec {
    use super::{Arguments, Page, DEFAULT_LIMIT, MAX_LIMIT};

    #[test]
    fn limits_arguments() {
        assert_eq!(
            Arguments::<u8>::new(None, None).unwrap().limit(),
            DEFAULT_LIMIT,
        );
        assert_eq!(Arguments::new(Some(5), Some(3_u8)).unwrap().limit(), 5);
        assert!(Arguments::<u8>::new(Some(0), None).is_none());
        assert!(Arguments::<u8>::new(Some(MAX_LIMIT + 1), None).is_none());
    }

    #[test]
    fn detects_more_items() {
        let args = Arguments::new(Some(2), None).unwrap();

        let page = Page::from_overfetched(&args, [(1, 'a'), (2, 'b'), (3, 'c')]);
        assert!(page.has_more);
        assert_eq!(page.end_cursor(), Some(&2));
        assert_eq!(page.into_nodes().collect::<String>(), "ab");

        let page = Page::from_overfetched(&args, [(1, 'a')]);
        assert!(!page.has_more);
        assert_eq!(page.end_cursor(), Some(&1));
    }
}
