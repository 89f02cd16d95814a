//! Pagination cursor.

use derive_getters::Getters;

/// Default request field carrying the page number.
pub const DEFAULT_PAGE_FIELD: &str = "page";

/// Default response field carrying the item collection.
pub const DEFAULT_ITEMS_FIELD: &str = "data";

/// Position of one paginated iteration.
///
/// The page only ever moves forward, and the yielded counter never exceeds
/// `max_items`.
///
/// # Examples
///
/// ```
/// use jcall_core::PageCursor;
///
/// let mut cursor = PageCursor::new("page", "data", 1).with_max_items(Some(2));
/// assert!(!cursor.is_exhausted());
/// cursor.record_yield();
/// cursor.record_yield();
/// assert!(cursor.is_exhausted());
///
/// cursor.advance();
/// assert_eq!(*cursor.page(), 2);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Getters)]
pub struct PageCursor {
    /// Current page number
    page: u64,
    /// Request field the page is sent under
    page_field: String,
    /// Response field holding the items
    items_field: String,
    /// Items handed to the caller so far
    yielded: usize,
    /// Optional ceiling on yielded items
    max_items: Option<usize>,
}

impl PageCursor {
    /// Start a cursor at `start_page`.
    pub fn new(page_field: impl Into<String>, items_field: impl Into<String>, start_page: u64) -> Self {
        Self {
            page: start_page,
            page_field: page_field.into(),
            items_field: items_field.into(),
            yielded: 0,
            max_items: None,
        }
    }

    /// Cursor over the default `page`/`data` fields.
    pub fn starting_at(start_page: u64) -> Self {
        Self::new(DEFAULT_PAGE_FIELD, DEFAULT_ITEMS_FIELD, start_page)
    }

    /// Cap the number of items yielded.
    pub fn with_max_items(mut self, max_items: Option<usize>) -> Self {
        self.max_items = max_items;
        self
    }

    /// True once `max_items` items have been yielded.
    pub fn is_exhausted(&self) -> bool {
        self.max_items.is_some_and(|max| self.yielded >= max)
    }

    /// Count one yielded item.
    pub fn record_yield(&mut self) {
        self.yielded += 1;
    }

    /// Move to the next page.
    pub fn advance(&mut self) {
        self.page += 1;
    }
}
