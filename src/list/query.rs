//! List query state shared by every paginated resource
//!
//! `ListQuery` is the pure half of a list controller: it holds page, page
//! size, filter and the raw/debounced search text, and enforces the reset
//! rules. It never performs I/O.

use crate::error::{AdminError, Result};
use crate::list::pagination;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

/// Default page size used by moderation lists
pub const DEFAULT_PAGE_SIZE: u32 = 50;

/// Page sizes offered by the list screens
pub const PAGE_SIZE_CHOICES: [u32; 4] = [10, 20, 25, 50];

/// A resource-specific lifecycle filter (stage, status, ...)
pub trait FilterKey: Clone + Default + PartialEq + Debug + Send + Sync + 'static {
    /// Query parameters this filter adds to a list request
    fn query_params(&self) -> Vec<(&'static str, String)>;

    /// Short key used to highlight the active filter tile
    fn label(&self) -> String;
}

/// Snapshot of a list query as sent to the gateway
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageRequest<F> {
    pub page: u32,
    pub limit: u32,
    pub filter: F,
    pub search: String,
}

impl<F: FilterKey> PageRequest<F> {
    /// First page with the default size and no filter
    pub fn first() -> Self {
        Self {
            page: 1,
            limit: DEFAULT_PAGE_SIZE,
            filter: F::default(),
            search: String::new(),
        }
    }

    /// Encode as query parameters.
    ///
    /// `search_param` names the server-side search parameter; resources
    /// whose endpoint has no search pass `None` and narrow locally instead.
    pub fn query_params(&self, search_param: Option<&'static str>) -> Vec<(&'static str, String)> {
        let mut params = vec![("page", self.page.to_string()), ("limit", self.limit.to_string())];
        if let Some(name) = search_param {
            let needle = self.search.trim();
            if !needle.is_empty() {
                params.push((name, needle.to_string()));
            }
        }
        params.extend(self.filter.query_params());
        params
    }

    /// Lowercased search needle, `None` when empty
    pub fn needle(&self) -> Option<String> {
        let needle = self.search.trim().to_lowercase();
        (!needle.is_empty()).then_some(needle)
    }
}

/// One page of results, replacing the previous page wholesale
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<R> {
    pub items: Vec<R>,
    pub total_pages: u32,
}

impl<R> Page<R> {
    /// Create a page, clamping `total_pages` to at least 1
    pub fn new(items: Vec<R>, total_pages: u32) -> Self {
        Self {
            items,
            total_pages: total_pages.max(1),
        }
    }

    /// Create a page from a total item count
    pub fn from_total(items: Vec<R>, total_items: u64, page_size: u32) -> Self {
        Self::new(items, pagination::total_pages(total_items, page_size))
    }

    /// An empty single page
    pub fn empty() -> Self {
        Self::new(Vec::new(), 1)
    }
}

/// Mutable query state of one list screen
#[derive(Debug, Clone, PartialEq)]
pub struct ListQuery<F> {
    page: u32,
    page_size: u32,
    filter: F,
    raw_search: String,
    debounced_search: String,
}

impl<F: FilterKey> Default for ListQuery<F> {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE)
    }
}

impl<F: FilterKey> ListQuery<F> {
    /// Fresh query on page 1
    pub fn new(page_size: u32) -> Self {
        Self {
            page: 1,
            page_size: page_size.max(1),
            filter: F::default(),
            raw_search: String::new(),
            debounced_search: String::new(),
        }
    }

    /// Seed filter and search, treating the search as already settled
    pub fn with_initial(mut self, filter: F, search: impl Into<String>) -> Self {
        let search = search.into();
        self.filter = filter;
        self.raw_search = search.clone();
        self.debounced_search = search;
        self
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    pub fn filter(&self) -> &F {
        &self.filter
    }

    pub fn raw_search(&self) -> &str {
        &self.raw_search
    }

    pub fn debounced_search(&self) -> &str {
        &self.debounced_search
    }

    /// Move to page `n`. Returns false (state unchanged) when `n` is outside
    /// `1..=total_pages`.
    pub fn set_page(&mut self, n: u32, total_pages: u32) -> bool {
        if n < 1 || n > total_pages.max(1) {
            return false;
        }
        self.page = n;
        true
    }

    /// Change the page size and go back to page 1
    pub fn set_page_size(&mut self, n: u32) -> Result<()> {
        if n == 0 {
            return Err(AdminError::validation("page size", "Page size must be at least 1."));
        }
        self.page_size = n;
        self.page = 1;
        Ok(())
    }

    /// Change the filter and go back to page 1
    pub fn set_filter(&mut self, filter: F) {
        self.filter = filter;
        self.page = 1;
    }

    /// Echo typed text; never triggers a fetch by itself
    pub fn set_raw_search(&mut self, text: impl Into<String>) {
        self.raw_search = text.into();
    }

    /// Apply a settled search value. Returns true when it changed, in which
    /// case the page is reset to 1 and a fetch is due.
    pub fn apply_debounced_search(&mut self, text: &str) -> bool {
        if self.debounced_search == text {
            return false;
        }
        self.debounced_search = text.to_string();
        self.page = 1;
        true
    }

    /// Snapshot for the gateway
    pub fn request(&self) -> PageRequest<F> {
        PageRequest {
            page: self.page,
            limit: self.page_size,
            filter: self.filter.clone(),
            search: self.debounced_search.clone(),
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use proptest::prelude::*;

    #[derive(Debug, Clone, Default, PartialEq)]
    pub(crate) enum Stage {
        #[default]
        All,
        Approved,
        Rejected,
    }

    impl FilterKey for Stage {
        fn query_params(&self) -> Vec<(&'static str, String)> {
            match self {
                Stage::All => Vec::new(),
                Stage::Approved => vec![("stage", "approved".to_string())],
                Stage::Rejected => vec![("stage", "rejected".to_string())],
            }
        }

        fn label(&self) -> String {
            format!("{:?}", self).to_lowercase()
        }
    }

    #[test]
    fn test_request_params() {
        let mut query: ListQuery<Stage> = ListQuery::new(25);
        query.set_filter(Stage::Approved);
        query.apply_debounced_search("van gogh");

        let params = query.request().query_params(Some("input"));
        assert_eq!(
            params,
            vec![
                ("page", "1".to_string()),
                ("limit", "25".to_string()),
                ("input", "van gogh".to_string()),
                ("stage", "approved".to_string()),
            ]
        );

        let local_only = query.request().query_params(None);
        assert!(!local_only.iter().any(|(k, _)| *k == "input"));
    }

    #[test]
    fn test_raw_search_does_not_touch_request() {
        let mut query: ListQuery<Stage> = ListQuery::new(10);
        query.set_page(3, 5);
        query.set_raw_search("mon");
        assert_eq!(query.raw_search(), "mon");
        assert_eq!(query.request().search, "");
        assert_eq!(query.page(), 3);
    }

    #[test]
    fn test_page_size_resets_page() {
        let mut query: ListQuery<Stage> = ListQuery::new(10);
        assert!(query.set_page(4, 10));
        query.set_page_size(25).unwrap();
        assert_eq!(query.page(), 1);
        assert_eq!(query.page_size(), 25);
        assert!(query.set_page_size(0).is_err());
    }

    #[test]
    fn test_same_debounced_value_is_not_a_change() {
        let mut query: ListQuery<Stage> = ListQuery::new(10);
        assert!(query.apply_debounced_search("a"));
        query.set_page(2, 3);
        assert!(!query.apply_debounced_search("a"));
        assert_eq!(query.page(), 2);
    }

    #[test]
    fn test_page_from_total() {
        let page = Page::from_total(vec![1, 2, 3], 120, 50);
        assert_eq!(page.total_pages, 3);
        assert_eq!(Page::<u8>::new(Vec::new(), 0).total_pages, 1);
    }

    proptest! {
        #[test]
        fn out_of_range_pages_are_ignored(total in 1u32..500, current in 1u32..500) {
            let current = current.min(total);
            let mut query: ListQuery<Stage> = ListQuery::new(10);
            query.set_page(current, total);
            let before = query.clone();

            prop_assert!(!query.set_page(0, total));
            prop_assert!(!query.set_page(total + 1, total));
            prop_assert_eq!(query, before);
        }

        #[test]
        fn filter_and_search_reset_page(total in 2u32..100, p in 2u32..100, text in "[a-z ]{1,12}") {
            let p = p.min(total);
            let mut query: ListQuery<Stage> = ListQuery::new(10);
            query.set_page(p, total);
            query.set_filter(Stage::Rejected);
            prop_assert_eq!(query.page(), 1);

            query.set_page(p, total);
            if query.apply_debounced_search(&text) {
                prop_assert_eq!(query.page(), 1);
            }
        }
    }
}
