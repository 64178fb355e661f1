//! Paginated list orchestration
//!
//! This module provides the pieces every moderation list is built from:
//! - Debounced search input
//! - Query state with page/filter/search reset rules
//! - A generic controller that discards out-of-order responses
//! - Client-side tri-state column sorting
//! - Pagination bar layout

pub mod controller;
pub mod debounce;
pub mod pagination;
pub mod query;
pub mod sort;

pub use controller::{
    FetchOutcome, ListController, ListOptions, ListSnapshot, ListSource, LoadStatus, StatsOrigin,
};
pub use debounce::{Debouncer, DEFAULT_DEBOUNCE};
pub use pagination::{page_window, total_pages, NavButtons, PageSlot, NARROW_WINDOW, WIDE_WINDOW};
pub use query::{FilterKey, ListQuery, Page, PageRequest, DEFAULT_PAGE_SIZE, PAGE_SIZE_CHOICES};
pub use sort::{SortDirection, SortState, SortValue, Sortable};
