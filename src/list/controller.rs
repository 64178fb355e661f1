//! Generic paginated list controller
//!
//! One [`ListController`] drives any list-shaped resource. It owns the query
//! state, forwards typed search text through a [`Debouncer`], and applies
//! fetch results only when they answer the most recently issued request.
//! Every fetch is tagged with a generation number; a response whose
//! generation is no longer the latest is discarded, so a slow page-1
//! response can never overwrite a page-2 result that already rendered.

use crate::error::{AdminError, Result};
use crate::list::debounce::{Debouncer, DEFAULT_DEBOUNCE};
use crate::list::pagination::{self, NavButtons, PageSlot};
use crate::list::query::{FilterKey, ListQuery, Page, PageRequest, DEFAULT_PAGE_SIZE};
use crate::list::sort::{self, SortState, Sortable};
use async_trait::async_trait;
use serde::Serialize;
use std::fmt::Debug;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Where a resource's aggregate tiles come from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StatsOrigin {
    /// A dedicated stats endpoint, independent of the loaded page
    Endpoint,
    /// Counts re-derived from the records currently loaded
    LoadedPage,
}

/// A remote, paginated collection
#[async_trait]
pub trait ListSource: Send + Sync + 'static {
    /// Record type shown in the list
    type Record: Sortable + Clone + Debug + Send + Sync + 'static;
    /// Lifecycle filter for this resource
    type Filter: FilterKey;
    /// Aggregate counts for dashboard tiles
    type Stats: Clone + Default + Debug + Send + Sync + 'static;

    /// Fetch one page for `request`
    async fn fetch(&self, request: &PageRequest<Self::Filter>) -> Result<Page<Self::Record>>;

    /// Source of truth for aggregate counts
    fn stats_origin(&self) -> StatsOrigin {
        StatsOrigin::LoadedPage
    }

    /// Fetch aggregate counts from the stats endpoint
    async fn fetch_stats(&self) -> Result<Self::Stats> {
        Ok(Self::Stats::default())
    }

    /// Derive aggregate counts from loaded records
    fn derive_stats(&self, _items: &[Self::Record]) -> Self::Stats {
        Self::Stats::default()
    }

    /// Client-side narrowing applied to the loaded page.
    ///
    /// Resources whose endpoint cannot filter or search server-side
    /// implement their matching here.
    fn matches_locally(&self, _record: &Self::Record, _request: &PageRequest<Self::Filter>) -> bool {
        true
    }
}

/// Loading state shown next to the list
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "state", content = "message")]
pub enum LoadStatus {
    Idle,
    Loading,
    Ready,
    /// Last fetch failed; previous items are still shown
    Failed(String),
    /// No usable session; the front end should send the user to login
    LoginRequired,
}

/// Result of one fetch attempt
#[derive(Debug)]
pub enum FetchOutcome {
    /// Response replaced the list
    Applied { items: usize },
    /// A newer request was issued while this one was in flight
    Discarded,
    /// Fetch failed; list left as it was
    Failed(AdminError),
    /// Controller was dropped before the response arrived
    Unmounted,
    /// Request was out of range and nothing was fetched
    Ignored,
}

impl FetchOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied { .. })
    }

    /// Number of records applied, or why the list was left unchanged
    pub fn into_result(self) -> Result<usize> {
        match self {
            Self::Applied { items } => Ok(items),
            Self::Failed(e) => Err(e),
            Self::Discarded | Self::Unmounted => Err(AdminError::Cancelled),
            Self::Ignored => Err(AdminError::validation("page", "page is out of range")),
        }
    }
}

/// Construction options for a controller
#[derive(Debug, Clone)]
pub struct ListOptions<F> {
    pub page_size: u32,
    pub debounce: Duration,
    pub filter: F,
    pub search: String,
}

impl<F: FilterKey> Default for ListOptions<F> {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            debounce: DEFAULT_DEBOUNCE,
            filter: F::default(),
            search: String::new(),
        }
    }
}

/// Render-ready view of a list
#[derive(Debug, Clone, Serialize)]
pub struct ListSnapshot<R, St> {
    pub page: u32,
    pub page_size: u32,
    pub total_pages: u32,
    pub filter: String,
    pub search_input: String,
    pub search: String,
    pub status: LoadStatus,
    pub items: Vec<R>,
    pub stats: St,
    pub stats_origin: StatsOrigin,
    pub window: Vec<PageSlot>,
    pub nav: NavButtons,
}

struct ListState<S: ListSource> {
    query: ListQuery<S::Filter>,
    items: Vec<S::Record>,
    total_pages: u32,
    status: LoadStatus,
    issued: u64,
    stats_issued: u64,
    stats: S::Stats,
    sort: SortState<<S::Record as Sortable>::Column>,
}

struct Inner<S: ListSource> {
    source: Arc<S>,
    state: Mutex<ListState<S>>,
    search: Mutex<Debouncer<String>>,
    mounted: AtomicBool,
    revision: watch::Sender<u64>,
}

impl<S: ListSource> Inner<S> {
    fn state(&self) -> MutexGuard<'_, ListState<S>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn search(&self) -> MutexGuard<'_, Debouncer<String>> {
        self.search.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn is_mounted(&self) -> bool {
        self.mounted.load(Ordering::Acquire)
    }

    fn bump(&self) {
        self.revision.send_modify(|r| *r = r.wrapping_add(1));
    }

    fn rederive_stats(&self, state: &mut ListState<S>) {
        if self.source.stats_origin() == StatsOrigin::LoadedPage {
            state.stats = self.source.derive_stats(&state.items);
        }
    }

    async fn fetch(&self) -> FetchOutcome {
        if !self.is_mounted() {
            return FetchOutcome::Unmounted;
        }

        let (generation, request) = {
            let mut state = self.state();
            state.issued += 1;
            state.status = LoadStatus::Loading;
            (state.issued, state.query.request())
        };
        self.bump();
        debug!(
            generation,
            page = request.page,
            limit = request.limit,
            filter = %request.filter.label(),
            "list fetch issued"
        );

        let result = self.source.fetch(&request).await;

        if !self.is_mounted() {
            debug!(generation, "list unmounted, ignoring response");
            return FetchOutcome::Unmounted;
        }

        let outcome = {
            let mut state = self.state();
            if generation != state.issued {
                debug!(generation, latest = state.issued, "discarding stale list response");
                return FetchOutcome::Discarded;
            }

            match result {
                Ok(page) => {
                    let count = page.items.len();
                    state.items = page.items;
                    state.total_pages = page.total_pages.max(1);
                    state.status = LoadStatus::Ready;
                    self.rederive_stats(&mut state);
                    debug!(generation, items = count, total_pages = state.total_pages, "list response applied");
                    FetchOutcome::Applied { items: count }
                }
                Err(err) => {
                    warn!(generation, error = %err, "list fetch failed");
                    state.status = if err.is_auth_error() {
                        LoadStatus::LoginRequired
                    } else {
                        LoadStatus::Failed(err.user_message())
                    };
                    FetchOutcome::Failed(err)
                }
            }
        };
        self.bump();
        outcome
    }
}

/// Drives one list screen
///
/// Dropping the controller cancels the pending search debounce and makes
/// any in-flight response a no-op.
pub struct ListController<S: ListSource> {
    inner: Arc<Inner<S>>,
    search_task: JoinHandle<()>,
}

impl<S: ListSource> ListController<S> {
    /// Create a controller. Must be called inside a tokio runtime.
    ///
    /// Nothing is fetched until [`fetch_page`](Self::fetch_page) or one of
    /// the setters runs.
    pub fn new(source: Arc<S>, options: ListOptions<S::Filter>) -> Self {
        let query = ListQuery::new(options.page_size).with_initial(options.filter, options.search.clone());
        let debouncer = Debouncer::new(options.search, options.debounce);
        let mut settled = debouncer.subscribe();
        let (revision, _) = watch::channel(0);

        let inner = Arc::new(Inner {
            source,
            state: Mutex::new(ListState {
                query,
                items: Vec::new(),
                total_pages: 1,
                status: LoadStatus::Idle,
                issued: 0,
                stats_issued: 0,
                stats: S::Stats::default(),
                sort: SortState::default(),
            }),
            search: Mutex::new(debouncer),
            mounted: AtomicBool::new(true),
            revision,
        });

        let weak = Arc::downgrade(&inner);
        let search_task = tokio::spawn(async move {
            while settled.changed().await.is_ok() {
                let text = settled.borrow_and_update().clone();
                let Some(inner) = weak.upgrade() else {
                    break;
                };
                let changed = inner.state().query.apply_debounced_search(&text);
                if changed {
                    debug!(search = %text, "search settled");
                    inner.fetch().await;
                }
            }
        });

        Self { inner, search_task }
    }

    /// Create a controller with default options
    pub fn with_defaults(source: Arc<S>) -> Self {
        Self::new(source, ListOptions::default())
    }

    pub fn source(&self) -> &Arc<S> {
        &self.inner.source
    }

    /// Fetch the current query snapshot
    pub async fn fetch_page(&self) -> FetchOutcome {
        self.inner.fetch().await
    }

    /// Go to page `n`; out-of-range pages are ignored
    pub async fn set_page(&self, n: u32) -> FetchOutcome {
        let moved = {
            let mut state = self.inner.state();
            let total = state.total_pages;
            state.query.set_page(n, total)
        };
        if !moved {
            debug!(page = n, "page out of range, ignored");
            return FetchOutcome::Ignored;
        }
        self.inner.fetch().await
    }

    /// Change page size, reset to page 1 and refetch
    pub async fn set_page_size(&self, n: u32) -> Result<FetchOutcome> {
        self.inner.state().query.set_page_size(n)?;
        Ok(self.inner.fetch().await)
    }

    /// Change the active filter, reset to page 1 and refetch
    pub async fn set_filter(&self, filter: S::Filter) -> FetchOutcome {
        self.inner.state().query.set_filter(filter);
        self.inner.fetch().await
    }

    /// Echo typed search text. The settled value triggers the fetch.
    pub fn set_search_text(&self, text: impl Into<String>) {
        let text = text.into();
        self.inner.state().query.set_raw_search(text.clone());
        self.inner.search().observe(text);
        self.inner.bump();
    }

    /// Whether typed search text is still waiting to settle
    pub fn search_pending(&self) -> bool {
        self.inner.search().is_pending()
    }

    /// Reload aggregate counts from this resource's stats source.
    ///
    /// Returns the counts this call fetched. They are stored only if no
    /// later refresh was issued while this one was in flight.
    pub async fn refresh_stats(&self) -> Result<S::Stats> {
        let generation = {
            let mut state = self.inner.state();
            state.stats_issued += 1;
            state.stats_issued
        };
        let stats = match self.inner.source.stats_origin() {
            StatsOrigin::Endpoint => self.inner.source.fetch_stats().await?,
            StatsOrigin::LoadedPage => {
                let state = self.inner.state();
                self.inner.source.derive_stats(&state.items)
            }
        };
        if self.inner.is_mounted() {
            let mut state = self.inner.state();
            if generation != state.stats_issued {
                debug!(generation, latest = state.stats_issued, "discarding stale stats response");
                return Ok(stats);
            }
            state.stats = stats.clone();
            drop(state);
            self.inner.bump();
        }
        Ok(stats)
    }

    /// Register a click on a sortable column
    pub fn toggle_sort(&self, column: <S::Record as Sortable>::Column) {
        self.inner.state().sort.toggle(column);
        self.inner.bump();
    }

    /// Reset to server order
    pub fn clear_sort(&self) {
        self.inner.state().sort.clear();
        self.inner.bump();
    }

    /// Drop loaded records matching `pred`, returning how many were removed
    pub fn remove_where(&self, pred: impl Fn(&S::Record) -> bool) -> usize {
        let mut state = self.inner.state();
        let before = state.items.len();
        state.items.retain(|r| !pred(r));
        let removed = before - state.items.len();
        if removed > 0 {
            self.inner.rederive_stats(&mut state);
            drop(state);
            self.inner.bump();
        }
        removed
    }

    /// Patch loaded records matching `pred` in place
    pub fn update_where(
        &self,
        pred: impl Fn(&S::Record) -> bool,
        mut update: impl FnMut(&mut S::Record),
    ) -> usize {
        let mut state = self.inner.state();
        let mut touched = 0;
        for record in state.items.iter_mut().filter(|r| pred(r)) {
            update(record);
            touched += 1;
        }
        if touched > 0 {
            self.inner.rederive_stats(&mut state);
            drop(state);
            self.inner.bump();
        }
        touched
    }

    /// Loaded records after local narrowing and sorting
    pub fn visible_items(&self) -> Vec<S::Record> {
        let state = self.inner.state();
        let request = state.query.request();
        let narrowed = state
            .items
            .iter()
            .filter(|r| self.inner.source.matches_locally(r, &request));
        sort::sorted(narrowed, &state.sort)
            .into_iter()
            .cloned()
            .collect()
    }

    pub fn page(&self) -> u32 {
        self.inner.state().query.page()
    }

    pub fn total_pages(&self) -> u32 {
        self.inner.state().total_pages
    }

    pub fn status(&self) -> LoadStatus {
        self.inner.state().status.clone()
    }

    pub fn stats(&self) -> S::Stats {
        self.inner.state().stats.clone()
    }

    pub fn request(&self) -> PageRequest<S::Filter> {
        self.inner.state().query.request()
    }

    /// Receiver that ticks whenever visible state changes
    pub fn revisions(&self) -> watch::Receiver<u64> {
        self.inner.revision.subscribe()
    }

    /// Full view for rendering, using `window` page buttons
    pub fn snapshot(&self, window: u32) -> ListSnapshot<S::Record, S::Stats> {
        let items = self.visible_items();
        let state = self.inner.state();
        let page = state.query.page();
        ListSnapshot {
            page,
            page_size: state.query.page_size(),
            total_pages: state.total_pages,
            filter: state.query.filter().label(),
            search_input: state.query.raw_search().to_string(),
            search: state.query.debounced_search().to_string(),
            status: state.status.clone(),
            items,
            stats: state.stats.clone(),
            stats_origin: self.inner.source.stats_origin(),
            window: pagination::page_window(page, state.total_pages, window),
            nav: NavButtons::for_page(page, state.total_pages),
        }
    }
}

impl<S: ListSource> Drop for ListController<S> {
    fn drop(&mut self) {
        self.inner.mounted.store(false, Ordering::Release);
        self.search_task.abort();
        self.inner.search().cancel();
    }
}
