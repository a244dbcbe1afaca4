use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use log::{debug, trace};

use crate::config::ListConfig;
use crate::debounce::Debouncer;
use crate::filters::{count_active_filters, FilterState, FilterValue};
use crate::pagination::{compute_window, total_pages, PageItem, PageSummary};
use crate::params::{ListParams, SortOrder};
use crate::sort::{next_sort, SortConfig};

pub type ParamsCallback = Box<dyn Fn(&ListParams) + Send + Sync>;
pub type FiltersCallback = Box<dyn Fn(&FilterState) + Send + Sync>;

/// Everything needed to build a [`ListController`].
pub struct ListControllerConfig {
    pub initial_params: ListParams,
    pub initial_filters: FilterState,
    pub search_debounce: Duration,
    pub on_params_change: Option<ParamsCallback>,
    pub on_advanced_filters_change: Option<FiltersCallback>,
}

impl ListControllerConfig {
    pub const SEARCH_DEBOUNCE: Duration = Duration::from_millis(300);

    pub fn from_list_config(list_config: &ListConfig) -> Self {
        ListControllerConfig {
            initial_params: ListParams::new(list_config.default_page_size),
            search_debounce: list_config.search_debounce(),
            ..Self::default()
        }
    }

    pub fn with_params(mut self, params: ListParams) -> Self {
        self.initial_params = params;
        self
    }

    pub fn with_filters(mut self, filters: FilterState) -> Self {
        self.initial_filters = filters;
        self
    }

    pub fn on_params_change<F>(mut self, callback: F) -> Self
    where
        F: Fn(&ListParams) + Send + Sync + 'static,
    {
        self.on_params_change = Some(Box::new(callback));
        self
    }

    pub fn on_advanced_filters_change<F>(mut self, callback: F) -> Self
    where
        F: Fn(&FilterState) + Send + Sync + 'static,
    {
        self.on_advanced_filters_change = Some(Box::new(callback));
        self
    }
}

impl Default for ListControllerConfig {
    fn default() -> Self {
        ListControllerConfig {
            initial_params: ListParams::default(),
            initial_filters: FilterState::new(),
            search_debounce: Self::SEARCH_DEBOUNCE,
            on_params_change: None,
            on_advanced_filters_change: None,
        }
    }
}

struct ControllerState {
    params: ListParams,
    filters: FilterState,
    search_input: String,
    show_advanced_filters: bool,
    /// Generation of the keystroke whose search is waiting on the debounce
    pending_search: Option<u64>,
    search_generation: u64,
}

struct Notifier {
    on_params_change: Option<ParamsCallback>,
    on_advanced_filters_change: Option<FiltersCallback>,
}

impl Notifier {
    fn params_changed(&self, params: &ListParams) {
        if let Some(callback) = &self.on_params_change {
            callback(params);
        }
    }

    fn filters_changed(&self, filters: &FilterState) {
        if let Some(callback) = &self.on_advanced_filters_change {
            callback(filters);
        }
    }
}

/// State shared with the debounced search task.
struct Shared {
    state: Mutex<ControllerState>,
    notifier: Notifier,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, ControllerState> {
        // Every mutation swaps in whole values, so a poisoned lock still
        // guards consistent state
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Replace the params with `update(current)` and notify. The lock is
    /// released before the callback runs.
    fn commit_params<F>(&self, update: F)
    where
        F: FnOnce(&ListParams) -> ListParams,
    {
        let snapshot = {
            let mut state = self.lock();
            let next = update(&state.params);
            state.params = next.clone();
            next
        };

        debug!(
            "List params: page={} page_size={} search={:?} status={:?} sort={:?} {:?}",
            snapshot.page,
            snapshot.page_size,
            snapshot.search,
            snapshot.status,
            snapshot.sort_by,
            snapshot.sort_order
        );
        self.notifier.params_changed(&snapshot);
    }

    fn commit_debounced_search(&self, generation: u64) {
        let snapshot = {
            let mut state = self.lock();
            if state.pending_search != Some(generation) {
                trace!("Skipping stale debounced search (generation {generation})");
                return;
            }
            state.pending_search = None;
            let next = state.params.with_search(&state.search_input);
            state.params = next.clone();
            next
        };

        debug!("Debounced search committed: {:?}", snapshot.search);
        self.notifier.params_changed(&snapshot);
    }
}

/// Headless state for a paged, sortable, filterable list view.
///
/// Holds the committed [`ListParams`], the advanced [`FilterState`], the
/// live search-box text and the advanced-filter panel toggle. Every change to
/// params or filters is pushed to the configured callback as a fresh
/// snapshot. Search typing goes through [`handle_search_change`], which
/// commits only after the input has been quiet for the debounce delay.
///
/// [`handle_search_change`]: ListController::handle_search_change
pub struct ListController {
    shared: Arc<Shared>,
    debouncer: Debouncer,
}

impl ListController {
    pub fn new(config: ListControllerConfig) -> Self {
        let search_input = config.initial_params.search_str().to_owned();

        let state = ControllerState {
            params: config.initial_params,
            filters: config.initial_filters,
            search_input,
            show_advanced_filters: false,
            pending_search: None,
            search_generation: 0,
        };

        ListController {
            shared: Arc::new(Shared {
                state: Mutex::new(state),
                notifier: Notifier {
                    on_params_change: config.on_params_change,
                    on_advanced_filters_change: config.on_advanced_filters_change,
                },
            }),
            debouncer: Debouncer::new(config.search_debounce),
        }
    }

    pub fn params(&self) -> ListParams {
        self.shared.lock().params.clone()
    }

    pub fn advanced_filters(&self) -> FilterState {
        self.shared.lock().filters.clone()
    }

    pub fn search_input(&self) -> String {
        self.shared.lock().search_input.clone()
    }

    pub fn show_advanced_filters(&self) -> bool {
        self.shared.lock().show_advanced_filters
    }

    pub fn set_page(&mut self, page: u32) {
        self.shared.commit_params(|params| params.with_page(page));
    }

    /// Changing the page size always returns to the first page.
    pub fn set_page_size(&mut self, page_size: u32) {
        self.shared
            .commit_params(|params| params.with_page_size(page_size));
    }

    /// Commit `term` as the search right away. The search box shows `term`
    /// too, and a pending debounced search is dropped so it cannot overwrite
    /// this one.
    pub fn set_search(&mut self, term: &str) {
        self.debouncer.cancel();
        {
            let mut state = self.shared.lock();
            state.pending_search = None;
            state.search_input = term.to_owned();
        }
        self.shared.commit_params(|params| params.with_search(term));
    }

    /// Echo `value` into the search box immediately and commit it as the
    /// search once typing has paused. Each call restarts the wait, so only
    /// the last value in a burst is committed.
    pub fn handle_search_change(&mut self, value: &str) {
        let generation = {
            let mut state = self.shared.lock();
            state.search_input = value.to_owned();
            state.search_generation += 1;
            state.pending_search = Some(state.search_generation);
            state.search_generation
        };

        let shared = Arc::clone(&self.shared);
        self.debouncer
            .schedule(move || shared.commit_debounced_search(generation));
    }

    /// Commit a pending debounced search right away. Returns false when
    /// nothing was pending.
    pub fn flush_search(&mut self) -> bool {
        self.debouncer.cancel();
        let generation = self.shared.lock().pending_search;
        match generation {
            Some(generation) => {
                self.shared.commit_debounced_search(generation);
                true
            }
            None => false,
        }
    }

    /// Drop a pending debounced search without committing it. The search box
    /// text is left as typed.
    pub fn cancel_pending_search(&mut self) -> bool {
        self.debouncer.cancel();
        self.shared.lock().pending_search.take().is_some()
    }

    pub fn has_pending_search(&self) -> bool {
        self.shared.lock().pending_search.is_some()
    }

    pub fn set_status_filter(&mut self, status: &str) {
        self.shared.commit_params(|params| params.with_status(status));
    }

    pub fn set_sort(&mut self, key: &str, order: SortOrder) {
        self.shared
            .commit_params(|params| params.with_sort(Some(key), Some(order)));
    }

    pub fn clear_sort(&mut self) {
        self.shared.commit_params(|params| params.with_sort(None, None));
    }

    pub fn sort_config(&self) -> Option<SortConfig> {
        let state = self.shared.lock();
        match (&state.params.sort_by, state.params.sort_order) {
            (Some(key), Some(order)) => Some(SortConfig::new(key, order)),
            _ => None,
        }
    }

    /// Apply one step of the asc → desc → unsorted cycle for `key`.
    pub fn toggle_sort(&mut self, key: &str) -> Option<SortConfig> {
        let next = next_sort(self.sort_config().as_ref(), key);
        match &next {
            Some(config) => self.set_sort(&config.key, config.direction),
            None => self.clear_sort(),
        }
        next
    }

    /// Set one advanced filter. Range values replace the previous range
    /// whole; callers merge bounds themselves.
    pub fn handle_advanced_filter_change(&mut self, key: &str, value: FilterValue) {
        let snapshot = {
            let mut state = self.shared.lock();
            let next = state.filters.merged(key, value);
            state.filters = next.clone();
            next
        };

        debug!("Advanced filter '{key}' changed ({} active)", snapshot.active_count());
        self.shared.notifier.filters_changed(&snapshot);
    }

    pub fn set_show_advanced_filters(&mut self, show: bool) {
        self.shared.lock().show_advanced_filters = show;
    }

    pub fn toggle_advanced_filters(&mut self) -> bool {
        let mut state = self.shared.lock();
        state.show_advanced_filters = !state.show_advanced_filters;
        state.show_advanced_filters
    }

    /// Reset the search box, basic search and status, and every advanced
    /// filter. Both callbacks receive the cleared values.
    pub fn clear_all_filters(&mut self) {
        self.debouncer.cancel();

        let (params, filters) = {
            let mut state = self.shared.lock();
            state.pending_search = None;
            state.search_input = String::new();
            state.params = state.params.cleared();
            state.filters = FilterState::new();
            (state.params.clone(), state.filters.clone())
        };

        debug!("All filters cleared");
        self.shared.notifier.params_changed(&params);
        self.shared.notifier.filters_changed(&filters);
    }

    /// Search box text, status and advanced filters are counted separately.
    /// The search box counts as soon as something is typed, before the
    /// debounce commits it.
    pub fn active_filters_count(&self) -> usize {
        let state = self.shared.lock();
        usize::from(!state.search_input.is_empty())
            + usize::from(!state.params.status_str().is_empty())
            + count_active_filters(&state.filters)
    }

    pub fn total_pages(&self, total: u64) -> u32 {
        total_pages(total, self.shared.lock().params.page_size)
    }

    pub fn page_window(&self, total: u64) -> Vec<PageItem> {
        let params = self.params();
        compute_window(params.page, total_pages(total, params.page_size))
    }

    pub fn page_summary(&self, total: u64) -> PageSummary {
        let params = self.params();
        PageSummary::new(params.page, params.page_size, total)
    }
}
