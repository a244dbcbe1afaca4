//! Headless state for list and table views.
//!
//! - [`sort`]: single-column sorting with asc → desc → unsorted cycling
//! - [`pagination`]: the abbreviated page strip and page summaries
//! - [`filters`]: typed advanced filters and active-filter counting
//! - [`controller`]: [`ListController`], which ties params, filters and the
//!   debounced search box together and reports every change through callbacks
//!
//! Nothing here renders or fetches. The controller hands each new
//! [`ListParams`] snapshot to a callback and the caller re-queries with it.

pub mod config;
pub mod controller;
pub mod debounce;
pub mod error;
pub mod field_path;
pub mod filters;
pub mod pagination;
pub mod params;
pub mod sort;

pub use controller::{ListController, ListControllerConfig};
pub use error::DataListError;
pub use field_path::{FieldAccess, FieldValue};
pub use filters::{count_active_filters, FilterField, FilterKind, FilterSchema, FilterState, FilterValue};
pub use pagination::{compute_window, paginate, total_pages, PageItem, PageSummary};
pub use params::{ListParams, SortOrder};
pub use sort::{next_sort, sort_records, SortConfig, SortDirection};
