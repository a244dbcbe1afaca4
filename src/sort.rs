//! Single-column record sorting with asc → desc → unsorted cycling.
//!
//! Values are read through [`FieldAccess`] and compared with their native
//! ordering; there is no locale-aware collation and no coercion between
//! strings and numbers.
use std::cmp::Ordering;

use log::Level;
use logging_timer::timer;
use serde::{Deserialize, Serialize};

use crate::field_path::{FieldAccess, FieldValue};
use crate::params::SortOrder;

pub type SortDirection = SortOrder;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortConfig {
    pub key: String,
    pub direction: SortDirection,
}

impl SortConfig {
    pub fn new(key: &str, direction: SortDirection) -> Self {
        SortConfig {
            key: key.to_owned(),
            direction,
        }
    }
}

/// Next sort state after a "sort by `key`" request.
///
/// - unsorted, or sorted by another key → `key` ascending
/// - `key` ascending → `key` descending
/// - `key` descending → unsorted
pub fn next_sort(current: Option<&SortConfig>, key: &str) -> Option<SortConfig> {
    match current {
        Some(config) if config.key == key => match config.direction {
            SortDirection::Asc => Some(SortConfig::new(key, SortDirection::Desc)),
            SortDirection::Desc => None,
        },
        _ => Some(SortConfig::new(key, SortDirection::Asc)),
    }
}

/// Compare two extracted values. A missing field sorts ahead of any
/// present value; otherwise see [`FieldValue::native_cmp`].
pub fn compare_field_values(a: Option<&FieldValue>, b: Option<&FieldValue>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(a), Some(b)) => a.native_cmp(b),
    }
}

/// Return a sorted copy of `data`. The input is never reordered.
///
/// With no config the original order is returned unchanged. Ties keep their
/// relative order in both directions.
pub fn sort_records<T>(data: &[T], config: Option<&SortConfig>) -> Vec<T>
where
    T: FieldAccess + Clone,
{
    let Some(config) = config else {
        return data.to_vec();
    };

    let _tmr = timer!(Level::Trace; "sort_records", "{} rows by {}", data.len(), config.key);

    // Extract each key once rather than on every comparison
    let mut keyed: Vec<(Option<FieldValue>, &T)> = data
        .iter()
        .map(|row| (row.field(&config.key), row))
        .collect();

    keyed.sort_by(|(a, _), (b, _)| {
        let ord = compare_field_values(a.as_ref(), b.as_ref());
        match config.direction {
            SortDirection::Asc => ord,
            SortDirection::Desc => ord.reverse(),
        }
    });

    keyed.into_iter().map(|(_, row)| row.clone()).collect()
}
