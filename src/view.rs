//! Derived view computation: search, then sort, then paginate.
//!
//! Everything here is a pure function of the record set and the view
//! state, so the store never keeps a filtered copy that could drift.

use std::ops::Range;

use crate::model::{Record, SortDirection, SortKey};
use crate::search;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sort {
    pub key: SortKey,
    pub direction: SortDirection,
}

/// Apply the search query and then the sort to `records`.
///
/// The sort is stable: records comparing equal keep their record-set order.
pub fn filter_and_sort<'a>(records: &'a [Record], query: &str, sort: Option<Sort>) -> Vec<&'a Record> {
    let mut result: Vec<&Record> = match search::normalize_query(query) {
        Some(normalized) => records
            .iter()
            .filter(|record| search::matches(record, &normalized))
            .collect(),
        None => records.iter().collect(),
    };

    if let Some(sort) = sort {
        result.sort_by_cached_key(|record| record.field_text(sort.key));
        if sort.direction == SortDirection::Descending {
            reverse_stable(&mut result, sort.key);
        }
    }

    result
}

/// Reverse an ascending-sorted slice while keeping ties in their original order.
fn reverse_stable(sorted: &mut Vec<&Record>, key: SortKey) {
    let mut groups: Vec<Vec<&Record>> = Vec::new();
    let mut last: Option<String> = None;
    for record in sorted.drain(..) {
        let text = record.field_text(key);
        match (&last, groups.last_mut()) {
            (Some(prev), Some(group)) if *prev == text => group.push(record),
            _ => groups.push(vec![record]),
        }
        last = Some(text);
    }
    sorted.extend(groups.into_iter().rev().flatten());
}

pub fn page_count(filtered_len: usize, page_size: usize) -> usize {
    if page_size == 0 {
        return 0;
    }
    filtered_len.div_ceil(page_size)
}

/// Index window of `page` (1-based). Pages outside the data give an empty range.
pub fn page_bounds(filtered_len: usize, page: usize, page_size: usize) -> Range<usize> {
    if page == 0 {
        return 0..0;
    }
    let start = (page - 1).saturating_mul(page_size).min(filtered_len);
    let end = start.saturating_add(page_size).min(filtered_len);
    start..end
}
