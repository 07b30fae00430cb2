//! Translation of a [`ProductQuery`] into wire parameters.
//!
//! Omission, not empty-string, signals "no filter": a parameter is emitted
//! only when its semantic value is present. Offsets follow the json-server
//! convention of a half-open `[_start, _end)` range.

use crate::types::{ProductQuery, SortOrder};

/// Build the query-string parameters for a list request. Pure.
pub fn build_params(query: &ProductQuery) -> Vec<(String, String)> {
    // Clamp against non-positive input before computing offsets.
    let page = u64::from(query.page.max(1));
    let limit = u64::from(query.limit.max(1));
    let start = (page - 1) * limit;
    let end = page * limit;

    let mut params = vec![
        ("_start".to_string(), start.to_string()),
        ("_end".to_string(), end.to_string()),
    ];

    if let Some(search) = &query.search {
        let trimmed = search.trim();
        if !trimmed.is_empty() {
            params.push(("q".to_string(), trimmed.to_string()));
        }
    }

    if let Some(category) = &query.category {
        if !category.is_empty() {
            params.push(("category".to_string(), category.clone()));
        }
    }

    if let Some(sort_by) = query.sort_by {
        let order = query.order.unwrap_or(SortOrder::Asc);
        params.push(("_sort".to_string(), sort_by.as_str().to_string()));
        params.push(("_order".to_string(), order.as_str().to_string()));
    }

    params
}
