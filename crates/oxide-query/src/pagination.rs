//! Page metadata returned by [`crate::Query::paginate`].

use oxide_query_core::Row;
use serde::Serialize;

/// Page size used when a non-positive size is requested.
pub const DEFAULT_PER_PAGE: u64 = 10;

/// Largest offset a database accepts as a signed 64-bit integer.
const MAX_OFFSET: u64 = i64::MAX.unsigned_abs();

/// Position of a page within a result set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Pagination {
    /// Rows matching the query, across all pages.
    pub total_records: u64,
    /// Page size.
    pub limit: u64,
    /// Rows skipped before this page.
    pub offset: u64,
    /// Whether pages follow this one.
    pub has_more: bool,
    /// Number of pages; at least 1.
    pub total_pages: u64,
    /// This page, 1-based.
    pub current_page: u64,
    /// Always 1.
    pub first_page: u64,
    /// The page before this one.
    pub previous_page: Option<u64>,
    /// The page after this one, present exactly when `has_more` is set.
    pub next_page: Option<u64>,
    /// Same as `total_pages`.
    pub last_page: u64,
}

impl Pagination {
    /// Computes page metadata. A page below 1 is treated as page 1 and a
    /// size below 1 as [`DEFAULT_PER_PAGE`].
    #[must_use]
    pub fn new(total_records: u64, page: i64, per_page: i64) -> Self {
        let current_page = u64::try_from(page).ok().filter(|p| *p >= 1).unwrap_or(1);
        let limit = u64::try_from(per_page)
            .ok()
            .filter(|p| *p >= 1)
            .unwrap_or(DEFAULT_PER_PAGE);
        let total_pages = if total_records == 0 {
            1
        } else {
            total_records.div_ceil(limit)
        };
        let has_more = current_page < total_pages;
        Self {
            total_records,
            limit,
            offset: (current_page - 1).saturating_mul(limit).min(MAX_OFFSET),
            has_more,
            total_pages,
            current_page,
            first_page: 1,
            previous_page: (current_page > 1).then(|| current_page - 1),
            next_page: has_more.then(|| current_page + 1),
            last_page: total_pages,
        }
    }
}

/// One page of rows plus its metadata.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page {
    /// Rows of this page.
    pub items: Vec<Row>,
    /// Page metadata.
    pub pagination: Pagination,
}
