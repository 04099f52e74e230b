//! Offset and keyset paging over the customers table.

use serde::{Deserialize, Serialize};

/// Rows per page when a query does not say otherwise.
pub const DEFAULT_PAGE_SIZE: i64 = 50;

fn default_page_size() -> i64 {
    DEFAULT_PAGE_SIZE
}

/// `LIMIT`/`OFFSET` window for the offset paging workload.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct PaginationQuery {
    #[serde(default = "default_page_size")]
    pub limit: i64,
    /// Rows skipped before the window starts.
    #[serde(default)]
    pub offset: i64,
}

impl Default for PaginationQuery {
    fn default() -> Self {
        Self::page(0, DEFAULT_PAGE_SIZE)
    }
}

impl PaginationQuery {
    /// Query for the zero-based page `index` of `limit` rows.
    pub fn page(index: i64, limit: i64) -> Self {
        Self {
            limit,
            offset: index.saturating_mul(limit),
        }
    }
}

/// One page of an offset-paginated listing.
#[derive(Debug, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total_count: i64,
    pub limit: i64,
    pub offset: i64,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, total_count: i64, limit: i64, offset: i64) -> Self {
        Self {
            items,
            total_count,
            limit,
            offset,
        }
    }

    pub fn has_more(&self) -> bool {
        self.offset + (self.items.len() as i64) < self.total_count
    }
}

/// One page of a keyset-paginated listing.
///
/// `next_after` is the last key on this page, or `None` once the listing is exhausted.
#[derive(Debug, Serialize)]
pub struct KeysetPage<T> {
    pub items: Vec<T>,
    pub next_after: Option<i64>,
}

impl<T> KeysetPage<T> {
    /// Builds a page from rows fetched in key order; a short page ends the listing.
    pub fn from_rows(items: Vec<T>, limit: i64, key: impl Fn(&T) -> i64) -> Self {
        let next_after = if (items.len() as i64) < limit {
            None
        } else {
            items.last().map(key)
        };

        Self { items, next_after }
    }
}
