//! Offset/limit windows that detect a following page by over-fetching one row.

use serde::{Deserialize, Serialize};

pub const DEFAULT_SKIP: i64 = 0;
pub const DEFAULT_LIMIT: i64 = 5;

/// A validated `(skip, limit)` window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    skip: i64,
    limit: i64,
}

impl PageRequest {
    /// Negative values are rejected rather than clamped.
    pub fn new(skip: i64, limit: i64) -> Result<Self, PaginationError> {
        if skip < 0 {
            return Err(PaginationError::NegativeSkip(skip));
        }
        if limit < 0 {
            return Err(PaginationError::NegativeLimit(limit));
        }
        if limit.checked_add(1).is_none() {
            return Err(PaginationError::LimitTooLarge(limit));
        }
        Ok(Self { skip, limit })
    }

    pub fn skip(&self) -> i64 {
        self.skip
    }

    pub fn limit(&self) -> i64 {
        self.limit
    }

    /// Rows to request from storage: one more than the page holds.
    pub fn fetch_limit(&self) -> i64 {
        self.limit + 1
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            skip: DEFAULT_SKIP,
            limit: DEFAULT_LIMIT,
        }
    }
}

/// Raw `skip`/`limit` query parameters before validation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct PageParams {
    #[serde(default)]
    pub skip: Option<i64>,
    #[serde(default)]
    pub limit: Option<i64>,
}

impl PageParams {
    pub fn into_request(self) -> Result<PageRequest, PaginationError> {
        PageRequest::new(
            self.skip.unwrap_or(DEFAULT_SKIP),
            self.limit.unwrap_or(DEFAULT_LIMIT),
        )
    }
}

/// A bounded page of results and whether another page follows it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub data: Vec<T>,
    pub more_exists: bool,
}

impl<T> Page<T> {
    /// Builds a page from rows fetched with [`PageRequest::fetch_limit`].
    ///
    /// With `limit == 0` the page is empty and `more_exists` reports whether any row
    /// was found at `skip`.
    pub fn from_overfetch(mut rows: Vec<T>, request: PageRequest) -> Self {
        let limit = usize::try_from(request.limit()).unwrap_or(usize::MAX);
        let more_exists = rows.len() > limit;
        rows.truncate(limit);
        Self {
            data: rows,
            more_exists,
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            data: self.data.into_iter().map(f).collect(),
            more_exists: self.more_exists,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum PaginationError {
    #[error("skip must be zero or greater (got {0})")]
    NegativeSkip(i64),
    #[error("limit must be zero or greater (got {0})")]
    NegativeLimit(i64),
    #[error("limit {0} is too large")]
    LimitTooLarge(i64),
}
