//! Limit/offset pagination
//!
//! Query values are parsed leniently: a missing, non-numeric or
//! out-of-range value falls back to the default instead of failing the
//! request.

use serde::{Deserialize, Serialize};

/// Largest page a client may request.
pub const MAX_LIMIT: i64 = 100;

/// Raw `?limit=&offset=` query parameters
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PageParams {
    pub limit: Option<String>,
    pub offset: Option<String>,
}

/// Resolved page window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub limit: i64,
    pub offset: i64,
}

impl PageParams {
    pub fn new(limit: Option<i64>, offset: Option<i64>) -> Self {
        Self {
            limit: limit.map(|l| l.to_string()),
            offset: offset.map(|o| o.to_string()),
        }
    }

    /// Resolve against a per-endpoint default limit.
    ///
    /// Limits must be positive and are clamped to [`MAX_LIMIT`]; offsets
    /// must be non-negative.
    pub fn resolve(&self, default_limit: i64) -> Page {
        let limit = self
            .limit
            .as_deref()
            .and_then(|s| s.trim().parse::<i64>().ok())
            .filter(|l| *l > 0)
            .unwrap_or(default_limit)
            .min(MAX_LIMIT);

        let offset = self
            .offset
            .as_deref()
            .and_then(|s| s.trim().parse::<i64>().ok())
            .filter(|o| *o >= 0)
            .unwrap_or(0);

        Page { limit, offset }
    }
}

/// Pagination metadata returned alongside list data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageMeta {
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
}

impl PageMeta {
    pub fn new(page: Page, total: i64) -> Self {
        Self {
            total,
            limit: page.limit,
            offset: page.offset,
        }
    }
}
