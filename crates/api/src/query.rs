//! Query parameter types shared by several handler modules.

use canopy_core::search::{clamp_limit, clamp_offset, DEFAULT_LIST_LIMIT, MAX_LIST_LIMIT};
use serde::Deserialize;

/// Generic pagination parameters (`?limit=&offset=`).
#[derive(Debug, Default, Deserialize)]
pub struct PaginationParams {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl PaginationParams {
    /// Clamped `(limit, offset)` for list endpoints.
    pub fn clamped(&self) -> (i64, i64) {
        (
            clamp_limit(self.limit, DEFAULT_LIST_LIMIT, MAX_LIST_LIMIT),
            clamp_offset(self.offset),
        )
    }
}

/// `?published_only=` flag for hierarchy listings. Defaults to `true`.
#[derive(Debug, Deserialize)]
pub struct PublishedParams {
    #[serde(default = "default_true")]
    pub published_only: bool,
}

fn default_true() -> bool {
    true
}
