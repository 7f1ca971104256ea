//! Revision ledger rows.
//!
//! A revision holds the page content as it was *before* the edit that
//! produced it (the initial revision holds the initial content). Rows are
//! never updated.

use canopy_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `revisions` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Revision {
    pub id: DbId,
    pub page_id: DbId,
    pub content: String,
    pub author_id: DbId,
    pub comment: String,
    pub created_at: Timestamp,
}

/// History list entry without the content body.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct RevisionSummary {
    pub id: DbId,
    pub page_id: DbId,
    pub author_id: DbId,
    pub author_display_name: String,
    pub comment: String,
    pub content_length: i32,
    pub created_at: Timestamp,
}
