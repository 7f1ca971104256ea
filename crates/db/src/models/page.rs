//! Page rows, projections and request DTOs.

use canopy_core::hierarchy::PageNode;
use canopy_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `pages` table (the search vector is never selected).
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Page {
    pub id: DbId,
    pub slug: String,
    pub title: String,
    pub content: String,
    pub content_html: String,
    pub author_id: DbId,
    pub parent_id: Option<DbId>,
    pub is_published: bool,
    pub published_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// List entry with a cleaned excerpt instead of the full body.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct PageSummary {
    pub id: DbId,
    pub slug: String,
    pub title: String,
    pub excerpt: String,
    pub author_id: DbId,
    pub parent_id: Option<DbId>,
    pub is_published: bool,
    pub updated_at: Timestamp,
}

/// Identity of a page as returned by hierarchy walks.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize)]
pub struct PageRef {
    pub id: DbId,
    pub slug: String,
}

/// One breadcrumb entry.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize)]
pub struct PageCrumb {
    pub id: DbId,
    pub slug: String,
    pub title: String,
}

/// A page body scanned for `[[wiki links]]`.
#[derive(Debug, Clone, FromRow)]
pub struct PageLinkSource {
    pub id: DbId,
    pub slug: String,
    pub title: String,
    pub content: String,
}

/// Page totals for the stats endpoint.
#[derive(Debug, Clone, Copy, FromRow)]
pub struct PageCounts {
    pub total: i64,
    pub published: i64,
}

/// Minimal row for in-memory tree building and consistency checks.
#[derive(Debug, Clone, FromRow)]
pub struct PageNodeRow {
    pub id: DbId,
    pub parent_id: Option<DbId>,
    pub slug: String,
    pub title: String,
}

impl From<PageNodeRow> for PageNode {
    fn from(row: PageNodeRow) -> Self {
        PageNode {
            id: row.id,
            parent_id: row.parent_id,
            slug: row.slug,
            title: row.title,
        }
    }
}

/// A search result.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct SearchHit {
    pub page_id: DbId,
    pub slug: String,
    pub title: String,
    pub snippet: String,
    pub rank: f32,
    pub updated_at: Timestamp,
}

/// Fully resolved values for a page insert.
#[derive(Debug, Clone)]
pub struct NewPage {
    pub slug: String,
    pub title: String,
    pub content: String,
    pub content_html: String,
    pub author_id: DbId,
    pub parent_id: Option<DbId>,
    pub is_published: bool,
}

/// Column changes for a page update. `None` leaves a column untouched.
#[derive(Debug, Clone, Default)]
pub struct PageChanges {
    pub slug: Option<String>,
    pub title: Option<String>,
    pub content: Option<String>,
    pub content_html: Option<String>,
    pub is_published: Option<bool>,
    /// `Some(parent)` rewrites `parent_id`, including to `NULL`.
    pub parent_id: Option<Option<DbId>>,
}

/// DTO for creating a page.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreatePage {
    /// Derived from the title when absent or blank.
    pub slug: Option<String>,
    pub title: String,
    #[serde(default)]
    pub content: String,
    pub is_published: Option<bool>,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// DTO for a partial page update. All fields are optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdatePage {
    pub slug: Option<String>,
    pub title: Option<String>,
    pub content: Option<String>,
    pub is_published: Option<bool>,
    pub tags: Option<Vec<String>>,
    /// Revision comment recorded when the content changes.
    pub comment: Option<String>,
}

/// Sort order for page listings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PageOrder {
    #[default]
    Updated,
    Created,
    Title,
}

impl PageOrder {
    pub fn sql(self) -> &'static str {
        match self {
            Self::Updated => "p.updated_at DESC, p.id DESC",
            Self::Created => "p.created_at DESC, p.id DESC",
            Self::Title => "lower(p.title) ASC, p.id ASC",
        }
    }
}

/// Filter for [`crate::repositories::PageRepo::list`].
#[derive(Debug, Clone, Default)]
pub struct PageFilter {
    pub is_published: Option<bool>,
    pub author_id: Option<DbId>,
    pub tag: Option<String>,
    pub order: PageOrder,
    pub limit: i64,
    pub offset: i64,
}
