//! Repository for the `revisions` table.
//!
//! Revisions are append-only: there is no update function.

use canopy_core::types::DbId;
use sqlx::{PgExecutor, PgPool};

use crate::models::revision::{Revision, RevisionSummary};

const COLUMNS: &str = "id, page_id, content, author_id, comment, created_at";

/// Provides append and read operations for the revision ledger.
pub struct RevisionRepo;

impl RevisionRepo {
    /// Append a revision snapshot.
    pub async fn create(
        executor: impl PgExecutor<'_>,
        page_id: DbId,
        content: &str,
        author_id: DbId,
        comment: &str,
    ) -> Result<Revision, sqlx::Error> {
        let query = format!(
            "INSERT INTO revisions (page_id, content, author_id, comment)
             VALUES ($1, $2, $3, $4)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Revision>(&query)
            .bind(page_id)
            .bind(content)
            .bind(author_id)
            .bind(comment)
            .fetch_one(executor)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Revision>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM revisions WHERE id = $1");
        sqlx::query_as::<_, Revision>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// History for a page, newest first.
    pub async fn list_for_page(
        pool: &PgPool,
        page_id: DbId,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<RevisionSummary>, sqlx::Error> {
        sqlx::query_as::<_, RevisionSummary>(
            "SELECT r.id, r.page_id, r.author_id,
                    COALESCE(u.display_name, '') AS author_display_name,
                    r.comment,
                    char_length(r.content) AS content_length,
                    r.created_at
             FROM revisions r
             LEFT JOIN users u ON u.id = r.author_id
             WHERE r.page_id = $1
             ORDER BY r.created_at DESC, r.id DESC
             LIMIT $2 OFFSET $3",
        )
        .bind(page_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await
    }

    /// Every revision for a page, oldest first.
    pub async fn list_full_for_page(
        pool: &PgPool,
        page_id: DbId,
    ) -> Result<Vec<Revision>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM revisions
             WHERE page_id = $1
             ORDER BY created_at ASC, id ASC"
        );
        sqlx::query_as::<_, Revision>(&query)
            .bind(page_id)
            .fetch_all(pool)
            .await
    }

    pub async fn count_for_page(pool: &PgPool, page_id: DbId) -> Result<i64, sqlx::Error> {
        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM revisions WHERE page_id = $1")
            .bind(page_id)
            .fetch_one(pool)
            .await?;
        Ok(row.0)
    }
}
