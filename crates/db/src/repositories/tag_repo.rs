//! Repository for `tags` and the `page_tags` join table.

use canopy_core::types::DbId;
use sqlx::{PgConnection, PgExecutor, PgPool};

use crate::models::tag::TagWithCount;

/// Provides tag assignment and listing.
pub struct TagRepo;

impl TagRepo {
    /// Replace the full tag set of a page.
    ///
    /// Callers run this inside their own transaction; tag names are expected
    /// to be normalized and de-duplicated already.
    pub async fn replace_for_page(
        conn: &mut PgConnection,
        page_id: DbId,
        names: &[String],
    ) -> Result<(), sqlx::Error> {
        sqlx::query("DELETE FROM page_tags WHERE page_id = $1")
            .bind(page_id)
            .execute(&mut *conn)
            .await?;

        for name in names {
            sqlx::query("INSERT INTO tags (name) VALUES ($1) ON CONFLICT DO NOTHING")
                .bind(name)
                .execute(&mut *conn)
                .await?;
            let (tag_id,): (DbId,) =
                sqlx::query_as("SELECT id FROM tags WHERE lower(name) = lower($1)")
                    .bind(name)
                    .fetch_one(&mut *conn)
                    .await?;
            sqlx::query(
                "INSERT INTO page_tags (page_id, tag_id) VALUES ($1, $2)
                 ON CONFLICT DO NOTHING",
            )
            .bind(page_id)
            .bind(tag_id)
            .execute(&mut *conn)
            .await?;
        }
        Ok(())
    }

    /// Tag names on a page, alphabetical.
    pub async fn names_for_page(
        executor: impl PgExecutor<'_>,
        page_id: DbId,
    ) -> Result<Vec<String>, sqlx::Error> {
        let rows: Vec<(String,)> = sqlx::query_as(
            "SELECT t.name FROM tags t
             JOIN page_tags pt ON pt.tag_id = t.id
             WHERE pt.page_id = $1
             ORDER BY lower(t.name)",
        )
        .bind(page_id)
        .fetch_all(executor)
        .await?;
        Ok(rows.into_iter().map(|r| r.0).collect())
    }

    /// All tags in use, with the number of published pages carrying each.
    pub async fn list_with_counts(pool: &PgPool) -> Result<Vec<TagWithCount>, sqlx::Error> {
        sqlx::query_as::<_, TagWithCount>(
            "SELECT t.id, t.name, COUNT(p.id) AS page_count
             FROM tags t
             JOIN page_tags pt ON pt.tag_id = t.id
             JOIN pages p ON p.id = pt.page_id AND p.is_published
             GROUP BY t.id, t.name
             ORDER BY page_count DESC, lower(t.name) ASC",
        )
        .fetch_all(pool)
        .await
    }

    /// Number of tags attached to at least one page.
    pub async fn count_in_use(pool: &PgPool) -> Result<i64, sqlx::Error> {
        let row: (i64,) = sqlx::query_as("SELECT COUNT(DISTINCT tag_id) FROM page_tags")
            .fetch_one(pool)
            .await?;
        Ok(row.0)
    }

    /// Drop tags no page references any more. Returns the number removed.
    pub async fn delete_unused(pool: &PgPool) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "DELETE FROM tags t
             WHERE NOT EXISTS (SELECT 1 FROM page_tags pt WHERE pt.tag_id = t.id)",
        )
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }
}
