//! Repository for the `pages` table.
//!
//! Slug lookups are case-insensitive everywhere; the unique index
//! `uq_pages_slug_lower` is the final arbiter of slug conflicts. Hierarchy
//! walks are recursive CTEs using `UNION`, which stops on revisiting a row,
//! so a corrupted parent cycle cannot loop forever.

use std::collections::HashSet;

use canopy_core::page::clean_excerpt;
use canopy_core::types::DbId;
use sqlx::{PgConnection, PgExecutor, PgPool};

use crate::models::page::{
    NewPage, Page, PageChanges, PageCounts, PageCrumb, PageFilter, PageLinkSource, PageNodeRow,
    PageRef, PageSummary, SearchHit,
};

/// Column list for page queries.
const COLUMNS: &str = "id, slug, title, content, content_html, author_id, parent_id, \
    is_published, published_at, created_at, updated_at";

/// Column list for summary queries over `pages p`.
const SUMMARY_COLUMNS: &str = "p.id, p.slug, p.title, LEFT(p.content, 200) AS excerpt, \
    p.author_id, p.parent_id, p.is_published, p.updated_at";

/// Upper bound on breadcrumb length; guards against parent cycles.
pub const MAX_PATH_DEPTH: i32 = 64;

/// Provides CRUD and hierarchy queries for pages.
pub struct PageRepo;

impl PageRepo {
    // -----------------------------------------------------------------------
    // Writes
    // -----------------------------------------------------------------------

    /// Insert a page. A duplicate slug surfaces as a unique violation on
    /// `uq_pages_slug_lower`.
    pub async fn insert(
        executor: impl PgExecutor<'_>,
        input: &NewPage,
    ) -> Result<Page, sqlx::Error> {
        let query = format!(
            "INSERT INTO pages
                (slug, title, content, content_html, author_id, parent_id, is_published, published_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, CASE WHEN $7 THEN NOW() END)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Page>(&query)
            .bind(&input.slug)
            .bind(&input.title)
            .bind(&input.content)
            .bind(&input.content_html)
            .bind(input.author_id)
            .bind(input.parent_id)
            .bind(input.is_published)
            .fetch_one(executor)
            .await
    }

    /// Insert a published, empty placeholder unless the slug already exists.
    ///
    /// Returns the new id, or `None` when another row holds the slug.
    pub async fn insert_placeholder(
        executor: impl PgExecutor<'_>,
        slug: &str,
        title: &str,
        author_id: DbId,
        parent_id: Option<DbId>,
    ) -> Result<Option<DbId>, sqlx::Error> {
        let row: Option<(DbId,)> = sqlx::query_as(
            "INSERT INTO pages (slug, title, content, content_html, author_id, parent_id, is_published, published_at)
             VALUES ($1, $2, '', '', $3, $4, true, NOW())
             ON CONFLICT DO NOTHING
             RETURNING id",
        )
        .bind(slug)
        .bind(title)
        .bind(author_id)
        .bind(parent_id)
        .fetch_optional(executor)
        .await?;
        Ok(row.map(|r| r.0))
    }

    /// Apply column changes. Publishing stamps `published_at` once.
    pub async fn update(
        executor: impl PgExecutor<'_>,
        id: DbId,
        changes: &PageChanges,
    ) -> Result<Option<Page>, sqlx::Error> {
        let query = format!(
            "UPDATE pages SET
                slug = COALESCE($2, slug),
                title = COALESCE($3, title),
                content = COALESCE($4, content),
                content_html = COALESCE($5, content_html),
                is_published = COALESCE($6, is_published),
                published_at = CASE
                    WHEN COALESCE($6, is_published) AND published_at IS NULL THEN NOW()
                    ELSE published_at
                END,
                parent_id = CASE WHEN $7 THEN $8 ELSE parent_id END
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Page>(&query)
            .bind(id)
            .bind(&changes.slug)
            .bind(&changes.title)
            .bind(&changes.content)
            .bind(&changes.content_html)
            .bind(changes.is_published)
            .bind(changes.parent_id.is_some())
            .bind(changes.parent_id.flatten())
            .fetch_optional(executor)
            .await
    }

    /// Rewrite only the slug of a page. Parent links are untouched.
    pub async fn update_slug(
        executor: impl PgExecutor<'_>,
        id: DbId,
        slug: &str,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE pages SET slug = $2 WHERE id = $1")
            .bind(id)
            .bind(slug)
            .execute(executor)
            .await?;
        Ok(())
    }

    /// Refresh the full-text vector from title (weight A) and body (weight B).
    pub async fn update_search_vector(
        executor: impl PgExecutor<'_>,
        id: DbId,
        title: &str,
        content: &str,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE pages SET search_vector =
                setweight(to_tsvector('simple', $2), 'A') ||
                setweight(to_tsvector('simple', $3), 'B')
             WHERE id = $1",
        )
        .bind(id)
        .bind(title)
        .bind(content)
        .execute(executor)
        .await?;
        Ok(())
    }

    /// Hard-delete one page. Returns `true` if a row was removed.
    pub async fn delete(executor: impl PgExecutor<'_>, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM pages WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Delete several pages atomically, in the order given.
    ///
    /// Callers pass children before parents so no row is ever orphaned
    /// mid-transaction. Returns the number of rows removed.
    pub async fn delete_many(pool: &PgPool, ids: &[DbId]) -> Result<u64, sqlx::Error> {
        let mut tx = pool.begin().await?;
        let mut removed = 0;
        for id in ids {
            let result = sqlx::query("DELETE FROM pages WHERE id = $1")
                .bind(id)
                .execute(&mut *tx)
                .await?;
            removed += result.rows_affected();
        }
        tx.commit().await?;
        Ok(removed)
    }

    // -----------------------------------------------------------------------
    // Lookups
    // -----------------------------------------------------------------------

    pub async fn find_by_id(
        executor: impl PgExecutor<'_>,
        id: DbId,
    ) -> Result<Option<Page>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM pages WHERE id = $1");
        sqlx::query_as::<_, Page>(&query)
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    /// Lock a page row for the rest of the transaction.
    pub async fn find_by_id_for_update(
        conn: &mut PgConnection,
        id: DbId,
    ) -> Result<Option<Page>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM pages WHERE id = $1 FOR UPDATE");
        sqlx::query_as::<_, Page>(&query)
            .bind(id)
            .fetch_optional(conn)
            .await
    }

    /// Case-insensitive slug lookup.
    pub async fn find_by_slug(
        executor: impl PgExecutor<'_>,
        slug: &str,
    ) -> Result<Option<Page>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM pages WHERE lower(slug) = lower($1)");
        sqlx::query_as::<_, Page>(&query)
            .bind(slug)
            .fetch_optional(executor)
            .await
    }

    pub async fn find_ref_by_slug(
        executor: impl PgExecutor<'_>,
        slug: &str,
    ) -> Result<Option<PageRef>, sqlx::Error> {
        sqlx::query_as::<_, PageRef>("SELECT id, slug FROM pages WHERE lower(slug) = lower($1)")
            .bind(slug)
            .fetch_optional(executor)
            .await
    }

    /// Whether a slug is held by any page other than `exclude_id`.
    pub async fn slug_taken(
        executor: impl PgExecutor<'_>,
        slug: &str,
        exclude_id: Option<DbId>,
    ) -> Result<bool, sqlx::Error> {
        let row: (bool,) = sqlx::query_as(
            "SELECT EXISTS(
                SELECT 1 FROM pages
                WHERE lower(slug) = lower($1) AND ($2::BIGINT IS NULL OR id <> $2)
             )",
        )
        .bind(slug)
        .bind(exclude_id)
        .fetch_one(executor)
        .await?;
        Ok(row.0)
    }

    // -----------------------------------------------------------------------
    // Hierarchy
    // -----------------------------------------------------------------------

    /// Every page below `id` through `parent_id` links, never `id` itself.
    pub async fn descendants(
        executor: impl PgExecutor<'_>,
        id: DbId,
    ) -> Result<Vec<PageRef>, sqlx::Error> {
        sqlx::query_as::<_, PageRef>(
            "WITH RECURSIVE tree AS (
                SELECT id, slug FROM pages WHERE parent_id = $1
                UNION
                SELECT p.id, p.slug FROM pages p JOIN tree t ON p.parent_id = t.id
             )
             SELECT id, slug FROM tree WHERE id <> $1 ORDER BY slug",
        )
        .bind(id)
        .fetch_all(executor)
        .await
    }

    /// The page itself plus everything below it, as hierarchy nodes.
    pub async fn subtree_nodes(
        executor: impl PgExecutor<'_>,
        id: DbId,
    ) -> Result<Vec<PageNodeRow>, sqlx::Error> {
        sqlx::query_as::<_, PageNodeRow>(
            "WITH RECURSIVE tree AS (
                SELECT id, parent_id, slug, title FROM pages WHERE id = $1
                UNION
                SELECT p.id, p.parent_id, p.slug, p.title
                FROM pages p JOIN tree t ON p.parent_id = t.id
             )
             SELECT id, parent_id, slug, title FROM tree",
        )
        .bind(id)
        .fetch_all(executor)
        .await
    }

    /// Every page below `id` through `parent_id` links, locked for update.
    ///
    /// Same walk as [`PageRepo::descendants`]; the rename cascade filters
    /// these rows by slug prefix before rewriting them.
    pub async fn lock_descendants(
        conn: &mut PgConnection,
        id: DbId,
    ) -> Result<Vec<PageRef>, sqlx::Error> {
        sqlx::query_as::<_, PageRef>(
            "WITH RECURSIVE tree AS (
                SELECT id FROM pages WHERE parent_id = $1
                UNION
                SELECT p.id FROM pages p JOIN tree t ON p.parent_id = t.id
             )
             SELECT id, slug FROM pages
             WHERE id IN (SELECT id FROM tree) AND id <> $1
             ORDER BY slug
             FOR UPDATE",
        )
        .bind(id)
        .fetch_all(conn)
        .await
    }

    /// Breadcrumbs from the root down to `id`, inclusive.
    ///
    /// Returns an empty list when the page does not exist.
    pub async fn path_to(
        executor: impl PgExecutor<'_>,
        id: DbId,
    ) -> Result<Vec<PageCrumb>, sqlx::Error> {
        let rows: Vec<PageCrumb> = sqlx::query_as(
            "WITH RECURSIVE chain AS (
                SELECT id, slug, title, parent_id, 0 AS depth FROM pages WHERE id = $1
                UNION ALL
                SELECT p.id, p.slug, p.title, p.parent_id, c.depth + 1
                FROM pages p JOIN chain c ON p.id = c.parent_id
                WHERE c.depth < $2
             )
             SELECT id, slug, title FROM chain ORDER BY depth ASC",
        )
        .bind(id)
        .bind(MAX_PATH_DEPTH)
        .fetch_all(executor)
        .await?;

        // Leaf first; stop at the first repeat so a cycle yields a finite path.
        let mut seen = HashSet::new();
        let mut path: Vec<PageCrumb> = rows.into_iter().take_while(|c| seen.insert(c.id)).collect();
        path.reverse();
        Ok(path)
    }

    /// Whether the page with `slug` sits strictly below `ancestor_id`.
    pub async fn is_descendant(
        executor: impl PgExecutor<'_>,
        ancestor_id: DbId,
        slug: &str,
    ) -> Result<bool, sqlx::Error> {
        let row: (bool,) = sqlx::query_as(
            "WITH RECURSIVE tree AS (
                SELECT id FROM pages WHERE parent_id = $1
                UNION
                SELECT p.id FROM pages p JOIN tree t ON p.parent_id = t.id
             )
             SELECT EXISTS(
                SELECT 1 FROM tree JOIN pages p ON p.id = tree.id
                WHERE lower(p.slug) = lower($2) AND p.id <> $1
             )",
        )
        .bind(ancestor_id)
        .bind(slug)
        .fetch_one(executor)
        .await?;
        Ok(row.0)
    }

    /// Minimal rows for every page, for tree building and consistency checks.
    pub async fn all_nodes(
        pool: &PgPool,
        published_only: bool,
    ) -> Result<Vec<PageNodeRow>, sqlx::Error> {
        sqlx::query_as::<_, PageNodeRow>(
            "SELECT id, parent_id, slug, title FROM pages
             WHERE (NOT $1 OR is_published)
             ORDER BY id",
        )
        .bind(published_only)
        .fetch_all(pool)
        .await
    }

    // -----------------------------------------------------------------------
    // Listings
    // -----------------------------------------------------------------------

    /// Filtered, paginated page summaries.
    pub async fn list(pool: &PgPool, filter: &PageFilter) -> Result<Vec<PageSummary>, sqlx::Error> {
        let query = format!(
            "SELECT {SUMMARY_COLUMNS} FROM pages p
             WHERE ($1::BOOL IS NULL OR p.is_published = $1)
               AND ($2::BIGINT IS NULL OR p.author_id = $2)
               AND ($3::TEXT IS NULL OR EXISTS(
                    SELECT 1 FROM page_tags pt JOIN tags t ON t.id = pt.tag_id
                    WHERE pt.page_id = p.id AND lower(t.name) = lower($3)
               ))
             ORDER BY {}
             LIMIT $4 OFFSET $5",
            filter.order.sql()
        );
        let rows = sqlx::query_as::<_, PageSummary>(&query)
            .bind(filter.is_published)
            .bind(filter.author_id)
            .bind(&filter.tag)
            .bind(filter.limit)
            .bind(filter.offset)
            .fetch_all(pool)
            .await?;
        Ok(with_clean_excerpts(rows))
    }

    /// Direct children of a page, alphabetical by title.
    pub async fn list_children(
        pool: &PgPool,
        parent_id: DbId,
        published_only: bool,
    ) -> Result<Vec<PageSummary>, sqlx::Error> {
        let query = format!(
            "SELECT {SUMMARY_COLUMNS} FROM pages p
             WHERE p.parent_id = $1 AND (NOT $2 OR p.is_published)
             ORDER BY lower(p.title), p.id"
        );
        let rows = sqlx::query_as::<_, PageSummary>(&query)
            .bind(parent_id)
            .bind(published_only)
            .fetch_all(pool)
            .await?;
        Ok(with_clean_excerpts(rows))
    }

    /// Top-level pages, alphabetical by title.
    pub async fn list_roots(
        pool: &PgPool,
        published_only: bool,
    ) -> Result<Vec<PageSummary>, sqlx::Error> {
        let query = format!(
            "SELECT {SUMMARY_COLUMNS} FROM pages p
             WHERE p.parent_id IS NULL AND (NOT $1 OR p.is_published)
             ORDER BY lower(p.title), p.id"
        );
        let rows = sqlx::query_as::<_, PageSummary>(&query)
            .bind(published_only)
            .fetch_all(pool)
            .await?;
        Ok(with_clean_excerpts(rows))
    }

    /// Published pages other than `exclude_id` whose body contains `[[`.
    ///
    /// A coarse prefilter; callers parse the bodies for actual link targets.
    pub async fn link_sources(
        pool: &PgPool,
        exclude_id: DbId,
    ) -> Result<Vec<PageLinkSource>, sqlx::Error> {
        sqlx::query_as::<_, PageLinkSource>(
            "SELECT id, slug, title, content FROM pages
             WHERE is_published AND id <> $1 AND strpos(content, '[[') > 0
             ORDER BY lower(title), id",
        )
        .bind(exclude_id)
        .fetch_all(pool)
        .await
    }

    pub async fn counts(pool: &PgPool) -> Result<PageCounts, sqlx::Error> {
        sqlx::query_as::<_, PageCounts>(
            "SELECT COUNT(*) AS total, COUNT(*) FILTER (WHERE is_published) AS published
             FROM pages",
        )
        .fetch_one(pool)
        .await
    }

    // -----------------------------------------------------------------------
    // Search
    // -----------------------------------------------------------------------

    /// `ILIKE` search over title and body of published pages, newest first.
    ///
    /// `pattern` must already be escaped with `\` (see
    /// `canopy_core::search::like_pattern`).
    pub async fn search_substring(
        pool: &PgPool,
        pattern: &str,
        limit: i64,
    ) -> Result<Vec<SearchHit>, sqlx::Error> {
        let rows = sqlx::query_as::<_, SearchHit>(
            "SELECT id AS page_id, slug, title, LEFT(content, 200) AS snippet,
                    0::REAL AS rank, updated_at
             FROM pages
             WHERE is_published
               AND (title ILIKE $1 ESCAPE '\\' OR content ILIKE $1 ESCAPE '\\')
             ORDER BY updated_at DESC, id DESC
             LIMIT $2",
        )
        .bind(pattern)
        .bind(limit)
        .fetch_all(pool)
        .await?;
        Ok(with_clean_snippets(rows))
    }

    /// Full-text search over published pages ranked by `ts_rank`.
    pub async fn search_fulltext(
        pool: &PgPool,
        tsquery: &str,
        limit: i64,
    ) -> Result<Vec<SearchHit>, sqlx::Error> {
        let rows = sqlx::query_as::<_, SearchHit>(
            "SELECT p.id AS page_id, p.slug, p.title, LEFT(p.content, 200) AS snippet,
                    ts_rank(p.search_vector, q) AS rank, p.updated_at
             FROM pages p, to_tsquery('simple', $1) q
             WHERE p.is_published AND p.search_vector @@ q
             ORDER BY rank DESC, p.updated_at DESC
             LIMIT $2",
        )
        .bind(tsquery)
        .bind(limit)
        .fetch_all(pool)
        .await?;
        Ok(with_clean_snippets(rows))
    }
}

fn with_clean_excerpts(mut rows: Vec<PageSummary>) -> Vec<PageSummary> {
    for row in &mut rows {
        row.excerpt = clean_excerpt(&row.excerpt);
    }
    rows
}

fn with_clean_snippets(mut rows: Vec<SearchHit>) -> Vec<SearchHit> {
    for row in &mut rows {
        row.snippet = clean_excerpt(&row.snippet);
    }
    rows
}
