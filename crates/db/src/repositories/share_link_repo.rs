//! Repository for `share_links` and `share_link_access`.
//!
//! Tokens are looked up by their SHA-256 hash only. The access row and the
//! `view_count` increment are always written in the same transaction.

use canopy_core::types::DbId;
use sqlx::{PgConnection, PgExecutor, PgPool};

use crate::models::share_link::{
    NewShareLink, ShareLink, ShareLinkAccess, ShareLinkDetail, ShareLinkStats,
};

/// Column list for share_links queries.
const COLUMNS: &str = "id, token_hash, page_id, created_by, include_children, max_views, \
    max_unique_ips, expires_at, is_revoked, view_count, created_at";

/// Joined projection over `share_links s`, `pages p`, `users u`.
const DETAIL_SELECT: &str = "SELECT s.id, s.page_id, p.slug AS page_slug, p.title AS page_title, \
    s.created_by, COALESCE(u.display_name, '') AS creator_name, s.include_children, \
    s.max_views, s.max_unique_ips, s.expires_at, s.is_revoked, s.view_count, s.created_at, \
    (SELECT COUNT(DISTINCT a.ip_address) FROM share_link_access a \
     WHERE a.share_link_id = s.id) AS unique_ips \
    FROM share_links s \
    JOIN pages p ON p.id = s.page_id \
    LEFT JOIN users u ON u.id = s.created_by";

/// Provides share link persistence and access auditing.
pub struct ShareLinkRepo;

impl ShareLinkRepo {
    pub async fn create(
        executor: impl PgExecutor<'_>,
        input: &NewShareLink,
    ) -> Result<ShareLink, sqlx::Error> {
        let query = format!(
            "INSERT INTO share_links
                (token_hash, page_id, created_by, include_children, max_views, max_unique_ips, expires_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ShareLink>(&query)
            .bind(&input.token_hash)
            .bind(input.page_id)
            .bind(input.created_by)
            .bind(input.include_children)
            .bind(input.max_views)
            .bind(input.max_unique_ips)
            .bind(input.expires_at)
            .fetch_one(executor)
            .await
    }

    pub async fn find_by_id(
        executor: impl PgExecutor<'_>,
        id: DbId,
    ) -> Result<Option<ShareLink>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM share_links WHERE id = $1");
        sqlx::query_as::<_, ShareLink>(&query)
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    pub async fn find_by_token_hash(
        executor: impl PgExecutor<'_>,
        token_hash: &str,
    ) -> Result<Option<ShareLink>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM share_links WHERE token_hash = $1");
        sqlx::query_as::<_, ShareLink>(&query)
            .bind(token_hash)
            .fetch_optional(executor)
            .await
    }

    /// Token lookup that locks the row so concurrent accesses serialize on
    /// the quota checks.
    pub async fn lock_by_token_hash(
        conn: &mut PgConnection,
        token_hash: &str,
    ) -> Result<Option<ShareLink>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM share_links WHERE token_hash = $1 FOR UPDATE");
        sqlx::query_as::<_, ShareLink>(&query)
            .bind(token_hash)
            .fetch_optional(conn)
            .await
    }

    pub async fn find_detail(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<ShareLinkDetail>, sqlx::Error> {
        let query = format!("{DETAIL_SELECT} WHERE s.id = $1");
        sqlx::query_as::<_, ShareLinkDetail>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn list_for_page(
        pool: &PgPool,
        page_id: DbId,
    ) -> Result<Vec<ShareLinkDetail>, sqlx::Error> {
        let query = format!(
            "{DETAIL_SELECT} WHERE s.page_id = $1 ORDER BY s.created_at DESC, s.id DESC"
        );
        sqlx::query_as::<_, ShareLinkDetail>(&query)
            .bind(page_id)
            .fetch_all(pool)
            .await
    }

    pub async fn list_for_user(
        pool: &PgPool,
        user_id: DbId,
    ) -> Result<Vec<ShareLinkDetail>, sqlx::Error> {
        let query = format!(
            "{DETAIL_SELECT} WHERE s.created_by = $1 ORDER BY s.created_at DESC, s.id DESC"
        );
        sqlx::query_as::<_, ShareLinkDetail>(&query)
            .bind(user_id)
            .fetch_all(pool)
            .await
    }

    pub async fn list_all(
        pool: &PgPool,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<ShareLinkDetail>, sqlx::Error> {
        let query =
            format!("{DETAIL_SELECT} ORDER BY s.created_at DESC, s.id DESC LIMIT $1 OFFSET $2");
        sqlx::query_as::<_, ShareLinkDetail>(&query)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    /// Revoke a link. Revocation is one-way; returns `false` if the link
    /// does not exist.
    pub async fn revoke(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE share_links SET is_revoked = true WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Hard-delete a link and, by cascade, its access history.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM share_links WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    // -----------------------------------------------------------------------
    // Access auditing
    // -----------------------------------------------------------------------

    /// Whether `ip` has accessed the link before.
    pub async fn has_ip(
        executor: impl PgExecutor<'_>,
        share_link_id: DbId,
        ip: &str,
    ) -> Result<bool, sqlx::Error> {
        let row: (bool,) = sqlx::query_as(
            "SELECT EXISTS(
                SELECT 1 FROM share_link_access WHERE share_link_id = $1 AND ip_address = $2
             )",
        )
        .bind(share_link_id)
        .bind(ip)
        .fetch_one(executor)
        .await?;
        Ok(row.0)
    }

    /// Number of distinct addresses that have accessed the link.
    pub async fn unique_ip_count(
        executor: impl PgExecutor<'_>,
        share_link_id: DbId,
    ) -> Result<i64, sqlx::Error> {
        let row: (i64,) = sqlx::query_as(
            "SELECT COUNT(DISTINCT ip_address) FROM share_link_access WHERE share_link_id = $1",
        )
        .bind(share_link_id)
        .fetch_one(executor)
        .await?;
        Ok(row.0)
    }

    /// Insert an access row and bump `view_count` on an open connection.
    ///
    /// Must run inside the caller's transaction.
    pub async fn record_access_in(
        conn: &mut PgConnection,
        share_link_id: DbId,
        ip: &str,
        user_agent: &str,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO share_link_access (share_link_id, ip_address, user_agent)
             VALUES ($1, $2, $3)",
        )
        .bind(share_link_id)
        .bind(ip)
        .bind(user_agent)
        .execute(&mut *conn)
        .await?;

        sqlx::query("UPDATE share_links SET view_count = view_count + 1 WHERE id = $1")
            .bind(share_link_id)
            .execute(&mut *conn)
            .await?;
        Ok(())
    }

    /// Record an access in its own transaction.
    pub async fn record_access(
        pool: &PgPool,
        share_link_id: DbId,
        ip: &str,
        user_agent: &str,
    ) -> Result<(), sqlx::Error> {
        let mut tx = pool.begin().await?;
        Self::record_access_in(&mut *tx, share_link_id, ip, user_agent).await?;
        tx.commit().await?;
        Ok(())
    }

    pub async fn stats(pool: &PgPool, share_link_id: DbId) -> Result<ShareLinkStats, sqlx::Error> {
        sqlx::query_as::<_, ShareLinkStats>(
            "SELECT COUNT(*) AS total_views,
                    COUNT(DISTINCT ip_address) AS unique_ips,
                    MAX(accessed_at) AS last_access
             FROM share_link_access
             WHERE share_link_id = $1",
        )
        .bind(share_link_id)
        .fetch_one(pool)
        .await
    }

    /// Access history, newest first.
    pub async fn list_accesses(
        pool: &PgPool,
        share_link_id: DbId,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<ShareLinkAccess>, sqlx::Error> {
        sqlx::query_as::<_, ShareLinkAccess>(
            "SELECT id, share_link_id, ip_address, user_agent, accessed_at
             FROM share_link_access
             WHERE share_link_id = $1
             ORDER BY accessed_at DESC, id DESC
             LIMIT $2 OFFSET $3",
        )
        .bind(share_link_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await
    }
}
