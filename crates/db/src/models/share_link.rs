//! Share link rows and access history.

use canopy_core::share::ShareLimits;
use canopy_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `share_links` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ShareLink {
    pub id: DbId,
    #[serde(skip_serializing)]
    pub token_hash: String,
    pub page_id: DbId,
    pub created_by: DbId,
    pub include_children: bool,
    pub max_views: Option<i32>,
    pub max_unique_ips: Option<i32>,
    pub expires_at: Option<Timestamp>,
    pub is_revoked: bool,
    pub view_count: i32,
    pub created_at: Timestamp,
}

impl ShareLink {
    pub fn limits(&self) -> ShareLimits {
        ShareLimits {
            is_revoked: self.is_revoked,
            expires_at: self.expires_at,
            max_views: self.max_views,
            view_count: self.view_count,
            max_unique_ips: self.max_unique_ips,
        }
    }
}

/// A share link joined with its page and creator for listings.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ShareLinkDetail {
    pub id: DbId,
    pub page_id: DbId,
    pub page_slug: String,
    pub page_title: String,
    pub created_by: DbId,
    pub creator_name: String,
    pub include_children: bool,
    pub max_views: Option<i32>,
    pub max_unique_ips: Option<i32>,
    pub expires_at: Option<Timestamp>,
    pub is_revoked: bool,
    pub view_count: i32,
    pub created_at: Timestamp,
    /// Distinct addresses that have opened the link.
    pub unique_ips: i64,
}

impl ShareLinkDetail {
    pub fn limits(&self) -> ShareLimits {
        ShareLimits {
            is_revoked: self.is_revoked,
            expires_at: self.expires_at,
            max_views: self.max_views,
            view_count: self.view_count,
            max_unique_ips: self.max_unique_ips,
        }
    }
}

/// Values for a new link row; the token hash is computed by the caller.
#[derive(Debug, Clone)]
pub struct NewShareLink {
    pub token_hash: String,
    pub page_id: DbId,
    pub created_by: DbId,
    pub include_children: bool,
    pub max_views: Option<i32>,
    pub max_unique_ips: Option<i32>,
    pub expires_at: Option<Timestamp>,
}

/// DTO for issuing a link.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateShareLink {
    #[serde(default)]
    pub include_children: bool,
    pub max_views: Option<i32>,
    pub max_unique_ips: Option<i32>,
    /// Lifetime such as `30m`, `24h` or `7d`; absent means no expiry.
    pub expires_in: Option<String>,
}

/// A row from the `share_link_access` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ShareLinkAccess {
    pub id: DbId,
    pub share_link_id: DbId,
    pub ip_address: String,
    pub user_agent: String,
    pub accessed_at: Timestamp,
}

/// Aggregate access statistics for one link.
#[derive(Debug, Clone, Default, FromRow, Serialize)]
pub struct ShareLinkStats {
    pub total_views: i64,
    pub unique_ips: i64,
    pub last_access: Option<Timestamp>,
}
