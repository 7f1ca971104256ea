//! Share link issuing, validation and management.
//!
//! A share link is a capability: whoever holds the raw token may read the
//! linked page (and, with `include_children`, any true descendant) until
//! the link is revoked, expires or exhausts a quota. Only the token hash is
//! stored. Validation re-evaluates every rule on every access while holding
//! a row lock on the link, so inline recording enforces quotas exactly.

use canopy_core::error::CoreError;
use canopy_core::share::{
    generate_share_token, hash_share_token, is_well_formed_token, parse_expires_in, sanitize_ip,
    share_scope, truncate_user_agent, validate_quota, ShareDenial, ShareLinkStatus, ShareScope,
};
use canopy_core::slug;
use canopy_core::types::DbId;
use canopy_db::models::page::{Page, PageSummary};
use canopy_db::models::share_link::{
    CreateShareLink, NewShareLink, ShareLink, ShareLinkAccess, ShareLinkDetail, ShareLinkStats,
};
use canopy_db::repositories::{PageRepo, ShareLinkRepo};
use chrono::Utc;
use serde::Serialize;

use crate::access_recorder::{AccessEvent, AccessSink};
use crate::error::{page_not_found, WikiResult};
use crate::wiki::{Actor, Wiki};

/// A freshly issued link. The raw token is only ever returned here.
#[derive(Debug, Clone, Serialize)]
pub struct IssuedShareLink {
    pub token: String,
    pub link: ShareLink,
}

/// A page served through a share link.
#[derive(Debug, Clone, Serialize)]
pub struct SharedPage {
    pub share_link_id: DbId,
    /// The page the link was issued for.
    pub root_slug: String,
    pub include_children: bool,
    pub page: Page,
    /// Direct children reachable through the link, when it covers them.
    pub children: Vec<PageSummary>,
}

/// Listing entry with its current status.
#[derive(Debug, Clone, Serialize)]
pub struct ShareLinkView {
    #[serde(flatten)]
    pub link: ShareLinkDetail,
    pub status: ShareLinkStatus,
}

impl From<ShareLinkDetail> for ShareLinkView {
    fn from(link: ShareLinkDetail) -> Self {
        let status = link.limits().status(Utc::now(), link.unique_ips);
        Self { link, status }
    }
}

fn share_link_not_found(id: DbId) -> CoreError {
    CoreError::NotFound {
        entity: "share_link",
        id,
    }
}

fn unknown_token() -> CoreError {
    CoreError::NotFoundByKey {
        entity: "share_link",
        key: "token".to_string(),
    }
}

/// Creator-or-admin rule for link management.
fn authorize(created_by: DbId, actor: &Actor) -> Result<(), CoreError> {
    if actor.user_id == created_by || actor.is_admin() {
        Ok(())
    } else {
        Err(CoreError::Forbidden(
            "only the link creator or an admin may manage this share link".into(),
        ))
    }
}

impl Wiki {
    /// Issue a new link for a page.
    pub async fn issue_share_link(
        &self,
        page_id: DbId,
        created_by: DbId,
        input: &CreateShareLink,
    ) -> WikiResult<IssuedShareLink> {
        validate_quota("max_views", input.max_views)?;
        validate_quota("max_unique_ips", input.max_unique_ips)?;
        let lifetime = match input.expires_in.as_deref() {
            Some(raw) => parse_expires_in(raw)?,
            None => None,
        };
        let expires_at = match lifetime {
            Some(d) => Some(Utc::now().checked_add_signed(d).ok_or_else(|| {
                CoreError::Validation("expires_in: too far in the future".into())
            })?),
            None => None,
        };

        if PageRepo::find_by_id(&self.pool, page_id).await?.is_none() {
            return Err(page_not_found(page_id));
        }

        let token = generate_share_token();
        let link = ShareLinkRepo::create(
            &self.pool,
            &NewShareLink {
                token_hash: token.hash,
                page_id,
                created_by,
                include_children: input.include_children,
                max_views: input.max_views,
                max_unique_ips: input.max_unique_ips,
                expires_at,
            },
        )
        .await?;

        tracing::info!(
            user_id = created_by,
            page_id,
            share_link_id = link.id,
            include_children = link.include_children,
            "Share link issued"
        );
        Ok(IssuedShareLink {
            token: token.plaintext,
            link,
        })
    }

    /// Validate an anonymous access and record it when admitted.
    ///
    /// The outer error covers unknown tokens and storage failures; the inner
    /// `Err` is a policy denial. Checks run in order: revoked, expired, view
    /// quota, unique-IP quota, then page scope.
    pub async fn validate_and_record(
        &self,
        raw_token: &str,
        ip: &str,
        user_agent: &str,
        requested_slug: Option<&str>,
    ) -> WikiResult<Result<SharedPage, ShareDenial>> {
        if !is_well_formed_token(raw_token) {
            return Err(unknown_token().into());
        }
        let token_hash = hash_share_token(raw_token);
        let ip = sanitize_ip(ip);
        let user_agent = truncate_user_agent(user_agent);

        let mut tx = self.pool.begin().await?;
        let link = ShareLinkRepo::lock_by_token_hash(&mut *tx, &token_hash)
            .await?
            .ok_or_else(unknown_token)?;

        let limits = link.limits();
        if let Err(denial) = limits.check(Utc::now()) {
            tracing::debug!(share_link_id = link.id, code = denial.code(), "Share access denied");
            return Ok(Err(denial));
        }
        if limits.limits_ips() {
            let seen = ShareLinkRepo::has_ip(&mut *tx, link.id, &ip).await?;
            let unique = ShareLinkRepo::unique_ip_count(&mut *tx, link.id).await?;
            if let Err(denial) = limits.check_ip(seen, unique) {
                tracing::debug!(
                    share_link_id = link.id,
                    code = denial.code(),
                    "Share access denied"
                );
                return Ok(Err(denial));
            }
        }

        let linked = PageRepo::find_by_id(&mut *tx, link.page_id)
            .await?
            .ok_or_else(|| page_not_found(link.page_id))?;
        let requested = requested_slug.map(slug::normalize);
        let page = match share_scope(&linked.slug, requested.as_deref(), link.include_children) {
            ShareScope::LinkedPage => linked.clone(),
            ShareScope::Denied => return Ok(Err(ShareDenial::PageNotAccessible)),
            ShareScope::NeedsDescendantCheck => {
                let target = requested.as_deref().unwrap_or_default();
                if !PageRepo::is_descendant(&mut *tx, linked.id, target).await? {
                    return Ok(Err(ShareDenial::PageNotAccessible));
                }
                match PageRepo::find_by_slug(&mut *tx, target).await? {
                    Some(page) => page,
                    None => return Ok(Err(ShareDenial::PageNotAccessible)),
                }
            }
        };

        match &self.access {
            AccessSink::Inline => {
                ShareLinkRepo::record_access_in(&mut *tx, link.id, &ip, &user_agent).await?;
                tx.commit().await?;
            }
            AccessSink::Queued(recorder) => {
                tx.commit().await?;
                recorder
                    .record(AccessEvent {
                        share_link_id: link.id,
                        ip_address: ip.clone(),
                        user_agent,
                    })
                    .await?;
            }
        }
        tracing::info!(
            share_link_id = link.id,
            page_id = page.id,
            ip = %ip,
            "Share access granted"
        );

        let children = if link.include_children {
            PageRepo::list_children(&self.pool, page.id, true).await?
        } else {
            Vec::new()
        };
        Ok(Ok(SharedPage {
            share_link_id: link.id,
            root_slug: linked.slug,
            include_children: link.include_children,
            page,
            children,
        }))
    }

    /// Look up a link for management.
    pub async fn get_share_link(&self, link_id: DbId, actor: &Actor) -> WikiResult<ShareLinkView> {
        let link = ShareLinkRepo::find_detail(&self.pool, link_id)
            .await?
            .ok_or_else(|| share_link_not_found(link_id))?;
        authorize(link.created_by, actor)?;
        Ok(link.into())
    }

    /// Permanently disable a link. Revoking twice is harmless.
    pub async fn revoke_share_link(&self, link_id: DbId, actor: &Actor) -> WikiResult<()> {
        let link = self.owned_link(link_id, actor).await?;
        ShareLinkRepo::revoke(&self.pool, link.id).await?;
        tracing::info!(user_id = actor.user_id, share_link_id = link_id, "Share link revoked");
        Ok(())
    }

    /// Delete a link together with its access history.
    pub async fn delete_share_link(&self, link_id: DbId, actor: &Actor) -> WikiResult<()> {
        let link = self.owned_link(link_id, actor).await?;
        ShareLinkRepo::delete(&self.pool, link.id).await?;
        tracing::info!(user_id = actor.user_id, share_link_id = link_id, "Share link deleted");
        Ok(())
    }

    pub async fn share_link_stats(
        &self,
        link_id: DbId,
        actor: &Actor,
    ) -> WikiResult<ShareLinkStats> {
        let link = self.owned_link(link_id, actor).await?;
        Ok(ShareLinkRepo::stats(&self.pool, link.id).await?)
    }

    /// Access history of a link, newest first.
    pub async fn list_share_accesses(
        &self,
        link_id: DbId,
        actor: &Actor,
        limit: i64,
        offset: i64,
    ) -> WikiResult<Vec<ShareLinkAccess>> {
        let link = self.owned_link(link_id, actor).await?;
        Ok(ShareLinkRepo::list_accesses(&self.pool, link.id, limit, offset).await?)
    }

    pub async fn list_share_links_for_page(&self, page_id: DbId) -> WikiResult<Vec<ShareLinkView>> {
        let links = ShareLinkRepo::list_for_page(&self.pool, page_id).await?;
        Ok(links.into_iter().map(Into::into).collect())
    }

    pub async fn list_share_links_for_user(&self, user_id: DbId) -> WikiResult<Vec<ShareLinkView>> {
        let links = ShareLinkRepo::list_for_user(&self.pool, user_id).await?;
        Ok(links.into_iter().map(Into::into).collect())
    }

    /// Every link in the wiki. Admin only.
    pub async fn list_all_share_links(
        &self,
        actor: &Actor,
        limit: i64,
        offset: i64,
    ) -> WikiResult<Vec<ShareLinkView>> {
        if !actor.is_admin() {
            return Err(CoreError::Forbidden("admin role required".into()).into());
        }
        let links = ShareLinkRepo::list_all(&self.pool, limit, offset).await?;
        Ok(links.into_iter().map(Into::into).collect())
    }

    async fn owned_link(&self, link_id: DbId, actor: &Actor) -> WikiResult<ShareLink> {
        let link = ShareLinkRepo::find_by_id(&self.pool, link_id)
            .await?
            .ok_or_else(|| share_link_not_found(link_id))?;
        authorize(link.created_by, actor)?;
        Ok(link)
    }
}
