//! Slug rename cascade.
//!
//! Moving `linux` to `commands/linux` rewrites `linux/ubuntu` to
//! `commands/linux/ubuntu`. Descendants keep their `parent_id`; only the
//! slug text changes. Only pages reachable through `parent_id` are
//! rewritten. Runs inside the caller's update transaction.

use canopy_core::error::CoreError;
use canopy_core::page::{validate_slug_length, SlugChange};
use canopy_core::slug;
use canopy_core::types::DbId;
use canopy_db::repositories::PageRepo;
use sqlx::PgConnection;

use crate::error::{slug_conflict_or_storage, WikiResult};
use crate::hierarchy::ensure_ancestors_in;

/// Result of moving one page to a new slug.
#[derive(Debug)]
pub(crate) struct RenamePlan {
    /// Parent the renamed page must point at.
    pub parent_id: Option<DbId>,
    /// Rewritten descendants, excluding the page itself.
    pub changes: Vec<SlugChange>,
}

/// Move `page_id` from `old_slug` to `new_slug` and rewrite its subtree.
///
/// The caller still has to write the page's own slug and `parent_id`.
pub(crate) async fn rename(
    conn: &mut PgConnection,
    page_id: DbId,
    author_id: DbId,
    old_slug: &str,
    new_slug: &str,
) -> WikiResult<RenamePlan> {
    if new_slug.starts_with(&format!("{old_slug}{}", slug::SEPARATOR)) {
        return Err(CoreError::Validation(format!(
            "slug: cannot move '{old_slug}' beneath itself"
        ))
        .into());
    }
    if PageRepo::slug_taken(&mut *conn, new_slug, Some(page_id)).await? {
        return Err(CoreError::SlugConflict {
            slug: new_slug.to_string(),
        }
        .into());
    }

    let parent_id = ensure_ancestors_in(&mut *conn, author_id, new_slug).await?;

    // Only real descendants move. A stray row that merely shares the
    // `old_slug/` prefix (an orphan left by a single-page delete) stays put.
    let subtree = PageRepo::lock_descendants(&mut *conn, page_id).await?;
    let mut changes = Vec::with_capacity(subtree.len());
    for page in subtree {
        let Some(rewritten) = slug::rewrite_prefix(&page.slug, old_slug, new_slug) else {
            continue;
        };
        validate_slug_length(&rewritten)?;
        if PageRepo::slug_taken(&mut *conn, &rewritten, Some(page.id)).await? {
            return Err(CoreError::SlugConflict { slug: rewritten }.into());
        }
        PageRepo::update_slug(&mut *conn, page.id, &rewritten)
            .await
            .map_err(|e| slug_conflict_or_storage(e, &rewritten))?;
        changes.push(SlugChange {
            old_slug: page.slug,
            new_slug: rewritten,
        });
    }

    Ok(RenamePlan { parent_id, changes })
}
