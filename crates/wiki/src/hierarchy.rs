//! Parent chains, subtrees and breadcrumbs.
//!
//! The slug `a/b/c` implies the ancestor chain `a`, `a/b`. Creating or
//! moving a page materializes any missing ancestor as a published
//! placeholder with empty content and a humanized title.

use canopy_core::error::CoreError;
use canopy_core::hierarchy::{HierarchyViolation, PageGraph, TreeNode};
use canopy_core::slug;
use canopy_core::types::DbId;
use canopy_db::models::page::{PageCrumb, PageRef, PageSummary};
use canopy_db::repositories::PageRepo;
use sqlx::PgConnection;

use crate::error::{page_not_found, WikiResult};
use crate::wiki::Wiki;

/// Ensure every ancestor of `page_slug` exists, root first.
///
/// Returns the id of the immediate parent, or `None` for a root slug.
/// Safe to repeat and safe against a concurrent creator of the same
/// ancestor: the insert is `ON CONFLICT DO NOTHING` followed by a lookup.
pub(crate) async fn ensure_ancestors_in(
    conn: &mut PgConnection,
    author_id: DbId,
    page_slug: &str,
) -> WikiResult<Option<DbId>> {
    let mut parent_id = None;
    for prefix in slug::ancestor_prefixes(page_slug) {
        let title = slug::humanize_segment(slug::last_segment(prefix));
        let inserted =
            PageRepo::insert_placeholder(&mut *conn, prefix, &title, author_id, parent_id).await?;
        let id = match inserted {
            Some(id) => {
                tracing::info!(
                    user_id = author_id,
                    page_id = id,
                    slug = %prefix,
                    "Placeholder ancestor created"
                );
                id
            }
            None => {
                PageRepo::find_ref_by_slug(&mut *conn, prefix)
                    .await?
                    .ok_or_else(|| CoreError::NotFoundByKey {
                        entity: "page",
                        key: prefix.to_string(),
                    })?
                    .id
            }
        };
        parent_id = Some(id);
    }
    Ok(parent_id)
}

impl Wiki {
    /// Materialize the ancestor chain of `page_slug` in its own transaction.
    pub async fn ensure_ancestors(
        &self,
        author_id: DbId,
        page_slug: &str,
    ) -> WikiResult<Option<DbId>> {
        let normalized = slug::normalize(page_slug);
        let mut tx = self.pool.begin().await?;
        let parent = ensure_ancestors_in(&mut *tx, author_id, &normalized).await?;
        tx.commit().await?;
        Ok(parent)
    }

    /// Every page below `page_id`; never includes the page itself.
    pub async fn descendants_of(&self, page_id: DbId) -> WikiResult<Vec<PageRef>> {
        Ok(PageRepo::descendants(&self.pool, page_id).await?)
    }

    /// Breadcrumbs from the root down to `page_id`, inclusive.
    pub async fn path_to(&self, page_id: DbId) -> WikiResult<Vec<PageCrumb>> {
        let path = PageRepo::path_to(&self.pool, page_id).await?;
        if path.is_empty() {
            return Err(page_not_found(page_id));
        }
        Ok(path)
    }

    /// Whether the page at `page_slug` sits strictly below `ancestor_id`.
    pub async fn is_descendant(&self, ancestor_id: DbId, page_slug: &str) -> WikiResult<bool> {
        Ok(PageRepo::is_descendant(&self.pool, ancestor_id, page_slug).await?)
    }

    pub async fn list_children(
        &self,
        page_id: DbId,
        published_only: bool,
    ) -> WikiResult<Vec<PageSummary>> {
        Ok(PageRepo::list_children(&self.pool, page_id, published_only).await?)
    }

    pub async fn list_roots(&self, published_only: bool) -> WikiResult<Vec<PageSummary>> {
        Ok(PageRepo::list_roots(&self.pool, published_only).await?)
    }

    /// Nested navigation tree.
    pub async fn tree(&self, published_only: bool) -> WikiResult<Vec<TreeNode>> {
        let nodes = PageRepo::all_nodes(&self.pool, published_only).await?;
        let graph = PageGraph::new(nodes.into_iter().map(Into::into));
        Ok(graph.tree())
    }

    /// Compare every page's slug with its live parent chain.
    pub async fn check_consistency(&self) -> WikiResult<Vec<HierarchyViolation>> {
        let nodes = PageRepo::all_nodes(&self.pool, false).await?;
        let graph = PageGraph::new(nodes.into_iter().map(Into::into));
        let violations = graph.check_consistency();
        if !violations.is_empty() {
            tracing::warn!(count = violations.len(), "Page hierarchy inconsistencies found");
        }
        Ok(violations)
    }
}
