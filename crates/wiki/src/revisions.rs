//! Revision ledger operations.

use canopy_core::error::CoreError;
use canopy_core::revision::{compute_line_diff, revert_comment, DiffLine};
use canopy_core::types::DbId;
use canopy_db::models::page::UpdatePage;
use canopy_db::models::revision::{Revision, RevisionSummary};
use canopy_db::repositories::{PageRepo, RevisionRepo};
use serde::Serialize;

use crate::error::{page_not_found, WikiResult};
use crate::pages::UpdateOutcome;
use crate::wiki::Wiki;

/// Line diff from a revision to the page's current content.
#[derive(Debug, Clone, Serialize)]
pub struct RevisionDiff {
    pub revision_id: DbId,
    pub page_id: DbId,
    pub lines: Vec<DiffLine>,
}

fn revision_not_found(id: DbId) -> CoreError {
    CoreError::NotFound {
        entity: "revision",
        id,
    }
}

impl Wiki {
    /// Append a snapshot to a page's history.
    pub async fn record_revision(
        &self,
        page_id: DbId,
        snapshot: &str,
        author_id: DbId,
        comment: &str,
    ) -> WikiResult<Revision> {
        Ok(RevisionRepo::create(&self.pool, page_id, snapshot, author_id, comment).await?)
    }

    /// History of a page, newest first.
    pub async fn list_revisions(
        &self,
        page_id: DbId,
        limit: i64,
        offset: i64,
    ) -> WikiResult<Vec<RevisionSummary>> {
        if PageRepo::find_by_id(&self.pool, page_id).await?.is_none() {
            return Err(page_not_found(page_id));
        }
        Ok(RevisionRepo::list_for_page(&self.pool, page_id, limit, offset).await?)
    }

    pub async fn get_revision(&self, revision_id: DbId) -> WikiResult<Option<Revision>> {
        Ok(RevisionRepo::find_by_id(&self.pool, revision_id).await?)
    }

    /// Restore a revision's content through a normal update, so the content
    /// being abandoned is itself recorded.
    pub async fn revert_to_revision(
        &self,
        revision_id: DbId,
        author_id: DbId,
    ) -> WikiResult<UpdateOutcome> {
        let revision = RevisionRepo::find_by_id(&self.pool, revision_id)
            .await?
            .ok_or_else(|| revision_not_found(revision_id))?;

        let outcome = self
            .update_page(
                revision.page_id,
                author_id,
                &UpdatePage {
                    content: Some(revision.content),
                    comment: Some(revert_comment(revision.id)),
                    ..Default::default()
                },
            )
            .await?;
        tracing::info!(
            user_id = author_id,
            page_id = revision.page_id,
            revision_id,
            "Page reverted"
        );
        Ok(outcome)
    }

    /// Diff a revision against the page as it is now.
    pub async fn diff_revision(&self, revision_id: DbId) -> WikiResult<RevisionDiff> {
        let revision = RevisionRepo::find_by_id(&self.pool, revision_id)
            .await?
            .ok_or_else(|| revision_not_found(revision_id))?;
        let page = PageRepo::find_by_id(&self.pool, revision.page_id)
            .await?
            .ok_or_else(|| page_not_found(revision.page_id))?;
        Ok(RevisionDiff {
            revision_id,
            page_id: page.id,
            lines: compute_line_diff(&revision.content, &page.content),
        })
    }
}
