//! Backup mirror fan-out.
//!
//! After a committed write the mirror sees the primary page once and every
//! rewritten descendant once. Failures are logged and never surface.

use canopy_core::backup::BackupDocument;
use canopy_core::page::SlugChange;
use canopy_core::slug;
use canopy_db::models::page::Page;
use canopy_db::repositories::{PageRepo, TagRepo, UserRepo};

use crate::wiki::Wiki;

fn ancestor_segments(page_slug: &str) -> Vec<String> {
    slug::ancestor_segments(page_slug)
        .into_iter()
        .map(str::to_string)
        .collect()
}

impl Wiki {
    /// Write the mirror file for a page.
    pub(crate) async fn mirror_save(&self, page: &Page) {
        if !self.mirror.is_enabled() {
            return;
        }
        let author = match UserRepo::display_name(&self.pool, page.author_id).await {
            Ok(name) => name.unwrap_or_default(),
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    page_id = page.id,
                    "Backup skipped: author lookup failed"
                );
                return;
            }
        };
        let tags = match TagRepo::names_for_page(&self.pool, page.id).await {
            Ok(tags) => tags,
            Err(e) => {
                tracing::warn!(error = %e, page_id = page.id, "Backup skipped: tag lookup failed");
                return;
            }
        };
        let doc = BackupDocument {
            slug: page.slug.clone(),
            title: page.title.clone(),
            content: page.content.clone(),
            tags,
            parent_id: page.parent_id,
            is_published: page.is_published,
            created_at: page.created_at,
            updated_at: page.updated_at,
            published_at: page.published_at,
        };
        if let Err(e) = self
            .mirror
            .save(&doc, &author, &ancestor_segments(&page.slug))
            .await
        {
            tracing::warn!(error = %e, page_id = page.id, slug = %page.slug, "Backup save failed");
        }
    }

    /// Remove the mirror file for a slug.
    pub(crate) async fn mirror_remove(&self, page_slug: &str) {
        if !self.mirror.is_enabled() {
            return;
        }
        if let Err(e) = self
            .mirror
            .remove(page_slug, &ancestor_segments(page_slug))
            .await
        {
            tracing::warn!(error = %e, slug = %page_slug, "Backup remove failed");
        }
    }

    /// Relocate the mirror files of every rewritten descendant.
    pub(crate) async fn mirror_slug_changes(&self, changes: &[SlugChange]) {
        if !self.mirror.is_enabled() {
            return;
        }
        for change in changes {
            self.mirror_remove(&change.old_slug).await;
            match PageRepo::find_by_slug(&self.pool, &change.new_slug).await {
                Ok(Some(page)) => self.mirror_save(&page).await,
                Ok(None) => {}
                Err(e) => {
                    tracing::warn!(
                        error = %e,
                        slug = %change.new_slug,
                        "Backup relocation lookup failed"
                    )
                }
            }
        }
    }
}
