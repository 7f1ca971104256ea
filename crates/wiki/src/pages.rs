//! Page store operations.
//!
//! Writes are transactional: the page row, its placeholder ancestors, its
//! revision snapshot, its tags and any rename cascade commit together.
//! Rendering happens before the transaction opens; reindexing and the
//! backup mirror run after it commits.

use canopy_core::error::CoreError;
use canopy_core::hierarchy::PageGraph;
use canopy_core::markdown::TocEntry;
use canopy_core::page::{normalize_tags, resolve_slug, validate_content, validate_title, SlugChange};
use canopy_core::revision::{edit_comment, INITIAL_REVISION_COMMENT};
use canopy_core::types::DbId;
use canopy_db::models::page::{
    CreatePage, NewPage, Page, PageChanges, PageCrumb, PageFilter, PageRef, PageSummary, UpdatePage,
};
use canopy_db::repositories::{PageRepo, RevisionRepo, TagRepo};
use serde::Serialize;

use crate::cascade;
use crate::error::{page_not_found, slug_conflict_or_storage, WikiResult};
use crate::hierarchy::ensure_ancestors_in;
use crate::wiki::Wiki;

/// Outcome of an update: the saved page and every descendant slug rewrite.
#[derive(Debug, Clone, Serialize)]
pub struct UpdateOutcome {
    pub page: Page,
    pub slug_changes: Vec<SlugChange>,
}

/// A page with everything a reader view needs.
#[derive(Debug, Clone, Serialize)]
pub struct PageDetail {
    #[serde(flatten)]
    pub page: Page,
    pub tags: Vec<String>,
    pub breadcrumbs: Vec<PageCrumb>,
    pub toc: Vec<TocEntry>,
}

impl Wiki {
    /// Create a page.
    ///
    /// The slug is derived from the title when absent. Missing ancestors of
    /// a hierarchical slug are created first, and exactly one initial
    /// revision is recorded.
    pub async fn create_page(&self, author_id: DbId, input: &CreatePage) -> WikiResult<Page> {
        let title = validate_title(&input.title)?;
        let page_slug = resolve_slug(input.slug.as_deref(), &title)?;
        validate_content(&input.content)?;
        let tags = normalize_tags(&input.tags)?;
        let rendered = self.render(&input.content)?;

        let mut tx = self.pool.begin().await?;
        if PageRepo::slug_taken(&mut *tx, &page_slug, None).await? {
            return Err(CoreError::SlugConflict { slug: page_slug }.into());
        }
        let parent_id = ensure_ancestors_in(&mut *tx, author_id, &page_slug).await?;

        let page = PageRepo::insert(
            &mut *tx,
            &NewPage {
                slug: page_slug.clone(),
                title,
                content: input.content.clone(),
                content_html: rendered.html,
                author_id,
                parent_id,
                is_published: input.is_published.unwrap_or(false),
            },
        )
        .await
        .map_err(|e| slug_conflict_or_storage(e, &page_slug))?;

        RevisionRepo::create(&mut *tx, page.id, &page.content, author_id, INITIAL_REVISION_COMMENT)
            .await?;
        if !tags.is_empty() {
            TagRepo::replace_for_page(&mut *tx, page.id, &tags).await?;
        }
        tx.commit().await?;

        tracing::info!(user_id = author_id, page_id = page.id, slug = %page.slug, "Page created");

        self.reindex(page.id, &page.title, &page.content).await;
        self.mirror_save(&page).await;
        Ok(page)
    }

    /// Apply a partial update.
    ///
    /// A content change first appends the pre-change content to the
    /// revision ledger. A slug change runs the rename cascade and reports
    /// every rewritten descendant.
    pub async fn update_page(
        &self,
        page_id: DbId,
        author_id: DbId,
        input: &UpdatePage,
    ) -> WikiResult<UpdateOutcome> {
        let new_title = input.title.as_deref().map(validate_title).transpose()?;
        if let Some(content) = &input.content {
            validate_content(content)?;
        }
        let tags = input.tags.as_deref().map(normalize_tags).transpose()?;
        let rendered = input
            .content
            .as_deref()
            .map(|c| self.render(c))
            .transpose()?;

        let mut tx = self.pool.begin().await?;
        let current = PageRepo::find_by_id_for_update(&mut *tx, page_id)
            .await?
            .ok_or_else(|| page_not_found(page_id))?;

        let mut changes = PageChanges {
            title: new_title,
            is_published: input.is_published,
            ..Default::default()
        };

        let content_changed = input
            .content
            .as_ref()
            .is_some_and(|content| *content != current.content);
        if content_changed {
            RevisionRepo::create(
                &mut *tx,
                page_id,
                &current.content,
                author_id,
                &edit_comment(input.comment.as_deref()),
            )
            .await?;
            changes.content = input.content.clone();
            changes.content_html = rendered.map(|r| r.html);
        }

        // A blank slug on update means "keep the current one".
        let requested_slug = input
            .slug
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty());
        let mut slug_changes = Vec::new();
        if let Some(requested) = requested_slug {
            let title_source = changes.title.as_deref().unwrap_or(&current.title);
            let new_slug = resolve_slug(Some(requested), title_source)?;
            if new_slug != current.slug {
                let plan =
                    cascade::rename(&mut *tx, page_id, author_id, &current.slug, &new_slug).await?;
                slug_changes = plan.changes;
                changes.parent_id = Some(plan.parent_id);
                changes.slug = Some(new_slug);
            }
        }

        let conflict_slug = changes.slug.clone().unwrap_or_else(|| current.slug.clone());
        let page = PageRepo::update(&mut *tx, page_id, &changes)
            .await
            .map_err(|e| slug_conflict_or_storage(e, &conflict_slug))?
            .ok_or_else(|| page_not_found(page_id))?;

        if let Some(tags) = &tags {
            TagRepo::replace_for_page(&mut *tx, page_id, tags).await?;
        }
        tx.commit().await?;

        tracing::info!(
            user_id = author_id,
            page_id,
            slug = %page.slug,
            content_changed,
            cascaded = slug_changes.len(),
            "Page updated"
        );

        if content_changed || page.title != current.title {
            self.reindex(page.id, &page.title, &page.content).await;
        }
        if page.slug != current.slug {
            self.mirror_remove(&current.slug).await;
            self.mirror_slug_changes(&slug_changes).await;
        }
        self.mirror_save(&page).await;

        Ok(UpdateOutcome { page, slug_changes })
    }

    /// Hard-delete a single page. Children keep their rows with a `NULL`
    /// parent; use [`Wiki::delete_tree`] to remove a subtree.
    pub async fn delete_page(&self, page_id: DbId) -> WikiResult<()> {
        let page = PageRepo::find_by_id(&self.pool, page_id)
            .await?
            .ok_or_else(|| page_not_found(page_id))?;
        PageRepo::delete(&self.pool, page_id).await?;
        tracing::info!(page_id, slug = %page.slug, "Page deleted");
        self.mirror_remove(&page.slug).await;
        Ok(())
    }

    /// Delete several pages atomically. Pass children before parents.
    pub async fn delete_many(&self, ids: &[DbId]) -> WikiResult<u64> {
        let mut slugs = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(page) = PageRepo::find_by_id(&self.pool, *id).await? {
                slugs.push(page.slug);
            }
        }
        let removed = PageRepo::delete_many(&self.pool, ids).await?;
        tracing::info!(requested = ids.len(), removed, "Pages deleted");
        for slug in &slugs {
            self.mirror_remove(slug).await;
        }
        Ok(removed)
    }

    /// Delete a page and its whole subtree, children first.
    ///
    /// Returns the removed pages in deletion order.
    pub async fn delete_tree(&self, page_id: DbId) -> WikiResult<Vec<PageRef>> {
        let nodes = PageRepo::subtree_nodes(&self.pool, page_id).await?;
        if nodes.is_empty() {
            return Err(page_not_found(page_id));
        }
        let graph = PageGraph::new(nodes.into_iter().map(Into::into));
        let order = graph.delete_order(page_id);
        let removed: Vec<PageRef> = order
            .iter()
            .filter_map(|id| graph.get(*id))
            .map(|n| PageRef {
                id: n.id,
                slug: n.slug.clone(),
            })
            .collect();

        PageRepo::delete_many(&self.pool, &order).await?;
        tracing::info!(page_id, removed = removed.len(), "Page tree deleted");

        for page in &removed {
            self.mirror_remove(&page.slug).await;
        }
        Ok(removed)
    }

    /// Case-insensitive slug lookup. Absence is `Ok(None)`.
    pub async fn get_page(&self, page_slug: &str) -> WikiResult<Option<Page>> {
        Ok(PageRepo::find_by_slug(&self.pool, page_slug).await?)
    }

    pub async fn get_page_by_id(&self, page_id: DbId) -> WikiResult<Option<Page>> {
        Ok(PageRepo::find_by_id(&self.pool, page_id).await?)
    }

    /// A page with tags, breadcrumbs and table of contents.
    pub async fn get_page_detail(&self, page_slug: &str) -> WikiResult<Option<PageDetail>> {
        let Some(page) = PageRepo::find_by_slug(&self.pool, page_slug).await? else {
            return Ok(None);
        };
        Ok(Some(self.detail_for(page).await?))
    }

    pub async fn get_page_detail_by_id(&self, page_id: DbId) -> WikiResult<Option<PageDetail>> {
        let Some(page) = PageRepo::find_by_id(&self.pool, page_id).await? else {
            return Ok(None);
        };
        Ok(Some(self.detail_for(page).await?))
    }

    async fn detail_for(&self, page: Page) -> WikiResult<PageDetail> {
        let tags = TagRepo::names_for_page(&self.pool, page.id).await?;
        let breadcrumbs = PageRepo::path_to(&self.pool, page.id).await?;
        let toc = self.render(&page.content)?.toc;
        Ok(PageDetail {
            page,
            tags,
            breadcrumbs,
            toc,
        })
    }

    /// Filtered, paginated page listing.
    pub async fn list_pages(&self, filter: &PageFilter) -> WikiResult<Vec<PageSummary>> {
        Ok(PageRepo::list(&self.pool, filter).await?)
    }

    /// Tags on one page.
    pub async fn page_tags(&self, page_id: DbId) -> WikiResult<Vec<String>> {
        Ok(TagRepo::names_for_page(&self.pool, page_id).await?)
    }
}
