use std::sync::Arc;

use canopy_core::backup::{BackupMirror, DisabledBackupMirror};
use canopy_core::error::CoreError;
use canopy_core::markdown::{CmarkRenderer, MarkdownRenderer, RenderedMarkdown};
use canopy_core::roles;
use canopy_core::search::{SearchIndexer, SearchStrategy};
use canopy_core::types::DbId;
use canopy_db::search_indexer::PgSearchIndexer;
use sqlx::PgPool;

use crate::access_recorder::AccessSink;
use crate::error::{WikiError, WikiResult};

/// The authenticated caller of a service operation.
#[derive(Debug, Clone)]
pub struct Actor {
    pub user_id: DbId,
    pub role: String,
}

impl Actor {
    pub fn new(user_id: DbId, role: impl Into<String>) -> Self {
        Self {
            user_id,
            role: role.into(),
        }
    }

    pub fn is_admin(&self) -> bool {
        roles::is_admin(&self.role)
    }
}

/// Handle to the wiki services. Cheap to clone.
#[derive(Clone)]
pub struct Wiki {
    pub(crate) pool: PgPool,
    pub(crate) renderer: Arc<dyn MarkdownRenderer>,
    pub(crate) indexer: Arc<dyn SearchIndexer>,
    pub(crate) mirror: Arc<dyn BackupMirror>,
    pub(crate) access: AccessSink,
    pub(crate) search_strategy: SearchStrategy,
}

impl Wiki {
    /// Defaults: pulldown-cmark rendering, Postgres full-text indexing,
    /// no backup mirror, inline access recording, substring search.
    pub fn new(pool: PgPool) -> Self {
        Self {
            indexer: Arc::new(PgSearchIndexer::new(pool.clone())),
            pool,
            renderer: Arc::new(CmarkRenderer::default()),
            mirror: Arc::new(DisabledBackupMirror),
            access: AccessSink::Inline,
            search_strategy: SearchStrategy::default(),
        }
    }

    pub fn with_renderer(mut self, renderer: Arc<dyn MarkdownRenderer>) -> Self {
        self.renderer = renderer;
        self
    }

    pub fn with_indexer(mut self, indexer: Arc<dyn SearchIndexer>) -> Self {
        self.indexer = indexer;
        self
    }

    pub fn with_mirror(mut self, mirror: Arc<dyn BackupMirror>) -> Self {
        self.mirror = mirror;
        self
    }

    pub fn with_access_sink(mut self, access: AccessSink) -> Self {
        self.access = access;
        self
    }

    pub fn with_search_strategy(mut self, strategy: SearchStrategy) -> Self {
        self.search_strategy = strategy;
        self
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub fn search_strategy(&self) -> SearchStrategy {
        self.search_strategy
    }

    /// Render markdown for a stored page.
    ///
    /// A renderer failure aborts the write as `ContentUnavailable`.
    /// Placeholder ancestors never come through here; they store empty HTML.
    pub(crate) fn render(&self, markdown: &str) -> WikiResult<RenderedMarkdown> {
        if markdown.is_empty() {
            return Ok(RenderedMarkdown::default());
        }
        self.renderer.render(markdown).map_err(|e| {
            tracing::warn!(error = %e, "Markdown render failed");
            WikiError::from(CoreError::ContentUnavailable(e.to_string()))
        })
    }

    /// Refresh the search index for a page after commit.
    pub(crate) async fn reindex(&self, page_id: DbId, title: &str, content: &str) {
        if let Err(e) = self.indexer.reindex(page_id, title, content).await {
            tracing::warn!(error = %e, page_id, "Search reindex failed");
        }
    }
}
