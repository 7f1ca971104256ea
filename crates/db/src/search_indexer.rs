//! PostgreSQL-backed [`SearchIndexer`].

use async_trait::async_trait;
use canopy_core::error::CoreError;
use canopy_core::search::SearchIndexer;
use canopy_core::types::DbId;
use sqlx::PgPool;

use crate::repositories::PageRepo;

/// Maintains `pages.search_vector`.
#[derive(Debug, Clone)]
pub struct PgSearchIndexer {
    pool: PgPool,
}

impl PgSearchIndexer {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SearchIndexer for PgSearchIndexer {
    async fn reindex(&self, page_id: DbId, title: &str, content: &str) -> Result<(), CoreError> {
        PageRepo::update_search_vector(&self.pool, page_id, title, content)
            .await
            .map_err(|e| CoreError::Internal(format!("search index update failed: {e}")))
    }
}
