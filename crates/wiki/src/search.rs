//! Search and tag listings.

use canopy_core::search::{
    build_prefix_tsquery, clamp_limit, like_pattern, SearchStrategy, DEFAULT_SEARCH_LIMIT,
    MAX_SEARCH_LIMIT,
};
use canopy_db::models::page::SearchHit;
use canopy_db::models::tag::TagWithCount;
use canopy_db::repositories::{PageRepo, TagRepo};

use crate::error::WikiResult;
use crate::wiki::Wiki;

impl Wiki {
    /// Search published pages.
    ///
    /// `strategy` falls back to the configured default. A blank query
    /// yields no hits.
    pub async fn search(
        &self,
        query: &str,
        limit: Option<i64>,
        strategy: Option<SearchStrategy>,
    ) -> WikiResult<Vec<SearchHit>> {
        let limit = clamp_limit(limit, DEFAULT_SEARCH_LIMIT, MAX_SEARCH_LIMIT);
        let hits = match strategy.unwrap_or(self.search_strategy) {
            SearchStrategy::Substring => match like_pattern(query) {
                Some(pattern) => PageRepo::search_substring(&self.pool, &pattern, limit).await?,
                None => Vec::new(),
            },
            SearchStrategy::FullText => match build_prefix_tsquery(query) {
                Some(tsquery) => PageRepo::search_fulltext(&self.pool, &tsquery, limit).await?,
                None => Vec::new(),
            },
        };
        tracing::debug!(query, hits = hits.len(), "Search executed");
        Ok(hits)
    }

    /// Tags in use on published pages, with counts.
    pub async fn list_tags(&self) -> WikiResult<Vec<TagWithCount>> {
        Ok(TagRepo::list_with_counts(&self.pool).await?)
    }
}
