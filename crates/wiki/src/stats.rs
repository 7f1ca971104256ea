//! Wiki-wide counters.

use canopy_db::repositories::{PageRepo, TagRepo, UserRepo};
use serde::Serialize;

use crate::error::WikiResult;
use crate::wiki::Wiki;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WikiStats {
    pub page_count: i64,
    pub published_page_count: i64,
    pub user_count: i64,
    /// Tags attached to at least one page.
    pub tag_count: i64,
}

impl Wiki {
    pub async fn stats(&self) -> WikiResult<WikiStats> {
        let pages = PageRepo::counts(&self.pool).await?;
        let user_count = UserRepo::count(&self.pool).await?;
        let tag_count = TagRepo::count_in_use(&self.pool).await?;
        Ok(WikiStats {
            page_count: pages.total,
            published_page_count: pages.published,
            user_count,
            tag_count,
        })
    }
}
