//! Backlinks: which pages point at a page through `[[wiki links]]`.

use canopy_core::markdown::wiki_link_targets;
use canopy_core::types::DbId;
use canopy_db::models::page::PageCrumb;
use canopy_db::repositories::PageRepo;

use crate::error::{page_not_found, WikiResult};
use crate::wiki::Wiki;

impl Wiki {
    /// Published pages whose content links to `page_id`, by title.
    ///
    /// Link targets are matched after slug normalization, so
    /// `[[Linux/Ubuntu]]` and `[[linux/ubuntu|Ubuntu]]` both count. A page
    /// never appears as its own backlink.
    pub async fn backlinks(&self, page_id: DbId) -> WikiResult<Vec<PageCrumb>> {
        let page = PageRepo::find_by_id(&self.pool, page_id)
            .await?
            .ok_or_else(|| page_not_found(page_id))?;
        let target = page.slug.to_lowercase();

        let sources = PageRepo::link_sources(&self.pool, page_id).await?;
        let linking = sources
            .into_iter()
            .filter(|source| wiki_link_targets(&source.content).contains(&target))
            .map(|source| PageCrumb {
                id: source.id,
                slug: source.slug,
                title: source.title,
            })
            .collect();
        Ok(linking)
    }
}
