//! Page creation from uploaded markdown files.

use canopy_core::import::parse_markdown_file;
use canopy_core::types::DbId;
use canopy_db::models::page::{CreatePage, Page};

use crate::error::WikiResult;
use crate::wiki::Wiki;

impl Wiki {
    /// Create a page from a markdown file with optional frontmatter.
    ///
    /// Goes through [`Wiki::create_page`], so slug normalization, ancestor
    /// placeholders and the initial revision apply as usual.
    pub async fn import_markdown(
        &self,
        author_id: DbId,
        filename: &str,
        content: &str,
        is_published: bool,
    ) -> WikiResult<Page> {
        let parsed = parse_markdown_file(content, filename);
        let input = CreatePage {
            slug: parsed.slug,
            title: parsed.title,
            content: parsed.body,
            is_published: Some(is_published),
            tags: parsed.tags,
        };
        let page = self.create_page(author_id, &input).await?;
        tracing::info!(user_id = author_id, page_id = page.id, filename, "Markdown file imported");
        Ok(page)
    }
}
