//! Markdown file mirror of wiki pages.
//!
//! Every saved page can be mirrored to `<root>/<ancestor segments>/<last>.md`
//! with a YAML frontmatter header. The mirror is a best-effort side channel:
//! callers log failures and carry on.

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::error::CoreError;
use crate::slug;
use crate::types::{DbId, Timestamp};

/// Characters replaced by `-` when a slug segment becomes a file name.
const UNSAFE_FILENAME_CHARS: &[char] = &['/', '\\', '<', '>', ':', '"', '|', '?', '*'];

/// Snapshot of a page as written to the mirror.
#[derive(Debug, Clone)]
pub struct BackupDocument {
    pub slug: String,
    pub title: String,
    pub content: String,
    pub tags: Vec<String>,
    pub parent_id: Option<DbId>,
    pub is_published: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    pub published_at: Option<Timestamp>,
}

#[async_trait]
pub trait BackupMirror: Send + Sync {
    /// `false` lets callers skip gathering document data entirely.
    fn is_enabled(&self) -> bool {
        true
    }

    /// Write (or overwrite) the mirror file for `doc`.
    async fn save(
        &self,
        doc: &BackupDocument,
        author_display_name: &str,
        ancestor_segments: &[String],
    ) -> Result<(), CoreError>;

    /// Remove the mirror file for `slug`. A missing file is not an error.
    async fn remove(&self, slug: &str, ancestor_segments: &[String]) -> Result<(), CoreError>;
}

/// Mirror used when backups are turned off.
#[derive(Debug, Default, Clone, Copy)]
pub struct DisabledBackupMirror;

#[async_trait]
impl BackupMirror for DisabledBackupMirror {
    fn is_enabled(&self) -> bool {
        false
    }

    async fn save(&self, _: &BackupDocument, _: &str, _: &[String]) -> Result<(), CoreError> {
        Ok(())
    }

    async fn remove(&self, _: &str, _: &[String]) -> Result<(), CoreError> {
        Ok(())
    }
}

/// Filesystem mirror rooted at a directory.
#[derive(Debug, Clone)]
pub struct FsBackupMirror {
    root: PathBuf,
}

impl FsBackupMirror {
    /// Create the mirror, making sure the root directory exists.
    pub async fn new(root: impl Into<PathBuf>) -> Result<Self, CoreError> {
        let root = root.into();
        tokio::fs::create_dir_all(&root)
            .await
            .map_err(|e| io_error("create backup directory", &root, e))?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory holding the file for a page with these ancestors.
    pub fn dir_for(&self, ancestor_segments: &[String]) -> PathBuf {
        ancestor_segments
            .iter()
            .fold(self.root.clone(), |dir, seg| dir.join(sanitize_filename(seg)))
    }

    /// Full path of the mirror file for `page_slug`.
    pub fn path_for(&self, page_slug: &str, ancestor_segments: &[String]) -> PathBuf {
        let name = sanitize_filename(slug::last_segment(page_slug));
        self.dir_for(ancestor_segments).join(format!("{name}.md"))
    }

    /// Remove empty directories from `dir` upward, stopping at the root.
    async fn prune_empty_dirs(&self, mut dir: PathBuf) {
        while dir != self.root && dir.starts_with(&self.root) {
            let Ok(mut entries) = tokio::fs::read_dir(&dir).await else {
                break;
            };
            match entries.next_entry().await {
                Ok(None) => {}
                _ => break,
            }
            if tokio::fs::remove_dir(&dir).await.is_err() {
                break;
            }
            tracing::debug!(dir = %dir.display(), "Pruned empty backup directory");
            if !dir.pop() {
                break;
            }
        }
    }
}

#[async_trait]
impl BackupMirror for FsBackupMirror {
    async fn save(
        &self,
        doc: &BackupDocument,
        author_display_name: &str,
        ancestor_segments: &[String],
    ) -> Result<(), CoreError> {
        let dir = self.dir_for(ancestor_segments);
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| io_error("create backup directory", &dir, e))?;

        let path = self.path_for(&doc.slug, ancestor_segments);
        let body = render_document(doc, author_display_name);
        tokio::fs::write(&path, body)
            .await
            .map_err(|e| io_error("write backup file", &path, e))?;
        Ok(())
    }

    async fn remove(&self, page_slug: &str, ancestor_segments: &[String]) -> Result<(), CoreError> {
        let path = self.path_for(page_slug, ancestor_segments);
        match tokio::fs::remove_file(&path).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(io_error("delete backup file", &path, e)),
        }
        self.prune_empty_dirs(self.dir_for(ancestor_segments)).await;
        Ok(())
    }
}

fn io_error(action: &str, path: &Path, err: std::io::Error) -> CoreError {
    CoreError::Internal(format!("Failed to {action} {}: {err}", path.display()))
}

/// Make a slug segment safe to use as a file or directory name.
pub fn sanitize_filename(segment: &str) -> String {
    segment
        .chars()
        .map(|c| if UNSAFE_FILENAME_CHARS.contains(&c) { '-' } else { c })
        .collect()
}

/// Frontmatter header followed by the raw markdown.
pub fn render_document(doc: &BackupDocument, author_display_name: &str) -> String {
    let mut out = String::with_capacity(doc.content.len() + 256);
    out.push_str("---\n");
    out.push_str(&format!("title: {:?}\n", doc.title));
    out.push_str(&format!("slug: {:?}\n", doc.slug));
    out.push_str(&format!("author: {author_display_name:?}\n"));
    if !doc.tags.is_empty() {
        let quoted: Vec<String> = doc.tags.iter().map(|t| format!("{t:?}")).collect();
        out.push_str(&format!("tags: [{}]\n", quoted.join(", ")));
    }
    if let Some(parent_id) = doc.parent_id {
        out.push_str(&format!("parent_id: {parent_id}\n"));
    }
    out.push_str(&format!("created_at: {}\n", doc.created_at.to_rfc3339()));
    out.push_str(&format!("updated_at: {}\n", doc.updated_at.to_rfc3339()));
    if let Some(published_at) = doc.published_at {
        out.push_str(&format!("published_at: {}\n", published_at.to_rfc3339()));
    }
    out.push_str(&format!("published: {}\n", doc.is_published));
    out.push_str("---\n\n");
    out.push_str(&doc.content);
    out
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
