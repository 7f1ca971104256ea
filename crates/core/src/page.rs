//! Page field validation, tag normalization, and listing excerpts.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::error::CoreError;
use crate::slug;

// ---------------------------------------------------------------------------
// Limits
// ---------------------------------------------------------------------------

/// Maximum page title length in characters.
pub const MAX_TITLE_LENGTH: usize = 500;

/// Maximum normalized slug length in bytes.
pub const MAX_SLUG_LENGTH: usize = 200;

/// Maximum markdown content size in bytes (1 MB).
pub const MAX_CONTENT_LENGTH: usize = 1_000_000;

/// Maximum number of tags on one page.
pub const MAX_TAGS_PER_PAGE: usize = 20;

/// Maximum tag name length in characters.
pub const MAX_TAG_LENGTH: usize = 50;

/// Number of raw content characters considered when building an excerpt.
pub const EXCERPT_SOURCE_CHARS: usize = 200;

/// Target excerpt length before the ellipsis.
pub const EXCERPT_LENGTH: usize = 150;

// ---------------------------------------------------------------------------
// Slug change report
// ---------------------------------------------------------------------------

/// One slug rewrite produced by a rename.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SlugChange {
    pub old_slug: String,
    pub new_slug: String,
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Normalize a requested slug, falling back to the title when empty.
///
/// Fails with [`CoreError::InvalidSlug`] when normalization leaves nothing,
/// or with a validation error when the result is too long.
pub fn resolve_slug(requested: Option<&str>, title: &str) -> Result<String, CoreError> {
    let source = match requested.map(str::trim) {
        Some(s) if !s.is_empty() => s,
        _ => title,
    };
    let normalized = slug::normalize(source);
    if normalized.is_empty() {
        return Err(CoreError::InvalidSlug {
            input: source.to_string(),
        });
    }
    validate_slug_length(&normalized)?;
    Ok(normalized)
}

/// Reject slugs longer than [`MAX_SLUG_LENGTH`].
pub fn validate_slug_length(slug: &str) -> Result<(), CoreError> {
    if slug.len() > MAX_SLUG_LENGTH {
        return Err(CoreError::Validation(format!(
            "slug: must be at most {MAX_SLUG_LENGTH} characters"
        )));
    }
    Ok(())
}

/// Validate a page title and return it trimmed.
pub fn validate_title(title: &str) -> Result<String, CoreError> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return Err(CoreError::InvalidTitle);
    }
    if trimmed.chars().count() > MAX_TITLE_LENGTH {
        return Err(CoreError::Validation(format!(
            "title: must be at most {MAX_TITLE_LENGTH} characters"
        )));
    }
    Ok(trimmed.to_string())
}

/// Validate markdown content size.
pub fn validate_content(content: &str) -> Result<(), CoreError> {
    if content.len() > MAX_CONTENT_LENGTH {
        return Err(CoreError::Validation("content: must be at most 1MB".into()));
    }
    Ok(())
}

/// Trim, de-duplicate (case-insensitively) and validate a tag list.
///
/// Empty entries are dropped. Order of first occurrence is preserved.
pub fn normalize_tags(tags: &[String]) -> Result<Vec<String>, CoreError> {
    let mut seen = std::collections::HashSet::new();
    let mut out = Vec::with_capacity(tags.len());
    for tag in tags {
        let tag = tag.trim();
        if tag.is_empty() {
            continue;
        }
        if tag.chars().count() > MAX_TAG_LENGTH {
            return Err(CoreError::Validation(format!(
                "tags: each tag must be at most {MAX_TAG_LENGTH} characters"
            )));
        }
        if seen.insert(tag.to_lowercase()) {
            out.push(tag.to_string());
        }
    }
    if out.len() > MAX_TAGS_PER_PAGE {
        return Err(CoreError::Validation(format!(
            "tags: at most {MAX_TAGS_PER_PAGE} tags are allowed"
        )));
    }
    Ok(out)
}

// ---------------------------------------------------------------------------
// Excerpts
// ---------------------------------------------------------------------------

static LINK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[([^\]]+)\]\([^)]+\)").expect("valid regex"));
static BOLD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*\*([^*]+)\*\*").expect("valid regex"));
static ITALIC_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*([^*]+)\*").expect("valid regex"));
static CODE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"`[^`]+`").expect("valid regex"));

/// Build a short plain-text excerpt from raw markdown for page listings.
///
/// Headings and blank lines are skipped, inline links keep their label,
/// emphasis markers are removed and inline code is dropped. Long excerpts
/// are cut at a word boundary and end with `...`.
pub fn clean_excerpt(markdown: &str) -> String {
    let source: String = markdown.chars().take(EXCERPT_SOURCE_CHARS).collect();

    let lines: Vec<String> = source
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(|line| {
            let line = LINK_RE.replace_all(line, "$1");
            let line = BOLD_RE.replace_all(&line, "$1");
            let line = ITALIC_RE.replace_all(&line, "$1");
            CODE_RE.replace_all(&line, "").into_owned()
        })
        .collect();

    let excerpt = lines.join(" ");
    if excerpt.chars().count() <= EXCERPT_LENGTH {
        return excerpt;
    }

    let mut cut: String = excerpt.chars().take(EXCERPT_LENGTH).collect();
    if let Some(idx) = cut.rfind(' ') {
        if idx > 100 {
            cut.truncate(idx);
        }
    }
    cut.push_str("...");
    cut
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
