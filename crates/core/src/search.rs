//! Search query helpers and the search indexer collaborator.
//!
//! Two retrieval strategies exist: a substring scan over title and content,
//! and a PostgreSQL full-text query against the indexed `search_vector`.
//! Which one serves requests is a deployment choice (`WIKI_SEARCH_STRATEGY`).

use std::str::FromStr;

use async_trait::async_trait;
use serde::Serialize;

use crate::error::CoreError;
use crate::types::DbId;

// ---------------------------------------------------------------------------
// Pagination defaults
// ---------------------------------------------------------------------------

/// Default number of search results per page.
pub const DEFAULT_SEARCH_LIMIT: i64 = 20;

/// Maximum number of search results per page.
pub const MAX_SEARCH_LIMIT: i64 = 100;

/// Default page size for listings.
pub const DEFAULT_LIST_LIMIT: i64 = 20;

/// Maximum page size for listings.
pub const MAX_LIST_LIMIT: i64 = 200;

/// Characters of content shown as a search snippet.
pub const SNIPPET_LENGTH: usize = 150;

// ---------------------------------------------------------------------------
// Strategy
// ---------------------------------------------------------------------------

/// How a search query is executed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchStrategy {
    /// Case-insensitive substring match on title and content, newest first.
    #[default]
    Substring,
    /// `to_tsquery` prefix match against the indexed vector, ranked.
    FullText,
}

impl FromStr for SearchStrategy {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "substring" | "like" => Ok(Self::Substring),
            "fulltext" | "full_text" | "fts" => Ok(Self::FullText),
            other => Err(CoreError::Validation(format!(
                "search strategy: unknown value '{other}'"
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// Query builder helpers
// ---------------------------------------------------------------------------

/// Split user input into terms safe for tsquery construction.
///
/// Non-alphanumeric characters (except `_`) are trimmed from each term and
/// empty terms are dropped. Returns `None` if nothing usable remains.
fn sanitize_terms(query: &str) -> Option<Vec<&str>> {
    let terms: Vec<&str> = query
        .split_whitespace()
        .map(|t| t.trim_matches(|c: char| !c.is_alphanumeric() && c != '_'))
        .filter(|t| !t.is_empty() && t.chars().all(|c| c.is_alphanumeric() || c == '_'))
        .collect();

    if terms.is_empty() {
        None
    } else {
        Some(terms)
    }
}

/// Convert user input into a `tsquery` with all terms AND-ed.
///
/// ```
/// use canopy_core::search::build_tsquery;
/// assert_eq!(build_tsquery("rust wiki"), Some("rust & wiki".to_string()));
/// assert_eq!(build_tsquery("  "), None);
/// ```
pub fn build_tsquery(query: &str) -> Option<String> {
    sanitize_terms(query).map(|terms| terms.join(" & "))
}

/// Like [`build_tsquery`] but every term matches as a prefix.
///
/// ```
/// use canopy_core::search::build_prefix_tsquery;
/// assert_eq!(build_prefix_tsquery("ubu net"), Some("ubu:* & net:*".to_string()));
/// ```
pub fn build_prefix_tsquery(query: &str) -> Option<String> {
    sanitize_terms(query).map(|terms| {
        terms
            .iter()
            .map(|t| format!("{t}:*"))
            .collect::<Vec<_>>()
            .join(" & ")
    })
}

/// Build an `ILIKE` pattern matching `query` literally anywhere.
///
/// `%`, `_` and `\` in the input are escaped. Returns `None` for blank input.
pub fn like_pattern(query: &str) -> Option<String> {
    let query = query.trim();
    if query.is_empty() {
        return None;
    }
    let mut escaped = String::with_capacity(query.len() + 2);
    escaped.push('%');
    for c in query.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    Some(escaped)
}

/// Clamp a user-provided limit to valid bounds.
pub fn clamp_limit(limit: Option<i64>, default: i64, max: i64) -> i64 {
    limit.unwrap_or(default).clamp(1, max)
}

/// Clamp a user-provided offset to non-negative.
pub fn clamp_offset(offset: Option<i64>) -> i64 {
    offset.unwrap_or(0).max(0)
}

// ---------------------------------------------------------------------------
// Indexer collaborator
// ---------------------------------------------------------------------------

/// Keeps the search index in step with page writes.
///
/// Called after a page write has committed. Failures are reported to the
/// caller, which logs them; they never undo the write.
#[async_trait]
pub trait SearchIndexer: Send + Sync {
    async fn reindex(&self, page_id: DbId, title: &str, content: &str) -> Result<(), CoreError>;
}

/// Indexer that does nothing, for deployments that only use substring search.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopSearchIndexer;

#[async_trait]
impl SearchIndexer for NoopSearchIndexer {
    async fn reindex(&self, _page_id: DbId, _title: &str, _content: &str) -> Result<(), CoreError> {
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    // -- strategy ------------------------------------------------------------

    #[test]
    fn strategy_parses_aliases() {
        assert_eq!("substring".parse::<SearchStrategy>().unwrap(), SearchStrategy::Substring);
        assert_eq!("FullText".parse::<SearchStrategy>().unwrap(), SearchStrategy::FullText);
        assert_eq!("fts".parse::<SearchStrategy>().unwrap(), SearchStrategy::FullText);
        assert!("ranked".parse::<SearchStrategy>().is_err());
        assert_eq!(SearchStrategy::default(), SearchStrategy::Substring);
    }

    // -- tsquery -------------------------------------------------------------

    #[test]
    fn tsquery_joins_terms() {
        assert_eq!(build_tsquery("john dance"), Some("john & dance".to_string()));
    }

    #[test]
    fn tsquery_strips_operators() {
        assert_eq!(build_tsquery("hello! world?"), Some("hello & world".to_string()));
        assert_eq!(build_tsquery("a|b !c"), Some("c".to_string()));
        assert_eq!(build_tsquery("& | !"), None);
    }

    #[test]
    fn prefix_tsquery_marks_every_term() {
        assert_eq!(build_prefix_tsquery("joh"), Some("joh:*".to_string()));
        assert_eq!(build_prefix_tsquery(""), None);
    }

    // -- like_pattern --------------------------------------------------------

    #[test]
    fn like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("50%_off"), Some(r"%50\%\_off%".to_string()));
        assert_eq!(like_pattern("   "), None);
    }

    // -- clamping ------------------------------------------------------------

    #[test]
    fn clamp_limit_bounds() {
        assert_eq!(clamp_limit(None, 20, 100), 20);
        assert_eq!(clamp_limit(Some(200), 20, 100), 100);
        assert_eq!(clamp_limit(Some(0), 20, 100), 1);
        assert_eq!(clamp_limit(Some(-3), 20, 100), 1);
    }

    #[test]
    fn clamp_offset_floors_at_zero() {
        assert_eq!(clamp_offset(None), 0);
        assert_eq!(clamp_offset(Some(-10)), 0);
        assert_eq!(clamp_offset(Some(40)), 40);
    }
}
