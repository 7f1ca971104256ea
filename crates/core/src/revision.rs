//! Revision comments and line diffs between content snapshots.

use serde::Serialize;

use crate::types::DbId;

/// Comment stored on the revision created together with a new page.
pub const INITIAL_REVISION_COMMENT: &str = "Initial version";

/// Comment used when an update supplies none.
pub const DEFAULT_EDIT_COMMENT: &str = "Updated";

/// Maximum revision comment length in characters.
pub const MAX_COMMENT_LENGTH: usize = 500;

/// Comment recorded when a page is reverted to an earlier revision.
pub fn revert_comment(revision_id: DbId) -> String {
    format!("Reverted to revision {revision_id}")
}

/// Trim a user-supplied comment, falling back to [`DEFAULT_EDIT_COMMENT`]
/// and truncating to [`MAX_COMMENT_LENGTH`] characters.
pub fn edit_comment(comment: Option<&str>) -> String {
    match comment.map(str::trim) {
        Some(c) if !c.is_empty() => c.chars().take(MAX_COMMENT_LENGTH).collect(),
        _ => DEFAULT_EDIT_COMMENT.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Line diff
// ---------------------------------------------------------------------------

/// The type of a line in a diff result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DiffLineType {
    Added,
    Removed,
    Unchanged,
}

/// A single line in a diff result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiffLine {
    pub line_type: DiffLineType,
    pub content: String,
}

/// Line-level diff from `old` to `new` using a longest-common-subsequence table.
pub fn compute_line_diff(old: &str, new: &str) -> Vec<DiffLine> {
    let old_lines: Vec<&str> = old.lines().collect();
    let new_lines: Vec<&str> = new.lines().collect();
    let (m, n) = (old_lines.len(), new_lines.len());

    let mut lcs = vec![vec![0u32; n + 1]; m + 1];
    for i in 1..=m {
        for j in 1..=n {
            lcs[i][j] = if old_lines[i - 1] == new_lines[j - 1] {
                lcs[i - 1][j - 1] + 1
            } else {
                lcs[i - 1][j].max(lcs[i][j - 1])
            };
        }
    }

    let mut result = Vec::with_capacity(m.max(n));
    let (mut i, mut j) = (m, n);
    while i > 0 || j > 0 {
        let (line_type, content) = if i > 0 && j > 0 && old_lines[i - 1] == new_lines[j - 1] {
            i -= 1;
            j -= 1;
            (DiffLineType::Unchanged, old_lines[i])
        } else if j > 0 && (i == 0 || lcs[i][j - 1] >= lcs[i - 1][j]) {
            j -= 1;
            (DiffLineType::Added, new_lines[j])
        } else {
            i -= 1;
            (DiffLineType::Removed, old_lines[i])
        };
        result.push(DiffLine {
            line_type,
            content: content.to_string(),
        });
    }

    result.reverse();
    result
}
