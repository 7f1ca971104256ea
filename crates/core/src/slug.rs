//! Slug normalization and hierarchy helpers.
//!
//! A slug is a sequence of non-empty segments joined by `/`. Each segment
//! contains only `[a-z0-9-]`, never starts or ends with `-`, and never
//! contains `--`. [`normalize`] produces exactly this shape from arbitrary
//! input, so `normalize(normalize(x)) == normalize(x)`.

/// The hierarchy delimiter.
pub const SEPARATOR: char = '/';

// ---------------------------------------------------------------------------
// Normalization
// ---------------------------------------------------------------------------

/// Turn an arbitrary page name into a canonical hierarchical slug.
///
/// Returns an empty string when nothing usable remains; callers must treat
/// that as an invalid slug.
///
/// ```
/// use canopy_core::slug::normalize;
/// assert_eq!(normalize("Getting Started"), "getting-started");
/// assert_eq!(normalize("Linux/Ubuntu_Setup"), "linux/ubuntu-setup");
/// assert_eq!(normalize("foo-/bar"), "foo/bar");
/// assert_eq!(normalize("!!!"), "");
/// ```
pub fn normalize(input: &str) -> String {
    let filtered: String = input
        .to_lowercase()
        .chars()
        .filter_map(|c| match c {
            c if c.is_whitespace() || c == '_' => Some('-'),
            'a'..='z' | '0'..='9' | '-' | SEPARATOR => Some(c),
            _ => None,
        })
        .collect();

    let segments: Vec<String> = filtered
        .split(SEPARATOR)
        .map(collapse_hyphens)
        .filter(|s| !s.is_empty())
        .collect();

    segments.join("/")
}

/// Collapse hyphen runs to a single hyphen and trim hyphens at both ends.
fn collapse_hyphens(segment: &str) -> String {
    let mut out = String::with_capacity(segment.len());
    let mut prev_hyphen = false;
    for c in segment.chars() {
        if c == '-' {
            if !prev_hyphen {
                out.push('-');
            }
            prev_hyphen = true;
        } else {
            out.push(c);
            prev_hyphen = false;
        }
    }
    out.trim_matches('-').to_string()
}

// ---------------------------------------------------------------------------
// Hierarchy helpers
// ---------------------------------------------------------------------------

/// Split a slug into its segments.
pub fn segments(slug: &str) -> Vec<&str> {
    slug.split(SEPARATOR).filter(|s| !s.is_empty()).collect()
}

/// Whether the slug has at least one ancestor.
pub fn is_hierarchical(slug: &str) -> bool {
    slug.contains(SEPARATOR)
}

/// The final segment of a slug (the page's own name).
pub fn last_segment(slug: &str) -> &str {
    slug.rsplit(SEPARATOR).next().unwrap_or(slug)
}

/// The slug of the immediate parent, if any.
pub fn parent_slug(slug: &str) -> Option<&str> {
    slug.rfind(SEPARATOR).map(|idx| &slug[..idx])
}

/// Every proper ancestor slug, root first.
///
/// ```
/// use canopy_core::slug::ancestor_prefixes;
/// assert_eq!(ancestor_prefixes("a/b/c"), vec!["a", "a/b"]);
/// assert!(ancestor_prefixes("a").is_empty());
/// ```
pub fn ancestor_prefixes(slug: &str) -> Vec<&str> {
    slug.char_indices()
        .filter(|&(_, c)| c == SEPARATOR)
        .map(|(idx, _)| &slug[..idx])
        .collect()
}

/// The ancestor segment names (every segment but the last), root first.
pub fn ancestor_segments(slug: &str) -> Vec<&str> {
    let mut parts = segments(slug);
    parts.pop();
    parts
}

/// Rewrite `slug` if it lives under `old_prefix`.
///
/// Only a literal `old_prefix + "/"` prefix matches, so renaming `lin` never
/// touches `linux/ubuntu`.
pub fn rewrite_prefix(slug: &str, old_prefix: &str, new_prefix: &str) -> Option<String> {
    let rest = slug.strip_prefix(old_prefix)?;
    if rest.starts_with(SEPARATOR) {
        Some(format!("{new_prefix}{rest}"))
    } else {
        None
    }
}

/// Derive a display title from a slug segment.
///
/// ```
/// use canopy_core::slug::humanize_segment;
/// assert_eq!(humanize_segment("getting-started"), "Getting Started");
/// ```
pub fn humanize_segment(segment: &str) -> String {
    segment
        .split('-')
        .filter(|w| !w.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
