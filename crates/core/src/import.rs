//! Markdown file import.
//!
//! Accepts the same shape the backup mirror writes: an optional `---`
//! delimited frontmatter block with `title`, `slug` and `tags` keys,
//! followed by the page body. Unknown keys are ignored.

/// A markdown file split into page fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportedPage {
    pub title: String,
    /// Raw slug from the frontmatter; `None` derives it from the title.
    pub slug: Option<String>,
    pub tags: Vec<String>,
    pub body: String,
}

const FRONTMATTER_FENCE: &str = "---";

/// Split `content` into page fields.
///
/// Title precedence: frontmatter `title`, then the first `# ` heading of the
/// body, then `filename` without its markdown extension and with `-`/`_`
/// read as spaces.
pub fn parse_markdown_file(content: &str, filename: &str) -> ImportedPage {
    let mut page = ImportedPage {
        body: content.to_string(),
        ..Default::default()
    };

    let lines: Vec<&str> = content.lines().collect();
    let has_fence = lines.first().is_some_and(|l| l.trim() == FRONTMATTER_FENCE);
    let closing = lines
        .iter()
        .skip(1)
        .position(|l| l.trim() == FRONTMATTER_FENCE)
        .map(|i| i + 1);

    if let (true, Some(end)) = (has_fence, closing) {
        for line in &lines[1..end] {
            let Some((key, value)) = line.split_once(':') else {
                continue;
            };
            match key.trim() {
                "title" => page.title = unquote(value).to_string(),
                "slug" => page.slug = Some(unquote(value).to_string()).filter(|s| !s.is_empty()),
                "tags" => page.tags = parse_tag_list(value),
                _ => {}
            }
        }
        page.body = lines[end + 1..].join("\n").trim().to_string();
    }

    if page.title.is_empty() {
        page.title = first_heading(&page.body).unwrap_or_else(|| title_from_filename(filename));
    }
    page
}

fn unquote(value: &str) -> &str {
    value.trim().trim_matches(|c| c == '"' || c == '\'')
}

/// `[a, "b"]` and `a, b` both read as two tags.
fn parse_tag_list(value: &str) -> Vec<String> {
    value
        .trim()
        .trim_start_matches('[')
        .trim_end_matches(']')
        .split(',')
        .map(unquote)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

fn first_heading(body: &str) -> Option<String> {
    body.lines()
        .map(str::trim)
        .find_map(|l| l.strip_prefix("# "))
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
}

fn title_from_filename(filename: &str) -> String {
    let stem = filename
        .strip_suffix(".md")
        .or_else(|| filename.strip_suffix(".markdown"))
        .unwrap_or(filename);
    stem.replace(['-', '_'], " ").trim().to_string()
}
