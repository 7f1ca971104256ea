//! Markdown rendering collaborator.
//!
//! [`MarkdownRenderer`] turns raw page markdown into sanitized HTML plus a
//! table of contents. [`CmarkRenderer`] is the pulldown-cmark implementation:
//! raw HTML in the source is escaped rather than passed through, link and
//! image targets with script-capable schemes are neutralized, headings get
//! stable anchors, and `[[target]]` / `[[target|label]]` become links to
//! other wiki pages.

use std::collections::HashMap;
use std::sync::LazyLock;

use pulldown_cmark::{html, CowStr, Event, HeadingLevel, LinkType, Options, Parser, Tag, TagEnd};
use regex::Regex;
use serde::Serialize;

use crate::error::CoreError;
use crate::slug;

/// One heading in a rendered page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TocEntry {
    pub level: u8,
    pub text: String,
    pub id: String,
}

/// Output of a render.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderedMarkdown {
    pub html: String,
    pub toc: Vec<TocEntry>,
}

/// Renders markdown to sanitized HTML.
///
/// Implementations must be deterministic and free of side effects.
pub trait MarkdownRenderer: Send + Sync {
    fn render(&self, markdown: &str) -> Result<RenderedMarkdown, CoreError>;
}

/// URL prefix for resolved `[[wiki links]]`.
pub const DEFAULT_WIKI_LINK_BASE: &str = "/wiki/";

static WIKI_LINK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\[\[([^\[\]|]+)(?:\|([^\[\]]+))?\]\]").expect("valid regex")
});

/// Schemes that can execute script when followed.
const BLOCKED_SCHEMES: &[&str] = &["javascript:", "vbscript:", "data:", "file:"];

/// pulldown-cmark backed renderer.
#[derive(Debug, Clone)]
pub struct CmarkRenderer {
    wiki_link_base: String,
}

impl Default for CmarkRenderer {
    fn default() -> Self {
        Self::new(DEFAULT_WIKI_LINK_BASE)
    }
}

impl CmarkRenderer {
    pub fn new(wiki_link_base: impl Into<String>) -> Self {
        Self {
            wiki_link_base: wiki_link_base.into(),
        }
    }

    fn options() -> Options {
        Options::ENABLE_TABLES
            | Options::ENABLE_STRIKETHROUGH
            | Options::ENABLE_TASKLISTS
            | Options::ENABLE_FOOTNOTES
            | Options::ENABLE_GFM
    }

    /// Replace `[[...]]` in plain text runs with links. Code blocks and
    /// existing links are left untouched.
    fn resolve_wiki_links<'a>(&self, events: Vec<Event<'a>>) -> Vec<Event<'a>> {
        let mut out = Vec::with_capacity(events.len());
        let mut pending = String::new();
        let mut in_code = false;
        let mut link_depth = 0usize;

        for event in events {
            if let Event::Text(text) = &event {
                if !in_code && link_depth == 0 {
                    pending.push_str(text);
                    continue;
                }
            }
            self.flush_text(&mut out, &mut pending);
            match &event {
                Event::Start(Tag::CodeBlock(_)) => in_code = true,
                Event::End(TagEnd::CodeBlock) => in_code = false,
                Event::Start(Tag::Link { .. }) | Event::Start(Tag::Image { .. }) => {
                    link_depth += 1
                }
                Event::End(TagEnd::Link) | Event::End(TagEnd::Image) => {
                    link_depth = link_depth.saturating_sub(1)
                }
                _ => {}
            }
            out.push(event);
        }
        self.flush_text(&mut out, &mut pending);
        out
    }

    fn flush_text<'a>(&self, out: &mut Vec<Event<'a>>, pending: &mut String) {
        if pending.is_empty() {
            return;
        }
        let text = std::mem::take(pending);
        let mut last = 0;
        for caps in WIKI_LINK_RE.captures_iter(&text) {
            let (Some(whole), Some(target)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            let target_slug = slug::normalize(target.as_str());
            if target_slug.is_empty() {
                continue;
            }
            if whole.start() > last {
                out.push(Event::Text(CowStr::from(text[last..whole.start()].to_string())));
            }
            let label = caps
                .get(2)
                .map(|m| m.as_str().trim())
                .filter(|l| !l.is_empty())
                .unwrap_or_else(|| target.as_str().trim());
            out.push(Event::Start(Tag::Link {
                link_type: LinkType::Inline,
                dest_url: CowStr::from(format!("{}{target_slug}", self.wiki_link_base)),
                title: CowStr::Borrowed(""),
                id: CowStr::Borrowed(""),
            }));
            out.push(Event::Text(CowStr::from(label.to_string())));
            out.push(Event::End(TagEnd::Link));
            last = whole.end();
        }
        if last < text.len() {
            out.push(Event::Text(CowStr::from(text[last..].to_string())));
        }
    }
}

impl MarkdownRenderer for CmarkRenderer {
    fn render(&self, markdown: &str) -> Result<RenderedMarkdown, CoreError> {
        let mut events: Vec<Event<'_>> = Parser::new_ext(markdown, Self::options())
            .map(neutralize)
            .collect();
        let toc = assign_heading_ids(&mut events);
        let events = self.resolve_wiki_links(events);

        let mut html_out = String::with_capacity(markdown.len() + markdown.len() / 2);
        html::push_html(&mut html_out, events.into_iter());
        Ok(RenderedMarkdown {
            html: html_out,
            toc,
        })
    }
}

/// Normalized slugs of every `[[wiki link]]` in `markdown`, first occurrence
/// first.
///
/// Follows the renderer's rules: links inside code or inside an existing
/// markdown link are not wiki links.
pub fn wiki_link_targets(markdown: &str) -> Vec<String> {
    let mut targets: Vec<String> = Vec::new();
    let mut pending = String::new();
    let mut in_code = false;
    let mut link_depth = 0usize;

    for event in Parser::new_ext(markdown, CmarkRenderer::options()) {
        match event {
            Event::Text(text) if !in_code && link_depth == 0 => {
                pending.push_str(&text);
                continue;
            }
            Event::Start(Tag::CodeBlock(_)) => in_code = true,
            Event::End(TagEnd::CodeBlock) => in_code = false,
            Event::Start(Tag::Link { .. }) | Event::Start(Tag::Image { .. }) => link_depth += 1,
            Event::End(TagEnd::Link) | Event::End(TagEnd::Image) => {
                link_depth = link_depth.saturating_sub(1)
            }
            _ => {}
        }
        collect_targets(&mut pending, &mut targets);
    }
    collect_targets(&mut pending, &mut targets);
    targets
}

fn collect_targets(text: &mut String, targets: &mut Vec<String>) {
    for target in WIKI_LINK_RE.captures_iter(text).filter_map(|caps| caps.get(1)) {
        let target_slug = slug::normalize(target.as_str());
        if !target_slug.is_empty() && !targets.contains(&target_slug) {
            targets.push(target_slug);
        }
    }
    text.clear();
}

/// Escape raw HTML and defuse dangerous link targets.
fn neutralize(event: Event<'_>) -> Event<'_> {
    match event {
        Event::Html(raw) | Event::InlineHtml(raw) => Event::Text(raw),
        Event::Start(Tag::Link {
            link_type,
            dest_url,
            title,
            id,
        }) => Event::Start(Tag::Link {
            link_type,
            dest_url: safe_url(dest_url),
            title,
            id,
        }),
        Event::Start(Tag::Image {
            link_type,
            dest_url,
            title,
            id,
        }) => Event::Start(Tag::Image {
            link_type,
            dest_url: safe_url(dest_url),
            title,
            id,
        }),
        other => other,
    }
}

fn safe_url(url: CowStr<'_>) -> CowStr<'_> {
    let compact: String = url
        .chars()
        .filter(|c| !c.is_ascii_whitespace() && !c.is_control())
        .collect::<String>()
        .to_ascii_lowercase();
    if BLOCKED_SCHEMES.iter().any(|s| compact.starts_with(s)) {
        CowStr::Borrowed("#")
    } else {
        url
    }
}

/// Give every heading a unique anchor id and collect the TOC.
fn assign_heading_ids(events: &mut [Event<'_>]) -> Vec<TocEntry> {
    let mut toc = Vec::new();
    let mut used: HashMap<String, usize> = HashMap::new();
    let mut i = 0;
    while i < events.len() {
        let level = match &events[i] {
            Event::Start(Tag::Heading { level, .. }) => *level,
            _ => {
                i += 1;
                continue;
            }
        };

        let mut text = String::new();
        let mut j = i + 1;
        while j < events.len() {
            match &events[j] {
                Event::End(TagEnd::Heading(_)) => break,
                Event::Text(t) | Event::Code(t) => text.push_str(t),
                _ => {}
            }
            j += 1;
        }

        let anchor = unique_anchor(&text, &mut used);
        if let Event::Start(Tag::Heading { id, .. }) = &mut events[i] {
            *id = Some(CowStr::from(anchor.clone()));
        }
        toc.push(TocEntry {
            level: heading_level_to_num(level),
            text: text.trim().to_string(),
            id: anchor,
        });
        i = j + 1;
    }
    toc
}

fn unique_anchor(text: &str, used: &mut HashMap<String, usize>) -> String {
    let mut base = slug::normalize(text).replace('/', "-");
    if base.is_empty() {
        base = "heading".to_string();
    }
    let count = used.entry(base.clone()).or_insert(0);
    let anchor = if *count == 0 {
        base
    } else {
        format!("{base}-{count}")
    };
    *count += 1;
    anchor
}

fn heading_level_to_num(level: HeadingLevel) -> u8 {
    match level {
        HeadingLevel::H1 => 1,
        HeadingLevel::H2 => 2,
        HeadingLevel::H3 => 3,
        HeadingLevel::H4 => 4,
        HeadingLevel::H5 => 5,
        HeadingLevel::H6 => 6,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn render(md: &str) -> RenderedMarkdown {
        CmarkRenderer::default().render(md).unwrap()
    }

    #[test]
    fn renders_basic_markdown() {
        let out = render("Hello **world**");
        assert_eq!(out.html.trim(), "<p>Hello <strong>world</strong></p>");
        assert!(out.toc.is_empty());
    }

    #[test]
    fn empty_input_renders_empty() {
        assert_eq!(render("").html, "");
    }

    #[test]
    fn raw_html_is_escaped() {
        let out = render("<script>alert(1)</script>\n\ntext <b>bold</b>");
        assert!(!out.html.contains("<script>"));
        assert!(out.html.contains("&lt;script&gt;"));
        assert!(out.html.contains("&lt;b&gt;"));
    }

    #[test]
    fn script_links_are_neutralized() {
        let out = render("[x](javascript:alert(1)) [y](<VBScript:evil>) [z](https://ok.example)");
        let lower = out.html.to_lowercase();
        assert!(!lower.contains("javascript:"));
        assert!(!lower.contains("vbscript:"));
        assert!(out.html.contains(r#"href="https://ok.example""#));
    }

    #[test]
    fn headings_get_unique_anchors_and_toc() {
        let out = render("# Intro\n\n## Setup `cargo`\n\n## Intro");
        let ids: Vec<&str> = out.toc.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["intro", "setup-cargo", "intro-1"]);
        assert_eq!(out.toc[1].level, 2);
        assert_eq!(out.toc[1].text, "Setup cargo");
        assert!(out.html.contains(r#"<h1 id="intro">"#));
        assert!(out.html.contains(r#"<h2 id="intro-1">"#));
    }

    #[test]
    fn wiki_links_resolve_to_pages() {
        let out = render("See [[Linux/Ubuntu]] and [[getting-started|the guide]].");
        assert!(out.html.contains(r#"<a href="/wiki/linux/ubuntu">Linux/Ubuntu</a>"#));
        assert!(out.html.contains(r#"<a href="/wiki/getting-started">the guide</a>"#));
    }

    #[test]
    fn wiki_links_inside_code_are_literal() {
        let out = render("```\n[[not-a-link]]\n```\n\n`[[inline]]`");
        assert!(!out.html.contains("href"));
        assert!(out.html.contains("[[not-a-link]]"));
    }

    #[test]
    fn link_targets_are_normalized_and_deduplicated() {
        let md = "See [[Linux/Ubuntu]], [[linux/ubuntu|again]] and [[Getting Started]].";
        assert_eq!(
            wiki_link_targets(md),
            vec!["linux/ubuntu".to_string(), "getting-started".to_string()]
        );
    }

    #[test]
    fn link_targets_skip_code() {
        let md = "```\n[[in-block]]\n```\n\n`[[inline]]` and [[real]]";
        assert_eq!(wiki_link_targets(md), vec!["real".to_string()]);
    }

    #[test]
    fn render_is_deterministic() {
        let md = "# A\n\n[[b]] text";
        assert_eq!(render(md), render(md));
    }
}
