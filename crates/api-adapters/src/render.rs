//! Escaping renderer for content bodies.
//!
//! Everything is HTML-escaped first, so the only markup in the output is
//! what this module adds: paragraphs, line breaks and `@mention` links.

use once_cell::sync::Lazy;
use regex::Regex;

use domains::ContentRenderer;

static PARAGRAPH_BREAK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\n[ \t]*\n\s*").expect("paragraph pattern is valid"));
static MENTION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"@([A-Za-z0-9_]{1,30})").expect("mention pattern is valid"));

#[derive(Debug, Clone, Copy, Default)]
pub struct SafeHtmlRenderer;

impl ContentRenderer for SafeHtmlRenderer {
    fn render_safe_html(&self, source: &str) -> String {
        let normalized = source.replace("\r\n", "\n");
        PARAGRAPH_BREAK
            .split(normalized.trim())
            .filter(|block| !block.trim().is_empty())
            .map(|block| {
                let escaped = html_escape::encode_safe(block.trim_end());
                let linked = MENTION.replace_all(&escaped, r#"<a href="/u/$1/">@$1</a>"#);
                format!("<p>{}</p>", linked.replace('\n', "<br />"))
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}
