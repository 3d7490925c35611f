use std::sync::OnceLock;

use regex::Regex;

// Wide enough that html2text rarely wraps prose mid-paragraph.
const RENDER_WIDTH: usize = 200;

static TAG_RE: OnceLock<Regex> = OnceLock::new();
static WHITESPACE_RE: OnceLock<Regex> = OnceLock::new();

/// Convert post markup into readable plain text, one trimmed line per block.
pub fn plain_text(html: &str) -> String {
    let text = match html2text::from_read(html.as_bytes(), RENDER_WIDTH) {
        Ok(t) => t,
        Err(e) => {
            tracing::debug!("Failed to convert HTML to text, stripping tags instead: {}", e);
            strip_tags(html)
        }
    };

    text.lines()
        .map(|l| l.trim())
        .filter(|l| !l.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Every whitespace run collapsed to a single space.
pub fn collapse_whitespace(text: &str) -> String {
    let re = WHITESPACE_RE.get_or_init(|| Regex::new(r"\s+").expect("valid whitespace regex"));
    re.replace_all(text, " ").trim().to_string()
}

fn strip_tags(html: &str) -> String {
    let re = TAG_RE.get_or_init(|| {
        Regex::new(r"(?is)<(script|style)[^>]*>.*?</(script|style)>|<[^>]*>")
            .expect("valid tag regex")
    });
    re.replace_all(html, " ").into_owned()
}
