use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SummaryTheme {
    #[default]
    Classic,
    Minimal,
    Modern,
    Elegant,
    Card,
}

impl SummaryTheme {
    pub const ALL: [SummaryTheme; 5] = [
        Self::Classic,
        Self::Minimal,
        Self::Modern,
        Self::Elegant,
        Self::Card,
    ];

    pub fn slug(self) -> &'static str {
        match self {
            Self::Classic => "classic",
            Self::Minimal => "minimal",
            Self::Modern => "modern",
            Self::Elegant => "elegant",
            Self::Card => "card",
        }
    }

    fn heading(self) -> &'static str {
        match self {
            Self::Classic | Self::Minimal | Self::Elegant => "Summary",
            Self::Modern => "AI Summary",
            Self::Card => "Article Summary",
        }
    }
}

impl fmt::Display for SummaryTheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

impl FromStr for SummaryTheme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|t| t.slug() == s)
            .ok_or_else(|| format!("unknown theme: {}", s))
    }
}

/// Render a stored summary as an HTML block for the post page. Blank
/// summaries render nothing.
pub fn render_summary(summary: &str, theme: SummaryTheme, disclaimer: &str) -> Option<String> {
    let summary = summary.trim();
    if summary.is_empty() {
        return None;
    }

    let mut html = format!(
        "<div class=\"post-summary post-summary-{}\">\n  <h4>{}</h4>\n  <p>{}</p>\n",
        theme.slug(),
        theme.heading(),
        escape_html(summary)
    );
    let disclaimer = disclaimer.trim();
    if !disclaimer.is_empty() {
        html.push_str(&format!(
            "  <small class=\"post-summary-disclaimer\">{}</small>\n",
            escape_html(disclaimer)
        ));
    }
    html.push_str("</div>");
    Some(html)
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
