//! Front matter parsing for Markdown posts.
//!
//! The header is a `---` delimited block of `key: value` lines at the very top
//! of the file. Values are taken literally after trimming whitespace and quotes;
//! `tags` is a comma separated list.

use once_cell::sync::Lazy;
use regex::Regex;

static FRONT_MATTER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)^---\s*\n(.*?)\n---\s*\n(.*)$").expect("valid front matter regex"));

/// Metadata recognised in a post header. Unknown keys are dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrontMatter {
    pub title: Option<String>,
    pub category: Option<String>,
    pub date: Option<String>,
    pub cover_image: Option<String>,
    pub excerpt: Option<String>,
    pub tags: Option<Vec<String>>,
}

impl FrontMatter {
    /// Parse the body of a header block (the lines between the delimiters)
    pub fn parse(block: &str) -> Self {
        let mut fm = FrontMatter::default();
        for line in block.lines() {
            let line = line.trim();
            let Some((key, value)) = line.split_once(':') else {
                continue;
            };
            let value = strip_quotes(value.trim()).to_string();
            match key.trim() {
                "title" => fm.title = Some(value),
                "category" => fm.category = Some(value),
                "date" => fm.date = Some(value),
                "cover_image" => fm.cover_image = Some(value),
                "excerpt" => fm.excerpt = Some(value),
                "tags" => {
                    fm.tags = Some(
                        value
                            .split(',')
                            .map(str::trim)
                            .filter(|t| !t.is_empty())
                            .map(String::from)
                            .collect(),
                    )
                }
                other => log::debug!("Ignoring front matter key '{}'", other),
            }
        }
        fm
    }
}

fn strip_quotes(value: &str) -> &str {
    value.trim_matches('"').trim_matches('\'')
}

/// Split a Markdown document into its header (if any) and trimmed body.
pub fn split(content: &str) -> (Option<FrontMatter>, String) {
    match FRONT_MATTER_RE.captures(content) {
        Some(caps) => {
            let header = caps.get(1).map_or("", |m| m.as_str());
            let body = caps.get(2).map_or("", |m| m.as_str());
            (Some(FrontMatter::parse(header)), body.trim().to_string())
        }
        None => (None, content.trim().to_string()),
    }
}
