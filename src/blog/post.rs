//! Post metadata derived from a Markdown source.

use std::fs;
use std::path::Path;

use super::frontmatter;
use crate::config::BlogConfig;
use crate::error::{Result, WorkbenchError};

/// Characters of the derived excerpt
const EXCERPT_CHARS: usize = 100;
/// Lines scanned for a derived excerpt
const EXCERPT_LINES: usize = 3;
const CJK_CHARS_PER_MINUTE: f64 = 300.0;
const WORDS_PER_MINUTE: f64 = 200.0;

/// Everything needed to render a post page and its catalog entry
#[derive(Debug, Clone, PartialEq)]
pub struct PostData {
    pub title: String,
    pub category: String,
    pub date: String,
    pub cover_image: String,
    pub excerpt: String,
    pub tags: Vec<String>,
    pub content: String,
    pub reading_time: u32,
}

/// Estimated reading time in whole minutes, at least one.
///
/// CJK ideographs are read at 300 per minute, ASCII words at 200 per minute.
pub fn reading_time(content: &str) -> u32 {
    let cjk = content
        .chars()
        .filter(|c| ('\u{4e00}'..='\u{9fff}').contains(c))
        .count();

    let mut words = 0usize;
    let mut in_word = false;
    for c in content.chars() {
        let letter = c.is_ascii_alphabetic();
        if letter && !in_word {
            words += 1;
        }
        in_word = letter;
    }

    let minutes = cjk as f64 / CJK_CHARS_PER_MINUTE + words as f64 / WORDS_PER_MINUTE;
    (minutes as u32).max(1)
}

/// First non-empty, non-heading line among the first few lines
pub fn derive_excerpt(content: &str) -> Option<String> {
    content
        .lines()
        .take(EXCERPT_LINES)
        .map(str::trim)
        .find(|line| !line.is_empty() && !line.starts_with('#'))
        .map(|line| line.chars().take(EXCERPT_CHARS).collect())
}

/// Lowercase, hyphen separated identifier
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    for c in name.chars().flat_map(char::to_lowercase) {
        if c.is_alphanumeric() {
            slug.push(c);
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    slug.trim_end_matches('-').to_string()
}

impl PostData {
    /// Build post data from Markdown text, filling gaps from `config`.
    ///
    /// `stem` is the source file name without extension and `today` the
    /// already formatted fallback date.
    pub fn from_markdown(content: &str, stem: &str, today: &str, config: &BlogConfig) -> Self {
        let (fm, body) = frontmatter::split(content);
        let fm = fm.unwrap_or_default();

        let title = fm.title.filter(|t| !t.is_empty()).unwrap_or_else(|| stem.to_string());
        let excerpt = fm.excerpt.unwrap_or_else(|| {
            derive_excerpt(&body).unwrap_or_else(|| config.excerpt_fallback.clone())
        });
        let cover_image = fm
            .cover_image
            .unwrap_or_else(|| config.default_cover_image.clone())
            .replace("&amp;", "&");

        Self {
            title,
            category: fm.category.unwrap_or_else(|| config.default_category.clone()),
            date: fm.date.unwrap_or_else(|| today.to_string()),
            cover_image,
            excerpt,
            tags: fm.tags.unwrap_or_default(),
            reading_time: reading_time(&body),
            content: body,
        }
    }

    /// Read and parse a Markdown file
    pub fn load(path: &Path, today: &str, config: &BlogConfig) -> Result<Self> {
        if !path.is_file() {
            return Err(WorkbenchError::PostNotFound(path.display().to_string()));
        }
        let content = fs::read_to_string(path)?;
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default();
        Ok(Self::from_markdown(&content, &stem, today, config))
    }
}
