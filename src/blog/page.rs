//! Post pages: file naming, HTML rendering and metadata recovery.
//!
//! Pages are named `post<N>.html` with the Markdown source next to them as
//! `post<N>.md`. The page fetches and renders the Markdown in the browser, so
//! only metadata is baked into the HTML.

use std::fs;
use std::path::{Path, PathBuf};

use handlebars::Handlebars;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use super::post::PostData;
use crate::error::{Result, WorkbenchError};

const PAGE_TEMPLATE_NAME: &str = "post";
const PAGE_TEMPLATE: &str = include_str!("../../templates/post.html.hbs");

static POST_FILE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^post(\d+)\.html$").expect("valid post file regex"));
static TITLE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"<h1 class="article-title">(.*?)</h1>"#).expect("valid title regex"));
static CATEGORY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"<i class="fas fa-folder"></i>\s*<span>(.*?)</span>"#).expect("valid category regex")
});
static DATE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"<i class="fas fa-calendar-alt"></i>\s*<span>(.*?)</span>"#).expect("valid date regex")
});
static COVER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r#"<img src="(.*?)" alt="#).expect("valid cover regex"));
static TAG_LIST_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?s)<div class="tag-list">(.*?)</div>"#).expect("valid tag list regex"));
static TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"<span>(.*?)</span>").expect("valid tag regex"));

/// Page number encoded in a `post<N>.html` file name
pub fn post_number(file_name: &str) -> Option<u32> {
    POST_FILE_RE
        .captures(file_name)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

pub fn page_name(number: u32) -> String {
    format!("post{}.html", number)
}

pub fn markdown_name(number: u32) -> String {
    format!("post{}.md", number)
}

/// The Markdown sibling of a page link (`post3.html` -> `post3.md`)
pub fn markdown_for_link(link: &str) -> String {
    match link.strip_suffix(".html") {
        Some(stem) => format!("{}.md", stem),
        None => format!("{}.md", link),
    }
}

/// All `post<N>.html` pages directly under `root`, ordered by number
pub fn list_pages(root: &Path) -> Result<Vec<(u32, PathBuf)>> {
    let mut pages = Vec::new();
    for entry in fs::read_dir(root)? {
        let path = entry?.path();
        if !path.is_file() {
            continue;
        }
        let Some(number) = path.file_name().and_then(|n| n.to_str()).and_then(post_number) else {
            continue;
        };
        pages.push((number, path));
    }
    pages.sort_by_key(|(number, _)| *number);
    Ok(pages)
}

/// One past the highest page number, or 1 when there are no pages
pub fn next_post_number(root: &Path) -> Result<u32> {
    Ok(list_pages(root)?.last().map_or(1, |(number, _)| number + 1))
}

#[derive(Serialize)]
struct PageContext<'a> {
    site_name: &'a str,
    title: &'a str,
    category: &'a str,
    date: &'a str,
    excerpt: &'a str,
    reading_time: u32,
    cover_image: &'a str,
    tags: &'a [String],
    md_filename: &'a str,
    current_year: i32,
}

/// Renders post pages from the built-in Handlebars template
pub struct PageRenderer {
    handlebars: Handlebars<'static>,
}

impl PageRenderer {
    pub fn new() -> Result<Self> {
        let mut handlebars = Handlebars::new();
        handlebars.set_strict_mode(false);
        handlebars
            .register_template_string(PAGE_TEMPLATE_NAME, PAGE_TEMPLATE)
            .map_err(|e| WorkbenchError::Template(format!("Failed to register page template: {}", e)))?;
        Ok(Self { handlebars })
    }

    /// Render the page for `post`, which loads `md_filename` at view time
    pub fn render(&self, post: &PostData, md_filename: &str, site_name: &str, current_year: i32) -> Result<String> {
        let context = PageContext {
            site_name,
            title: &post.title,
            category: &post.category,
            date: &post.date,
            excerpt: &post.excerpt,
            reading_time: post.reading_time,
            cover_image: &post.cover_image,
            tags: &post.tags,
            md_filename,
            current_year,
        };
        self.handlebars
            .render(PAGE_TEMPLATE_NAME, &context)
            .map_err(|e| WorkbenchError::Template(format!("Failed to render page: {}", e)))
    }
}

/// Metadata recovered from a generated page
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageMeta {
    pub number: Option<u32>,
    pub title: Option<String>,
    pub category: Option<String>,
    pub date: Option<String>,
    pub cover_image: Option<String>,
    pub tags: Vec<String>,
}

/// Reverse the entity escaping applied by the template engine
pub fn unescape_html(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#34;", "\"")
        .replace("&#x27;", "'")
        .replace("&#39;", "'")
        .replace("&#x60;", "`")
        .replace("&#x3D;", "=")
        .replace("&amp;", "&")
}

fn capture(re: &Regex, html: &str) -> Option<String> {
    re.captures(html)
        .and_then(|caps| caps.get(1))
        .map(|m| unescape_html(m.as_str()))
}

impl PageMeta {
    pub fn parse(html: &str, file_name: &str) -> Self {
        let tags = TAG_LIST_RE
            .captures(html)
            .and_then(|caps| caps.get(1))
            .map(|list| {
                TAG_RE
                    .captures_iter(list.as_str())
                    .filter_map(|c| c.get(1))
                    .map(|m| unescape_html(m.as_str()))
                    .collect()
            })
            .unwrap_or_default();

        Self {
            number: post_number(file_name),
            title: capture(&TITLE_RE, html),
            category: capture(&CATEGORY_RE, html),
            date: capture(&DATE_RE, html),
            cover_image: capture(&COVER_RE, html),
            tags,
        }
    }

    pub fn load(path: &Path) -> Result<Self> {
        let html = fs::read_to_string(path)?;
        let file_name = path.file_name().and_then(|n| n.to_str()).unwrap_or_default();
        Ok(Self::parse(&html, file_name))
    }
}
