//! Blog operations: publish, delete, list and sync posts under a site root.

use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{Datelike, Local};

use super::catalog::{catalog_path, Catalog, PostEntry, Upsert, DYNAMIC_MODE};
use super::page::{self, PageMeta, PageRenderer};
use super::post::PostData;
use crate::config::BlogConfig;
use crate::error::{Result, WorkbenchError};

/// Reading time recorded for pages rebuilt by a sync
const SYNC_READ_TIME: &str = "5分钟";
const SYNC_EXCERPT: &str = "暂无摘要";
const SYNC_TITLE: &str = "无标题";
const SYNC_CATEGORY: &str = "未分类";

fn read_time_label(minutes: u32) -> String {
    format!("{}分钟", minutes)
}

#[derive(Debug, Clone)]
pub struct PublishOutcome {
    pub number: u32,
    pub page: PathBuf,
    pub markdown: PathBuf,
    pub post: PostData,
    pub is_new: bool,
    pub catalog_change: Upsert,
    pub catalog_size: usize,
}

#[derive(Debug, Clone)]
pub struct DeleteOutcome {
    pub page: PathBuf,
    pub title: Option<String>,
    pub removed_from_catalog: bool,
    pub markdown_removed: bool,
}

/// A catalog entry together with what exists on disk
#[derive(Debug, Clone)]
pub struct ListedPost {
    pub entry: PostEntry,
    pub page_exists: bool,
    pub markdown_exists: bool,
}

#[derive(Debug, Clone, Default)]
pub struct SyncOutcome {
    pub synced: Vec<PostEntry>,
    pub failed: Vec<(PathBuf, String)>,
}

/// A static blog rooted at one directory
pub struct Blog {
    root: PathBuf,
    config: BlogConfig,
    renderer: PageRenderer,
}

impl Blog {
    pub fn new(config: BlogConfig) -> Result<Self> {
        let root = config.root.clone();
        Self::with_root(root, config)
    }

    pub fn with_root(root: impl AsRef<Path>, config: BlogConfig) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        if !root.is_dir() {
            return Err(WorkbenchError::InvalidInput(format!(
                "blog root {} is not a directory",
                root.display()
            )));
        }
        Ok(Self {
            root,
            config,
            renderer: PageRenderer::new()?,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn catalog_path(&self) -> PathBuf {
        catalog_path(&self.root, &self.config.posts_config)
    }

    /// Today's date in the configured display format
    pub fn today(&self) -> Result<String> {
        let mut out = String::new();
        write!(out, "{}", Local::now().format(&self.config.date_format)).map_err(|_| {
            WorkbenchError::InvalidInput(format!("invalid date format '{}'", self.config.date_format))
        })?;
        Ok(out)
    }

    /// The existing page whose title matches, if any
    pub fn find_page_by_title(&self, title: &str) -> Result<Option<(u32, PathBuf)>> {
        for (number, path) in page::list_pages(&self.root)? {
            match PageMeta::load(&path) {
                Ok(meta) if meta.title.as_deref() == Some(title) => return Ok(Some((number, path))),
                Ok(_) => {}
                Err(e) => log::warn!("Could not read {}: {}", path.display(), e),
            }
        }
        Ok(None)
    }

    /// Generate or refresh the page for a Markdown file.
    ///
    /// A page with the same title is updated in place unless `force_new` is set.
    pub fn publish(&self, markdown: &Path, force_new: bool) -> Result<PublishOutcome> {
        let today = self.today()?;
        let post = PostData::load(markdown, &today, &self.config)?;
        log::info!("Publishing '{}' from {}", post.title, markdown.display());

        let existing = if force_new {
            None
        } else {
            self.find_page_by_title(&post.title)?
        };
        let is_new = existing.is_none();
        let number = match existing {
            Some((number, _)) => number,
            None => page::next_post_number(&self.root)?,
        };

        let link = page::page_name(number);
        let md_name = page::markdown_name(number);
        let page_path = self.root.join(&link);
        let md_path = self.root.join(&md_name);

        let same_file = match (fs::canonicalize(markdown), fs::canonicalize(&md_path)) {
            (Ok(a), Ok(b)) => a == b,
            _ => false,
        };
        if !same_file {
            fs::copy(markdown, &md_path)?;
            log::debug!("Copied {} to {}", markdown.display(), md_path.display());
        }

        let html = self
            .renderer
            .render(&post, &md_name, &self.config.site_name, Local::now().year())?;
        fs::write(&page_path, html)?;

        let entry = PostEntry {
            id: number,
            title: post.title.clone(),
            excerpt: post.excerpt.clone(),
            date: post.date.clone(),
            read_time: read_time_label(post.reading_time),
            category: post.category.clone(),
            mode: DYNAMIC_MODE.to_string(),
            image: post.cover_image.clone(),
            link,
            ..PostEntry::default()
        };
        let catalog_file = self.catalog_path();
        let mut catalog = Catalog::load(&catalog_file);
        let catalog_change = catalog.upsert(entry, is_new);
        catalog.save(&catalog_file)?;

        Ok(PublishOutcome {
            number,
            page: page_path,
            markdown: md_path,
            post,
            is_new,
            catalog_change,
            catalog_size: catalog.posts.len(),
        })
    }

    fn resolve_page(&self, page_name: &str) -> PathBuf {
        let path = Path::new(page_name);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }

    /// Remove a page, its Markdown source and its catalog entry
    pub fn delete(&self, page_name: &str) -> Result<DeleteOutcome> {
        let page_path = self.resolve_page(page_name);
        if !page_path.is_file() {
            return Err(WorkbenchError::PostNotFound(page_path.display().to_string()));
        }
        let link = page_path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();

        let title = PageMeta::load(&page_path).ok().and_then(|m| m.title);

        let catalog_file = self.catalog_path();
        let removed_from_catalog = if catalog_file.exists() {
            let mut catalog = Catalog::load(&catalog_file);
            let removed = catalog.remove_by_link(&link);
            if removed {
                catalog.save(&catalog_file)?;
            } else {
                log::warn!("{} has no entry in {}", link, catalog_file.display());
            }
            removed
        } else {
            false
        };

        fs::remove_file(&page_path)?;
        log::info!("Deleted {}", page_path.display());

        let md_path = page_path.with_file_name(page::markdown_for_link(&link));
        let markdown_removed = if md_path.is_file() {
            fs::remove_file(&md_path)?;
            true
        } else {
            false
        };

        Ok(DeleteOutcome {
            page: page_path,
            title,
            removed_from_catalog,
            markdown_removed,
        })
    }

    /// Catalog entries with the presence of their files
    pub fn list(&self) -> Vec<ListedPost> {
        Catalog::load(&self.catalog_path())
            .posts
            .into_iter()
            .map(|entry| {
                let (page_exists, markdown_exists) = if entry.link.is_empty() {
                    (false, false)
                } else {
                    (
                        self.root.join(&entry.link).is_file(),
                        self.root.join(page::markdown_for_link(&entry.link)).is_file(),
                    )
                };
                ListedPost {
                    entry,
                    page_exists,
                    markdown_exists,
                }
            })
            .collect()
    }

    /// Rebuild the catalog from the pages on disk, newest first
    pub fn sync(&self) -> Result<SyncOutcome> {
        let catalog_file = self.catalog_path();
        let previous = Catalog::load(&catalog_file);
        let today = self.today()?;

        let mut outcome = SyncOutcome::default();
        let mut rebuilt = Catalog {
            extra: previous.extra.clone(),
            ..Catalog::default()
        };
        for (number, path) in page::list_pages(&self.root)? {
            let meta = match PageMeta::load(&path) {
                Ok(meta) => meta,
                Err(e) => {
                    log::warn!("Could not parse {}: {}", path.display(), e);
                    outcome.failed.push((path, e.to_string()));
                    continue;
                }
            };
            let link = page::page_name(number);
            let known = previous.find_by_link(&link);
            let excerpt = known
                .map(|p| p.excerpt.clone())
                .filter(|e| !e.is_empty())
                .unwrap_or_else(|| SYNC_EXCERPT.to_string());
            let extra = known.map(|p| p.extra.clone()).unwrap_or_default();

            let entry = PostEntry {
                id: number,
                title: meta.title.unwrap_or_else(|| SYNC_TITLE.to_string()),
                excerpt,
                date: meta.date.unwrap_or_else(|| today.clone()),
                read_time: SYNC_READ_TIME.to_string(),
                category: meta.category.unwrap_or_else(|| SYNC_CATEGORY.to_string()),
                mode: DYNAMIC_MODE.to_string(),
                image: meta
                    .cover_image
                    .unwrap_or_else(|| self.config.default_cover_image.clone()),
                link,
                extra,
            };
            rebuilt.posts.push(entry);
        }

        rebuilt.sort_newest_first();
        rebuilt.save(&catalog_file)?;
        outcome.synced = rebuilt.posts;
        Ok(outcome)
    }
}
