//! The posts catalog (`posts-config.json`) read by the blog index page.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{Result, WorkbenchError};

/// Badge shown on the index page for dynamically rendered posts
pub const DYNAMIC_MODE: &str = "🔄";

/// One post as listed on the index page
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PostEntry {
    pub id: u32,
    pub title: String,
    pub excerpt: String,
    pub date: String,
    #[serde(rename = "readTime")]
    pub read_time: String,
    pub category: String,
    pub mode: String,
    pub image: String,
    pub link: String,
    /// Fields this tool does not manage, written back untouched
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl PostEntry {
    /// Build an entry from a raw catalog object, coercing mistyped fields.
    ///
    /// Numbers or booleans in text fields become their JSON text, an `id`
    /// given as a numeric string is parsed, and unknown keys land in `extra`.
    pub fn from_object(mut fields: Map<String, Value>) -> Self {
        let id = match fields.shift_remove("id") {
            Some(Value::Number(n)) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
            Some(Value::String(s)) => s.trim().parse().ok(),
            Some(Value::Null) | None => Some(0),
            Some(_) => None,
        }
        .unwrap_or_else(|| {
            log::warn!("Catalog entry has an unusable id, using 0");
            0
        });
        Self {
            id,
            title: take_text(&mut fields, "title"),
            excerpt: take_text(&mut fields, "excerpt"),
            date: take_text(&mut fields, "date"),
            read_time: take_text(&mut fields, "readTime"),
            category: take_text(&mut fields, "category"),
            mode: take_text(&mut fields, "mode"),
            image: take_text(&mut fields, "image"),
            link: take_text(&mut fields, "link"),
            extra: fields,
        }
    }
}

fn take_text(fields: &mut Map<String, Value>, key: &str) -> String {
    match fields.shift_remove(key) {
        Some(Value::String(s)) => s,
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    }
}

/// Whether an upsert added a new entry or replaced an existing one
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upsert {
    Inserted,
    Updated,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Catalog {
    #[serde(default)]
    pub posts: Vec<PostEntry>,
    /// Top-level keys other than `posts`
    #[serde(flatten)]
    pub extra: Map<String, Value>,
    /// Non-object items of `posts`, appended back on save
    #[serde(skip)]
    pub(crate) unreadable: Vec<Value>,
}

impl Catalog {
    /// Load the catalog; a missing file or one that is not a JSON object
    /// yields an empty one.
    pub fn load(path: &Path) -> Self {
        if !path.exists() {
            log::info!("No catalog at {}, starting empty", path.display());
            return Self::default();
        }
        let value = fs::read_to_string(path)
            .map_err(WorkbenchError::from)
            .and_then(|content| serde_json::from_str::<Value>(&content).map_err(Into::into));
        match value {
            Ok(Value::Object(map)) => Self::from_map(map),
            Ok(_) => {
                log::warn!("Catalog {} is not a JSON object, starting empty", path.display());
                Self::default()
            }
            Err(e) => {
                log::warn!("Catalog {} is malformed, starting empty: {}", path.display(), e);
                Self::default()
            }
        }
    }

    /// Read entries one at a time so a bad entry never costs the others
    fn from_map(mut map: Map<String, Value>) -> Self {
        let mut catalog = Self::default();
        match map.shift_remove("posts") {
            Some(Value::Array(items)) => {
                for item in items {
                    match item {
                        Value::Object(fields) => catalog.posts.push(PostEntry::from_object(fields)),
                        other => {
                            log::warn!("Keeping non-object catalog entry as is: {}", other);
                            catalog.unreadable.push(other);
                        }
                    }
                }
            }
            Some(Value::Null) | None => {}
            Some(other) => log::warn!("Catalog `posts` is not a list, ignoring: {}", other),
        }
        catalog.extra = map;
        catalog
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let mut value = serde_json::to_value(self)?;
        if let Some(Value::Array(posts)) = value.get_mut("posts") {
            posts.extend(self.unreadable.iter().cloned());
        }
        fs::write(path, serde_json::to_string_pretty(&value)?)?;
        log::info!("Saved catalog with {} posts to {}", self.posts.len(), path.display());
        Ok(())
    }

    pub fn find_by_link(&self, link: &str) -> Option<&PostEntry> {
        self.posts.iter().find(|p| p.link == link)
    }

    /// Insert or replace an entry.
    ///
    /// New posts go to the front. An update replaces the entry sharing the id
    /// or link, keeping its unmanaged fields, and falls back to inserting at
    /// the front.
    pub fn upsert(&mut self, entry: PostEntry, is_new: bool) -> Upsert {
        if !is_new {
            if let Some(existing) = self
                .posts
                .iter_mut()
                .find(|p| p.id == entry.id || p.link == entry.link)
            {
                let mut extra = std::mem::take(&mut existing.extra);
                extra.extend(entry.extra);
                *existing = PostEntry { extra, ..entry };
                return Upsert::Updated;
            }
        }
        self.posts.insert(0, entry);
        Upsert::Inserted
    }

    /// Remove every entry pointing at `link`; true when something was removed
    pub fn remove_by_link(&mut self, link: &str) -> bool {
        let before = self.posts.len();
        self.posts.retain(|p| p.link != link);
        self.posts.len() < before
    }

    /// Newest (highest id) first
    pub fn sort_newest_first(&mut self) {
        self.posts.sort_by(|a, b| b.id.cmp(&a.id));
    }
}

/// Resolve the catalog path under the blog root
pub fn catalog_path(root: &Path, file_name: &str) -> PathBuf {
    root.join(file_name)
}
