//! Blog workflow integration tests
//!
//! Publishes posts into a temp site, then lists, syncs and deletes them
//! the way the CLI does.

use std::fs;

use tempfile::TempDir;
use workbench::blog::{Blog, Catalog, PageMeta, Upsert};
use workbench::config::BlogConfig;
use workbench::Result;

fn blog(dir: &TempDir) -> Blog {
    let config = BlogConfig {
        root: dir.path().to_path_buf(),
        ..Default::default()
    };
    Blog::new(config).unwrap()
}

const RUST_POST: &str = "---
title: Rust 所有权入门
category: 技术
date: 2024年01月15日
cover_image: https://example.test/cover.jpg?w=800&h=400
excerpt: 从借用检查器说起
tags: Rust, 内存安全
---
# 所有权

每个值都有一个所有者。
";

#[test]
fn test_publish_list_sync_delete() -> Result<()> {
    let site = TempDir::new()?;
    let drafts = TempDir::new()?;
    let blog = blog(&site);

    let rust_md = drafts.path().join("rust.md");
    fs::write(&rust_md, RUST_POST)?;
    let notes_md = drafts.path().join("weekend-notes.md");
    fs::write(&notes_md, "Some notes without front matter.\nSecond line.\n")?;

    let first = blog.publish(&rust_md, false)?;
    let second = blog.publish(&notes_md, false)?;
    assert_eq!(first.number, 1);
    assert_eq!(second.number, 2);
    assert_eq!(second.post.title, "weekend-notes");
    assert_eq!(second.catalog_size, 2);

    // Metadata survives the trip through the generated page
    let meta = PageMeta::load(&first.page)?;
    assert_eq!(meta.title.as_deref(), Some("Rust 所有权入门"));
    assert_eq!(meta.category.as_deref(), Some("技术"));
    assert_eq!(meta.date.as_deref(), Some("2024年01月15日"));
    assert_eq!(meta.cover_image.as_deref(), Some("https://example.test/cover.jpg?w=800&h=400"));
    assert_eq!(meta.tags, vec!["Rust".to_string(), "内存安全".to_string()]);

    let listed = blog.list();
    assert_eq!(listed.len(), 2);
    assert!(listed.iter().all(|p| p.page_exists && p.markdown_exists));

    // Editing the source and republishing keeps the post number
    fs::write(&rust_md, RUST_POST.replace("每个值都有一个所有者。", "更新后的正文。"))?;
    let again = blog.publish(&rust_md, false)?;
    assert_eq!(again.number, 1);
    assert_eq!(again.catalog_change, Upsert::Updated);
    assert!(fs::read_to_string(site.path().join("post1.md"))?.contains("更新后的正文"));

    // Sync rebuilds the catalog from disk, newest first
    fs::remove_file(blog.catalog_path())?;
    let synced = blog.sync()?;
    assert!(synced.failed.is_empty());
    let ids: Vec<u32> = synced.synced.iter().map(|p| p.id).collect();
    assert_eq!(ids, vec![2, 1]);
    assert_eq!(synced.synced[1].title, "Rust 所有权入门");

    let deleted = blog.delete("post2.html")?;
    assert!(deleted.removed_from_catalog);
    assert!(deleted.markdown_removed);
    assert!(!site.path().join("post2.html").exists());

    let catalog = Catalog::load(&blog.catalog_path());
    assert_eq!(catalog.posts.len(), 1);
    assert_eq!(catalog.posts[0].link, "post1.html");
    Ok(())
}

#[test]
fn test_publish_force_new_with_duplicate_title() -> Result<()> {
    let site = TempDir::new()?;
    let blog = blog(&site);
    let md = site.path().join("draft.md");
    fs::write(&md, "---\ntitle: 重复标题\n---\n正文\n")?;

    blog.publish(&md, false)?;
    let forced = blog.publish(&md, true)?;
    assert!(forced.is_new);
    assert_eq!(forced.number, 2);
    assert_eq!(Catalog::load(&blog.catalog_path()).posts.len(), 2);
    Ok(())
}
