//! Static blog generator.
//!
//! Turns a Markdown file (with optional front matter) into a `post<N>.html`
//! page that renders the Markdown in the browser, and keeps the
//! `posts-config.json` catalog used by the index page in sync.

mod catalog;
mod frontmatter;
mod manager;
mod page;
mod post;

pub use catalog::{Catalog, PostEntry, Upsert, DYNAMIC_MODE};
pub use frontmatter::FrontMatter;
pub use manager::{Blog, DeleteOutcome, ListedPost, PublishOutcome, SyncOutcome};
pub use page::{next_post_number, post_number, PageMeta, PageRenderer};
pub use post::{derive_excerpt, reading_time, slugify, PostData};
