//! Workbench - tooling for a small static blog and a few data chores
//!
//! - `blog`: Markdown to post pages plus the `posts-config.json` catalog
//! - `server`: static file server with CORS for previewing the site
//! - `geo`: haversine distances and nearby-place search
//! - `merge`: combine a directory of JSON files
//! - `report`: weekly task report in Markdown

pub mod blog;
pub mod config;
pub mod error;
pub mod geo;
pub mod merge;
pub mod report;
pub mod server;

pub use error::{Result, WorkbenchError};
