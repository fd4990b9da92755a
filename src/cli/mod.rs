//! Command-line interface for workbench.
//!
//! Subcommands cover the geo and merge data tools, blog post management,
//! the local preview server and the weekly report.

pub mod commands;

pub use commands::Cli;
