//! CLI command definitions using clap.
//!
//! - geo: point distance and nearby-place search
//! - merge: combine JSON files from a directory
//! - post: publish, delete, list and sync blog posts
//! - serve: CORS-enabled static file server
//! - report: weekly task report

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use workbench::merge::MergeMode;

/// Workbench - blog publishing, a local dev server and small data tools
#[derive(Parser, Debug)]
#[command(name = "workbench")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Optional config file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    pub fn is_verbose(&self) -> bool {
        self.verbose
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Great-circle distances between places
    Geo {
        #[command(subcommand)]
        command: GeoCommands,
    },

    /// Merge the JSON files of a directory into one file
    Merge {
        /// Directory to scan for *.json files
        #[arg(short, long, default_value = ".")]
        dir: PathBuf,

        /// Output file (defaults to the configured name inside DIR)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// How file contents are combined
        #[arg(short, long, value_enum)]
        mode: Option<MergeMode>,
    },

    /// Blog post management
    Post {
        #[command(subcommand)]
        command: PostCommands,
    },

    /// Serve a directory over HTTP with CORS headers
    Serve {
        #[arg(short, long)]
        port: Option<u16>,

        /// Address to bind
        #[arg(short, long)]
        bind: Option<String>,

        /// Directory to serve
        #[arg(short, long)]
        dir: Option<PathBuf>,
    },

    /// Work reports
    Report {
        #[command(subcommand)]
        command: ReportCommands,
    },
}

#[derive(Subcommand, Debug)]
pub enum GeoCommands {
    /// Distance in km between two points
    Distance {
        #[arg(allow_negative_numbers = true)]
        lat1: f64,
        #[arg(allow_negative_numbers = true)]
        lng1: f64,
        #[arg(allow_negative_numbers = true)]
        lat2: f64,
        #[arg(allow_negative_numbers = true)]
        lng2: f64,
    },

    /// Find places within a threshold of each other
    Nearby {
        /// City map JSON: name -> {lat, lng}
        #[arg(short, long)]
        input: Option<PathBuf>,

        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Threshold in km
        #[arg(short, long)]
        threshold: Option<f64>,
    },
}

#[derive(Subcommand, Debug)]
pub enum PostCommands {
    /// Generate (or regenerate) the page for a Markdown file
    Publish {
        markdown: PathBuf,

        /// Always create a new post, even if one with this title exists
        #[arg(long)]
        new: bool,
    },

    /// Delete a post page, its Markdown and its catalog entry
    Delete {
        /// Page file name, e.g. post3.html
        post: String,

        /// Actually delete; without it nothing is removed
        #[arg(long)]
        force: bool,
    },

    /// List catalog entries
    List,

    /// Rebuild the catalog from the pages on disk
    Sync,
}

#[derive(Subcommand, Debug)]
pub enum ReportCommands {
    /// Markdown report for one week of tasks
    Weekly {
        /// Task export JSON
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// 0 for the week ending today, 1 for the week before, ...
        #[arg(short, long, default_value_t = 0)]
        weeks_ago: u32,

        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_requires_command() {
        assert!(Cli::try_parse_from(["workbench"]).is_err());
    }

    #[test]
    fn test_cli_global_flags() {
        let cli = Cli::try_parse_from(["workbench", "post", "list", "-v", "-c", "/tmp/wb.yml"]).unwrap();
        assert!(cli.is_verbose());
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/wb.yml")));
    }

    #[test]
    fn test_geo_distance_negative_coordinates() {
        let cli = Cli::try_parse_from(["workbench", "geo", "distance", "-33.87", "151.21", "51.51", "-0.13"]).unwrap();
        match cli.command {
            Commands::Geo {
                command: GeoCommands::Distance { lat1, lng1, lat2, lng2 },
            } => {
                assert_eq!(lat1, -33.87);
                assert_eq!(lng1, 151.21);
                assert_eq!(lat2, 51.51);
                assert_eq!(lng2, -0.13);
            }
            other => panic!("Expected geo distance, got {:?}", other),
        }
    }

    #[test]
    fn test_geo_nearby_options() {
        let cli = Cli::try_parse_from(["workbench", "geo", "nearby", "-i", "cities.json", "-t", "25"]).unwrap();
        match cli.command {
            Commands::Geo {
                command: GeoCommands::Nearby { input, output, threshold },
            } => {
                assert_eq!(input, Some(PathBuf::from("cities.json")));
                assert!(output.is_none());
                assert_eq!(threshold, Some(25.0));
            }
            other => panic!("Expected geo nearby, got {:?}", other),
        }
    }

    #[test]
    fn test_merge_mode() {
        let cli = Cli::try_parse_from(["workbench", "merge", "-d", "data", "-m", "keyed"]).unwrap();
        match cli.command {
            Commands::Merge { dir, output, mode } => {
                assert_eq!(dir, PathBuf::from("data"));
                assert!(output.is_none());
                assert_eq!(mode, Some(MergeMode::Keyed));
            }
            other => panic!("Expected merge, got {:?}", other),
        }
        assert!(Cli::try_parse_from(["workbench", "merge", "-m", "zip"]).is_err());
    }

    #[test]
    fn test_post_publish() {
        let cli = Cli::try_parse_from(["workbench", "post", "publish", "notes.md", "--new"]).unwrap();
        match cli.command {
            Commands::Post {
                command: PostCommands::Publish { markdown, new },
            } => {
                assert_eq!(markdown, PathBuf::from("notes.md"));
                assert!(new);
            }
            other => panic!("Expected post publish, got {:?}", other),
        }
    }

    #[test]
    fn test_post_delete_defaults_to_dry() {
        let cli = Cli::try_parse_from(["workbench", "post", "delete", "post3.html"]).unwrap();
        match cli.command {
            Commands::Post {
                command: PostCommands::Delete { post, force },
            } => {
                assert_eq!(post, "post3.html");
                assert!(!force);
            }
            other => panic!("Expected post delete, got {:?}", other),
        }
    }

    #[test]
    fn test_serve_options() {
        let cli = Cli::try_parse_from(["workbench", "serve", "-p", "9000", "-b", "127.0.0.1"]).unwrap();
        match cli.command {
            Commands::Serve { port, bind, dir } => {
                assert_eq!(port, Some(9000));
                assert_eq!(bind.as_deref(), Some("127.0.0.1"));
                assert!(dir.is_none());
            }
            other => panic!("Expected serve, got {:?}", other),
        }
    }

    #[test]
    fn test_report_weekly() {
        let cli = Cli::try_parse_from(["workbench", "report", "weekly", "-w", "1"]).unwrap();
        match cli.command {
            Commands::Report {
                command: ReportCommands::Weekly { input, weeks_ago, output },
            } => {
                assert!(input.is_none());
                assert_eq!(weeks_ago, 1);
                assert!(output.is_none());
            }
            other => panic!("Expected report weekly, got {:?}", other),
        }
    }

    #[test]
    fn test_cli_debug_assert() {
        Cli::command().debug_assert();
    }
}
