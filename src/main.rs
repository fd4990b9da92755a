use clap::Parser;
use colored::*;
use eyre::{Context, Result};
use log::info;
use std::fs;
use std::path::{Path, PathBuf};

mod cli;

use cli::Cli;
use cli::commands::{Commands, GeoCommands, PostCommands, ReportCommands};
use workbench::blog::{Blog, Upsert};
use workbench::config::Config;
use workbench::geo::{self, Coordinate};
use workbench::merge::{self, MergeMode};
use workbench::report::{self, WeeklyReport};
use workbench::server::DevServer;

fn setup_logging(level: &str) -> Result<()> {
    let log_dir = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("workbench")
        .join("logs");

    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    let log_file = log_dir.join("workbench.log");

    let target = Box::new(
        fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_file)
            .context("Failed to open log file")?,
    );

    // RUST_LOG still wins over the configured level
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .target(env_logger::Target::Pipe(target))
        .init();

    info!("Logging initialized, writing to: {}", log_file.display());
    Ok(())
}

fn run_application(cli: &Cli, config: &Config) -> Result<()> {
    info!("Starting application");

    if cli.is_verbose() {
        println!("{}", "Verbose mode enabled".yellow());
    }

    match &cli.command {
        Commands::Geo { command } => handle_geo_command(command, config),
        Commands::Merge { dir, output, mode } => handle_merge_command(dir, output.as_deref(), *mode, config),
        Commands::Post { command } => handle_post_command(command, config),
        Commands::Serve { port, bind, dir } => handle_serve_command(*port, bind.as_deref(), dir.as_deref(), config),
        Commands::Report { command } => handle_report_command(command, config),
    }
}

fn handle_geo_command(command: &GeoCommands, config: &Config) -> Result<()> {
    info!("Handling geo command: {:?}", command);
    match command {
        GeoCommands::Distance { lat1, lng1, lat2, lng2 } => {
            let a = Coordinate::new(*lat1, *lng1);
            let b = Coordinate::new(*lat2, *lng2);
            a.validate().context("Invalid first point")?;
            b.validate().context("Invalid second point")?;
            println!("{} {:.2} km", "Distance:".green(), a.distance_to(&b));
        }
        GeoCommands::Nearby { input, output, threshold } => {
            let input = input.clone().unwrap_or_else(|| config.geo.input.clone());
            let output = output.clone().unwrap_or_else(|| config.geo.output.clone());
            let threshold = threshold.unwrap_or(config.geo.threshold_km);

            let places = geo::load_places(&input)
                .with_context(|| format!("Failed to read places from {}", input.display()))?;
            let report = geo::find_nearby(&places, threshold)?;
            geo::write_report(&report, &output)
                .with_context(|| format!("Failed to write {}", output.display()))?;

            let summary = report.summary();
            println!(
                "{} {} places, {} with a neighbour within {} km, {} without",
                "Nearby:".green(),
                summary.total,
                summary.with_nearby,
                threshold,
                summary.without_nearby
            );
            println!("  Written to {}", output.display());
        }
    }
    Ok(())
}

fn handle_merge_command(dir: &Path, output: Option<&Path>, mode: Option<MergeMode>, config: &Config) -> Result<()> {
    let output = output
        .map(Path::to_path_buf)
        .unwrap_or_else(|| dir.join(&config.merge.output));
    let mode = mode.unwrap_or(config.merge.mode);
    info!("Merging {} into {} ({})", dir.display(), output.display(), mode);

    let outcome = merge::merge_directory(dir, &output, mode)
        .with_context(|| format!("Failed to merge JSON files in {}", dir.display()))?;

    for skipped in &outcome.skipped {
        println!("{} {}: {}", "Skipped:".yellow(), skipped.path.display(), skipped.reason);
    }
    println!(
        "{} {} files, {} entries -> {}",
        "Merged:".green(),
        outcome.files.len(),
        outcome.entry_count(),
        output.display()
    );
    Ok(())
}

fn handle_post_command(command: &PostCommands, config: &Config) -> Result<()> {
    info!("Handling post command: {:?}", command);
    let blog = Blog::new(config.blog.clone()).context("Failed to open blog directory")?;

    match command {
        PostCommands::Publish { markdown, new } => {
            let outcome = blog
                .publish(markdown, *new)
                .with_context(|| format!("Failed to publish {}", markdown.display()))?;
            let verb = if outcome.is_new { "Created" } else { "Updated" };
            println!("{} {} ({})", format!("{}:", verb).green(), outcome.post.title, outcome.page.display());
            println!("  Markdown: {}", outcome.markdown.display());
            println!("  Reading time: {} min", outcome.post.reading_time);
            let change = match outcome.catalog_change {
                Upsert::Inserted => "added to",
                Upsert::Updated => "updated in",
            };
            println!("  Catalog entry {} {} ({} posts)", change, blog.catalog_path().display(), outcome.catalog_size);
        }
        PostCommands::Delete { post, force } => {
            if !*force {
                println!(
                    "{} this removes {}, its Markdown and its catalog entry; rerun with --force",
                    "Warning:".yellow(),
                    post
                );
                return Ok(());
            }
            let outcome = blog.delete(post).with_context(|| format!("Failed to delete {}", post))?;
            println!(
                "{} {}{}",
                "Deleted:".red(),
                outcome.page.display(),
                outcome.title.map(|t| format!(" ({})", t)).unwrap_or_default()
            );
            if outcome.markdown_removed {
                println!("  Markdown source removed");
            }
            if !outcome.removed_from_catalog {
                println!("  {}", "No catalog entry was found".yellow());
            }
        }
        PostCommands::List => {
            let posts = blog.list();
            if posts.is_empty() {
                println!("{}", "No posts in catalog".yellow());
            }
            for listed in posts {
                let e = &listed.entry;
                let page = if listed.page_exists { "page".green() } else { "page missing".red() };
                let md = if listed.markdown_exists { "md".green() } else { "md missing".red() };
                println!("{:>4}  {}  {}  [{}] {} | {}", e.id, e.date, e.title.bold(), e.category, page, md);
            }
        }
        PostCommands::Sync => {
            let outcome = blog.sync().context("Failed to sync catalog")?;
            for (path, reason) in &outcome.failed {
                println!("{} {}: {}", "Skipped:".yellow(), path.display(), reason);
            }
            println!(
                "{} {} posts written to {}",
                "Synced:".green(),
                outcome.synced.len(),
                blog.catalog_path().display()
            );
        }
    }
    Ok(())
}

fn handle_serve_command(port: Option<u16>, bind: Option<&str>, dir: Option<&Path>, config: &Config) -> Result<()> {
    let mut server_config = config.server.clone();
    if let Some(port) = port {
        server_config.port = port;
    }
    if let Some(bind) = bind {
        server_config.bind = bind.to_string();
    }
    if let Some(dir) = dir {
        server_config.root = dir.to_path_buf();
    }

    let runtime = tokio::runtime::Runtime::new().context("Failed to start async runtime")?;
    runtime.block_on(async {
        let server = DevServer::bind(&server_config).await?;
        let addr = server.local_addr()?;
        info!("Serving {} on {}", server.root().display(), addr);
        println!("{} http://{} ({})", "Serving:".green(), addr, server.root().display());
        println!("  Press Ctrl-C to stop");

        server
            .run(async {
                if let Err(e) = tokio::signal::ctrl_c().await {
                    log::error!("Failed to listen for Ctrl-C: {}", e);
                }
            })
            .await?;
        println!("{}", "Server stopped".cyan());
        Ok::<(), workbench::WorkbenchError>(())
    })?;
    Ok(())
}

fn handle_report_command(command: &ReportCommands, config: &Config) -> Result<()> {
    info!("Handling report command: {:?}", command);
    match command {
        ReportCommands::Weekly { input, weeks_ago, output } => {
            let input = input.clone().unwrap_or_else(|| config.report.input.clone());
            let tasks = report::load_tasks(&input)
                .with_context(|| format!("Failed to read tasks from {}", input.display()))?;

            let today = chrono::Local::now().date_naive();
            let weekly = WeeklyReport::build(&tasks, today, *weeks_ago, &config.report)?;
            let output = output
                .clone()
                .unwrap_or_else(|| PathBuf::from(weekly.default_file_name()));
            weekly
                .save(&output)
                .with_context(|| format!("Failed to write {}", output.display()))?;

            let m = &weekly.metrics;
            println!(
                "{} {} to {}: {} tasks, {} completed",
                "Week:".green(),
                weekly.window.start,
                weekly.window.end,
                m.total_tasks,
                m.completed_tasks
            );
            println!("  Report written to {}", output.display());
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;

    let level = if cli.is_verbose() {
        "debug".to_string()
    } else {
        config.log_level.clone().unwrap_or_else(|| "info".to_string())
    };
    setup_logging(&level).context("Failed to setup logging")?;

    info!("Starting with config from: {:?}", cli.config);

    run_application(&cli, &config).context("Application failed")?;

    Ok(())
}
