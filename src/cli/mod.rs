//! Command-line interface for pldl.
//!
//! Provides commands for adding playlists to the catalog, syncing them
//! through yt-dlp, listing the catalog and showing the configuration.

use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Lines};

use crate::adapters::{HttpFetcher, PageFetcher, YtDlpAdapter};
use crate::catalog::{CatalogEntry, CatalogStore};
use crate::config::{paths, ResolvedConfig};
use crate::core::add::{add_playlist, describe};
use crate::core::SyncDriver;
use crate::resolver::IdentifierResolver;

const PROMPT: &str = "Enter YouTube playlist/channel URL (or 'exit' to quit): ";

/// pldl - keep a catalog of YouTube playlists and sync them with yt-dlp
#[derive(Parser, Debug)]
#[command(name = "pldl")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Project root holding config.json and the catalog (default: current directory)
    #[arg(long, global = true, env = paths::HOME_ENV)]
    pub root: Option<PathBuf>,

    /// Config file (default: <root>/config.json)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Add playlists or channels to the catalog
    Add {
        /// URLs to add (prompts interactively if none are given)
        urls: Vec<String>,
    },

    /// Download every cataloged playlist in sync order
    Sync {
        /// Only print what would be downloaded
        #[arg(long)]
        dry_run: bool,
    },

    /// List the catalog in sync order
    List,

    /// Show resolved configuration
    Config,
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(self) -> Result<()> {
        let config = ResolvedConfig::load(self.root, self.config)?;

        match self.command {
            Commands::Add { urls } => add_urls(&config, urls).await,
            Commands::Sync { dry_run } => sync(&config, dry_run).await,
            Commands::List => list_catalog(&config).await,
            Commands::Config => show_config(&config),
        }
    }
}

/// Add URLs from arguments, or from stdin until `exit`
async fn add_urls(config: &ResolvedConfig, urls: Vec<String>) -> Result<()> {
    let store = CatalogStore::new(&config.csv_file);
    store.ensure_initialized().await?;

    let resolver = IdentifierResolver::new(HttpFetcher::new()?);

    if !urls.is_empty() {
        for url in urls {
            add_one(&store, &resolver, &url).await;
        }
        return Ok(());
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(url) = next_url(&mut lines).await? {
        add_one(&store, &resolver, &url).await;
    }

    Ok(())
}

/// Prompt until a non-blank line arrives. `None` on `exit` or end of input.
async fn next_url<R>(lines: &mut Lines<R>) -> Result<Option<String>>
where
    R: AsyncBufRead + Unpin,
{
    loop {
        print!("{}", PROMPT);
        std::io::stdout().flush().context("Failed to flush stdout")?;

        let Some(line) = lines.next_line().await.context("Failed to read from stdin")? else {
            println!();
            return Ok(None);
        };

        let url = line.trim();
        if url.eq_ignore_ascii_case("exit") {
            return Ok(None);
        }
        if !url.is_empty() {
            return Ok(Some(url.to_string()));
        }
    }
}

async fn add_one<F: PageFetcher>(store: &CatalogStore, resolver: &IdentifierResolver<F>, url: &str) {
    let result = add_playlist(store, resolver, url).await;
    println!("{}", describe(&result, store.path()));
}

/// Run the sync driver over the catalog
async fn sync(config: &ResolvedConfig, dry_run: bool) -> Result<()> {
    let store = CatalogStore::new(&config.csv_file);
    store.ensure_initialized().await?;
    let save_path = config.ensure_save_path().await?;

    let downloader = YtDlpAdapter::from_config(config);
    let summary = SyncDriver::new(&store, &downloader, save_path)
        .dry_run(dry_run)
        .run()
        .await
        .with_context(|| format!("Failed to load catalog: {}", store.path().display()))?;

    println!(
        "[PLDL] Done: {} downloaded, {} skipped, {} not found, {} failed",
        summary.downloaded(),
        summary.skipped(),
        summary.not_found(),
        summary.failed()
    );

    Ok(())
}

/// List the catalog in sync order
async fn list_catalog(config: &ResolvedConfig) -> Result<()> {
    let store = CatalogStore::new(&config.csv_file);

    if !store.path().exists() {
        println!("Catalog is empty. Use 'pldl add <url>' to add playlists.");
        return Ok(());
    }

    let entries = store.ordered_for_sync().await?;
    if entries.is_empty() {
        println!("Catalog is empty. Use 'pldl add <url>' to add playlists.");
        return Ok(());
    }

    println!("{:<9} {:<20} {:<36} {}", "PRIORITY", "LAST UPDATED", "ID", "TITLE");
    println!("{}", "-".repeat(100));

    for entry in &entries {
        println!("{}", format_row(entry));
    }

    println!("\nTotal: {} playlists", entries.len());

    Ok(())
}

fn format_row(entry: &CatalogEntry) -> String {
    let priority = if entry.priority.is_excluded() {
        "off".to_string()
    } else {
        entry.priority.to_string()
    };
    let last_updated = entry.last_updated.as_deref().unwrap_or("never");

    let title = if entry.title.chars().count() > 47 {
        format!("{}...", entry.title.chars().take(47).collect::<String>())
    } else {
        entry.title.clone()
    };

    format!(
        "{:<9} {:<20} {:<36} {}",
        priority, last_updated, entry.id, title
    )
}

/// Show the resolved configuration (for debugging)
fn show_config(config: &ResolvedConfig) -> Result<()> {
    println!("pldl configuration");
    println!();
    println!(
        "Config file: {}",
        config
            .config_file
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "(none - using defaults)".to_string())
    );
    println!();
    println!("Paths:");
    println!("  Root:      {}", config.root.display());
    println!("  Catalog:   {}", config.csv_file.display());
    println!("  Downloads: {}", config.save_path.display());
    println!();

    let downloader = YtDlpAdapter::from_config(config);
    println!("yt-dlp:");
    println!("  Binary:          {}", downloader.binary_path());
    println!("  Output template: {}", downloader.output_template().display());
    let args = downloader.option_args();
    if args.is_empty() {
        println!("  Options:         (none)");
    } else {
        println!("  Options:         {}", args.join(" "));
    }

    Ok(())
}
