//! Syncing cataloged playlists through the downloader.
//!
//! Entries are processed one at a time in sync order. Failures are reported
//! per entry and never stop the run.

use std::path::PathBuf;

use chrono::{NaiveDateTime, Timelike, Utc};

use crate::adapters::Downloader;
use crate::catalog::{CatalogEntry, CatalogError, CatalogStore};

const TAG: &str = "[PLDL]";

/// What happened to one entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    /// Downloaded and marked synced
    Downloaded { remote_title: String },

    /// Excluded by priority
    Skipped,

    /// The downloader could not find the playlist
    NotFound,

    /// Would be downloaded (dry run)
    Planned,

    /// Downloader or catalog error
    Failed(String),
}

/// Per-entry result
#[derive(Debug, Clone)]
pub struct SyncReport {
    pub id: String,
    pub title: String,
    pub outcome: SyncOutcome,
}

/// Result of a sync run, in processing order
#[derive(Debug, Clone, Default)]
pub struct SyncSummary {
    pub reports: Vec<SyncReport>,
}

impl SyncSummary {
    fn count(&self, matches: impl Fn(&SyncOutcome) -> bool) -> usize {
        self.reports.iter().filter(|r| matches(&r.outcome)).count()
    }

    pub fn downloaded(&self) -> usize {
        self.count(|o| matches!(o, SyncOutcome::Downloaded { .. }))
    }

    pub fn skipped(&self) -> usize {
        self.count(|o| matches!(o, SyncOutcome::Skipped))
    }

    pub fn not_found(&self) -> usize {
        self.count(|o| matches!(o, SyncOutcome::NotFound))
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, SyncOutcome::Failed(_)))
    }

    /// Ids in the order they were processed
    pub fn ids(&self) -> Vec<&str> {
        self.reports.iter().map(|r| r.id.as_str()).collect()
    }
}

/// Drives the downloader over the catalog
pub struct SyncDriver<'a, D: ?Sized> {
    store: &'a CatalogStore,
    downloader: &'a D,
    save_path: PathBuf,
    dry_run: bool,
}

impl<'a, D: Downloader + ?Sized> SyncDriver<'a, D> {
    pub fn new(store: &'a CatalogStore, downloader: &'a D, save_path: impl Into<PathBuf>) -> Self {
        Self {
            store,
            downloader,
            save_path: save_path.into(),
            dry_run: false,
        }
    }

    /// Report the plan without downloading or touching the catalog
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Sync every entry. Only loading the catalog up front can fail the run.
    pub async fn run(&self) -> Result<SyncSummary, CatalogError> {
        let entries = self.store.ordered_for_sync().await?;
        tracing::info!(
            entries = entries.len(),
            downloader = self.downloader.name(),
            dry_run = self.dry_run,
            "Starting sync"
        );

        let mut summary = SyncSummary::default();
        for entry in entries {
            let outcome = self.sync_entry(&entry).await;
            summary.reports.push(SyncReport {
                id: entry.id,
                title: entry.title,
                outcome,
            });
        }

        Ok(summary)
    }

    async fn sync_entry(&self, entry: &CatalogEntry) -> SyncOutcome {
        if entry.priority.is_excluded() {
            println!("{} Skipping '{}' due to priority setting.", TAG, entry.title);
            return SyncOutcome::Skipped;
        }

        if self.dry_run {
            println!("{} Would download '{}' ({})", TAG, entry.title, entry.id);
            return SyncOutcome::Planned;
        }

        println!("{} Downloading '{}'...", TAG, entry.title);
        let url = entry.playlist_url();

        let info = match self.downloader.probe(&url).await {
            Ok(Some(info)) => info,
            Ok(None) => {
                println!("{} Failed to download '{}': Playlist not found.", TAG, url);
                return SyncOutcome::NotFound;
            }
            Err(e) => return self.failed(entry, e.to_string()),
        };

        tracing::info!(id = %entry.id, items = ?info.entry_count, "Playlist found");
        println!("{} Downloading playlist '{}'...", TAG, info.title);
        if let Err(e) = self.downloader.download(&url).await {
            return self.failed(entry, e.to_string());
        }
        println!(
            "{} Finished downloading playlist '{}' to '{}'",
            TAG,
            info.title,
            self.save_path.display()
        );

        if let Err(e) = self.store.mark_synced(&entry.id, now()).await {
            return self.failed(entry, e.to_string());
        }

        SyncOutcome::Downloaded {
            remote_title: info.title,
        }
    }

    fn failed(&self, entry: &CatalogEntry, reason: String) -> SyncOutcome {
        println!("{} Failed to sync '{}': {}", TAG, entry.title, reason);
        tracing::warn!(id = %entry.id, %reason, "Sync failed");
        SyncOutcome::Failed(reason)
    }
}

/// Current UTC time at second precision, as stored in the catalog
fn now() -> NaiveDateTime {
    let now = Utc::now().naive_utc();
    now.with_nanosecond(0).unwrap_or(now)
}
