//! Sync Driver Integration Tests
//!
//! Runs the driver against a real catalog file with an in-memory downloader.

use std::collections::HashSet;
use std::sync::Mutex;

use async_trait::async_trait;
use pldl::adapters::{DownloadError, Downloader, PlaylistInfo};
use pldl::catalog::{CatalogEntry, CatalogStore, Priority};
use pldl::core::{SyncDriver, SyncOutcome};
use tempfile::TempDir;

/// Downloader that records calls instead of running yt-dlp
#[derive(Default)]
struct RecordingDownloader {
    missing: HashSet<String>,
    broken: HashSet<String>,
    probed: Mutex<Vec<String>>,
    downloaded: Mutex<Vec<String>>,
}

impl RecordingDownloader {
    fn with_missing(mut self, id: &str) -> Self {
        self.missing.insert(id.to_string());
        self
    }

    fn with_broken(mut self, id: &str) -> Self {
        self.broken.insert(id.to_string());
        self
    }

    fn downloaded(&self) -> Vec<String> {
        self.downloaded.lock().unwrap().clone()
    }

    fn probed(&self) -> Vec<String> {
        self.probed.lock().unwrap().clone()
    }
}

fn list_id(url: &str) -> String {
    url.rsplit("list=").next().unwrap_or_default().to_string()
}

#[async_trait]
impl Downloader for RecordingDownloader {
    fn name(&self) -> &str {
        "recording"
    }

    async fn probe(&self, playlist_url: &str) -> Result<Option<PlaylistInfo>, DownloadError> {
        let id = list_id(playlist_url);
        self.probed.lock().unwrap().push(id.clone());

        if self.missing.contains(&id) {
            return Ok(None);
        }
        Ok(Some(PlaylistInfo::new(format!("Remote {}", id))))
    }

    async fn download(&self, playlist_url: &str) -> Result<(), DownloadError> {
        let id = list_id(playlist_url);
        if self.broken.contains(&id) {
            return Err(DownloadError::Failed {
                url: playlist_url.to_string(),
                code: 1,
            });
        }
        self.downloaded.lock().unwrap().push(id);
        Ok(())
    }
}

async fn store_with(entries: Vec<CatalogEntry>) -> (CatalogStore, TempDir) {
    let temp_dir = TempDir::new().unwrap();
    let store = CatalogStore::new(temp_dir.path().join("data.csv"));
    store.ensure_initialized().await.unwrap();
    for entry in entries {
        store.append(entry).await.unwrap();
    }
    (store, temp_dir)
}

#[tokio::test]
async fn test_excluded_entries_are_skipped() {
    let (store, temp) = store_with(vec![
        CatalogEntry::new("A", "a").with_priority(Priority::EXCLUDED),
        CatalogEntry::new("B", "b"),
    ])
    .await;
    let downloader = RecordingDownloader::default();

    let summary = SyncDriver::new(&store, &downloader, temp.path().join("downloads"))
        .run()
        .await
        .unwrap();

    assert_eq!(downloader.probed(), vec!["B"]);
    assert_eq!(downloader.downloaded(), vec!["B"]);
    assert_eq!(summary.ids(), vec!["B", "A"]);
    assert_eq!(summary.reports[1].outcome, SyncOutcome::Skipped);
    assert_eq!(summary.skipped(), 1);
    assert_eq!(summary.downloaded(), 1);

    let catalog = store.load().await.unwrap();
    assert!(catalog.get("A").unwrap().last_updated.is_none());
    assert!(catalog.get("B").unwrap().last_updated_at().is_some());
}

#[tokio::test]
async fn test_not_found_is_not_marked_synced() {
    let (store, temp) = store_with(vec![
        CatalogEntry::new("gone", "Deleted playlist"),
        CatalogEntry::new("ok", "Fine"),
    ])
    .await;
    let downloader = RecordingDownloader::default().with_missing("gone");

    let summary = SyncDriver::new(&store, &downloader, temp.path())
        .run()
        .await
        .unwrap();

    assert_eq!(summary.reports[0].outcome, SyncOutcome::NotFound);
    assert_eq!(
        summary.reports[1].outcome,
        SyncOutcome::Downloaded {
            remote_title: "Remote ok".to_string()
        }
    );
    assert_eq!(downloader.downloaded(), vec!["ok"]);

    let catalog = store.load().await.unwrap();
    assert!(catalog.get("gone").unwrap().last_updated.is_none());
    assert!(catalog.get("ok").unwrap().last_updated.is_some());
}

#[tokio::test]
async fn test_failure_does_not_stop_the_run() {
    let (store, temp) = store_with(vec![
        CatalogEntry::new("first", "1").with_priority(Priority::new(9)),
        CatalogEntry::new("second", "2"),
    ])
    .await;
    let downloader = RecordingDownloader::default().with_broken("first");

    let summary = SyncDriver::new(&store, &downloader, temp.path())
        .run()
        .await
        .unwrap();

    assert!(matches!(summary.reports[0].outcome, SyncOutcome::Failed(_)));
    assert_eq!(summary.failed(), 1);
    assert_eq!(downloader.downloaded(), vec!["second"]);

    let catalog = store.load().await.unwrap();
    assert!(catalog.get("first").unwrap().last_updated.is_none());
}

#[tokio::test]
async fn test_processing_follows_sync_order() {
    let new_year = chrono::NaiveDate::from_ymd_opt(2024, 1, 1)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap();
    let (store, temp) = store_with(vec![
        CatalogEntry::new("recent", "r").with_last_updated(new_year),
        CatalogEntry::new("never", "n"),
        CatalogEntry::new("pinned", "p").with_priority(Priority::new(100)),
    ])
    .await;
    let downloader = RecordingDownloader::default();

    SyncDriver::new(&store, &downloader, temp.path())
        .run()
        .await
        .unwrap();

    assert_eq!(downloader.downloaded(), vec!["pinned", "never", "recent"]);
}

#[tokio::test]
async fn test_dry_run_touches_nothing() {
    let (store, temp) = store_with(vec![
        CatalogEntry::new("A", "a"),
        CatalogEntry::new("B", "b").with_priority(Priority::EXCLUDED),
    ])
    .await;
    let before = std::fs::read(store.path()).unwrap();
    let downloader = RecordingDownloader::default();

    let summary = SyncDriver::new(&store, &downloader, temp.path())
        .dry_run(true)
        .run()
        .await
        .unwrap();

    assert_eq!(summary.reports[0].outcome, SyncOutcome::Planned);
    assert_eq!(summary.reports[1].outcome, SyncOutcome::Skipped);
    assert!(downloader.probed().is_empty());
    assert_eq!(std::fs::read(store.path()).unwrap(), before);
}

#[tokio::test]
async fn test_empty_catalog() {
    let (store, temp) = store_with(vec![]).await;
    let downloader = RecordingDownloader::default();

    let summary = SyncDriver::new(&store, &downloader, temp.path())
        .run()
        .await
        .unwrap();

    assert!(summary.reports.is_empty());
}
