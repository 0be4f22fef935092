//! Adapter interfaces for external systems.
//!
//! Two collaborators sit behind traits so the add and sync flows can be
//! exercised without the network or a real downloader:
//! - [`PageFetcher`]: plain HTTP GET of YouTube pages
//! - [`Downloader`]: the `yt-dlp` executable

pub mod http;
pub mod ytdlp;

use anyhow::Result;
use async_trait::async_trait;

pub use http::HttpFetcher;
pub use ytdlp::{DownloadError, YtDlpAdapter};

/// Metadata returned by a successful probe
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaylistInfo {
    /// Playlist title as reported by the platform
    pub title: String,

    /// Number of entries, when known
    pub entry_count: Option<u64>,
}

impl PlaylistInfo {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            entry_count: None,
        }
    }
}

/// Fetches page bodies over HTTP
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// GET `url` and return the body as text. Non-success statuses are errors.
    async fn fetch_text(&self, url: &str) -> Result<String>;
}

/// Downloads playlists
#[async_trait]
pub trait Downloader: Send + Sync {
    /// Human-readable downloader name
    fn name(&self) -> &str;

    /// Look up a playlist without downloading. `Ok(None)` means not found.
    async fn probe(&self, playlist_url: &str) -> Result<Option<PlaylistInfo>, DownloadError>;

    /// Download every item of the playlist
    async fn download(&self, playlist_url: &str) -> Result<(), DownloadError>;
}
