//! Turns user-supplied URLs into catalog ids.
//!
//! Recognized shapes, in order:
//! 1. playlist pages (`/playlist?list=<id>`, id used as-is)
//! 2. channel handle pages (`https://www.youtube.com/@name`)
//! 3. any channel page tagged with the `--forceid` marker
//!
//! Channels are tracked through their uploads playlist, whose id is the
//! channel id with the second character replaced by `U`.

pub mod scrape;

use std::sync::OnceLock;

use regex::Regex;
use thiserror::Error;

use crate::adapters::PageFetcher;
use crate::catalog::entry::playlist_url;

/// Marker that forces a channel-id lookup on arbitrary channel URLs
pub const FORCE_ID_MARKER: &str = "--forceid";

/// Errors from resolving a URL or fetching a title
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Failed to fetch {url}: {reason}")]
    Fetch { url: String, reason: String },

    #[error("Channel ID not found on {0}")]
    ChannelIdNotFound(String),

    #[error("No page title found for playlist {0}")]
    TitleNotFound(String),
}

/// Recognized URL shape
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UrlShape {
    /// Direct playlist link; holds the list id
    Playlist(String),

    /// Channel handle page; holds the page URL
    ChannelHandle(String),

    /// Channel page tagged with the force marker; holds the URL without it
    ForcedChannel(String),
}

fn list_param_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"playlist\?list=([\w-]+)").expect("list pattern is valid"))
}

/// Classify a URL without touching the network
pub fn classify(url: &str) -> Result<UrlShape, ResolveError> {
    let url = url.trim();

    if let Some(caps) = list_param_pattern().captures(url) {
        return Ok(UrlShape::Playlist(caps[1].to_string()));
    }

    if url.contains("/@") {
        return Ok(UrlShape::ChannelHandle(url.to_string()));
    }

    if url.contains(FORCE_ID_MARKER) {
        let stripped = url.replace(FORCE_ID_MARKER, "").trim().to_string();
        return Ok(UrlShape::ForcedChannel(stripped));
    }

    Err(ResolveError::InvalidUrl(url.to_string()))
}

/// Uploads playlist id for a channel id (`UCxyz` -> `UUxyz`)
pub fn uploads_playlist_id(channel_id: &str) -> Option<String> {
    let mut chars = channel_id.chars();
    let first = chars.next()?;
    chars.next()?;

    let mut id = String::with_capacity(channel_id.len());
    id.push(first);
    id.push('U');
    id.extend(chars);
    Some(id)
}

/// Resolves URLs and titles through a [`PageFetcher`]
pub struct IdentifierResolver<F> {
    fetcher: F,
}

impl<F: PageFetcher> IdentifierResolver<F> {
    pub fn new(fetcher: F) -> Self {
        Self { fetcher }
    }

    /// The underlying fetcher
    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    /// Resolve a URL to a catalog id
    pub async fn resolve(&self, url: &str) -> Result<String, ResolveError> {
        match classify(url)? {
            UrlShape::Playlist(id) => Ok(id),
            UrlShape::ChannelHandle(page) | UrlShape::ForcedChannel(page) => {
                self.uploads_playlist_for(&page).await
            }
        }
    }

    /// Display title for a playlist id
    pub async fn fetch_title(&self, id: &str) -> Result<String, ResolveError> {
        let url = playlist_url(id);
        let html = self.fetch(&url).await?;
        scrape::page_title(&html).ok_or_else(|| ResolveError::TitleNotFound(id.to_string()))
    }

    async fn uploads_playlist_for(&self, page: &str) -> Result<String, ResolveError> {
        let html = self.fetch(page).await?;
        let channel_id = scrape::channel_id(&html)
            .ok_or_else(|| ResolveError::ChannelIdNotFound(page.to_string()))?;

        tracing::debug!(page, channel_id = %channel_id, "Resolved channel");
        uploads_playlist_id(&channel_id)
            .ok_or_else(|| ResolveError::ChannelIdNotFound(page.to_string()))
    }

    async fn fetch(&self, url: &str) -> Result<String, ResolveError> {
        self.fetcher.fetch_text(url).await.map_err(|e| {
            tracing::warn!(url, error = %e, "Fetch failed");
            ResolveError::Fetch {
                url: url.to_string(),
                reason: format!("{:#}", e),
            }
        })
    }
}
