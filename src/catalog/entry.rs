//! A single catalog row.

use std::cmp::{Ordering, Reverse};
use std::fmt;

use chrono::{NaiveDate, NaiveDateTime};

/// Format used for `last_updated` in the catalog file
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Additional spellings accepted when reading `last_updated`
const LENIENT_TIMESTAMP_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S%.f"];

/// Sync precedence of an entry. Higher syncs first, `-1` never syncs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Priority(i64);

impl Priority {
    /// Sentinel for "excluded from sync"
    pub const EXCLUDED: Priority = Priority(-1);

    /// Priority given to newly added entries
    pub const DEFAULT: Priority = Priority(5);

    pub fn new(value: i64) -> Self {
        Self(value)
    }

    pub fn value(self) -> i64 {
        self.0
    }

    pub fn is_excluded(self) -> bool {
        self == Self::EXCLUDED
    }

    /// Parse a priority cell.
    ///
    /// Integer-valued decimals (`5.0`) are accepted since spreadsheet tools
    /// write them once a column has held a blank.
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if let Ok(value) = raw.parse::<i64>() {
            return Some(Self(value));
        }

        let value = raw.parse::<f64>().ok()?;
        if value.is_finite() && value.fract() == 0.0 && value.abs() < i64::MAX as f64 {
            Some(Self(value as i64))
        } else {
            None
        }
    }
}

impl Default for Priority {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One tracked playlist
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogEntry {
    /// Canonical playlist identifier (unique within the catalog)
    pub id: String,

    /// Display title fetched when the entry was added
    pub title: String,

    /// Sync precedence
    pub priority: Priority,

    /// Raw `last_updated` cell, `None` when the entry was never synced
    pub last_updated: Option<String>,
}

impl CatalogEntry {
    /// Create a never-synced entry with the default priority
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            priority: Priority::DEFAULT,
            last_updated: None,
        }
    }

    /// Set the priority
    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    /// Set the last sync time
    pub fn with_last_updated(mut self, timestamp: NaiveDateTime) -> Self {
        self.last_updated = Some(format_timestamp(timestamp));
        self
    }

    /// Parsed `last_updated`. Unparseable values read as `None`.
    pub fn last_updated_at(&self) -> Option<NaiveDateTime> {
        self.last_updated.as_deref().and_then(parse_timestamp)
    }

    /// Playlist page URL handed to the downloader
    pub fn playlist_url(&self) -> String {
        playlist_url(&self.id)
    }

    /// Sync order: priority descending, then oldest sync first.
    ///
    /// Never-synced entries compare lowest on the time key, so they lead
    /// their priority tier.
    pub fn sync_order(&self, other: &Self) -> Ordering {
        self.sync_key().cmp(&other.sync_key())
    }

    fn sync_key(&self) -> (Reverse<Priority>, Option<NaiveDateTime>) {
        (Reverse(self.priority), self.last_updated_at())
    }
}

/// Playlist page URL for an id
pub fn playlist_url(id: &str) -> String {
    format!("https://www.youtube.com/playlist?list={}", id)
}

/// Render a timestamp the way the catalog stores it
pub fn format_timestamp(timestamp: NaiveDateTime) -> String {
    timestamp.format(TIMESTAMP_FORMAT).to_string()
}

/// Parse a stored timestamp, accepting a few common spellings
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    std::iter::once(TIMESTAMP_FORMAT)
        .chain(LENIENT_TIMESTAMP_FORMATS.iter().copied())
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
}
