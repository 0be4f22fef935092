//! pldl - playlist catalog and sync tool
//!
//! Keeps a CSV catalog of YouTube playlists (and channel uploads) and
//! downloads them through yt-dlp, remembering when each was last synced.
//!
//! # Modules
//!
//! - `catalog`: CSV-backed catalog and sync ordering
//! - `resolver`: URL classification, channel id and title scraping
//! - `adapters`: External system integrations (HTTP, yt-dlp)
//! - `core`: Add and sync flows
//! - `config`: `config.json` loading
//! - `cli`: Command-line interface
//!
//! # Usage
//!
//! ```bash
//! # Add playlists (or run without URLs for an interactive prompt)
//! pldl add https://www.youtube.com/playlist?list=PL123
//! pldl add https://www.youtube.com/@somechannel
//!
//! # Download everything, highest priority and stalest first
//! pldl sync
//! ```

pub mod adapters;
pub mod catalog;
pub mod cli;
pub mod config;
pub mod core;
pub mod resolver;

// Re-export main types at crate root for convenience
pub use catalog::{Catalog, CatalogEntry, CatalogError, CatalogStore, Priority};
pub use config::ResolvedConfig;
pub use core::{SyncDriver, SyncOutcome, SyncSummary};
pub use resolver::{IdentifierResolver, ResolveError};
