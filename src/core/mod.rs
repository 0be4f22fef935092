//! Core flows.
//!
//! This module contains:
//! - add: URL -> catalog row
//! - sync: catalog -> downloader, in sync order

pub mod add;
pub mod sync;

// Re-export commonly used types
pub use add::{add_playlist, AddError};
pub use sync::{SyncDriver, SyncOutcome, SyncReport, SyncSummary};
