//! Catalog of tracked playlists.
//!
//! The catalog is a flat CSV file, one row per playlist:
//!
//! ```text
//! last_updated,priority,id,title
//! 2024-03-01 18:22:05,5,PLxxxxxxxxxxxxxxxx,Some Playlist
//! ,10,UUxxxxxxxxxxxxxxxxxxxxxx,Some Channel
//! ```
//!
//! The whole file is read, modified in memory and written back on every
//! mutation. Ids are unique; that is checked when appending and again when
//! a file is loaded.

pub mod entry;
pub mod store;

pub use entry::{CatalogEntry, Priority, TIMESTAMP_FORMAT};
pub use store::{Catalog, CatalogError, CatalogStore, HEADER};
