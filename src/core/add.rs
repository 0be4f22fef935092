//! Adding playlists to the catalog.

use std::path::Path;

use thiserror::Error;

use crate::adapters::PageFetcher;
use crate::catalog::{CatalogEntry, CatalogError, CatalogStore};
use crate::resolver::{IdentifierResolver, ResolveError};

/// Errors from adding a URL
#[derive(Debug, Error)]
pub enum AddError {
    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

/// Resolve `url` and append it to the catalog.
///
/// The duplicate check runs before the title fetch, so a known playlist
/// costs no page request. A title fetch failure aborts the add.
pub async fn add_playlist<F: PageFetcher>(
    store: &CatalogStore,
    resolver: &IdentifierResolver<F>,
    url: &str,
) -> Result<CatalogEntry, AddError> {
    let id = resolver.resolve(url).await?;

    let catalog = store.load().await?;
    if let Some(existing) = catalog.get(&id) {
        return Err(CatalogError::DuplicateEntry {
            id: existing.id.clone(),
            title: existing.title.clone(),
        }
        .into());
    }

    let title = resolver.fetch_title(&id).await?;
    let entry = CatalogEntry::new(id, title);
    store.append(entry.clone()).await?;

    tracing::info!(id = %entry.id, title = %entry.title, "Playlist added");
    Ok(entry)
}

/// One-line, operator-facing summary of an add attempt
pub fn describe(result: &Result<CatalogEntry, AddError>, csv_path: &Path) -> String {
    match result {
        Ok(entry) => format!("Added '{}' to '{}'", entry.title, csv_path.display()),
        Err(AddError::Catalog(CatalogError::DuplicateEntry { id, title })) => format!(
            "The playlist '{}' ({}) already exists in '{}'",
            title,
            id,
            csv_path.display()
        ),
        Err(e) => format!("Error: {}", e),
    }
}
