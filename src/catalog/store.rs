//! CSV-backed catalog storage.
//!
//! Every mutation rewrites the whole file. There is no locking; the last
//! writer wins.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use csv::{ReaderBuilder, StringRecord, WriterBuilder};
use thiserror::Error;
use tokio::fs;

use super::entry::{format_timestamp, CatalogEntry, Priority};

/// Column layout of the catalog file
pub const HEADER: [&str; 4] = ["last_updated", "priority", "id", "title"];

/// Errors raised by the catalog
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("The playlist '{title}' ({id}) already exists in the catalog")]
    DuplicateEntry { id: String, title: String },

    #[error("No catalog entry with id '{0}'")]
    NotFound(String),

    #[error("Invalid catalog id '{0}'")]
    InvalidId(String),

    #[error("Malformed catalog {} (line {line}): {reason}", .path.display())]
    Schema {
        path: PathBuf,
        line: u64,
        reason: String,
    },

    #[error("Catalog I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// In-memory catalog, rows kept in file order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Catalog {
    entries: Vec<CatalogEntry>,
}

impl Catalog {
    /// Create an empty catalog
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a catalog from rows, rejecting duplicate ids
    pub fn from_entries(entries: impl IntoIterator<Item = CatalogEntry>) -> Result<Self, CatalogError> {
        let mut catalog = Self::new();
        for entry in entries {
            catalog.append(entry)?;
        }
        Ok(catalog)
    }

    /// Rows in file order
    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    /// Get an entry by id
    pub fn get(&self, id: &str) -> Option<&CatalogEntry> {
        self.entries.iter().find(|e| e.id == id)
    }

    /// Exact id match
    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    /// Append a row at the end. Ids are trimmed the way the file reader
    /// trims them; empty and duplicate ids are refused and leave the catalog
    /// unchanged.
    pub fn append(&mut self, mut entry: CatalogEntry) -> Result<(), CatalogError> {
        let id = entry.id.trim();
        if id.is_empty() {
            return Err(CatalogError::InvalidId(entry.id));
        }
        if id.len() != entry.id.len() {
            entry.id = id.to_string();
        }

        if let Some(existing) = self.get(&entry.id) {
            return Err(CatalogError::DuplicateEntry {
                id: existing.id.clone(),
                title: existing.title.clone(),
            });
        }
        self.entries.push(entry);
        Ok(())
    }

    /// Record a successful sync of `id`
    pub fn mark_synced(&mut self, id: &str, timestamp: NaiveDateTime) -> Result<(), CatalogError> {
        let entry = self
            .entries
            .iter_mut()
            .find(|e| e.id == id)
            .ok_or_else(|| CatalogError::NotFound(id.to_string()))?;
        entry.last_updated = Some(format_timestamp(timestamp));
        Ok(())
    }

    /// All rows in sync order (stable).
    pub fn ordered_for_sync(&self) -> Vec<CatalogEntry> {
        let mut ordered = self.entries.clone();
        ordered.sort_by(|a, b| a.sync_order(b));
        ordered
    }

    /// Number of rows
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the catalog has no rows
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Parse catalog CSV. `path` is only used in error messages.
    pub fn from_csv(content: &str, path: &Path) -> Result<Self, CatalogError> {
        let schema_error = |line: u64, reason: String| CatalogError::Schema {
            path: path.to_path_buf(),
            line,
            reason,
        };

        let content = content.strip_prefix('\u{feff}').unwrap_or(content);
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(content.as_bytes());

        let headers = reader.headers()?.clone();
        let found: Vec<&str> = headers.iter().map(str::trim).collect();
        if found != HEADER {
            return Err(schema_error(
                1,
                format!("expected header '{}', found '{}'", HEADER.join(","), found.join(",")),
            ));
        }

        let mut entries = Vec::new();
        let mut seen = HashSet::new();

        for record in reader.records() {
            let record = record?;
            let line = record.position().map(|p| p.line()).unwrap_or(0);
            let entry = parse_row(&record).map_err(|reason| schema_error(line, reason))?;

            if !seen.insert(entry.id.clone()) {
                return Err(schema_error(line, format!("duplicate id '{}'", entry.id)));
            }
            entries.push(entry);
        }

        Ok(Self { entries })
    }

    /// Render the catalog as CSV, header included
    pub fn to_csv(&self) -> Result<Vec<u8>, CatalogError> {
        let mut writer = WriterBuilder::new().from_writer(Vec::new());
        writer.write_record(HEADER)?;

        for entry in &self.entries {
            let priority = entry.priority.to_string();
            writer.write_record([
                entry.last_updated.as_deref().unwrap_or(""),
                priority.as_str(),
                entry.id.as_str(),
                entry.title.as_str(),
            ])?;
        }

        writer
            .into_inner()
            .map_err(|e| CatalogError::Csv(e.into_error().into()))
    }
}

fn parse_row(record: &StringRecord) -> Result<CatalogEntry, String> {
    if record.len() != HEADER.len() {
        return Err(format!(
            "expected {} fields, found {}",
            HEADER.len(),
            record.len()
        ));
    }

    let last_updated = record[0].trim();
    let priority = Priority::parse(&record[1])
        .ok_or_else(|| format!("priority '{}' is not an integer", &record[1]))?;
    let id = record[2].trim();
    if id.is_empty() {
        return Err("empty id".to_string());
    }

    Ok(CatalogEntry {
        id: id.to_string(),
        title: record[3].to_string(),
        priority,
        last_updated: (!last_updated.is_empty()).then(|| last_updated.to_string()),
    })
}

/// File-backed catalog
#[derive(Debug, Clone)]
pub struct CatalogStore {
    path: PathBuf,
}

impl CatalogStore {
    /// Open a store at `path` (the file is not touched)
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the catalog file
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> CatalogError {
        CatalogError::Io {
            path: self.path.clone(),
            source,
        }
    }

    /// Create an empty catalog (header only) if none exists yet
    pub async fn ensure_initialized(&self) -> Result<(), CatalogError> {
        if fs::try_exists(&self.path).await.map_err(|e| self.io_error(e))? {
            return Ok(());
        }

        tracing::info!(path = %self.path.display(), "Creating empty catalog");
        self.save(&Catalog::new()).await
    }

    /// Load the catalog from disk
    pub async fn load(&self) -> Result<Catalog, CatalogError> {
        let content = fs::read_to_string(&self.path)
            .await
            .map_err(|e| self.io_error(e))?;

        Catalog::from_csv(&content, &self.path)
    }

    /// Save the catalog to disk, replacing the file
    pub async fn save(&self, catalog: &Catalog) -> Result<(), CatalogError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| self.io_error(e))?;
        }

        let content = catalog.to_csv()?;
        fs::write(&self.path, content)
            .await
            .map_err(|e| self.io_error(e))?;

        tracing::debug!(path = %self.path.display(), rows = catalog.len(), "Catalog written");
        Ok(())
    }

    /// Check whether `id` is cataloged
    pub async fn contains(&self, id: &str) -> Result<bool, CatalogError> {
        Ok(self.load().await?.contains(id))
    }

    /// Append an entry and persist
    pub async fn append(&self, entry: CatalogEntry) -> Result<(), CatalogError> {
        let mut catalog = self.load().await?;
        catalog.append(entry)?;
        self.save(&catalog).await
    }

    /// Set `last_updated` for `id` and persist
    pub async fn mark_synced(&self, id: &str, timestamp: NaiveDateTime) -> Result<(), CatalogError> {
        let mut catalog = self.load().await?;
        catalog.mark_synced(id, timestamp)?;
        self.save(&catalog).await
    }

    /// Load and return every entry in sync order
    pub async fn ordered_for_sync(&self) -> Result<Vec<CatalogEntry>, CatalogError> {
        Ok(self.load().await?.ordered_for_sync())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(raw: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S").unwrap()
    }

    fn ids(entries: &[CatalogEntry]) -> Vec<&str> {
        entries.iter().map(|e| e.id.as_str()).collect()
    }

    #[test]
    fn test_append_rejects_duplicate() {
        let mut catalog = Catalog::new();
        catalog.append(CatalogEntry::new("PL1", "First")).unwrap();

        let err = catalog
            .append(CatalogEntry::new("PL1", "Again"))
            .unwrap_err();
        assert!(matches!(err, CatalogError::DuplicateEntry { ref title, .. } if title == "First"));
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.get("PL1").unwrap().title, "First");
    }

    #[test]
    fn test_append_normalizes_id_like_the_reader() {
        let mut catalog = Catalog::new();
        catalog.append(CatalogEntry::new("A", "First")).unwrap();

        let err = catalog.append(CatalogEntry::new(" A\t", "Padded")).unwrap_err();
        assert!(matches!(err, CatalogError::DuplicateEntry { ref id, .. } if id == "A"));

        catalog.append(CatalogEntry::new("  B ", "Second")).unwrap();
        assert!(catalog.contains("B"));

        let csv = String::from_utf8(catalog.to_csv().unwrap()).unwrap();
        let reread = Catalog::from_csv(&csv, Path::new("data.csv")).unwrap();
        assert_eq!(reread, catalog);
    }

    #[test]
    fn test_append_rejects_empty_id() {
        let mut catalog = Catalog::new();
        for id in ["", "   "] {
            let err = catalog.append(CatalogEntry::new(id, "Nameless")).unwrap_err();
            assert!(matches!(err, CatalogError::InvalidId(_)));
        }
        assert!(catalog.is_empty());
    }

    #[test]
    fn test_mark_synced_unknown_id() {
        let mut catalog = Catalog::from_entries([CatalogEntry::new("PL1", "First")]).unwrap();
        let err = catalog
            .mark_synced("PL2", at("2024-01-01 00:00:00"))
            .unwrap_err();
        assert!(matches!(err, CatalogError::NotFound(ref id) if id == "PL2"));
        assert!(catalog.get("PL1").unwrap().last_updated.is_none());
    }

    #[test]
    fn test_ordered_for_sync_null_sorts_first() {
        let catalog = Catalog::from_entries([
            CatalogEntry::new("B", "b").with_last_updated(at("2020-01-01 00:00:00")),
            CatalogEntry::new("A", "a"),
        ])
        .unwrap();

        assert_eq!(ids(&catalog.ordered_for_sync()), vec!["A", "B"]);
    }

    #[test]
    fn test_ordered_for_sync_is_stable() {
        let catalog = Catalog::from_entries([
            CatalogEntry::new("low", "l").with_priority(Priority::new(1)),
            CatalogEntry::new("tie1", "t"),
            CatalogEntry::new("old", "o").with_last_updated(at("2021-06-01 12:00:00")),
            CatalogEntry::new("tie2", "t"),
            CatalogEntry::new("top", "t").with_priority(Priority::new(9)),
            CatalogEntry::new("off", "x").with_priority(Priority::EXCLUDED),
            CatalogEntry::new("new", "n").with_last_updated(at("2023-06-01 12:00:00")),
        ])
        .unwrap();

        assert_eq!(
            ids(&catalog.ordered_for_sync()),
            vec!["top", "tie1", "tie2", "old", "new", "low", "off"]
        );
        // File order is untouched
        assert_eq!(catalog.entries()[0].id, "low");
    }

    #[test]
    fn test_csv_layout() {
        let catalog = Catalog::from_entries([
            CatalogEntry::new("PL1", "Talks, vol. \"2\"").with_last_updated(at("2024-03-01 18:22:05")),
            CatalogEntry::new("UU2", "Channel").with_priority(Priority::EXCLUDED),
        ])
        .unwrap();

        let csv = String::from_utf8(catalog.to_csv().unwrap()).unwrap();
        assert_eq!(
            csv,
            "last_updated,priority,id,title\n\
             2024-03-01 18:22:05,5,PL1,\"Talks, vol. \"\"2\"\"\"\n\
             ,-1,UU2,Channel\n"
        );

        let parsed = Catalog::from_csv(&csv, Path::new("data.csv")).unwrap();
        assert_eq!(parsed, catalog);
    }

    #[test]
    fn test_from_csv_keeps_unparseable_timestamp() {
        let csv = "last_updated,priority,id,title\nsometime,5.0,PL1,Title\n";
        let catalog = Catalog::from_csv(csv, Path::new("data.csv")).unwrap();
        let entry = catalog.get("PL1").unwrap();
        assert_eq!(entry.last_updated.as_deref(), Some("sometime"));
        assert_eq!(entry.last_updated_at(), None);
        assert_eq!(entry.priority, Priority::new(5));
    }

    #[test]
    fn test_from_csv_schema_errors() {
        let path = Path::new("data.csv");
        let cases = [
            ("", 1),
            ("id,title\nPL1,Title\n", 1),
            ("last_updated,priority,id,title\n,5,PL1\n", 2),
            ("last_updated,priority,id,title\n,five,PL1,T\n", 2),
            ("last_updated,priority,id,title\n,5, ,T\n", 2),
            ("last_updated,priority,id,title\n,5,PL1,T\n,5,PL1,T\n", 3),
        ];

        for (content, expected_line) in cases {
            match Catalog::from_csv(content, path) {
                Err(CatalogError::Schema { line, .. }) => {
                    assert_eq!(line, expected_line, "content: {:?}", content)
                }
                other => panic!("expected schema error for {:?}, got {:?}", content, other),
            }
        }
    }

    #[test]
    fn test_from_csv_strips_bom() {
        let csv = "\u{feff}last_updated,priority,id,title\n,5,PL1,T\n";
        let catalog = Catalog::from_csv(csv, Path::new("data.csv")).unwrap();
        assert_eq!(catalog.len(), 1);
    }
}
