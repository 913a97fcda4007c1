use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::csv_store::CsvDrawStore;
use crate::database::SqliteDrawStore;
use crate::error::StoreError;
use crate::types::{AppendResult, DrawRecord};

/// Append-only collection of draws keyed by `game_id`.
///
/// Callers must serialize runs against the same store; there is no internal
/// locking between `load_all` and the write in `merge_and_append`.
pub trait DrawStore {
    /// Every persisted record in storage order. A store that does not exist
    /// yet loads as empty.
    fn load_all(&self) -> Result<Vec<DrawRecord>, StoreError>;

    /// Append the records of `batch` whose `game_id` is not stored yet.
    fn merge_and_append(&mut self, batch: &[DrawRecord]) -> Result<AppendResult, StoreError>;
}

/// Records of `batch` not present in `existing`, in batch order. A `game_id`
/// repeated inside the batch is admitted once.
pub fn select_new(existing: &[DrawRecord], batch: &[DrawRecord]) -> Vec<DrawRecord> {
    let mut seen: HashSet<&str> = existing.iter().map(|r| r.game_id.trim()).collect();

    batch
        .iter()
        .filter(|r| seen.insert(r.game_id.trim()))
        .cloned()
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Csv,
    Sqlite,
}

impl StoreBackend {
    pub fn infer(path: &Path) -> Self {
        match path.extension().and_then(|s| s.to_str()) {
            Some(ext) if ["db", "sqlite", "sqlite3"].contains(&ext.to_ascii_lowercase().as_str()) => {
                StoreBackend::Sqlite
            }
            _ => StoreBackend::Csv,
        }
    }
}

impl FromStr for StoreBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "csv" => Ok(StoreBackend::Csv),
            "sqlite" | "db" => Ok(StoreBackend::Sqlite),
            other => Err(format!("unknown store backend: {}", other)),
        }
    }
}

pub fn open_store(path: impl Into<PathBuf>, backend: StoreBackend) -> Box<dyn DrawStore + Send> {
    let path = path.into();
    match backend {
        StoreBackend::Csv => Box::new(CsvDrawStore::new(path)),
        StoreBackend::Sqlite => Box::new(SqliteDrawStore::new(path)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::parse_scraped_at;

    fn record(id: &str) -> DrawRecord {
        DrawRecord {
            game_id: id.to_string(),
            draw_timestamp: "t".to_string(),
            numbers: "1-2".to_string(),
            scraped_at: parse_scraped_at("2025-01-01 00:00:00").unwrap(),
        }
    }

    #[test]
    fn select_new_skips_stored_and_repeated_ids() {
        let existing = vec![record("1"), record("2")];
        let batch = vec![record("2"), record("3"), record(" 3 "), record("4"), record("1")];
        let ids: Vec<_> = select_new(&existing, &batch)
            .into_iter()
            .map(|r| r.game_id)
            .collect();
        assert_eq!(ids, vec!["3", "4"]);
    }

    #[test]
    fn backend_from_extension() {
        assert_eq!(StoreBackend::infer(Path::new("results.csv")), StoreBackend::Csv);
        assert_eq!(StoreBackend::infer(Path::new("data/keno.DB")), StoreBackend::Sqlite);
        assert_eq!(StoreBackend::infer(Path::new("results")), StoreBackend::Csv);
        assert_eq!("SQLite".parse::<StoreBackend>(), Ok(StoreBackend::Sqlite));
        assert!("parquet".parse::<StoreBackend>().is_err());
    }
}
