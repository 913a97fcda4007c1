use rusqlite::{Connection, ErrorCode, Result};
use std::path::{Path, PathBuf};
use tracing::info;

use crate::connection::{conn, read_only_conn};
use crate::error::StoreError;
use crate::store::{DrawStore, select_new};
use crate::types::{AppendResult, DrawRecord};
use crate::utils::{format_scraped_at, parse_scraped_at};

pub fn create_tables(conn: &Connection) -> Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS draws (
            seq INTEGER PRIMARY KEY AUTOINCREMENT,
            game_id TEXT NOT NULL UNIQUE,
            draw_timestamp TEXT NOT NULL,
            numbers TEXT NOT NULL,
            scraped_at TEXT NOT NULL
        )",
        [],
    )?;
    Ok(())
}

/// Map damage to the database file onto the corrupt-store error.
pub fn classify(path: &Path, e: rusqlite::Error) -> StoreError {
    match e.sqlite_error_code() {
        Some(ErrorCode::NotADatabase) | Some(ErrorCode::DatabaseCorrupt) => {
            StoreError::corrupt(path, None, e.to_string())
        }
        _ => match e {
            rusqlite::Error::InvalidColumnType(..) | rusqlite::Error::FromSqlConversionFailure(..) => {
                StoreError::corrupt(path, None, e.to_string())
            }
            other => StoreError::Database(other),
        },
    }
}

pub fn draws_table_exists(conn: &Connection) -> Result<bool> {
    let mut stmt =
        conn.prepare("SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'draws'")?;
    let count: i64 = stmt.query_row([], |row| row.get(0))?;
    Ok(count > 0)
}

pub const DRAW_COLUMNS: [&str; 5] = ["seq", "game_id", "draw_timestamp", "numbers", "scraped_at"];

pub fn draws_columns(conn: &Connection) -> Result<Vec<String>> {
    let mut stmt = conn.prepare("SELECT name FROM pragma_table_info('draws') ORDER BY cid")?;
    let column_iter = stmt.query_map([], |row| row.get::<_, String>(0))?;

    let mut columns = Vec::new();
    for column in column_iter {
        columns.push(column?);
    }
    Ok(columns)
}

pub fn get_all_draws(conn: &Connection) -> Result<Vec<(i64, String, String, String, String)>> {
    let mut stmt = conn.prepare(
        "SELECT seq, game_id, draw_timestamp, numbers, scraped_at FROM draws ORDER BY seq ASC",
    )?;
    let draw_iter = stmt.query_map([], |row| {
        Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?, row.get(4)?))
    })?;

    let mut results = Vec::new();
    for draw in draw_iter {
        results.push(draw?);
    }
    Ok(results)
}

pub fn insert_draws(conn: &mut Connection, records: &[DrawRecord]) -> Result<()> {
    let tx = conn.transaction()?;
    {
        let mut stmt = tx.prepare(
            "INSERT INTO draws (game_id, draw_timestamp, numbers, scraped_at) VALUES (?1, ?2, ?3, ?4)",
        )?;
        for record in records {
            stmt.execute((
                &record.game_id,
                &record.draw_timestamp,
                &record.numbers,
                format_scraped_at(&record.scraped_at),
            ))?;
        }
    }
    tx.commit()
}

/// Draw store kept in an SQLite table, ordered by insertion sequence.
#[derive(Debug, Clone)]
pub struct SqliteDrawStore {
    path: PathBuf,
}

impl SqliteDrawStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl DrawStore for SqliteDrawStore {
    fn load_all(&self) -> Result<Vec<DrawRecord>, StoreError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let conn = read_only_conn(&self.path)?;
        if !draws_table_exists(&conn).map_err(|e| classify(&self.path, e))? {
            return Ok(Vec::new());
        }

        let columns = draws_columns(&conn).map_err(|e| classify(&self.path, e))?;
        if columns != DRAW_COLUMNS {
            return Err(StoreError::corrupt(
                &self.path,
                None,
                format!("draws table has columns {:?}, expected {:?}", columns, DRAW_COLUMNS),
            ));
        }

        let rows = get_all_draws(&conn).map_err(|e| classify(&self.path, e))?;
        rows.into_iter()
            .map(|(seq, game_id, draw_timestamp, numbers, scraped_at)| -> Result<DrawRecord, StoreError> {
                let scraped_at = parse_scraped_at(&scraped_at).map_err(|e| {
                    StoreError::corrupt(&self.path, None, format!("draw #{} has bad scraped_at: {}", seq, e))
                })?;
                Ok(DrawRecord {
                    game_id,
                    draw_timestamp,
                    numbers,
                    scraped_at,
                })
            })
            .collect()
    }

    fn merge_and_append(&mut self, batch: &[DrawRecord]) -> Result<AppendResult, StoreError> {
        let existing = self.load_all()?;
        let fresh = select_new(&existing, batch);
        let result = AppendResult {
            added_count: fresh.len(),
            total_count: existing.len() + fresh.len(),
        };

        if fresh.is_empty() {
            info!("No new draws found. Data is up to date.");
            return Ok(result);
        }

        let mut conn = conn(&self.path)?;
        insert_draws(&mut conn, &fresh).map_err(|e| classify(&self.path, e))?;
        info!("🎯 Saved {} new draws to {}", fresh.len(), self.path.display());

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn record(id: &str) -> DrawRecord {
        DrawRecord {
            game_id: id.to_string(),
            draw_timestamp: "06/01/2025 11:58 AM".to_string(),
            numbers: "22-18-70".to_string(),
            scraped_at: parse_scraped_at("2025-06-01 12:00:00").unwrap(),
        }
    }

    #[test]
    fn missing_database_loads_empty_without_creating_it() {
        let dir = tempdir().unwrap();
        let store = SqliteDrawStore::new(dir.path().join("keno.db"));
        assert!(store.load_all().unwrap().is_empty());
        assert!(!store.path().exists());
    }

    #[test]
    fn keeps_insertion_order_and_skips_known_ids() {
        let dir = tempdir().unwrap();
        let mut store = SqliteDrawStore::new(dir.path().join("data/keno.db"));

        let first = store.merge_and_append(&[record("30"), record("10")]).unwrap();
        assert_eq!(first, AppendResult { added_count: 2, total_count: 2 });

        let second = store
            .merge_and_append(&[record("10"), record("20"), record("20")])
            .unwrap();
        assert_eq!(second, AppendResult { added_count: 1, total_count: 3 });

        let ids: Vec<_> = store.load_all().unwrap().into_iter().map(|r| r.game_id).collect();
        assert_eq!(ids, vec!["30", "10", "20"]);
        assert_eq!(store.load_all().unwrap()[0], record("30"));
    }

    #[test]
    fn empty_database_without_table_loads_empty() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("keno.db");
        fs::write(&path, b"").unwrap();
        let mut store = SqliteDrawStore::new(&path);
        assert!(store.load_all().unwrap().is_empty());
        assert_eq!(store.merge_and_append(&[record("1")]).unwrap().added_count, 1);
    }

    #[test]
    fn foreign_draws_table_is_corrupt_and_untouched() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("keno.db");
        {
            let conn = Connection::open(&path).unwrap();
            conn.execute("CREATE TABLE draws (id INTEGER, payload TEXT)", []).unwrap();
            conn.execute("INSERT INTO draws (id, payload) VALUES (1, 'x')", []).unwrap();
        }
        let before = fs::read(&path).unwrap();

        let mut store = SqliteDrawStore::new(&path);
        assert!(store.load_all().unwrap_err().is_corrupt());
        assert!(store.merge_and_append(&[record("1")]).unwrap_err().is_corrupt());
        assert_eq!(fs::read(&path).unwrap(), before);
    }

    #[test]
    fn garbage_file_is_corrupt_and_untouched() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("keno.db");
        let garbage = "Game ID,Timestamp,Numbers,Scraped At\n".repeat(8);
        fs::write(&path, &garbage).unwrap();

        let mut store = SqliteDrawStore::new(&path);
        assert!(store.load_all().unwrap_err().is_corrupt());
        assert!(store.merge_and_append(&[record("1")]).unwrap_err().is_corrupt());
        assert_eq!(fs::read_to_string(&path).unwrap(), garbage);
    }
}
