use rusqlite::{Connection, OpenFlags};
use std::fs;
use std::path::Path;

use crate::error::StoreError;

/// Open the draw database for writing, creating the file and table if needed.
pub fn conn(database_path: &Path) -> Result<Connection, StoreError> {
    if let Some(parent) = database_path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|e| StoreError::io(parent, e))?;
        }
    }

    let conn = Connection::open(database_path)?;
    crate::database::create_tables(&conn).map_err(|e| crate::database::classify(database_path, e))?;
    Ok(conn)
}

/// Open an existing draw database without creating anything.
pub fn read_only_conn(database_path: &Path) -> Result<Connection, StoreError> {
    let conn = Connection::open_with_flags(
        database_path,
        OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
    )?;
    Ok(conn)
}
