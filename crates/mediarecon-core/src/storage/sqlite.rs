use rusqlite::{params, Connection};
use std::cell::OnceCell;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

use crate::error::Error;

pub const SONARR_TABLES: &[&str] = &["Series", "Episodes", "EpisodeFiles"];
pub const LIDARR_TABLES: &[&str] = &["Artists", "Albums", "Tracks", "TrackFiles"];

/// A library manager's own SQLite catalog. The connection is opened on first use and kept
/// for the life of the reconciler that owns it.
pub struct CatalogDb {
    path: Option<PathBuf>,
    required_tables: &'static [&'static str],
    dry_run: bool,
    conn: OnceCell<Connection>,
}

impl CatalogDb {
    pub fn new(path: &Path, required_tables: &'static [&'static str], dry_run: bool) -> Self {
        Self {
            path: Some(path.to_path_buf()),
            required_tables,
            dry_run,
            conn: OnceCell::new(),
        }
    }

    pub fn sonarr(path: &Path, dry_run: bool) -> Self {
        Self::new(path, SONARR_TABLES, dry_run)
    }

    pub fn lidarr(path: &Path, dry_run: bool) -> Self {
        Self::new(path, LIDARR_TABLES, dry_run)
    }

    /// Fresh database with the minimal catalog schema, for tests.
    pub fn open_in_memory(dry_run: bool) -> Result<Self, Error> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(include_str!("schema.sql"))?;
        debug!("In-memory catalog schema created");
        let conn_cell = OnceCell::new();
        let _ = conn_cell.set(conn);
        Ok(Self {
            path: None,
            required_tables: &[],
            dry_run,
            conn: conn_cell,
        })
    }

    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    pub fn connection(&self) -> Result<&Connection, Error> {
        if let Some(conn) = self.conn.get() {
            return Ok(conn);
        }
        let conn = self.open()?;
        let _ = self.conn.set(conn);
        self.conn
            .get()
            .ok_or_else(|| Error::Other("catalog connection not initialised".to_string()))
    }

    fn open(&self) -> Result<Connection, Error> {
        let path = self
            .path
            .as_deref()
            .ok_or_else(|| Error::Other("catalog database has no path".to_string()))?;
        let conn = Connection::open(path)?;
        conn.busy_timeout(Duration::from_secs(5))?;
        verify_tables(&conn, self.required_tables)?;
        info!("Opened catalog database {}", path.display());
        Ok(conn)
    }
}

/// Refuses to write into a database that is not the expected manager's catalog.
fn verify_tables(conn: &Connection, tables: &[&str]) -> Result<(), Error> {
    for table in tables {
        let found: i64 = conn.query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1",
            params![table],
            |row| row.get(0),
        )?;
        if found == 0 {
            return Err(Error::Other(format!("catalog database is missing table {}", table)));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_in_memory_schema() {
        let db = CatalogDb::open_in_memory(false).unwrap();
        let conn = db.connection().unwrap();
        verify_tables(conn, SONARR_TABLES).unwrap();
        verify_tables(conn, LIDARR_TABLES).unwrap();
    }

    #[test]
    fn test_rejects_foreign_database() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("other.db");
        Connection::open(&path)
            .unwrap()
            .execute_batch("CREATE TABLE Unrelated (Id INTEGER PRIMARY KEY);")
            .unwrap();

        let db = CatalogDb::sonarr(&path, false);
        assert!(db.connection().is_err());
    }

    #[test]
    fn test_opens_lazily_once() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("sonarr.db");
        Connection::open(&path)
            .unwrap()
            .execute_batch(include_str!("schema.sql"))
            .unwrap();

        let db = CatalogDb::sonarr(&path, false);
        let first = db.connection().unwrap() as *const Connection;
        let second = db.connection().unwrap() as *const Connection;
        assert_eq!(first, second);
    }
}
