//! `SQLite` connection wrapper used for scanning and migrating.

use crate::error::{Result, SchemaError};
use crate::migrate::MigrationTarget;
use crate::migrate::ddl::{Ident, Statement};
use crate::model::Database;
use crate::storage::scan::scan;
use rusqlite::{Connection, OpenFlags};
use std::path::Path;
use std::time::Duration;

/// An open `SQLite` database.
#[derive(Debug)]
pub struct SqliteTarget {
    conn: Connection,
}

impl SqliteTarget {
    /// Open an existing database file for reading and writing.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseNotFound` if the file does not exist, or a database
    /// error if it cannot be opened.
    pub fn open(path: &Path) -> Result<Self> {
        Self::open_with_timeout(path, None)
    }

    /// Open an existing database with an optional busy timeout (ms).
    ///
    /// # Errors
    ///
    /// Returns `DatabaseNotFound` if the file does not exist, or a database
    /// error if it cannot be opened.
    pub fn open_with_timeout(path: &Path, lock_timeout_ms: Option<u64>) -> Result<Self> {
        if !path.is_file() {
            return Err(SchemaError::DatabaseNotFound {
                path: path.to_path_buf(),
            });
        }
        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        if let Some(timeout) = lock_timeout_ms {
            conn.busy_timeout(Duration::from_millis(timeout))?;
        }
        Ok(Self { conn })
    }

    /// Open an in-memory database for testing.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection cannot be established.
    pub fn open_memory() -> Result<Self> {
        Ok(Self {
            conn: Connection::open_in_memory()?,
        })
    }

    #[must_use]
    pub const fn from_connection(conn: Connection) -> Self {
        Self { conn }
    }

    #[must_use]
    pub const fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Introspect the current schema.
    ///
    /// # Errors
    ///
    /// Returns `SchemaError::Introspection` if the catalog cannot be read.
    pub fn scan(&self) -> Result<Database> {
        scan(&self.conn)
    }
}

impl MigrationTarget for SqliteTarget {
    fn table_exists(&self, table: &str) -> Result<bool> {
        let mut stmt = self.conn.prepare(
            "SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1 COLLATE NOCASE",
        )?;
        Ok(stmt.exists([table])?)
    }

    fn row_count(&self, table: &Ident) -> Result<u64> {
        let sql = format!("SELECT COUNT(*) FROM {}", table.quoted());
        let count: i64 = self
            .conn
            .query_row(&sql, [], |row| row.get(0))
            .map_err(|source| SchemaError::Statement { sql, source })?;
        Ok(u64::try_from(count).unwrap_or(0))
    }

    fn execute(&mut self, statement: &Statement) -> Result<()> {
        let sql = statement.to_sql();
        self.conn
            .execute_batch(&sql)
            .map_err(|source| SchemaError::Statement { sql, source })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reports_existence_and_rows() {
        let mut target = SqliteTarget::open_memory().unwrap();
        target
            .connection()
            .execute_batch("CREATE TABLE t (id INTEGER); INSERT INTO t VALUES (1), (2);")
            .unwrap();

        assert!(target.table_exists("t").unwrap());
        assert!(!target.table_exists("u").unwrap());
        assert_eq!(target.row_count(&Ident::new("t").unwrap()).unwrap(), 2);

        target
            .execute(&Statement::add_column("t", "name", "TEXT").unwrap())
            .unwrap();
        let db = target.scan().unwrap();
        assert!(db.find_table("t").unwrap().has_column("name"));
    }

    #[test]
    fn table_lookup_ignores_case() {
        let target = SqliteTarget::open_memory().unwrap();
        target
            .connection()
            .execute_batch("CREATE TABLE users (id INTEGER);")
            .unwrap();

        assert!(target.table_exists("USERS").unwrap());
        assert!(target.table_exists("Users").unwrap());
        assert_eq!(target.row_count(&Ident::new("USERS").unwrap()).unwrap(), 0);
    }

    #[test]
    fn failed_statement_carries_sql() {
        let mut target = SqliteTarget::open_memory().unwrap();
        let err = target
            .execute(&Statement::drop_table("missing").unwrap())
            .unwrap_err();
        match err {
            SchemaError::Statement { sql, .. } => assert_eq!(sql, "DROP TABLE \"missing\";"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn missing_file_is_not_created() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("absent.db");
        let err = SqliteTarget::open(&path).unwrap_err();
        assert!(matches!(err, SchemaError::DatabaseNotFound { .. }));
        assert!(!path.exists());
    }
}
