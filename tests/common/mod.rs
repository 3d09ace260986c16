#![allow(dead_code)]

use assert_cmd::Command;
use db_schema::model::{Column, Database, Index, Table};
use rusqlite::Connection;
use std::path::{Path, PathBuf};
use std::sync::Once;
use std::time::Instant;
use tempfile::TempDir;
use tracing::info;

static INIT: Once = Once::new();

pub fn init_test_logging() {
    INIT.call_once(|| {
        db_schema::logging::init_test_logging();
    });
}

pub struct TestLogGuard {
    name: String,
    start: Instant,
}

impl Drop for TestLogGuard {
    fn drop(&mut self) {
        info!(
            "{}: assertions passed (elapsed {:?})",
            self.name,
            self.start.elapsed()
        );
    }
}

pub fn test_log(name: &str) -> TestLogGuard {
    init_test_logging();
    info!("{name}: starting");
    TestLogGuard {
        name: name.to_string(),
        start: Instant::now(),
    }
}

/// `users(id, name)`: the base side of the standard scenario.
pub fn users_v1() -> Database {
    Database::new(vec![
        Table::new("users")
            .with_column(Column::new("id", "int").not_null().primary_key())
            .with_column(Column::new("name", "text")),
    ])
}

/// `users(id, name, email)` plus `orders(id, user_id)`.
pub fn users_v2() -> Database {
    Database::new(vec![
        Table::new("users")
            .with_column(Column::new("id", "int").not_null().primary_key())
            .with_column(Column::new("name", "text"))
            .with_column(Column::new("email", "text")),
        Table::new("orders")
            .with_column(Column::new("id", "int").not_null().primary_key())
            .with_column(Column::new("user_id", "int"))
            .with_index(Index::new("idx_orders_user", ["user_id"])),
    ])
}

/// A scratch directory holding one `SQLite` file built from `ddl`.
pub struct DbFixture {
    pub dir: TempDir,
    pub path: PathBuf,
}

impl DbFixture {
    pub fn new(file_name: &str, ddl: &str) -> Self {
        init_test_logging();
        let dir = TempDir::new().expect("temp dir");
        let path = dir.path().join(file_name);
        let conn = Connection::open(&path).expect("create database");
        conn.execute_batch(ddl).expect("apply fixture ddl");
        Self { dir, path }
    }

    pub fn connection(&self) -> Connection {
        Connection::open(&self.path).expect("reopen database")
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn write(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.dir.path().join(name);
        std::fs::write(&path, contents).expect("write fixture file");
        path
    }
}

pub const USERS_V1_DDL: &str = "
    CREATE TABLE users (id INTEGER PRIMARY KEY, name TEXT);
    INSERT INTO users (name) VALUES ('ada'), ('grace');
";

/// The CLI, isolated from the caller's config files and environment.
pub fn db_schema(cwd: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("db-schema"));
    cmd.current_dir(cwd);
    cmd.env("HOME", cwd);
    cmd.env("NO_COLOR", "1");
    cmd.env_remove("RUST_LOG");
    for (key, _) in std::env::vars() {
        if key.starts_with("DB_SCHEMA_") {
            cmd.env_remove(key);
        }
    }
    cmd
}
