//! Schema introspection for `SQLite` databases.

use crate::error::{Result, SchemaError};
use crate::model::{Column, Database, Index, Table};
use rusqlite::Connection;
use tracing::debug;

/// Read every user table of `conn`, in catalog order.
///
/// Internal `sqlite_%` tables are skipped, as are indices created implicitly
/// for primary keys and `UNIQUE` constraints; only explicit `CREATE INDEX`
/// indices are reported.
///
/// # Errors
///
/// Returns `SchemaError::Introspection` if any catalog query fails.
pub fn scan(conn: &Connection) -> Result<Database> {
    let names = table_names(conn).map_err(|e| SchemaError::introspection(None, e))?;

    let mut tables = Vec::with_capacity(names.len());
    for name in names {
        let table = scan_table(conn, &name)
            .map_err(|e| SchemaError::introspection(Some(&name), e))?;
        debug!(
            table = %table.name,
            columns = table.columns.len(),
            indices = table.indices.len(),
            "Scanned table"
        );
        tables.push(table);
    }

    Ok(Database::new(tables))
}

fn table_names(conn: &Connection) -> rusqlite::Result<Vec<String>> {
    let mut stmt = conn.prepare(
        "SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%'",
    )?;
    let names = stmt
        .query_map([], |row| row.get(0))?
        .collect::<rusqlite::Result<Vec<String>>>()?;
    Ok(names)
}

fn scan_table(conn: &Connection, name: &str) -> rusqlite::Result<Table> {
    Ok(Table {
        name: name.to_string(),
        columns: scan_columns(conn, name)?,
        indices: scan_indices(conn, name)?,
    })
}

fn scan_columns(conn: &Connection, table: &str) -> rusqlite::Result<Vec<Column>> {
    let mut stmt = conn.prepare(
        "SELECT name, type, \"notnull\", dflt_value, pk FROM pragma_table_info(?1) ORDER BY cid",
    )?;
    let columns = stmt
        .query_map([table], |row| {
            let not_null: i64 = row.get(2)?;
            let pk: i64 = row.get(4)?;
            Ok(Column {
                name: row.get(0)?,
                column_type: row.get(1)?,
                nullable: not_null == 0,
                default: row.get(3)?,
                primary_key: pk > 0,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(columns)
}

fn scan_indices(conn: &Connection, table: &str) -> rusqlite::Result<Vec<Index>> {
    let mut stmt = conn.prepare(
        "SELECT name, \"unique\" FROM pragma_index_list(?1) WHERE origin = 'c' ORDER BY seq DESC",
    )?;
    let listed = stmt
        .query_map([table], |row| {
            let unique: i64 = row.get(1)?;
            Ok((row.get::<_, String>(0)?, unique != 0))
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    let mut columns_stmt =
        conn.prepare("SELECT name FROM pragma_index_info(?1) ORDER BY seqno")?;
    let mut indices = Vec::with_capacity(listed.len());
    for (name, unique) in listed {
        let terms = columns_stmt
            .query_map([&name], |row| row.get::<_, Option<String>>(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        // Expression terms have no column name and cannot be modeled.
        if terms.iter().any(Option::is_none) {
            debug!(table, index = %name, "Skipping expression index");
            continue;
        }
        let columns = terms.into_iter().flatten().collect();
        indices.push(Index {
            name,
            columns,
            unique,
        });
    }
    Ok(indices)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::{OutputFormat, encode_database};

    fn fixture() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            r"
            CREATE TABLE users (
                id INTEGER PRIMARY KEY,
                name VARCHAR(64) NOT NULL,
                email TEXT UNIQUE,
                note TEXT DEFAULT NULL
            );
            CREATE INDEX idx_users_name ON users(name);
            CREATE UNIQUE INDEX idx_users_name_email ON users(name, email);
            CREATE TABLE orders (id INTEGER, user_id INTEGER, total REAL DEFAULT 0);
            ",
        )
        .unwrap();
        conn
    }

    #[test]
    fn scans_tables_in_catalog_order() {
        let db = scan(&fixture()).unwrap();
        assert_eq!(db.table_names().collect::<Vec<_>>(), vec!["users", "orders"]);
    }

    #[test]
    fn scans_column_details() {
        let db = scan(&fixture()).unwrap();
        let users = db.find_table("users").unwrap();
        assert_eq!(
            users.column_names().collect::<Vec<_>>(),
            vec!["id", "name", "email", "note"]
        );

        let id = users.find_column("id").unwrap();
        assert!(id.primary_key);
        assert_eq!(id.column_type, "INTEGER");

        let name = users.find_column("name").unwrap();
        assert!(!name.nullable);
        assert_eq!(name.column_type, "VARCHAR(64)");

        let note = users.find_column("note").unwrap();
        assert!(note.nullable);
        assert_eq!(note.default.as_deref(), Some("NULL"));

        let orders = db.find_table("orders").unwrap();
        assert_eq!(orders.find_column("total").unwrap().default.as_deref(), Some("0"));
    }

    #[test]
    fn scans_only_explicit_indices() {
        let db = scan(&fixture()).unwrap();
        let users = db.find_table("users").unwrap();
        assert_eq!(users.indices.len(), 2);

        let plain = users.find_index("idx_users_name").unwrap();
        assert!(!plain.unique);
        assert_eq!(plain.columns, vec!["name"]);

        let composite = users.find_index("idx_users_name_email").unwrap();
        assert!(composite.unique);
        assert_eq!(composite.columns, vec!["name", "email"]);
    }

    #[test]
    fn expression_indices_are_skipped() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "CREATE TABLE t (id INTEGER, name TEXT);
             CREATE INDEX i_lower ON t (lower(name));
             CREATE INDEX i_mixed ON t (id, lower(name));
             CREATE INDEX i_name ON t (name);",
        )
        .unwrap();

        let db = scan(&conn).unwrap();
        let t = db.find_table("t").unwrap();
        assert_eq!(t.indices.len(), 1);
        assert_eq!(t.indices[0].name, "i_name");

        let sql = encode_database(&db, OutputFormat::Sql).unwrap();
        assert!(sql.contains("CREATE INDEX \"i_name\" ON \"t\" (\"name\");"));
        assert!(!sql.contains("i_lower"));
    }

    #[test]
    fn empty_database_scans_empty() {
        let conn = Connection::open_in_memory().unwrap();
        assert!(scan(&conn).unwrap().is_empty());
    }
}
