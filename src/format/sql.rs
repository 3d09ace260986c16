//! Generated DDL text form of a schema.
//!
//! Every identifier goes through [`Ident`], every type through
//! [`ColumnType`] and every default through [`DefaultExpr`].

use crate::error::Result;
use crate::migrate::ddl::{ColumnType, DefaultExpr, Ident};
use crate::model::{Column, Database, Index, Table};
use std::fmt::Write as _;

/// `CREATE TABLE` plus `CREATE INDEX` statements for one table.
///
/// # Errors
///
/// Returns an error if a table, column or index name, a column type or a
/// default fails validation.
pub fn create_statements(table: &Table) -> Result<String> {
    let table_ident = Ident::new(&table.name)?;
    let mut out = String::new();

    let _ = writeln!(out, "CREATE TABLE {} (", table_ident.quoted());
    let primary_keys: Vec<&Column> = table.columns.iter().filter(|c| c.primary_key).collect();
    let inline_pk = primary_keys.len() == 1;

    let mut lines = Vec::with_capacity(table.columns.len() + 1);
    for column in &table.columns {
        lines.push(column_definition(column, inline_pk)?);
    }
    if primary_keys.len() > 1 {
        let names = primary_keys
            .iter()
            .map(|c| Ident::new(&c.name).map(|i| i.quoted()))
            .collect::<Result<Vec<_>>>()?;
        lines.push(format!("PRIMARY KEY ({})", names.join(", ")));
    }
    for (i, line) in lines.iter().enumerate() {
        let sep = if i + 1 < lines.len() { "," } else { "" };
        let _ = writeln!(out, "    {line}{sep}");
    }
    out.push_str(");\n");

    for index in &table.indices {
        out.push_str(&index_statement(&table_ident, index)?);
        out.push('\n');
    }
    Ok(out)
}

/// DDL for a whole schema, tables separated by a blank line.
///
/// # Errors
///
/// Returns an error if any name, type or default fails validation.
pub fn database_statements(database: &Database) -> Result<String> {
    let mut out = String::new();
    for (i, table) in database.tables.iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        out.push_str(&create_statements(table)?);
    }
    Ok(out)
}

fn column_definition(column: &Column, inline_pk: bool) -> Result<String> {
    let name = Ident::new(&column.name)?;
    let column_type = ColumnType::new(&column.column_type)?;

    let mut def = name.quoted();
    if !column_type.is_empty() {
        def.push(' ');
        def.push_str(column_type.as_str());
    }
    if column.primary_key && inline_pk {
        def.push_str(" PRIMARY KEY");
    }
    if !column.nullable {
        def.push_str(" NOT NULL");
    }
    if let Some(default) = &column.default {
        let default = DefaultExpr::new(default)?;
        let _ = write!(def, " DEFAULT {}", default.as_str());
    }
    Ok(def)
}

fn index_statement(table: &Ident, index: &Index) -> Result<String> {
    let name = Ident::new(&index.name)?;
    let columns = index
        .columns
        .iter()
        .map(|c| Ident::new(c).map(|i| i.quoted()))
        .collect::<Result<Vec<_>>>()?;
    let unique = if index.unique { "UNIQUE " } else { "" };
    Ok(format!(
        "CREATE {unique}INDEX {} ON {} ({});",
        name.quoted(),
        table.quoted(),
        columns.join(", ")
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SchemaError;

    #[test]
    fn renders_table_with_index() {
        let table = Table::new("users")
            .with_column(Column::new("id", "INTEGER").not_null().primary_key())
            .with_column(Column::new("name", "TEXT").with_default("''"))
            .with_index(Index::new("idx_users_name", ["name"]).unique());

        assert_eq!(
            create_statements(&table).unwrap(),
            "CREATE TABLE \"users\" (\n    \"id\" INTEGER PRIMARY KEY NOT NULL,\n    \"name\" TEXT DEFAULT ''\n);\nCREATE UNIQUE INDEX \"idx_users_name\" ON \"users\" (\"name\");\n"
        );
    }

    #[test]
    fn composite_primary_key_is_a_table_constraint() {
        let table = Table::new("memberships")
            .with_column(Column::new("user_id", "INTEGER").not_null().primary_key())
            .with_column(Column::new("group_id", "INTEGER").not_null().primary_key());
        let sql = create_statements(&table).unwrap();
        assert!(sql.contains("    PRIMARY KEY (\"user_id\", \"group_id\")\n"));
        assert!(!sql.contains("INTEGER PRIMARY KEY"));
    }

    #[test]
    fn tables_separated_by_blank_line() {
        let db = Database::new(vec![
            Table::new("a").with_column(Column::new("id", "int")),
            Table::new("b").with_column(Column::new("id", "int")),
        ]);
        let sql = database_statements(&db).unwrap();
        assert_eq!(
            sql,
            "CREATE TABLE \"a\" (\n    \"id\" int\n);\n\nCREATE TABLE \"b\" (\n    \"id\" int\n);\n"
        );
    }

    #[test]
    fn function_defaults_are_parenthesized() {
        let table = Table::new("events")
            .with_column(Column::new("at", "TEXT").with_default("datetime('now')"))
            .with_column(Column::new("seen", "INTEGER").with_default("0"));
        let sql = create_statements(&table).unwrap();
        assert!(sql.contains("\"at\" TEXT DEFAULT (datetime('now'))"));
        assert!(sql.contains("\"seen\" INTEGER DEFAULT 0\n"));
    }

    #[test]
    fn rejects_default_that_ends_the_clause() {
        let table = Table::new("t")
            .with_column(Column::new("n", "INTEGER").with_default("0); DROP TABLE x; --"));
        assert!(matches!(
            create_statements(&table),
            Err(SchemaError::InvalidDefault { .. })
        ));
    }

    #[test]
    fn rejects_unsafe_names() {
        let table = Table::new("t; DROP TABLE x").with_column(Column::new("id", "int"));
        assert!(matches!(
            create_statements(&table),
            Err(SchemaError::InvalidIdentifier { .. })
        ));
    }
}
