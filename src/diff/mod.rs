//! Schema diffing.
//!
//! Compares a base schema (the database to migrate) against a derived
//! schema (the reference) and produces a [`Migration`]:
//!
//! - tables only in derived become whole-table additions,
//! - tables only in base become removals,
//! - columns only in the derived version of a shared table become column
//!   additions for that table.
//!
//! Columns are matched purely by name. Type or nullability drift on a column
//! present in both schemas is not reported, and columns missing from derived
//! are not removed: the applier has no `ALTER COLUMN` or `DROP COLUMN` step.
//!
//! Output order follows the inputs (`derived` for additions, `base` for
//! removals). Sort both schemas first for deterministic output.

use crate::error::Result;
use crate::migrate::ddl::Statement;
use crate::migrate::is_anchor;
use crate::model::{Column, Database, Table};
use serde::{Deserialize, Serialize};

/// One addition instruction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TableAddition {
    /// A table missing from base, with its full definition.
    WholeTable(Table),
    /// New columns for a table present in both schemas.
    Columns { table: String, columns: Vec<Column> },
}

impl TableAddition {
    #[must_use]
    pub fn table_name(&self) -> &str {
        match self {
            Self::WholeTable(table) => &table.name,
            Self::Columns { table, .. } => table,
        }
    }

    #[must_use]
    pub fn columns(&self) -> &[Column] {
        match self {
            Self::WholeTable(table) => &table.columns,
            Self::Columns { columns, .. } => columns,
        }
    }

    fn push_column(&mut self, column: Column) {
        match self {
            Self::WholeTable(table) => table.columns.push(column),
            Self::Columns { columns, .. } => columns.push(column),
        }
    }
}

/// Instructions to bring base toward derived: additions, then removals.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Migration {
    #[serde(default)]
    pub add: Vec<TableAddition>,
    #[serde(default, alias = "rm")]
    pub remove: Vec<Table>,
}

impl Migration {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.add.is_empty() && self.remove.is_empty()
    }

    /// Count of tables touched.
    #[must_use]
    pub fn change_count(&self) -> usize {
        self.add.len() + self.remove.len()
    }

    #[must_use]
    pub fn find_addition(&self, table: &str) -> Option<&TableAddition> {
        self.add.iter().find(|a| a.table_name() == table)
    }

    /// Record a new column for `table`, extending an existing entry when
    /// there is one.
    pub fn push_column(&mut self, table: &str, column: Column) {
        if let Some(entry) = self.add.iter_mut().find(|a| a.table_name() == table) {
            entry.push_column(column);
            return;
        }
        self.add.push(TableAddition::Columns {
            table: table.to_string(),
            columns: vec![column],
        });
    }

    /// The DDL this migration would issue, assuming every removal is
    /// confirmed and every `Columns` target exists.
    ///
    /// # Errors
    ///
    /// Returns an error if a name or type fails validation, or a whole-table
    /// addition has no anchor column.
    pub fn statements(&self) -> Result<Vec<Statement>> {
        let mut statements = Vec::new();
        for table in &self.remove {
            statements.push(Statement::drop_table(&table.name)?);
        }
        for addition in &self.add {
            let table = addition.table_name();
            if let TableAddition::WholeTable(whole) = addition {
                let anchor = whole
                    .columns
                    .iter()
                    .find(|c| is_anchor(&c.name))
                    .ok_or_else(|| crate::error::SchemaError::MissingAnchorColumn {
                        table: table.to_string(),
                    })?;
                statements.push(Statement::create_table(
                    table,
                    &anchor.name,
                    &anchor.column_type,
                )?);
            }
            for column in addition.columns() {
                if is_anchor(&column.name) {
                    continue;
                }
                statements.push(Statement::add_column(
                    table,
                    &column.name,
                    &column.column_type,
                )?);
            }
        }
        Ok(statements)
    }
}

/// Compute the migration from `base` to `derived`.
#[must_use]
pub fn diff(base: &Database, derived: &Database) -> Migration {
    let mut migration = Migration::default();

    for derived_table in &derived.tables {
        match base.find_table(&derived_table.name) {
            None => migration
                .add
                .push(TableAddition::WholeTable(derived_table.clone())),
            Some(base_table) => diff_columns(base_table, derived_table, &mut migration),
        }
    }

    for base_table in &base.tables {
        if !derived.has_table(&base_table.name) {
            migration.remove.push(base_table.clone());
        }
    }

    migration
}

fn diff_columns(base: &Table, derived: &Table, migration: &mut Migration) {
    for column in &derived.columns {
        if !base.has_column(&column.name) {
            migration.push_column(&derived.name, column.clone());
        }
    }
}
