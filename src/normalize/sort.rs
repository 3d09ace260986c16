//! Deterministic ordering of tables, columns and indices.
//!
//! Names are unique within their scope, so a plain byte-order comparison is
//! a total order and stability never matters.

use crate::model::{Database, Table};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// A part of the schema that can be sorted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SortScope {
    Tables,
    Columns,
    #[value(alias = "indexes")]
    Indices,
}

impl SortScope {
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "tables" => Some(Self::Tables),
            "columns" => Some(Self::Columns),
            "indices" | "indexes" => Some(Self::Indices),
            _ => None,
        }
    }
}

pub fn sort_tables(database: &mut Database) {
    database.tables.sort_by(|a, b| a.name.cmp(&b.name));
}

pub fn sort_columns(table: &mut Table) {
    table.columns.sort_by(|a, b| a.name.cmp(&b.name));
}

pub fn sort_indices(table: &mut Table) {
    table.indices.sort_by(|a, b| a.name.cmp(&b.name));
}

/// Apply every requested sort scope. Repeated scopes are harmless.
pub fn apply_sort(database: &mut Database, scopes: &[SortScope]) {
    let do_tables = scopes.contains(&SortScope::Tables);
    let do_columns = scopes.contains(&SortScope::Columns);
    let do_indices = scopes.contains(&SortScope::Indices);

    if do_tables {
        sort_tables(database);
    }
    if do_columns || do_indices {
        for table in &mut database.tables {
            if do_columns {
                sort_columns(table);
            }
            if do_indices {
                sort_indices(table);
            }
        }
    }
}
