//! Schema normalization.
//!
//! Canonicalizes column type spellings, drops redundant `DEFAULT NULL` on
//! nullable columns, and folds identifier case. Everything here mutates in
//! place; clone the schema first if the original is still needed.

pub mod sort;

pub use sort::{SortScope, apply_sort, sort_columns, sort_indices, sort_tables};

use crate::error::{Result, SchemaError};
use crate::model::{Column, Database, Table};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// Target case for `normalize_names`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum NameCase {
    Upper,
    Lower,
}

impl NameCase {
    #[must_use]
    pub fn apply(self, name: &str) -> String {
        match self {
            Self::Upper => name.to_uppercase(),
            Self::Lower => name.to_lowercase(),
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Upper => "upper",
            Self::Lower => "lower",
        }
    }
}

impl fmt::Display for NameCase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NameCase {
    type Err = SchemaError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "upper" => Ok(Self::Upper),
            "lower" => Ok(Self::Lower),
            other => Err(SchemaError::validation(
                "norm-names",
                format!("expected skip, upper or lower, got '{other}'"),
            )),
        }
    }
}

/// Which normalization and sort passes to run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NormalizeOptions {
    /// Canonicalize types and strip redundant null defaults.
    pub types: bool,
    /// Fold identifier case, `None` to keep names as scanned.
    pub names: Option<NameCase>,
    pub sort: Vec<SortScope>,
}

impl NormalizeOptions {
    #[must_use]
    pub fn is_noop(&self) -> bool {
        !self.types && self.names.is_none() && self.sort.is_empty()
    }
}

/// Map a raw SQL type spelling to its canonical token.
///
/// Matching is case-insensitive on the base name; a parenthesized size such
/// as `(255)` is ignored. Unrecognized spellings come back unchanged.
#[must_use]
pub fn normalize_type(raw: &str) -> String {
    let base = raw.split('(').next().unwrap_or(raw);
    let base = base.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase();

    let canonical = match base.as_str() {
        "int" | "integer" | "tinyint" | "smallint" | "mediumint" => "int",
        "int64" | "bigint" => "int64",
        "boolean" | "bool" => "bool",
        "real" | "double" | "float" => "float",
        "blob" => "blob",
        "text" | "string" | "clob" | "character" | "varchar" | "nchar" | "nvarchar" => "text",
        "date" => "date",
        "time" => "time",
        "datetime" | "timestamp" => "timestamp",
        "uuid" | "guid" => "uuid",
        _ => return raw.to_string(),
    };
    canonical.to_string()
}

/// Clear a `NULL` default on a nullable column.
///
/// Left alone when the declared type itself carries `NOT NULL`.
pub fn normalize_default(column: &mut Column) {
    if !column.nullable || declares_not_null(&column.column_type) {
        return;
    }
    if column.default.as_deref().is_some_and(is_null_literal) {
        column.default = None;
    }
}

/// Apply `normalize_type` and `normalize_default` to every column.
pub fn normalize_types(database: &mut Database) {
    for table in &mut database.tables {
        for column in &mut table.columns {
            column.column_type = normalize_type(&column.column_type);
            normalize_default(column);
        }
    }
}

/// Fold the table name and every column and index name to one case.
///
/// Index column references are folded too so indices keep pointing at their
/// columns.
///
/// # Errors
///
/// Returns `NameCollision` without touching the table when two distinct
/// column names (or index names) would fold to the same name.
pub fn normalize_names(table: &mut Table, case: NameCase) -> Result<()> {
    check_collisions(
        &format!("columns of table '{}'", table.name),
        table.columns.iter().map(|c| c.name.as_str()),
        case,
    )?;
    check_collisions(
        &format!("indices of table '{}'", table.name),
        table.indices.iter().map(|i| i.name.as_str()),
        case,
    )?;

    table.name = case.apply(&table.name);
    for column in &mut table.columns {
        column.name = case.apply(&column.name);
    }
    for index in &mut table.indices {
        index.name = case.apply(&index.name);
        for column in &mut index.columns {
            *column = case.apply(column);
        }
    }
    Ok(())
}

/// Fold names across a whole schema.
///
/// # Errors
///
/// Returns `NameCollision` when two tables, or two names within one table,
/// would fold together. Nothing is modified in that case.
pub fn normalize_database_names(database: &mut Database, case: NameCase) -> Result<()> {
    check_collisions("tables", database.table_names(), case)?;
    for table in &database.tables {
        check_collisions(
            &format!("columns of table '{}'", table.name),
            table.column_names(),
            case,
        )?;
        check_collisions(
            &format!("indices of table '{}'", table.name),
            table.indices.iter().map(|i| i.name.as_str()),
            case,
        )?;
    }
    for table in &mut database.tables {
        normalize_names(table, case)?;
    }
    Ok(())
}

/// Run the requested passes: types, then names, then sorting.
///
/// Sorting always comes last so sort keys reflect the final casing.
///
/// # Errors
///
/// Returns `NameCollision` if name folding would merge two names.
pub fn prepare(database: &mut Database, options: &NormalizeOptions) -> Result<()> {
    if options.types {
        normalize_types(database);
    }
    if let Some(case) = options.names {
        normalize_database_names(database, case)?;
    }
    apply_sort(database, &options.sort);
    Ok(())
}

fn check_collisions<'a>(
    scope: &str,
    names: impl Iterator<Item = &'a str>,
    case: NameCase,
) -> Result<()> {
    let mut seen: HashMap<String, &str> = HashMap::new();
    for name in names {
        let folded = case.apply(name);
        if let Some(first) = seen.get(&folded) {
            if *first != name {
                return Err(SchemaError::NameCollision {
                    scope: scope.to_string(),
                    first: (*first).to_string(),
                    second: name.to_string(),
                });
            }
        } else {
            seen.insert(folded, name);
        }
    }
    Ok(())
}

fn declares_not_null(column_type: &str) -> bool {
    let words: Vec<String> = column_type
        .split_whitespace()
        .map(str::to_lowercase)
        .collect();
    words.windows(2).any(|w| w[0] == "not" && w[1] == "null")
}

fn is_null_literal(value: &str) -> bool {
    let trimmed = value
        .trim()
        .trim_start_matches('(')
        .trim_end_matches(')')
        .trim();
    trimmed.eq_ignore_ascii_case("null")
}
