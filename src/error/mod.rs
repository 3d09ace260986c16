//! Error types and handling for `db_schema`.
//!
//! # Design
//!
//! - Uses `thiserror` for derive-based error types
//! - Supports `anyhow` integration at the command layer
//! - Provides recovery hints for user-facing errors
//! - Provides structured JSON output for scripted callers

mod structured;

pub use structured::{ErrorCode, StructuredError};

use std::path::PathBuf;
use thiserror::Error;

/// Primary error type for `db_schema` operations.
#[derive(Error, Debug)]
pub enum SchemaError {
    // === Introspection Errors ===
    /// Reading the catalog of a database failed.
    #[error("Introspection failed{}: {source}", table_suffix(.table.as_deref()))]
    Introspection {
        table: Option<String>,
        #[source]
        source: rusqlite::Error,
    },

    /// Database file not found at the specified path.
    #[error("Database not found at '{path}'")]
    DatabaseNotFound { path: PathBuf },

    /// `SQLite` database error.
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    // === Schema Input Errors ===
    /// A serialized schema could not be decoded.
    #[error("Malformed schema in '{path}': {reason}")]
    MalformedSchema { path: PathBuf, reason: String },

    /// Case folding would merge two distinct names.
    #[error("Name collision in {scope}: '{first}' and '{second}' fold to the same name")]
    NameCollision {
        scope: String,
        first: String,
        second: String,
    },

    // === Migration Errors ===
    /// A brand-new table lacks the anchor `id` column.
    #[error("Table '{table}' does not exist and has no 'id' column to create it with")]
    MissingAnchorColumn { table: String },

    /// A DDL statement failed against the target.
    #[error("Statement failed: {sql}: {source}")]
    Statement {
        sql: String,
        #[source]
        source: rusqlite::Error,
    },

    /// An identifier failed the allow-list check.
    #[error("Invalid identifier '{value}': {reason}")]
    InvalidIdentifier { value: String, reason: String },

    /// A column type is not safe to splice into DDL.
    #[error("Invalid column type '{value}'")]
    InvalidColumnType { value: String },

    /// A column default could end its `DEFAULT` clause.
    #[error("Invalid default expression '{value}'")]
    InvalidDefault { value: String },

    // === Validation Errors ===
    /// Argument or field validation failed.
    #[error("Validation failed: {field}: {reason}")]
    Validation { field: String, reason: String },

    /// Output or input format could not be determined.
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    // === Configuration Errors ===
    /// Configuration file or value error.
    #[error("Configuration error: {0}")]
    Config(String),

    // === I/O Errors ===
    /// File system I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML serialization/deserialization error.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Wrapped anyhow error.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

fn table_suffix(table: Option<&str>) -> String {
    table.map(|t| format!(" for table '{t}'")).unwrap_or_default()
}

impl SchemaError {
    /// Can the user fix this without code changes?
    #[must_use]
    pub const fn is_user_recoverable(&self) -> bool {
        matches!(
            self,
            Self::DatabaseNotFound { .. }
                | Self::MalformedSchema { .. }
                | Self::NameCollision { .. }
                | Self::MissingAnchorColumn { .. }
                | Self::InvalidIdentifier { .. }
                | Self::InvalidColumnType { .. }
                | Self::InvalidDefault { .. }
                | Self::Validation { .. }
                | Self::UnsupportedFormat(_)
                | Self::Config(_)
        )
    }

    /// Human-friendly suggestion for fixing this error.
    #[must_use]
    pub const fn suggestion(&self) -> Option<&'static str> {
        match self {
            Self::DatabaseNotFound { .. } => Some("Check the database path"),
            Self::MalformedSchema { .. } => {
                Some("Schema files hold a list of tables or a document with a 'tables' key")
            }
            Self::NameCollision { .. } => Some("Rename one of the colliding objects or skip --norm-names"),
            Self::MissingAnchorColumn { .. } => {
                Some("Add an 'id' column to the table in the reference schema")
            }
            Self::InvalidIdentifier { .. } => {
                Some("Names may contain only letters, digits and '_' and must not start with a digit")
            }
            Self::InvalidColumnType { .. } => {
                Some("Use a plain type name, optionally with a numeric size such as VARCHAR(255)")
            }
            Self::InvalidDefault { .. } => Some(
                "Use a literal such as 'text', 0, NULL or CURRENT_TIMESTAMP, or a parenthesized expression",
            ),
            Self::UnsupportedFormat(_) => Some("Pass --fmt json|yaml|sql"),
            _ => None,
        }
    }

    /// Create a validation error for a specific field.
    #[must_use]
    pub fn validation(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Create an introspection error scoped to a table.
    #[must_use]
    pub fn introspection(table: Option<&str>, source: rusqlite::Error) -> Self {
        Self::Introspection {
            table: table.map(str::to_string),
            source,
        }
    }
}

/// Result type using `SchemaError`.
pub type Result<T> = std::result::Result<T, SchemaError>;
