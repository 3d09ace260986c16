//! Structured error output for scripted callers.
//!
//! Provides machine-parseable error information with:
//! - Error codes for categorization
//! - Hints for self-correction
//! - Retryability flags
//! - Context for debugging

use crate::error::SchemaError;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

/// Machine-readable error codes.
///
/// These codes are stable and can be used for programmatic error handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCode {
    // === Database Errors (exit code 2) ===
    /// Reading the schema catalog failed
    IntrospectionFailed,
    /// Database file not found
    DatabaseNotFound,
    /// Database operation failed
    DatabaseError,

    // === Validation Errors (exit code 4) ===
    /// Argument validation failed
    ValidationFailed,
    /// Schema document could not be decoded
    MalformedSchema,
    /// Name normalization would merge two names
    NameCollision,
    /// Identifier rejected by the allow-list
    InvalidIdentifier,
    /// Column type rejected by the allow-list
    InvalidColumnType,
    /// Column default rejected by the allow-list
    InvalidDefault,
    /// Unknown input or output format
    UnsupportedFormat,

    // === Migration Errors (exit code 5) ===
    /// New table lacks the anchor column
    MissingAnchorColumn,
    /// DDL statement failed against the target
    StatementFailed,

    // === Config Errors (exit code 7) ===
    /// Configuration error
    ConfigError,

    // === I/O Errors (exit code 8) ===
    /// File I/O error
    IoError,
    /// JSON serialization error
    JsonError,
    /// YAML serialization error
    YamlError,

    // === Internal Errors (exit code 1) ===
    /// Unexpected internal error
    InternalError,
}

impl ErrorCode {
    /// Get the string representation for JSON output.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::IntrospectionFailed => "INTROSPECTION_FAILED",
            Self::DatabaseNotFound => "DATABASE_NOT_FOUND",
            Self::DatabaseError => "DATABASE_ERROR",
            Self::ValidationFailed => "VALIDATION_FAILED",
            Self::MalformedSchema => "MALFORMED_SCHEMA",
            Self::NameCollision => "NAME_COLLISION",
            Self::InvalidIdentifier => "INVALID_IDENTIFIER",
            Self::InvalidColumnType => "INVALID_COLUMN_TYPE",
            Self::InvalidDefault => "INVALID_DEFAULT",
            Self::UnsupportedFormat => "UNSUPPORTED_FORMAT",
            Self::MissingAnchorColumn => "MISSING_ANCHOR_COLUMN",
            Self::StatementFailed => "STATEMENT_FAILED",
            Self::ConfigError => "CONFIG_ERROR",
            Self::IoError => "IO_ERROR",
            Self::JsonError => "JSON_ERROR",
            Self::YamlError => "YAML_ERROR",
            Self::InternalError => "INTERNAL_ERROR",
        }
    }

    /// Whether fixing the input and re-running might succeed.
    ///
    /// DDL failures are never marked retryable: they are schema conflicts or
    /// locked files, and the target may already hold a partial migration.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::ValidationFailed
                | Self::MalformedSchema
                | Self::NameCollision
                | Self::InvalidIdentifier
                | Self::InvalidColumnType
                | Self::InvalidDefault
                | Self::UnsupportedFormat
        )
    }

    /// Get the exit code for this error category.
    ///
    /// - 1: Internal/unknown errors
    /// - 2: Database errors
    /// - 4: Validation errors
    /// - 5: Migration errors
    /// - 7: Config errors
    /// - 8: I/O errors
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::IntrospectionFailed | Self::DatabaseNotFound | Self::DatabaseError => 2,
            Self::ValidationFailed
            | Self::MalformedSchema
            | Self::NameCollision
            | Self::InvalidIdentifier
            | Self::InvalidColumnType
            | Self::InvalidDefault
            | Self::UnsupportedFormat => 4,
            Self::MissingAnchorColumn | Self::StatementFailed => 5,
            Self::ConfigError => 7,
            Self::IoError | Self::JsonError | Self::YamlError => 8,
            Self::InternalError => 1,
        }
    }
}

/// Structured error for machine-parseable output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StructuredError {
    /// Machine-readable error code
    pub code: ErrorCode,
    /// Human-readable error message
    pub message: String,
    /// Optional hint for fixing the error
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
    /// Whether the operation can be retried
    pub retryable: bool,
    /// Additional context data
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<Value>,
}

impl StructuredError {
    /// Create a new structured error from a `SchemaError`.
    #[must_use]
    pub fn from_error(err: &SchemaError) -> Self {
        let (code, context) = Self::extract_code_and_context(err);

        Self {
            code,
            message: err.to_string(),
            hint: err.suggestion().map(str::to_string),
            retryable: code.is_retryable(),
            context,
        }
    }

    /// Serialize to JSON value.
    #[must_use]
    pub fn to_json(&self) -> Value {
        json!({
            "error": {
                "code": self.code.as_str(),
                "message": self.message,
                "hint": self.hint,
                "retryable": self.retryable,
                "context": self.context,
            }
        })
    }

    /// Format for human-readable output.
    #[must_use]
    pub fn to_human(&self, color: bool) -> String {
        let mut output = String::new();

        if color {
            output.push_str("\x1b[31mError:\x1b[0m ");
        } else {
            output.push_str("Error: ");
        }

        output.push_str(&self.message);

        if let Some(hint) = &self.hint {
            output.push('\n');
            if color {
                output.push_str("\x1b[33mHint:\x1b[0m ");
            } else {
                output.push_str("Hint: ");
            }
            output.push_str(hint);
        }

        output
    }

    fn extract_code_and_context(err: &SchemaError) -> (ErrorCode, Option<Value>) {
        match err {
            SchemaError::Introspection { table, .. } => (
                ErrorCode::IntrospectionFailed,
                table.as_ref().map(|t| json!({"table": t})),
            ),
            SchemaError::DatabaseNotFound { path } => (
                ErrorCode::DatabaseNotFound,
                Some(json!({"path": path.display().to_string()})),
            ),
            SchemaError::Database(_) => (ErrorCode::DatabaseError, None),
            SchemaError::MalformedSchema { path, reason } => (
                ErrorCode::MalformedSchema,
                Some(json!({"path": path.display().to_string(), "reason": reason})),
            ),
            SchemaError::NameCollision {
                scope,
                first,
                second,
            } => (
                ErrorCode::NameCollision,
                Some(json!({"scope": scope, "names": [first, second]})),
            ),
            SchemaError::MissingAnchorColumn { table } => (
                ErrorCode::MissingAnchorColumn,
                Some(json!({"table": table, "anchor_column": "id"})),
            ),
            SchemaError::Statement { sql, .. } => {
                (ErrorCode::StatementFailed, Some(json!({"sql": sql})))
            }
            SchemaError::InvalidIdentifier { value, reason } => (
                ErrorCode::InvalidIdentifier,
                Some(json!({"value": value, "reason": reason})),
            ),
            SchemaError::InvalidColumnType { value } => {
                (ErrorCode::InvalidColumnType, Some(json!({"value": value})))
            }
            SchemaError::InvalidDefault { value } => {
                (ErrorCode::InvalidDefault, Some(json!({"value": value})))
            }
            SchemaError::Validation { field, reason } => (
                ErrorCode::ValidationFailed,
                Some(json!({"field": field, "reason": reason})),
            ),
            SchemaError::UnsupportedFormat(format) => (
                ErrorCode::UnsupportedFormat,
                Some(json!({"provided": format, "valid_values": ["json", "yaml", "sql"]})),
            ),
            SchemaError::Config(_) => (ErrorCode::ConfigError, None),
            SchemaError::Io(_) => (ErrorCode::IoError, None),
            SchemaError::Json(_) => (ErrorCode::JsonError, None),
            SchemaError::Yaml(_) => (ErrorCode::YamlError, None),
            SchemaError::Other(_) => (ErrorCode::InternalError, None),
        }
    }
}
