//! Serialization of schemas and migrations.
//!
//! - JSON: pretty-printed with four-space indentation
//! - YAML: `serde_yaml`
//! - SQL: generated DDL (see [`sql`])
//!
//! Schemas are written as the bare list of tables. Reading accepts either
//! that list or a document with a `tables` key.

pub mod sql;

use crate::diff::Migration;
use crate::error::{Result, SchemaError};
use crate::model::{Database, Table};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Output format for schemas and migrations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Json,
    #[value(alias = "yml")]
    Yaml,
    Sql,
}

impl OutputFormat {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Yaml => "yaml",
            Self::Sql => "sql",
        }
    }

    /// Parse a format name as given in config files.
    ///
    /// # Errors
    ///
    /// Returns `UnsupportedFormat` for anything but json, yaml/yml or sql.
    pub fn parse(value: &str) -> Result<Self> {
        match value.trim().to_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "yaml" | "yml" => Ok(Self::Yaml),
            "sql" => Ok(Self::Sql),
            other => Err(SchemaError::UnsupportedFormat(other.to_string())),
        }
    }

    /// Guess the format from a file extension.
    ///
    /// # Errors
    ///
    /// Returns `UnsupportedFormat` if the path has no extension or an
    /// unknown one.
    pub fn from_path(path: &Path) -> Result<Self> {
        let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
            return Err(SchemaError::UnsupportedFormat(format!(
                "output file '{}' has no extension, specify --fmt json|yaml|sql",
                path.display()
            )));
        };
        match ext.to_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "yaml" | "yml" => Ok(Self::Yaml),
            "sql" => Ok(Self::Sql),
            _ => Err(SchemaError::UnsupportedFormat(format!(
                "unknown output file extension '.{ext}', specify --fmt json|yaml|sql"
            ))),
        }
    }

    /// Pick the format: explicit choice, else the output extension, else `fallback`.
    ///
    /// # Errors
    ///
    /// Returns `UnsupportedFormat` when only an output path is given and its
    /// extension is missing or unknown.
    pub fn resolve(explicit: Option<Self>, output: Option<&Path>, fallback: Self) -> Result<Self> {
        match (explicit, output) {
            (Some(format), _) => Ok(format),
            (None, Some(path)) => Self::from_path(path),
            (None, None) => Ok(fallback),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Encode a schema.
///
/// # Errors
///
/// Returns an error if serialization fails or, for SQL, a name fails validation.
pub fn encode_database(database: &Database, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => to_json_pretty(&database.tables),
        OutputFormat::Yaml => Ok(serde_yaml::to_string(&database.tables)?),
        OutputFormat::Sql => sql::database_statements(database),
    }
}

/// Encode a migration. The SQL form is the DDL plan.
///
/// # Errors
///
/// Returns an error if serialization fails or, for SQL, the plan cannot be built.
pub fn encode_migration(migration: &Migration, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => to_json_pretty(migration),
        OutputFormat::Yaml => Ok(serde_yaml::to_string(migration)?),
        OutputFormat::Sql => {
            let mut out = String::new();
            for statement in migration.statements()? {
                out.push_str(&statement.to_sql());
                out.push('\n');
            }
            Ok(out)
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum SchemaDocument {
    Tables(Vec<Table>),
    Database(Database),
}

/// Decode a schema document. `.json` files are read as JSON, anything else
/// as YAML. `path` is only used for format detection and error messages.
///
/// # Errors
///
/// Returns `MalformedSchema` if the contents match neither accepted shape.
pub fn decode_database(path: &Path, contents: &str) -> Result<Database> {
    let is_json = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("json"));

    let document: std::result::Result<SchemaDocument, String> = if is_json {
        serde_json::from_str(contents).map_err(|e| e.to_string())
    } else {
        serde_yaml::from_str(contents).map_err(|e| e.to_string())
    };

    match document {
        Ok(SchemaDocument::Tables(tables)) => Ok(Database::new(tables)),
        Ok(SchemaDocument::Database(database)) => Ok(database),
        Err(reason) => Err(SchemaError::MalformedSchema {
            path: path.to_path_buf(),
            reason,
        }),
    }
}

fn to_json_pretty<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
    value.serialize(&mut ser)?;
    buf.push(b'\n');
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Column;
    use std::path::PathBuf;

    fn sample() -> Database {
        Database::new(vec![
            Table::new("users")
                .with_column(Column::new("id", "int").not_null())
                .with_column(Column::new("name", "text")),
        ])
    }

    #[test]
    fn format_from_extension() {
        assert_eq!(OutputFormat::from_path(Path::new("a.JSON")).unwrap(), OutputFormat::Json);
        assert_eq!(OutputFormat::from_path(Path::new("a.yml")).unwrap(), OutputFormat::Yaml);
        assert_eq!(OutputFormat::from_path(Path::new("a.sql")).unwrap(), OutputFormat::Sql);
        assert!(OutputFormat::from_path(Path::new("schema")).is_err());
        assert!(OutputFormat::from_path(Path::new("schema.toml")).is_err());
    }

    #[test]
    fn resolve_prefers_explicit_then_extension() {
        let path = PathBuf::from("out.yaml");
        assert_eq!(
            OutputFormat::resolve(Some(OutputFormat::Sql), Some(&path), OutputFormat::Json).unwrap(),
            OutputFormat::Sql
        );
        assert_eq!(
            OutputFormat::resolve(None, Some(&path), OutputFormat::Json).unwrap(),
            OutputFormat::Yaml
        );
        assert_eq!(
            OutputFormat::resolve(None, None, OutputFormat::Json).unwrap(),
            OutputFormat::Json
        );
    }

    #[test]
    fn json_uses_four_space_indent() {
        let json = encode_database(&sample(), OutputFormat::Json).unwrap();
        assert!(json.starts_with("[\n    {\n        \"name\": \"users\""));
    }

    #[test]
    fn yaml_decodes_table_list_and_document() {
        let yaml = encode_database(&sample(), OutputFormat::Yaml).unwrap();
        let back = decode_database(Path::new("s.yaml"), &yaml).unwrap();
        assert_eq!(back, sample());

        let doc = "tables:\n  - name: users\n    columns:\n      - name: id\n        type: int\n";
        let db = decode_database(Path::new("s.yml"), doc).unwrap();
        assert_eq!(db.tables[0].columns[0].name, "id");
    }

    #[test]
    fn json_file_decodes_as_json() {
        let json = encode_database(&sample(), OutputFormat::Json).unwrap();
        assert_eq!(decode_database(Path::new("s.json"), &json).unwrap(), sample());
    }

    #[test]
    fn malformed_input_reports_path() {
        let err = decode_database(Path::new("bad.yaml"), "name: [unclosed").unwrap_err();
        match err {
            SchemaError::MalformedSchema { path, .. } => assert_eq!(path, PathBuf::from("bad.yaml")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn migration_sql_plan() {
        let migration = crate::diff::diff(&Database::default(), &sample());
        let sql = encode_migration(&migration, OutputFormat::Sql).unwrap();
        assert_eq!(
            sql,
            "CREATE TABLE \"users\" (\"id\" int);\nALTER TABLE \"users\" ADD COLUMN \"name\" text;\n"
        );
    }
}
