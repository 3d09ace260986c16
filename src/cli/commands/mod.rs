//! Command implementations and the helpers they share.

pub mod compare;
pub mod completions;
pub mod migrate;
pub mod scan;
pub mod version;

use crate::cli::{NormNames, NormalizeArgs};
use crate::config::{self, CliOverrides, Settings};
use crate::error::{Result, SchemaError};
use crate::format;
use crate::model::Database;
use crate::normalize::NameCase;
use crate::storage::SqliteTarget;
use std::fs;
use std::path::Path;
use tracing::debug;

/// File extensions treated as `SQLite` databases rather than schema documents.
pub const DATABASE_EXTENSIONS: &[&str] = &["db", "db3", "sqlite", "sqlite3"];

#[must_use]
pub fn is_database_path(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| {
            DATABASE_EXTENSIONS
                .iter()
                .any(|known| known.eq_ignore_ascii_case(ext))
        })
}

/// Load a schema from a database (scanned) or a schema file (decoded).
///
/// # Errors
///
/// Returns `DatabaseNotFound` or an introspection error for databases, and
/// an I/O or `MalformedSchema` error for schema files.
pub fn load_schema(path: &Path, lock_timeout: Option<u64>) -> Result<Database> {
    if is_database_path(path) {
        debug!(path = %path.display(), "Scanning database");
        return SqliteTarget::open_with_timeout(path, lock_timeout)?.scan();
    }
    debug!(path = %path.display(), "Reading schema file");
    let contents = fs::read_to_string(path)?;
    format::decode_database(path, &contents)
}

/// Merge command-line normalization flags into the config overrides and
/// resolve the final settings.
///
/// # Errors
///
/// Returns an error if a config file is unreadable or holds invalid values.
pub fn resolve_settings(base: &CliOverrides, normalize: &NormalizeArgs) -> Result<Settings> {
    let mut overrides = base.clone();
    if normalize.norm_types {
        overrides.norm_types = Some(true);
    }
    if let Some(names) = normalize.norm_names {
        overrides.norm_names = Some(match names {
            NormNames::Skip => None,
            NormNames::Upper => Some(NameCase::Upper),
            NormNames::Lower => Some(NameCase::Lower),
        });
    }
    if !normalize.sort.is_empty() {
        overrides.sort = Some(normalize.sort.clone());
    }

    let cwd = std::env::current_dir()?;
    config::load_settings(&cwd, &overrides)
}

/// Check that `path` names a file inside an existing directory.
///
/// # Errors
///
/// Returns a validation error if the path is a directory or its parent is
/// missing or not a directory.
pub fn validate_output_path(path: &Path) -> Result<()> {
    if path.is_dir() {
        return Err(SchemaError::validation(
            "output",
            format!(
                "'{}' resolves to an existing directory (expected path to a file within an existing directory)",
                path.display()
            ),
        ));
    }

    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    match fs::metadata(parent) {
        Ok(meta) if meta.is_dir() => Ok(()),
        Ok(_) => Err(SchemaError::validation(
            "output",
            format!(
                "'{}': expected path to a file within an existing directory",
                path.display()
            ),
        )),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Err(SchemaError::validation(
            "output",
            format!("'{}': parent directory does not exist", path.display()),
        )),
        Err(err) => Err(err.into()),
    }
}

/// Write command output to a file (reporting progress on stderr) or stdout.
///
/// # Errors
///
/// Returns an error if the file cannot be written.
pub fn write_output(output: Option<&Path>, contents: &str, quiet: bool) -> Result<()> {
    let Some(path) = output else {
        print!("{contents}");
        return Ok(());
    };

    if !quiet {
        eprint!("writing results to {} ... ", path.display());
    }
    match fs::write(path, contents) {
        Ok(()) => {
            if !quiet {
                eprintln!("SUCCEEDED");
            }
            Ok(())
        }
        Err(err) => {
            if !quiet {
                eprintln!("FAILED");
            }
            Err(err.into())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn database_extensions_are_detected() {
        assert!(is_database_path(Path::new("app.db")));
        assert!(is_database_path(Path::new("app.SQLITE3")));
        assert!(is_database_path(Path::new("dir/app.db3")));
        assert!(!is_database_path(Path::new("schema.yaml")));
        assert!(!is_database_path(Path::new("schema")));
    }

    #[test]
    fn output_path_rules() {
        let temp = TempDir::new().expect("tempdir");
        assert!(validate_output_path(&temp.path().join("out.json")).is_ok());
        assert!(validate_output_path(temp.path()).is_err());
        assert!(validate_output_path(&temp.path().join("missing").join("out.json")).is_err());

        let file = temp.path().join("plain");
        fs::write(&file, "x").expect("write");
        assert!(validate_output_path(&file.join("out.json")).is_err());
    }

    #[test]
    fn bare_file_name_uses_current_dir() {
        assert!(validate_output_path(Path::new("out.json")).is_ok());
    }

    #[test]
    fn load_schema_reads_yaml_file() {
        let temp = TempDir::new().expect("tempdir");
        let path = temp.path().join("schema.yaml");
        fs::write(&path, "- name: t\n  columns:\n    - name: id\n      type: int\n").expect("write");
        let db = load_schema(&path, None).unwrap();
        assert!(db.has_table("t"));
    }

    #[test]
    fn load_schema_missing_database() {
        let temp = TempDir::new().expect("tempdir");
        let err = load_schema(&temp.path().join("nope.db"), None).unwrap_err();
        assert!(matches!(err, SchemaError::DatabaseNotFound { .. }));
    }
}
