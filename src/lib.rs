//! `db_schema`: `SQLite` schema introspection, normalization, diff and migration.
//!
//! The library is usable on its own; the `db-schema` binary is a thin
//! command layer over it.

pub mod cli;
pub mod config;
pub mod diff;
pub mod error;
pub mod format;
pub mod logging;
pub mod migrate;
pub mod model;
pub mod normalize;
pub mod storage;

pub use diff::{Migration, TableAddition, diff};
pub use error::{ErrorCode, Result, SchemaError, StructuredError};
pub use migrate::{
    AlwaysAllow, AlwaysDeny, ApplyReport, Confirm, MigrationTarget, StdinConfirm, TableOutcome,
    apply,
};
pub use model::{Column, Database, Index, Table};
pub use normalize::{
    NameCase, NormalizeOptions, SortScope, normalize_default, normalize_names, normalize_type,
    prepare,
};
pub use storage::{SqliteTarget, scan};
