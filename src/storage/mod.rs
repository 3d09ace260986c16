//! `SQLite` storage: schema introspection and the live migration target.

pub mod scan;
pub mod sqlite;

pub use scan::scan;
pub use sqlite::SqliteTarget;
