//! Migration applier.
//!
//! Runs a [`Migration`] against a live target in two fixed phases:
//!
//! 1. **Removal**: each removed table is dropped. Tables that still hold
//!    rows are only dropped after the injected [`Confirm`] policy agrees;
//!    a refusal skips that table and the run continues.
//! 2. **Addition**: a missing table is created from its `id` anchor column,
//!    then every other column is added with its own `ALTER TABLE`.
//!
//! Nothing is wrapped in a transaction. The first failing statement stops
//! the run and whatever was already issued stays applied.

pub mod ddl;

use crate::diff::Migration;
use crate::error::{Result, SchemaError};
use ddl::Statement;
use serde::Serialize;
use std::io::{self, BufRead, Write};
use tracing::{debug, info, warn};

/// Name of the column a brand-new table is created with.
pub const ANCHOR_COLUMN: &str = "id";

/// Whether `name` is the anchor column. `SQLite` names are case-insensitive,
/// so `ID` and `Id` count too.
#[must_use]
pub fn is_anchor(name: &str) -> bool {
    name.eq_ignore_ascii_case(ANCHOR_COLUMN)
}

/// Decides whether a destructive step may proceed.
pub trait Confirm {
    fn confirm(&mut self, prompt: &str) -> bool;
}

impl<F> Confirm for F
where
    F: FnMut(&str) -> bool,
{
    fn confirm(&mut self, prompt: &str) -> bool {
        self(prompt)
    }
}

/// Approves everything. Used by `--yes` and batch callers.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysAllow;

impl Confirm for AlwaysAllow {
    fn confirm(&mut self, _prompt: &str) -> bool {
        true
    }
}

/// Refuses everything. Non-empty tables are never dropped.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysDeny;

impl Confirm for AlwaysDeny {
    fn confirm(&mut self, _prompt: &str) -> bool {
        false
    }
}

/// Asks on a terminal. Answers `y` or `yes` approve; anything else,
/// including EOF or a read error, refuses.
pub struct StdinConfirm<R, W> {
    input: R,
    output: W,
}

impl StdinConfirm<io::StdinLock<'static>, io::Stdout> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            input: io::stdin().lock(),
            output: io::stdout(),
        }
    }
}

impl Default for StdinConfirm<io::StdinLock<'static>, io::Stdout> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: BufRead, W: Write> StdinConfirm<R, W> {
    pub const fn with_io(input: R, output: W) -> Self {
        Self { input, output }
    }
}

impl<R: BufRead, W: Write> Confirm for StdinConfirm<R, W> {
    fn confirm(&mut self, prompt: &str) -> bool {
        if write!(self.output, "{prompt} [y/N] ").is_err() || self.output.flush().is_err() {
            return false;
        }
        let mut answer = String::new();
        match self.input.read_line(&mut answer) {
            Ok(0) | Err(_) => false,
            Ok(_) => matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"),
        }
    }
}

/// A database the applier can inspect and alter.
pub trait MigrationTarget {
    /// # Errors
    ///
    /// Returns an error if the catalog cannot be queried.
    fn table_exists(&self, table: &str) -> Result<bool>;

    /// # Errors
    ///
    /// Returns an error if the table cannot be counted.
    fn row_count(&self, table: &ddl::Ident) -> Result<u64>;

    /// # Errors
    ///
    /// Returns `SchemaError::Statement` if the statement fails.
    fn execute(&mut self, statement: &Statement) -> Result<()>;
}

/// What happened to one table during `apply`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum TableOutcome {
    Dropped { table: String, rows: u64 },
    DropDeclined { table: String, rows: u64 },
    Created { table: String, columns_added: usize },
    Extended { table: String, columns_added: usize },
}

/// Summary of an `apply` run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ApplyReport {
    pub outcomes: Vec<TableOutcome>,
    pub statements: Vec<String>,
}

impl ApplyReport {
    #[must_use]
    pub fn dropped(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, TableOutcome::Dropped { .. }))
            .count()
    }

    #[must_use]
    pub fn declined(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, TableOutcome::DropDeclined { .. }))
            .count()
    }

    #[must_use]
    pub fn added(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| {
                matches!(
                    o,
                    TableOutcome::Created { .. } | TableOutcome::Extended { .. }
                )
            })
            .count()
    }
}

/// Apply `migration` to `target`.
///
/// # Errors
///
/// - `InvalidIdentifier` / `InvalidColumnType` before a statement with an
///   unsafe name or type would be built
/// - `MissingAnchorColumn` for a missing table without an `id` column; no
///   statement is issued for that table
/// - `Statement` for the first DDL failure; later work is not attempted
pub fn apply<T, C>(migration: &Migration, target: &mut T, confirm: &mut C) -> Result<ApplyReport>
where
    T: MigrationTarget + ?Sized,
    C: Confirm + ?Sized,
{
    let mut report = ApplyReport::default();

    remove_tables(migration, target, confirm, &mut report)?;
    info!(
        dropped = report.dropped(),
        declined = report.declined(),
        "Removal phase complete"
    );

    add_tables(migration, target, &mut report)?;
    info!(tables = report.added(), "Addition phase complete");

    Ok(report)
}

fn remove_tables<T, C>(
    migration: &Migration,
    target: &mut T,
    confirm: &mut C,
    report: &mut ApplyReport,
) -> Result<()>
where
    T: MigrationTarget + ?Sized,
    C: Confirm + ?Sized,
{
    for table in &migration.remove {
        let statement = Statement::drop_table(&table.name)?;
        let rows = target.row_count(statement.table())?;
        debug!(table = %table.name, rows, "Checked table before drop");

        if rows > 0 {
            let prompt = format!(
                "Are you sure you want to remove table {}? It has {} rows.",
                table.name, rows
            );
            if !confirm.confirm(&prompt) {
                warn!(table = %table.name, rows, "Drop declined, keeping table");
                report.outcomes.push(TableOutcome::DropDeclined {
                    table: table.name.clone(),
                    rows,
                });
                continue;
            }
        }

        issue(target, &statement, report)?;
        report.outcomes.push(TableOutcome::Dropped {
            table: table.name.clone(),
            rows,
        });
    }
    Ok(())
}

fn add_tables<T>(migration: &Migration, target: &mut T, report: &mut ApplyReport) -> Result<()>
where
    T: MigrationTarget + ?Sized,
{
    for addition in &migration.add {
        let table = addition.table_name();
        let columns = addition.columns();

        // Validate the whole entry before touching the target.
        let mut planned = Vec::with_capacity(columns.len());
        for column in columns.iter().filter(|c| !is_anchor(&c.name)) {
            planned.push(Statement::add_column(
                table,
                &column.name,
                &column.column_type,
            )?);
        }

        let exists = target.table_exists(table)?;
        if !exists {
            let anchor = columns
                .iter()
                .find(|c| is_anchor(&c.name))
                .ok_or_else(|| SchemaError::MissingAnchorColumn {
                    table: table.to_string(),
                })?;
            let create = Statement::create_table(table, &anchor.name, &anchor.column_type)?;
            issue(target, &create, report)?;
        }

        for statement in &planned {
            issue(target, statement, report)?;
        }

        let columns_added = planned.len();
        report.outcomes.push(if exists {
            TableOutcome::Extended {
                table: table.to_string(),
                columns_added,
            }
        } else {
            TableOutcome::Created {
                table: table.to_string(),
                columns_added,
            }
        });
        info!(table, columns_added, created = !exists, "Added table columns");
    }
    Ok(())
}

fn issue<T>(target: &mut T, statement: &Statement, report: &mut ApplyReport) -> Result<()>
where
    T: MigrationTarget + ?Sized,
{
    let sql = statement.to_sql();
    info!(sql = %sql, "Executing DDL");
    target.execute(statement)?;
    report.statements.push(sql);
    Ok(())
}
