//! Migrate command implementation.

use super::{load_schema, resolve_settings};
use crate::cli::MigrateArgs;
use crate::config::CliOverrides;
use crate::diff::{Migration, diff};
use crate::error::Result;
use crate::migrate::{AlwaysAllow, AlwaysDeny, ApplyReport, Confirm, StdinConfirm, TableOutcome, apply};
use crate::normalize::prepare;
use crate::storage::SqliteTarget;
use serde::Serialize;
use tracing::info;

#[derive(Serialize)]
struct MigrateOutput<'a> {
    dry_run: bool,
    migration: &'a Migration,
    #[serde(skip_serializing_if = "Option::is_none")]
    report: Option<&'a ApplyReport>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    plan: Vec<String>,
}

/// Execute the migrate command.
///
/// # Errors
///
/// Returns an error if either schema cannot be loaded, the plan contains an
/// unsafe name or type, a new table lacks its `id` column, or a statement
/// fails.
pub fn execute(args: &MigrateArgs, json: bool, overrides: &CliOverrides) -> Result<()> {
    let mut overrides = overrides.clone();
    if args.yes {
        overrides.assume_yes = Some(true);
    }
    let settings = resolve_settings(&overrides, &args.normalize)?;

    let mut target = SqliteTarget::open_with_timeout(&args.source, settings.lock_timeout)?;
    let mut current = target.scan()?;
    let mut reference = load_schema(&args.reference, settings.lock_timeout)?;
    prepare(&mut current, &settings.normalize)?;
    prepare(&mut reference, &settings.normalize)?;

    let migration = diff(&current, &reference);
    info!(
        source = %args.source.display(),
        reference = %args.reference.display(),
        changes = migration.change_count(),
        "Computed migration"
    );

    if migration.is_empty() {
        if json {
            print_json(&MigrateOutput {
                dry_run: args.dry_run,
                migration: &migration,
                report: None,
                plan: Vec::new(),
            })?;
        } else {
            println!("Database is up to date.");
        }
        return Ok(());
    }

    if args.dry_run {
        let plan: Vec<String> = migration
            .statements()?
            .iter()
            .map(ToString::to_string)
            .collect();
        if json {
            print_json(&MigrateOutput {
                dry_run: true,
                migration: &migration,
                report: None,
                plan,
            })?;
        } else {
            for sql in &plan {
                println!("{sql}");
            }
        }
        return Ok(());
    }

    let mut confirm: Box<dyn Confirm> = if args.no_drop {
        Box::new(AlwaysDeny)
    } else if settings.assume_yes {
        Box::new(AlwaysAllow)
    } else {
        Box::new(StdinConfirm::new())
    };
    let report = apply(&migration, &mut target, confirm.as_mut())?;

    if json {
        print_json(&MigrateOutput {
            dry_run: false,
            migration: &migration,
            report: Some(&report),
            plan: Vec::new(),
        })?;
    } else {
        print_summary(&report);
    }
    Ok(())
}

fn print_summary(report: &ApplyReport) {
    for outcome in &report.outcomes {
        match outcome {
            TableOutcome::DropDeclined { table, rows } => {
                println!("Kept table {table} ({rows} rows).");
            }
            TableOutcome::Created {
                table,
                columns_added,
            } => {
                println!("Added table {table} with {} columns.", columns_added + 1);
            }
            TableOutcome::Extended {
                table,
                columns_added,
            } => {
                println!("Added {columns_added} columns to table {table}.");
            }
            TableOutcome::Dropped { .. } => {}
        }
    }
    println!("Done removing {} tables.", report.dropped());
    println!("Done adding {} tables.", report.added());
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
