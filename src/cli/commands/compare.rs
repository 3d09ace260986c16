//! Compare command implementation.
//!
//! Both sides go through the same normalization so that cosmetic
//! differences (type spelling, name case) do not show up as changes.

use super::{load_schema, resolve_settings, validate_output_path, write_output};
use crate::cli::CompareArgs;
use crate::config::CliOverrides;
use crate::diff::diff;
use crate::error::Result;
use crate::format::{self, OutputFormat};
use crate::normalize::prepare;
use tracing::info;

/// Execute the compare command.
///
/// # Errors
///
/// Returns an error if either schema cannot be loaded, the output is
/// invalid, or writing fails.
pub fn execute(
    args: &CompareArgs,
    json: bool,
    quiet: bool,
    overrides: &CliOverrides,
) -> Result<()> {
    if let Some(output) = &args.output {
        validate_output_path(output)?;
    }
    let settings = resolve_settings(overrides, &args.normalize)?;
    let fallback = if json {
        OutputFormat::Json
    } else {
        settings.format.unwrap_or(OutputFormat::Yaml)
    };
    let output_format = OutputFormat::resolve(args.format, args.output.as_deref(), fallback)?;

    let mut base = load_schema(&args.base, settings.lock_timeout)?;
    let mut derived = load_schema(&args.derived, settings.lock_timeout)?;
    prepare(&mut base, &settings.normalize)?;
    prepare(&mut derived, &settings.normalize)?;

    let migration = diff(&base, &derived);
    info!(
        add = migration.add.len(),
        remove = migration.remove.len(),
        "Compared schemas"
    );

    let rendered = format::encode_migration(&migration, output_format)?;
    write_output(args.output.as_deref(), &rendered, quiet)
}
