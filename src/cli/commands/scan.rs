//! Scan command implementation.

use super::{resolve_settings, validate_output_path, write_output};
use crate::cli::ScanArgs;
use crate::config::CliOverrides;
use crate::error::Result;
use crate::format::{self, OutputFormat};
use crate::normalize::prepare;
use crate::storage::SqliteTarget;
use tracing::info;

/// Execute the scan command.
///
/// # Errors
///
/// Returns an error if the output path or format is invalid, the database
/// cannot be scanned, normalization hits a name collision, or writing fails.
pub fn execute(
    args: &ScanArgs,
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
        settings.format.unwrap_or(OutputFormat::Json)
    };
    let output_format = OutputFormat::resolve(args.format, args.output.as_deref(), fallback)?;

    let target = SqliteTarget::open_with_timeout(&args.database, settings.lock_timeout)?;
    let mut database = target.scan()?;
    prepare(&mut database, &settings.normalize)?;
    info!(
        tables = database.tables.len(),
        format = %output_format,
        "Scanned database"
    );

    let rendered = format::encode_database(&database, output_format)?;
    write_output(args.output.as_deref(), &rendered, quiet)
}
