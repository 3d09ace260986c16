//! CLI definitions and entry point.

use crate::format::OutputFormat;
use crate::normalize::SortScope;
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

pub mod commands;

/// `SQLite` schema scanner, differ and migrator
#[derive(Parser, Debug)]
#[command(name = "db-schema", author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// JSON output and error reports (--fmt and the output extension still win)
    #[arg(long, global = true)]
    pub json: bool,

    /// `SQLite` busy timeout in ms
    #[arg(long, global = true)]
    pub lock_timeout: Option<u64>,

    /// Increase logging verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (no output except errors)
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Retrieve the schema of a `SQLite` database
    Scan(ScanArgs),

    /// Compare two schemas and print the migration between them
    Compare(CompareArgs),

    /// Bring a `SQLite` database up to a reference schema
    Migrate(MigrateArgs),

    /// Show version information
    Version,

    /// Generate shell completions
    Completions(CompletionsArgs),
}

/// Name normalization choice on the command line.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum NormNames {
    /// Keep names as scanned
    Skip,
    /// Fold names to upper case
    Upper,
    /// Fold names to lower case
    Lower,
}

/// Flags shared by every command that loads schemas.
#[derive(Args, Debug, Clone, Default)]
pub struct NormalizeArgs {
    /// Normalize column types and drop `DEFAULT NULL` on nullable columns
    #[arg(long)]
    pub norm_types: bool,

    /// Fold table, column and index names
    #[arg(long, value_enum)]
    pub norm_names: Option<NormNames>,

    /// Sort tables, columns and/or indices by name (repeatable or comma separated)
    #[arg(short, long, value_enum, value_delimiter = ',')]
    pub sort: Vec<SortScope>,
}

#[derive(Args, Debug, Clone)]
pub struct ScanArgs {
    /// `SQLite` database file
    pub database: PathBuf,

    /// Output file (default: stdout)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Output format (default: from the output extension, json on stdout)
    #[arg(short = 'f', long = "fmt", value_enum)]
    pub format: Option<OutputFormat>,

    #[command(flatten)]
    pub normalize: NormalizeArgs,
}

#[derive(Args, Debug, Clone)]
pub struct CompareArgs {
    /// Base schema (the version that may need migrating): schema file or database
    pub base: PathBuf,

    /// Derived schema (the reference version): schema file or database
    pub derived: PathBuf,

    /// Output file (default: stdout)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Output format (default: from the output extension, yaml on stdout)
    #[arg(short = 'f', long = "fmt", value_enum)]
    pub format: Option<OutputFormat>,

    #[command(flatten)]
    pub normalize: NormalizeArgs,
}

#[derive(Args, Debug, Clone)]
pub struct MigrateArgs {
    /// `SQLite` database to alter
    pub source: PathBuf,

    /// Reference schema: schema file or database
    pub reference: PathBuf,

    /// Drop non-empty tables without asking
    #[arg(short, long, conflicts_with = "no_drop")]
    pub yes: bool,

    /// Never drop non-empty tables
    #[arg(long)]
    pub no_drop: bool,

    /// Print the DDL plan without executing it
    #[arg(long)]
    pub dry_run: bool,

    #[command(flatten)]
    pub normalize: NormalizeArgs,
}

#[derive(Args, Debug, Clone)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: ShellType,

    /// Output file (default: stdout)
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,
}

/// Supported shells for completion generation.
#[derive(ValueEnum, Debug, Clone, Copy, Eq, PartialEq)]
pub enum ShellType {
    /// Bash shell
    Bash,
    /// Zsh shell
    Zsh,
    /// Fish shell
    Fish,
    #[value(name = "powershell")]
    #[value(alias = "pwsh")]
    /// `PowerShell`
    PowerShell,
    /// Elvish
    Elvish,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn scan_accepts_repeated_and_comma_sorts() {
        let cli = Cli::parse_from([
            "db-schema",
            "scan",
            "app.db",
            "-s",
            "tables,columns",
            "--sort",
            "indices",
            "--norm-names",
            "lower",
        ]);
        let Commands::Scan(args) = cli.command else {
            panic!("expected scan");
        };
        assert_eq!(
            args.normalize.sort,
            vec![SortScope::Tables, SortScope::Columns, SortScope::Indices]
        );
        assert_eq!(args.normalize.norm_names, Some(NormNames::Lower));
    }

    #[test]
    fn fmt_accepts_yml_alias() {
        let cli = Cli::parse_from(["db-schema", "scan", "a.db", "--fmt", "yml"]);
        let Commands::Scan(args) = cli.command else {
            panic!("expected scan");
        };
        assert_eq!(args.format, Some(OutputFormat::Yaml));
    }

    #[test]
    fn migrate_yes_conflicts_with_no_drop() {
        let result = Cli::try_parse_from(["db-schema", "migrate", "a.db", "b.yaml", "--yes", "--no-drop"]);
        assert!(result.is_err());
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::parse_from(["db-schema", "compare", "a.yaml", "b.yaml", "--json", "-vv"]);
        assert!(cli.json);
        assert_eq!(cli.verbose, 2);
    }
}
