use clap::Parser;
use db_schema::cli::commands;
use db_schema::cli::{Cli, Commands};
use db_schema::config::CliOverrides;
use db_schema::logging::init_logging;
use db_schema::{SchemaError, StructuredError};
use std::io::{self, IsTerminal};

fn main() {
    let cli = Cli::parse();

    if let Err(e) = init_logging(cli.verbose, cli.quiet, None) {
        eprintln!("Failed to initialize logging: {e}");
    }

    let overrides = CliOverrides {
        lock_timeout: cli.lock_timeout,
        ..CliOverrides::default()
    };

    let result = match &cli.command {
        Commands::Scan(args) => commands::scan::execute(args, cli.json, cli.quiet, &overrides),
        Commands::Compare(args) => {
            commands::compare::execute(args, cli.json, cli.quiet, &overrides)
        }
        Commands::Migrate(args) => commands::migrate::execute(args, cli.json, &overrides),
        Commands::Version => commands::version::execute(cli.json),
        Commands::Completions(args) => commands::completions::execute(args),
    };

    if let Err(e) = result {
        handle_error(&e, cli.json);
    }
}

/// Report an error and exit.
///
/// JSON goes to stderr when `--json` is set or stdout is not a terminal;
/// otherwise a human-readable message with a hint.
fn handle_error(err: &SchemaError, json_mode: bool) -> ! {
    let structured = StructuredError::from_error(err);
    let exit_code = structured.code.exit_code();

    if json_mode || !io::stdout().is_terminal() {
        let json = structured.to_json();
        eprintln!(
            "{}",
            serde_json::to_string_pretty(&json).unwrap_or_else(|_| json.to_string())
        );
    } else {
        eprintln!("{}", structured.to_human(io::stderr().is_terminal()));
    }

    std::process::exit(exit_code);
}
