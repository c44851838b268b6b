//! Main entry point for the sketchstrings CLI application.
//!
//! Extracts marked strings from a Sketch file into a CSV table, or with
//! `-i` injects a CSV table back into its Sketch file.

use log::LevelFilter;
use std::error::Error;
use std::process::ExitCode;

use sketchstrings::cli::write_usage;
use sketchstrings::error::{EXIT_FAILURE, EXIT_OK};
use sketchstrings::{Cli, RunConfig, SketchError, pipeline};

/// Application entry point.
///
/// Exit codes: 0 on success or help, 1 when a referenced file does not
/// exist, 2 for argument errors and every other failure.
fn main() -> ExitCode {
    // `help` as a bare word behaves like -h
    if std::env::args_os().skip(1).any(|arg| arg == "help") {
        return match write_usage(&mut std::io::stdout().lock()) {
            Ok(()) => ExitCode::from(EXIT_OK),
            Err(err) => {
                eprintln!("Error: failed to print usage: {}", err);
                ExitCode::from(EXIT_FAILURE)
            }
        };
    }

    // clap exits with 0 for -h/-V and 2 for malformed arguments
    let cli = match Cli::try_parse_ordered_from(std::env::args_os()) {
        Ok(cli) => cli,
        Err(err) => err.exit(),
    };
    init_logging(cli.log_level());

    match RunConfig::from_cli(&cli).and_then(|config| pipeline::run(&config)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            report(&err);
            ExitCode::from(err.exit_code())
        }
    }
}

/// Route `log` records to stderr. `RUST_LOG`, when set, overrides the
/// level chosen with -q / -v.
fn init_logging(level: LevelFilter) {
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .format_timestamp(None)
        .format_target(false)
        .init();
}

/// Print the error and its chain of causes.
fn report(err: &SketchError) {
    eprintln!("Error: {}", err);
    let mut source = err.source();
    while let Some(cause) = source {
        eprintln!("  caused by: {}", cause);
        source = cause.source();
    }
}
