use clap::error::ErrorKind;
use clap::parser::ValueSource;
use clap::{ArgAction, CommandFactory, FromArgMatches, Parser};
use log::LevelFilter;
use std::ffi::OsString;
use std::io::{self, Write};
use std::path::PathBuf;

use crate::config::DEFAULT_PREFIX;

#[derive(Parser, Debug)]
#[command(name = "sketchstrings")]
#[command(version)]
#[command(
    about = "Extract localizable strings from Sketch files, or inject translated ones back",
    long_about = "Extracts every string whose layer name begins with the marker prefix \
                  (\"%%\" by default) into a CSV table with a `label,string` header. \
                  With -i, reads such a table and writes its strings back into the Sketch file."
)]
#[command(after_help = "Examples:\n  \
  sketchstrings design.sketch                 write design.csv\n  \
  sketchstrings design.sketch -o strings.csv  write strings.csv\n  \
  sketchstrings -i design.csv                 update design.sketch in place\n  \
  sketchstrings -i fr.csv -o design.sketch    update design.sketch from fr.csv")]
pub struct Cli {
    /// Sketch file to extract from (or CSV table to inject with -i)
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Output file (default: input name with the other extension)
    #[arg(short = 'o', value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Inject strings from a CSV table into its Sketch file (must come
    /// before FILE)
    #[arg(short = 'i', long = "invert")]
    pub invert: bool,

    /// Prefix marking localizable layer names
    #[arg(long, value_name = "PREFIX", default_value = DEFAULT_PREFIX)]
    pub prefix: String,

    /// Quiet mode (-qq => errors only)
    #[arg(short = 'q', action = ArgAction::Count, conflicts_with = "verbose")]
    pub quiet: u8,

    /// Verbose output (-vv => trace)
    #[arg(short = 'v', action = ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    /// Parse arguments like [`Parser::try_parse_from`], and also require
    /// -i/--invert to precede the input file.
    pub fn try_parse_ordered_from<I, T>(args: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        let mut command = Cli::command();
        let matches = command.try_get_matches_from_mut(args)?;

        if matches.value_source("invert") == Some(ValueSource::CommandLine) {
            if let (Some(flag), Some(file)) = (matches.index_of("invert"), matches.index_of("file")) {
                if flag > file {
                    return Err(command.error(
                        ErrorKind::ArgumentConflict,
                        "-i/--invert must come before the input file",
                    ));
                }
            }
        }

        Cli::from_arg_matches(&matches).map_err(|err| err.format(&mut command))
    }

    pub fn is_quiet(&self) -> bool {
        self.quiet > 0
    }

    /// Log level selected by the -q / -v counts
    pub fn log_level(&self) -> LevelFilter {
        match (self.quiet, self.verbose) {
            (0, 0) => LevelFilter::Info,
            (1, _) => LevelFilter::Warn,
            (q, _) if q > 1 => LevelFilter::Error,
            (_, 1) => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    }
}

/// Write the usage text followed by a blank line.
pub fn write_usage<W: Write>(out: &mut W) -> io::Result<()> {
    Cli::command().write_help(out)?;
    writeln!(out)
}
