//! Immutable run configuration resolved from the command line.

use std::path::{Path, PathBuf};

use crate::cli::Cli;
use crate::error::{Result, SketchError};

/// Marker prefix used when none is given
pub const DEFAULT_PREFIX: &str = "%%";

pub const SKETCH_EXTENSION: &str = "sketch";
pub const TABLE_EXTENSION: &str = "csv";

/// Direction of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Sketch archive to CSV table
    Extract,
    /// CSV table into an existing Sketch archive
    Inject,
}

/// Everything a pipeline needs, fixed before the run starts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    pub mode: Mode,
    /// Sketch file when extracting, CSV table when injecting
    pub input: PathBuf,
    /// CSV table when extracting, Sketch file (rewritten in place) when injecting
    pub output: PathBuf,
    pub prefix: String,
}

impl RunConfig {
    /// Validate the input extension and prefix, and derive the output path
    /// from the input when none is given.
    pub fn new(
        mode: Mode,
        input: PathBuf,
        output: Option<PathBuf>,
        prefix: impl Into<String>,
    ) -> Result<Self> {
        let prefix = prefix.into();
        if prefix.is_empty() {
            return Err(SketchError::Argument(
                "The marker prefix must not be empty".to_string(),
            ));
        }

        let (input_ext, output_ext) = match mode {
            Mode::Extract => (SKETCH_EXTENSION, TABLE_EXTENSION),
            Mode::Inject => (TABLE_EXTENSION, SKETCH_EXTENSION),
        };
        require_extension(&input, input_ext)?;

        let output = match output {
            Some(output) => {
                // Injection rewrites the archive, so it has to look like one
                if mode == Mode::Inject {
                    require_extension(&output, SKETCH_EXTENSION)?;
                }
                output
            }
            None => input.with_extension(output_ext),
        };

        if output == input {
            return Err(SketchError::Argument(format!(
                "Output file '{}' would overwrite the input",
                output.display()
            )));
        }

        Ok(Self {
            mode,
            input,
            output,
            prefix,
        })
    }

    pub fn from_cli(cli: &Cli) -> Result<Self> {
        let mode = if cli.invert { Mode::Inject } else { Mode::Extract };
        Self::new(mode, cli.file.clone(), cli.output.clone(), cli.prefix.as_str())
    }
}

fn require_extension(path: &Path, extension: &'static str) -> Result<()> {
    if path.extension().and_then(|ext| ext.to_str()) == Some(extension) {
        Ok(())
    } else {
        Err(SketchError::InvalidInputExtension {
            path: path.to_path_buf(),
            expected: match extension {
                SKETCH_EXTENSION => ".sketch",
                _ => ".csv",
            },
        })
    }
}
