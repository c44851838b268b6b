/*!
 * Error types for sketchstrings.
 *
 * Every failure a run can end with is a variant of [`SketchError`], and each
 * variant maps to the process exit code documented for the CLI.
 */

use std::path::PathBuf;
use thiserror::Error;

/// Exit code for a successful run or a help request
pub const EXIT_OK: u8 = 0;
/// Exit code when a referenced file does not exist
pub const EXIT_FILE_NOT_FOUND: u8 = 1;
/// Exit code for argument errors and every other failure
pub const EXIT_FAILURE: u8 = 2;

/// Errors that terminate an extraction or injection run
#[derive(Error, Debug)]
pub enum SketchError {
    /// Input file does not carry the extension its mode requires
    #[error("'{}' is not a {expected} file. Please enter a file name with the '{expected}' extension", .path.display())]
    InvalidInputExtension { path: PathBuf, expected: &'static str },

    /// Input or destination path is missing
    #[error("File '{}' doesn't exist", .0.display())]
    FileNotFound(PathBuf),

    /// The archive could not be opened or extracted
    #[error("There is a problem with unpacking sketch file '{}'", .path.display())]
    ArchiveUnpack {
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },

    /// The scratch directory could not be packed into the destination
    #[error("There is a problem with repacking sketch file '{}'", .path.display())]
    ArchiveRepack {
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },

    /// The CSV table could not be read
    #[error("Failed to read table '{}'", .path.display())]
    TableParse {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    /// The CSV table could not be written
    #[error("Failed to write table '{}'", .path.display())]
    TableWrite {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    /// A page document is not valid JSON
    #[error("Failed to parse page '{}'", .path.display())]
    PageParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// A mutated page could not be saved back to the scratch directory
    #[error("Failed to save page '{}'", .path.display())]
    PageWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Malformed or missing flags and paths
    #[error("{0}")]
    Argument(String),
}

impl SketchError {
    /// Process exit code for this error
    pub fn exit_code(&self) -> u8 {
        match self {
            SketchError::FileNotFound(_) => EXIT_FILE_NOT_FOUND,
            _ => EXIT_FAILURE,
        }
    }
}

pub type Result<T, E = SketchError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn missing_file_exits_with_one() {
        let err = SketchError::FileNotFound(PathBuf::from("design.sketch"));
        assert_eq!(err.exit_code(), EXIT_FILE_NOT_FOUND);
        assert_eq!(err.to_string(), "File 'design.sketch' doesn't exist");
    }

    #[test]
    fn other_failures_exit_with_two() {
        let err = SketchError::InvalidInputExtension {
            path: PathBuf::from("design.png"),
            expected: ".sketch",
        };
        assert_eq!(err.exit_code(), EXIT_FAILURE);
        assert_eq!(SketchError::Argument("x".into()).exit_code(), EXIT_FAILURE);
    }

    #[test]
    fn unpack_failure_keeps_its_cause() {
        let err = SketchError::ArchiveUnpack {
            path: PathBuf::from("broken.sketch"),
            source: anyhow::anyhow!("Not a valid ZIP file"),
        };
        let cause = err.source().map(|s| s.to_string());
        assert_eq!(cause.as_deref(), Some("Not a valid ZIP file"));
    }
}
