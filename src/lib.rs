//! # sketchstrings
//!
//! Extract localizable strings from Sketch design files into a CSV table,
//! and inject translated tables back.
//!
//! A Sketch file is a ZIP archive whose `pages/` directory holds one JSON
//! document per page. Any layer whose `name` starts with the marker prefix
//! (`%%` by default) is localizable; its displayed text lives in
//! `attributedString.string`.
//!
//! ## Features
//!
//! - Extraction: every marked layer becomes a `label,string` CSV row; the
//!   first occurrence of a label wins
//! - Injection: every marked layer whose label appears in the table gets the
//!   table's text; the last row for a label wins
//! - ZIP round-trip with STORED and DEFLATE entries and CRC-32 verification
//! - Cycle-safe depth-first walker over JSON structures
//!
//! ## Example
//!
//! ```no_run
//! use sketchstrings::{Mode, RunConfig, pipeline};
//!
//! fn main() -> Result<(), sketchstrings::SketchError> {
//!     let config = RunConfig::new(Mode::Extract, "design.sketch".into(), None, "%%")?;
//!     let report = pipeline::extract(&config)?;
//!     println!("{} strings written to {}", report.entries, config.output.display());
//!     Ok(())
//! }
//! ```

pub mod archive;
pub mod cli;
pub mod config;
pub mod error;
pub mod io;
pub mod page;
pub mod pipeline;
pub mod table;
pub mod zip;

pub use cli::Cli;
pub use config::{Mode, RunConfig};
pub use error::SketchError;
pub use io::{LocalFileReader, ReadAt};
pub use table::{LookupTable, MarkerEntry};
pub use zip::{ZipExtractor, ZipFileEntry, ZipWriter};
