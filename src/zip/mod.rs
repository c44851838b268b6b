//! ZIP archive reading and writing.
//!
//! Sketch documents are ZIP containers, so this module covers both halves
//! of the round-trip:
//!
//! - [`structures`]: ZIP format records (EOCD, file headers) with their
//!   byte-level encoders and decoders
//! - [`parser`]: locating and parsing records from a [`ReadAt`](crate::io::ReadAt) source
//! - [`extractor`]: unpacking entries to disk
//! - [`writer`]: building a new archive from files
//!
//! ## Supported Features
//!
//! - Reading standard ZIP and ZIP64 central directories
//! - STORED and DEFLATE entries, with CRC-32 verification on read
//! - Writing standard (non-ZIP64) archives with UTF-8 entry names
//!
//! ## Limitations
//!
//! - No encryption support
//! - No multi-disk archive support
//! - No BZIP2, LZMA, or other compression methods

mod extractor;
mod parser;
mod structures;
mod writer;

pub use extractor::{ZipExtractor, enclosed_name};
pub use parser::ZipParser;
pub use structures::*;
pub use writer::ZipWriter;
