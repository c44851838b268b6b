//! Page documents: the JSON files under `pages/` in a Sketch archive.
//!
//! - [`walker`]: depth-first `(path, scalar)` traversal
//! - [`path`]: re-resolvable locations inside a document
//! - [`scan`]: finding marker-tagged objects and their displayed text
//! - [`mutator`]: rewriting displayed text from a lookup table

mod mutator;
mod path;
mod scan;
mod walker;

pub use mutator::{PageChanges, PageMutator};
pub use path::{JsonPath, PathComponent};
pub use scan::{
    MarkedName, NAME_KEY, TEXT_CONTAINER_KEY, TEXT_KEY, collect_entries, displayed_text,
    displayed_text_mut, marked_names,
};
pub use walker::{Node, Walk, walk, walk_from};

use serde_json::Value;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use crate::error::{Result, SketchError};

/// Load one page document.
pub fn load(path: &Path) -> Result<Value> {
    let parse_error = |source| SketchError::PageParse {
        path: path.to_path_buf(),
        source,
    };
    let file = File::open(path).map_err(|e| parse_error(serde_json::Error::io(e)))?;
    serde_json::from_reader(BufReader::new(file)).map_err(parse_error)
}

/// Save a page document in compact form, replacing the file.
pub fn save(path: &Path, page: &Value) -> Result<()> {
    let write_error = |source| SketchError::PageWrite {
        path: path.to_path_buf(),
        source,
    };
    let mut out = BufWriter::new(File::create(path).map_err(write_error)?);
    serde_json::to_writer(&mut out, page).map_err(|e| write_error(e.into()))?;
    out.flush().map_err(write_error)
}
