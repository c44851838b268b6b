//! Sketch archive round-trip: unpack into a scratch directory, repack from
//! it.

use anyhow::Context;
use log::{debug, info};
use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::UNIX_EPOCH;
use tempfile::{NamedTempFile, TempDir};
use walkdir::WalkDir;

use crate::error::{Result, SketchError};
use crate::io::LocalFileReader;
use crate::zip::{ZipExtractor, ZipFileEntry, ZipWriter, enclosed_name};

/// Directory inside the archive holding the page documents
pub const PAGES_DIR: &str = "pages";
/// Extension of page documents
pub const PAGE_EXTENSION: &str = "json";

/// Unpacked archive tree, deleted when dropped. Remembers the entry
/// listing it was unpacked from, so a repack keeps the original order,
/// directory entries and timestamps.
#[derive(Debug)]
pub struct ScratchDir {
    dir: TempDir,
    entries: Vec<ZipFileEntry>,
}

impl ScratchDir {
    /// Create an empty scratch directory
    pub fn new() -> std::io::Result<Self> {
        let dir = tempfile::Builder::new().prefix("sketchstrings-").tempdir()?;
        Ok(Self {
            dir,
            entries: Vec::new(),
        })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Entries of the archive this tree was unpacked from, in archive order
    pub fn entries(&self) -> &[ZipFileEntry] {
        &self.entries
    }

    /// Page documents (`pages/*.json`), sorted by file name. An archive
    /// without a pages directory has no pages.
    pub fn pages(&self) -> std::io::Result<Vec<PathBuf>> {
        let pages_dir = self.path().join(PAGES_DIR);
        if !pages_dir.is_dir() {
            return Ok(Vec::new());
        }

        let mut pages = Vec::new();
        for entry in fs::read_dir(&pages_dir)? {
            let path = entry?.path();
            let is_page = path.is_file()
                && path
                    .extension()
                    .is_some_and(|ext| ext.eq_ignore_ascii_case(PAGE_EXTENSION));
            if is_page {
                pages.push(path);
            }
        }
        pages.sort();
        Ok(pages)
    }

    /// Every file under the scratch root with its `/`-separated archive
    /// name, sorted by name.
    pub fn files(&self) -> anyhow::Result<Vec<(String, PathBuf)>> {
        let mut files = Vec::new();
        for entry in WalkDir::new(self.path()).sort_by_file_name() {
            let entry = entry.context("Failed to read scratch directory")?;
            if !entry.file_type().is_file() {
                continue;
            }
            let relative = entry.path().strip_prefix(self.path())?;
            files.push((archive_name(relative), entry.into_path()));
        }
        files.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(files)
    }
}

/// Extract `archive` into a fresh scratch directory.
pub fn unpack(archive: &Path) -> Result<ScratchDir> {
    if !archive.is_file() {
        return Err(SketchError::FileNotFound(archive.to_path_buf()));
    }

    let unpack_error = |source| SketchError::ArchiveUnpack {
        path: archive.to_path_buf(),
        source,
    };

    let mut scratch = ScratchDir::new()
        .context("Failed to create scratch directory")
        .map_err(unpack_error)?;
    info!("Unpacking {}...", archive.display());
    debug!("Scratch directory: {}", scratch.path().display());

    let reader = LocalFileReader::new(archive).map_err(unpack_error)?;
    let extractor = ZipExtractor::new(Arc::new(reader));
    let entries = extractor.list_files().map_err(unpack_error)?;
    let written = extractor
        .extract_entries(&entries, scratch.path())
        .map_err(unpack_error)?;

    debug!("Unpacked {} files", written.len());
    scratch.entries = entries;
    Ok(scratch)
}

/// Rewrite the existing archive at `dest` with the contents of `scratch`.
///
/// The new archive is written beside `dest` and renamed over it, so a
/// failure leaves `dest` as it was.
pub fn repack(scratch: &ScratchDir, dest: &Path) -> Result<()> {
    if !dest.is_file() {
        return Err(SketchError::FileNotFound(dest.to_path_buf()));
    }

    info!("Repacking {}...", dest.display());
    write_archive(scratch, dest).map_err(|source| SketchError::ArchiveRepack {
        path: dest.to_path_buf(),
        source,
    })
}

fn write_archive(scratch: &ScratchDir, dest: &Path) -> anyhow::Result<()> {
    let dir = match dest.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let staging = NamedTempFile::new_in(dir)
        .with_context(|| format!("Failed to create temporary file in {}", dir.display()))?;

    let files: BTreeMap<String, PathBuf> = scratch.files()?.into_iter().collect();
    let mut added = HashSet::new();
    let mut writer = ZipWriter::new(BufWriter::new(staging.reopen()?));

    // Original entries first, in their original order
    for entry in scratch.entries() {
        let name = archive_name(&enclosed_name(&entry.file_name)?);
        if entry.is_directory {
            let dir_name = format!("{}/", name);
            if added.insert(dir_name.clone()) {
                let modified = entry.modified().unwrap_or(UNIX_EPOCH);
                writer.add_directory(&dir_name, modified)?;
            }
        } else if let Some(path) = files.get(&name) {
            if added.insert(name.clone()) {
                add_file(&mut writer, &name, path)?;
            }
        }
    }
    // Then anything created in the tree since unpacking
    for (name, path) in &files {
        if added.insert(name.clone()) {
            add_file(&mut writer, name, path)?;
        }
    }

    let entries = writer.entries().len();
    writer
        .finish()?
        .into_inner()
        .map_err(|e| e.into_error())?
        .sync_all()?;

    fs::set_permissions(staging.path(), fs::metadata(dest)?.permissions())?;
    staging
        .persist(dest)
        .with_context(|| format!("Failed to replace {}", dest.display()))?;
    debug!("Wrote {} entries", entries);
    Ok(())
}

/// Add one scratch file, stamped with its modification time.
fn add_file<W: Write>(writer: &mut ZipWriter<W>, name: &str, path: &Path) -> anyhow::Result<()> {
    let data = fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let modified = fs::metadata(path)?.modified()?;
    debug!("  adding: {} ({} bytes)", name, data.len());
    writer.add_file(name, &data, modified)
}

/// `/`-separated archive name of a relative path
fn archive_name(relative: &Path) -> String {
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
