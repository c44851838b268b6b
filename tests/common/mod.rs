/*!
 * Common test utilities for the sketchstrings test suite
 */

#![allow(dead_code)]

use anyhow::Result;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;
use tempfile::TempDir;

use sketchstrings::zip::{ZipFileEntry, ZipParser, ZipWriter};

/// Page entry of the greeting fixture
pub const GREETING_PAGE: &str = "pages/7F2C5A8E-1B3D-4E6F-9A0B-C1D2E3F4A5B6.json";

/// Path of a checked-in fixture
pub fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

/// Creates a temporary directory for test files
pub fn create_temp_dir() -> Result<TempDir> {
    Ok(TempDir::new()?)
}

/// Copy a fixture into `dir` under `name`
pub fn copy_fixture(dir: &Path, fixture_name: &str, name: &str) -> Result<PathBuf> {
    let path = dir.join(name);
    fs::copy(fixture(fixture_name), &path)?;
    Ok(path)
}

/// Build a Sketch archive from (entry name, JSON) pairs
pub fn create_sketch(dir: &Path, name: &str, entries: &[(&str, Value)]) -> Result<PathBuf> {
    let path = dir.join(name);
    let mut writer = ZipWriter::new(fs::File::create(&path)?);
    for (entry_name, json) in entries {
        writer.add_file(entry_name, &serde_json::to_vec(json)?, SystemTime::now())?;
    }
    writer.finish()?;
    Ok(path)
}

/// Decompressed contents of every entry, by name, in archive order
pub fn read_entries(archive: &Path) -> Result<Vec<(String, Vec<u8>)>> {
    let parser = ZipParser::new(Arc::new(fs::read(archive)?));
    let mut out = Vec::new();
    for entry in parser.list_files()? {
        if entry.is_directory {
            continue;
        }
        let data = parser.read_entry(&entry)?;
        out.push((entry.file_name, data));
    }
    Ok(out)
}

/// Central directory listing, directories included, in archive order
pub fn read_listing(archive: &Path) -> Result<Vec<ZipFileEntry>> {
    ZipParser::new(Arc::new(fs::read(archive)?)).list_files()
}

/// Raw bytes of one entry
pub fn read_entry(archive: &Path, name: &str) -> Result<Vec<u8>> {
    read_entries(archive)?
        .into_iter()
        .find(|(entry_name, _)| entry_name == name)
        .map(|(_, data)| data)
        .ok_or_else(|| anyhow::anyhow!("{} not found in {}", name, archive.display()))
}

/// One entry parsed as JSON
pub fn read_json(archive: &Path, name: &str) -> Result<Value> {
    Ok(serde_json::from_slice(&read_entry(archive, name)?)?)
}

/// Write a CSV table
pub fn create_table(dir: &Path, name: &str, content: &str) -> Result<PathBuf> {
    let path = dir.join(name);
    fs::write(&path, content)?;
    Ok(path)
}
