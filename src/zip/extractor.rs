use log::debug;
use std::fs;
use std::io::Write;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use crate::io::ReadAt;
use anyhow::{Context, Result, bail};

use super::parser::ZipParser;
use super::structures::ZipFileEntry;

/// ZIP file extractor
pub struct ZipExtractor<R: ReadAt> {
    parser: ZipParser<R>,
}

impl<R: ReadAt> ZipExtractor<R> {
    pub fn new(reader: Arc<R>) -> Self {
        Self {
            parser: ZipParser::new(reader),
        }
    }

    /// List all entries in the archive
    pub fn list_files(&self) -> Result<Vec<ZipFileEntry>> {
        self.parser.list_files()
    }

    /// Extract entry data to memory
    pub fn extract_to_memory(&self, entry: &ZipFileEntry) -> Result<Vec<u8>> {
        self.parser.read_entry(entry)
    }

    /// Extract a single entry to the given path. The file's modification
    /// time is set from the entry's timestamp.
    pub fn extract_to_file(&self, entry: &ZipFileEntry, output_path: &Path) -> Result<()> {
        if let Some(parent) = output_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let data = self.extract_to_memory(entry)?;
        let mut file = fs::File::create(output_path)
            .with_context(|| format!("Failed to create {}", output_path.display()))?;
        file.write_all(&data)
            .with_context(|| format!("Failed to write {}", output_path.display()))?;

        if let Some(modified) = entry.modified() {
            file.set_modified(modified).with_context(|| {
                format!("Failed to set modification time of {}", output_path.display())
            })?;
        }

        Ok(())
    }

    /// Extract every entry under `dest`, keeping the archive's directory
    /// layout. Returns the paths of the files written.
    pub fn extract_all(&self, dest: &Path) -> Result<Vec<PathBuf>> {
        let entries = self.list_files()?;
        self.extract_entries(&entries, dest)
    }

    /// Extract the given entries (as listed by [`Self::list_files`]) under
    /// `dest`.
    pub fn extract_entries(&self, entries: &[ZipFileEntry], dest: &Path) -> Result<Vec<PathBuf>> {
        let mut written = Vec::new();

        for entry in entries {
            let relative = enclosed_name(&entry.file_name)?;
            let output_path = dest.join(relative);

            if entry.is_directory {
                fs::create_dir_all(&output_path)?;
                continue;
            }

            debug!("  extracting: {}", entry.file_name);
            self.extract_to_file(entry, &output_path)?;
            written.push(output_path);
        }

        Ok(written)
    }
}

/// Map an entry name to a relative path that cannot leave the extraction
/// root.
pub fn enclosed_name(file_name: &str) -> Result<PathBuf> {
    if file_name.contains('\0') {
        bail!("Entry name contains a NUL byte: {:?}", file_name);
    }

    let mut path = PathBuf::new();
    for component in Path::new(file_name).components() {
        match component {
            Component::Normal(part) => path.push(part),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                bail!("Entry escapes the extraction directory: {}", file_name)
            }
        }
    }

    if path.as_os_str().is_empty() {
        bail!("Entry has an empty name");
    }
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::zip::ZipWriter;
    use std::time::{Duration, SystemTime, UNIX_EPOCH};
    use tempfile::TempDir;

    #[test]
    fn extraction_restores_entry_timestamps() {
        // 2024-03-01 12:00:00 UTC
        let stamp = UNIX_EPOCH + Duration::from_secs(1_709_294_400);
        let mut writer = ZipWriter::new(Vec::new());
        writer.add_directory("pages/", stamp).unwrap();
        writer.add_file("pages/A.json", b"{}", stamp).unwrap();
        writer.add_file("meta.json", b"{}", SystemTime::now()).unwrap();
        let archive = writer.finish().unwrap();

        let tmp = TempDir::new().unwrap();
        let extractor = ZipExtractor::new(Arc::new(archive));
        let written = extractor.extract_all(tmp.path()).unwrap();

        assert_eq!(written.len(), 2);
        let page = fs::metadata(tmp.path().join("pages").join("A.json")).unwrap();
        assert_eq!(page.modified().unwrap(), stamp);
        assert!(tmp.path().join("pages").is_dir());
    }

    #[test]
    fn enclosed_name_keeps_nested_layout() {
        assert_eq!(
            enclosed_name("pages/ABC.json").unwrap(),
            Path::new("pages").join("ABC.json")
        );
        assert_eq!(enclosed_name("./meta.json").unwrap(), PathBuf::from("meta.json"));
    }

    #[test]
    fn enclosed_name_rejects_traversal() {
        assert!(enclosed_name("../evil.json").is_err());
        assert!(enclosed_name("pages/../../evil.json").is_err());
        assert!(enclosed_name("/etc/passwd").is_err());
        assert!(enclosed_name("").is_err());
    }
}
