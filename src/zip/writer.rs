//! ZIP archive writer.
//!
//! Produces the layout the parser reads back: a Local File Header and
//! data per entry, then the Central Directory and the EOCD record. Entry
//! data is compressed in memory first, so every header is written with its
//! final sizes and CRC and no data descriptors are needed.

use flate2::Compression;
use flate2::Crc;
use flate2::write::DeflateEncoder;
use std::io::Write;
use std::time::SystemTime;

use anyhow::{Result, bail};

use super::structures::*;

/// Sequential ZIP writer over any [`Write`] sink
pub struct ZipWriter<W: Write> {
    out: W,
    offset: u64,
    entries: Vec<ZipFileEntry>,
    level: Compression,
}

impl<W: Write> ZipWriter<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            offset: 0,
            entries: Vec::new(),
            level: Compression::default(),
        }
    }

    /// Entries written so far, in archive order
    pub fn entries(&self) -> &[ZipFileEntry] {
        &self.entries
    }

    /// Append a file entry. Data that does not shrink under DEFLATE is
    /// stored as is.
    pub fn add_file(&mut self, name: &str, data: &[u8], modified: SystemTime) -> Result<()> {
        if name.ends_with('/') {
            bail!("File entry name ends with '/': {}", name);
        }
        self.check_name(name)?;

        let mut crc = Crc::new();
        crc.update(data);

        let mut encoder = DeflateEncoder::new(Vec::with_capacity(data.len() / 2), self.level);
        encoder.write_all(data)?;
        let deflated = encoder.finish()?;

        let (compression_method, payload) = if deflated.len() < data.len() {
            (CompressionMethod::Deflate, deflated.as_slice())
        } else {
            (CompressionMethod::Stored, data)
        };

        let (last_mod_time, last_mod_date) = dos_datetime(modified);
        let entry = ZipFileEntry {
            file_name: name.to_string(),
            compression_method,
            compressed_size: payload.len() as u64,
            uncompressed_size: data.len() as u64,
            crc32: crc.sum(),
            lfh_offset: self.offset,
            last_mod_time,
            last_mod_date,
            is_directory: false,
        };
        self.push(entry, payload)
    }

    /// Append a directory entry. `name` must end with `/`.
    pub fn add_directory(&mut self, name: &str, modified: SystemTime) -> Result<()> {
        if !name.ends_with('/') {
            bail!("Directory entry name must end with '/': {}", name);
        }
        self.check_name(name)?;

        let (last_mod_time, last_mod_date) = dos_datetime(modified);
        let entry = ZipFileEntry {
            file_name: name.to_string(),
            compression_method: CompressionMethod::Stored,
            compressed_size: 0,
            uncompressed_size: 0,
            crc32: 0,
            lfh_offset: self.offset,
            last_mod_time,
            last_mod_date,
            is_directory: true,
        };
        self.push(entry, &[])
    }

    fn check_name(&self, name: &str) -> Result<()> {
        if name.is_empty() || name.starts_with('/') || name.contains('\\') {
            bail!("Invalid ZIP entry name: {:?}", name);
        }
        if self.entries.iter().any(|e| e.file_name == name) {
            bail!("Duplicate ZIP entry: {}", name);
        }
        Ok(())
    }

    fn push(&mut self, entry: ZipFileEntry, payload: &[u8]) -> Result<()> {
        let mut header = Vec::with_capacity(LFH_SIZE + entry.file_name.len());
        entry.write_local_header(&mut header)?;
        self.out.write_all(&header)?;
        self.out.write_all(payload)?;
        self.offset += (header.len() + payload.len()) as u64;

        self.entries.push(entry);
        Ok(())
    }

    /// Write the Central Directory and EOCD, returning the sink.
    pub fn finish(mut self) -> Result<W> {
        let cd_offset = self.offset;
        let mut directory = Vec::with_capacity(self.entries.len() * (CDFH_MIN_SIZE + 32));
        for entry in &self.entries {
            entry.write_central_header(&mut directory)?;
        }

        let (Ok(total_entries), Ok(cd_size), Ok(cd_offset)) = (
            u16::try_from(self.entries.len()),
            u32::try_from(directory.len()),
            u32::try_from(cd_offset),
        ) else {
            bail!("Archive needs ZIP64, which is not written");
        };
        if total_entries == u16::MAX || cd_size == u32::MAX || cd_offset == u32::MAX {
            bail!("Archive needs ZIP64, which is not written");
        }

        self.out.write_all(&directory)?;
        EndOfCentralDirectory {
            disk_entries: total_entries,
            total_entries,
            cd_size,
            cd_offset,
            comment_len: 0,
        }
        .write_to(&mut self.out)?;
        self.out.flush()?;

        Ok(self.out)
    }
}
