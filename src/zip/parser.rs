//! Low-level ZIP archive parser.
//!
//! Reads ZIP structures from any source implementing [`ReadAt`]:
//! 1. Find the End of Central Directory (EOCD) at the file's end
//! 2. If ZIP64, follow the locator to the ZIP64 EOCD
//! 3. Read the Central Directory to get metadata for all entries
//! 4. For extraction, skip each entry's Local File Header and inflate its data

use byteorder::{LittleEndian, ReadBytesExt};
use flate2::Crc;
use flate2::read::DeflateDecoder;
use std::io::{Cursor, Read};
use std::sync::Arc;

use crate::io::ReadAt;
use anyhow::{Context, Result, bail};

use super::structures::*;

/// Maximum ZIP comment size allowed by the format (65535 bytes).
///
/// This limits the search area when looking for EOCD with a comment.
const MAX_COMMENT_SIZE: u64 = 65535;

/// Low-level ZIP file parser.
///
/// Typically used through [`ZipExtractor`](super::ZipExtractor)
/// rather than directly.
pub struct ZipParser<R: ReadAt> {
    reader: Arc<R>,
    size: u64,
}

impl<R: ReadAt> ZipParser<R> {
    pub fn new(reader: Arc<R>) -> Self {
        let size = reader.size();
        Self { reader, size }
    }

    /// Find and parse the End of Central Directory record.
    ///
    /// Returns the record and its offset in the archive. Archives with a
    /// trailing comment are handled by scanning backwards for the signature.
    pub fn find_eocd(&self) -> Result<(EndOfCentralDirectory, u64)> {
        if self.size < EndOfCentralDirectory::SIZE as u64 {
            bail!("Not a valid ZIP file (only {} bytes)", self.size);
        }

        // Common case: no comment, EOCD is the last 22 bytes
        let offset = self.size - EndOfCentralDirectory::SIZE as u64;
        let mut buf = vec![0u8; EndOfCentralDirectory::SIZE];
        self.reader.read_exact_at(offset, &mut buf)?;
        if &buf[0..4] == EndOfCentralDirectory::SIGNATURE && &buf[20..22] == b"\x00\x00" {
            return Ok((EndOfCentralDirectory::from_bytes(&buf)?, offset));
        }

        let search_size = (MAX_COMMENT_SIZE + EndOfCentralDirectory::SIZE as u64).min(self.size);
        let search_start = self.size - search_size;
        let mut buf = vec![0u8; search_size as usize];
        self.reader.read_exact_at(search_start, &mut buf)?;

        for i in (0..=buf.len() - EndOfCentralDirectory::SIZE).rev() {
            if &buf[i..i + 4] != EndOfCentralDirectory::SIGNATURE {
                continue;
            }
            // A real EOCD's comment runs exactly to the end of the file
            let comment_len = u16::from_le_bytes([buf[i + 20], buf[i + 21]]) as usize;
            if comment_len == buf.len() - i - EndOfCentralDirectory::SIZE {
                let eocd =
                    EndOfCentralDirectory::from_bytes(&buf[i..i + EndOfCentralDirectory::SIZE])?;
                return Ok((eocd, search_start + i as u64));
            }
        }

        bail!("Not a valid ZIP file (no End of Central Directory record)")
    }

    /// Read the ZIP64 End of Central Directory record, located through the
    /// locator that sits immediately before the regular EOCD.
    pub fn read_zip64_eocd(&self, eocd_offset: u64) -> Result<Zip64EOCD> {
        let locator_offset = eocd_offset
            .checked_sub(Zip64EOCDLocator::SIZE as u64)
            .context("ZIP64 locator would start before the archive")?;
        let mut locator_buf = vec![0u8; Zip64EOCDLocator::SIZE];
        self.reader.read_exact_at(locator_offset, &mut locator_buf)?;
        let locator = Zip64EOCDLocator::from_bytes(&locator_buf)?;

        let mut eocd64_buf = vec![0u8; Zip64EOCD::MIN_SIZE];
        self.reader
            .read_exact_at(locator.eocd64_offset, &mut eocd64_buf)?;
        Zip64EOCD::from_bytes(&eocd64_buf)
    }

    /// List every entry recorded in the Central Directory.
    pub fn list_files(&self) -> Result<Vec<ZipFileEntry>> {
        let (eocd, eocd_offset) = self.find_eocd()?;

        let (cd_offset, cd_size, total_entries) = if eocd.is_zip64() {
            let eocd64 = self.read_zip64_eocd(eocd_offset)?;
            (eocd64.cd_offset, eocd64.cd_size, eocd64.total_entries)
        } else {
            (
                eocd.cd_offset as u64,
                eocd.cd_size as u64,
                eocd.total_entries as u64,
            )
        };

        if cd_offset.saturating_add(cd_size) > self.size {
            bail!("Central Directory extends past the end of the archive");
        }

        let mut cd_data = vec![0u8; cd_size as usize];
        self.reader.read_exact_at(cd_offset, &mut cd_data)?;

        let mut entries = Vec::with_capacity(total_entries.min(u16::MAX as u64) as usize);
        let mut cursor = Cursor::new(cd_data.as_slice());
        for index in 0..total_entries {
            let entry = Self::parse_cdfh(&mut cursor)
                .with_context(|| format!("Central Directory entry #{index} is malformed"))?;
            entries.push(entry);
        }

        Ok(entries)
    }

    /// Parse one Central Directory File Header, leaving the cursor on the
    /// next header.
    fn parse_cdfh(cursor: &mut Cursor<&[u8]>) -> Result<ZipFileEntry> {
        let mut sig = [0u8; 4];
        cursor.read_exact(&mut sig)?;
        if sig != CDFH_SIGNATURE {
            bail!("Invalid Central Directory File Header");
        }

        let _version_made_by = cursor.read_u16::<LittleEndian>()?;
        let _version_needed = cursor.read_u16::<LittleEndian>()?;
        let flags = cursor.read_u16::<LittleEndian>()?;
        let compression_method = cursor.read_u16::<LittleEndian>()?;
        let last_mod_time = cursor.read_u16::<LittleEndian>()?;
        let last_mod_date = cursor.read_u16::<LittleEndian>()?;
        let crc32 = cursor.read_u32::<LittleEndian>()?;
        let mut compressed_size = cursor.read_u32::<LittleEndian>()? as u64;
        let mut uncompressed_size = cursor.read_u32::<LittleEndian>()? as u64;
        let file_name_length = cursor.read_u16::<LittleEndian>()?;
        let extra_field_length = cursor.read_u16::<LittleEndian>()?;
        let file_comment_length = cursor.read_u16::<LittleEndian>()?;
        let _disk_number_start = cursor.read_u16::<LittleEndian>()?;
        let _internal_attrs = cursor.read_u16::<LittleEndian>()?;
        let _external_attrs = cursor.read_u32::<LittleEndian>()?;
        let mut lfh_offset = cursor.read_u32::<LittleEndian>()? as u64;

        if flags & 0x0001 != 0 {
            bail!("Encrypted entries are not supported");
        }

        let mut file_name_bytes = vec![0u8; file_name_length as usize];
        cursor.read_exact(&mut file_name_bytes)?;
        let file_name = String::from_utf8_lossy(&file_name_bytes).to_string();
        let is_directory = file_name.ends_with('/');

        // ZIP64 extended information (header ID 0x0001) only carries the
        // fields whose 32-bit slot is saturated
        let extra_field_end = cursor.position() + extra_field_length as u64;
        while cursor.position() + 4 <= extra_field_end {
            let header_id = cursor.read_u16::<LittleEndian>()?;
            let field_size = cursor.read_u16::<LittleEndian>()?;
            let field_end = cursor.position() + field_size as u64;

            if header_id == 0x0001 {
                if uncompressed_size == 0xFFFFFFFF && cursor.position() + 8 <= field_end {
                    uncompressed_size = cursor.read_u64::<LittleEndian>()?;
                }
                if compressed_size == 0xFFFFFFFF && cursor.position() + 8 <= field_end {
                    compressed_size = cursor.read_u64::<LittleEndian>()?;
                }
                if lfh_offset == 0xFFFFFFFF && cursor.position() + 8 <= field_end {
                    lfh_offset = cursor.read_u64::<LittleEndian>()?;
                }
            }
            cursor.set_position(field_end);
        }
        cursor.set_position(extra_field_end + file_comment_length as u64);

        Ok(ZipFileEntry {
            file_name,
            compression_method: CompressionMethod::from_u16(compression_method),
            compressed_size,
            uncompressed_size,
            crc32,
            lfh_offset,
            last_mod_time,
            last_mod_date,
            is_directory,
        })
    }

    /// Offset of the entry's data, past its Local File Header.
    ///
    /// The local header's name and extra field lengths may differ from the
    /// Central Directory's, so they are read from the local header itself.
    pub fn get_data_offset(&self, entry: &ZipFileEntry) -> Result<u64> {
        let mut lfh_buf = vec![0u8; LFH_SIZE];
        self.reader.read_exact_at(entry.lfh_offset, &mut lfh_buf)?;
        if &lfh_buf[0..4] != LFH_SIGNATURE {
            bail!("Invalid Local File Header for {}", entry.file_name);
        }

        let mut cursor = Cursor::new(&lfh_buf);
        cursor.set_position(26);
        let file_name_length = cursor.read_u16::<LittleEndian>()? as u64;
        let extra_field_length = cursor.read_u16::<LittleEndian>()? as u64;

        Ok(entry.lfh_offset + LFH_SIZE as u64 + file_name_length + extra_field_length)
    }

    /// Read and decompress an entry, verifying its size and CRC-32.
    pub fn read_entry(&self, entry: &ZipFileEntry) -> Result<Vec<u8>> {
        let data_offset = self.get_data_offset(entry)?;
        if data_offset.saturating_add(entry.compressed_size) > self.size {
            bail!("Data for {} extends past the end of the archive", entry.file_name);
        }

        let mut raw = vec![0u8; entry.compressed_size as usize];
        self.reader.read_exact_at(data_offset, &mut raw)?;

        let data = match entry.compression_method {
            CompressionMethod::Stored => raw,
            CompressionMethod::Deflate => {
                // Header sizes are untrusted; read one byte past the declared
                // size so an overlong stream shows up as a size mismatch
                let capacity = entry
                    .uncompressed_size
                    .min(entry.compressed_size.saturating_mul(4));
                let mut out = Vec::with_capacity(capacity as usize);
                DeflateDecoder::new(raw.as_slice())
                    .take(entry.uncompressed_size.saturating_add(1))
                    .read_to_end(&mut out)
                    .with_context(|| format!("Failed to inflate {}", entry.file_name))?;
                out
            }
            CompressionMethod::Unknown(method) => {
                bail!(
                    "Unsupported compression method {} for {}",
                    method,
                    entry.file_name
                )
            }
        };

        if data.len() as u64 != entry.uncompressed_size {
            bail!(
                "Size mismatch for {}: expected {} bytes, got {}",
                entry.file_name,
                entry.uncompressed_size,
                data.len()
            );
        }

        let mut crc = Crc::new();
        crc.update(&data);
        if crc.sum() != entry.crc32 {
            bail!(
                "CRC mismatch for {}: expected {:08x}, got {:08x}",
                entry.file_name,
                entry.crc32,
                crc.sum()
            );
        }

        Ok(data)
    }
}
