use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use chrono::{DateTime, Datelike, NaiveDate, Timelike, Utc};
use std::io::{Cursor, Write};
use std::time::SystemTime;

use anyhow::{Result, bail};

/// ZIP compression methods
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompressionMethod {
    Stored,
    Deflate,
    Unknown(u16),
}

impl CompressionMethod {
    pub fn from_u16(value: u16) -> Self {
        match value {
            0 => CompressionMethod::Stored,
            8 => CompressionMethod::Deflate,
            _ => CompressionMethod::Unknown(value),
        }
    }

    pub fn as_u16(&self) -> u16 {
        match self {
            CompressionMethod::Stored => 0,
            CompressionMethod::Deflate => 8,
            CompressionMethod::Unknown(v) => *v,
        }
    }
}

/// Version 2.0: DEFLATE, directories
pub const VERSION_NEEDED: u16 = 20;
/// Upper byte 3 = UNIX, so external attributes carry a file mode
pub const VERSION_MADE_BY: u16 = (3 << 8) | VERSION_NEEDED;
/// General purpose flag bit 11: file names are UTF-8
pub const FLAG_UTF8: u16 = 0x0800;
/// Regular file, rw-r--r--
pub const EXTERNAL_ATTRS_FILE: u32 = 0o100644 << 16;
/// Directory, rwxr-xr-x, plus the MS-DOS directory bit
pub const EXTERNAL_ATTRS_DIR: u32 = (0o040755 << 16) | 0x10;

/// End of Central Directory (EOCD) - 22 bytes minimum
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndOfCentralDirectory {
    pub disk_entries: u16,
    pub total_entries: u16,
    pub cd_size: u32,
    pub cd_offset: u32,
    pub comment_len: u16,
}

impl EndOfCentralDirectory {
    pub const SIGNATURE: &'static [u8] = b"PK\x05\x06";
    pub const SIZE: usize = 22;

    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        if data.len() < Self::SIZE || &data[0..4] != Self::SIGNATURE {
            bail!("Invalid End of Central Directory");
        }

        let mut cursor = Cursor::new(&data[4..]);
        let _disk_number = cursor.read_u16::<LittleEndian>()?;
        let _disk_with_cd = cursor.read_u16::<LittleEndian>()?;

        Ok(Self {
            disk_entries: cursor.read_u16::<LittleEndian>()?,
            total_entries: cursor.read_u16::<LittleEndian>()?,
            cd_size: cursor.read_u32::<LittleEndian>()?,
            cd_offset: cursor.read_u32::<LittleEndian>()?,
            comment_len: cursor.read_u16::<LittleEndian>()?,
        })
    }

    pub fn write_to<W: Write>(&self, out: &mut W) -> Result<()> {
        out.write_all(Self::SIGNATURE)?;
        out.write_u16::<LittleEndian>(0)?; // this disk
        out.write_u16::<LittleEndian>(0)?; // disk holding the central directory
        out.write_u16::<LittleEndian>(self.disk_entries)?;
        out.write_u16::<LittleEndian>(self.total_entries)?;
        out.write_u32::<LittleEndian>(self.cd_size)?;
        out.write_u32::<LittleEndian>(self.cd_offset)?;
        out.write_u16::<LittleEndian>(0)?; // no archive comment
        Ok(())
    }

    pub fn is_zip64(&self) -> bool {
        self.disk_entries == 0xFFFF
            || self.total_entries == 0xFFFF
            || self.cd_size == 0xFFFFFFFF
            || self.cd_offset == 0xFFFFFFFF
    }
}

/// ZIP64 End of Central Directory Locator - 20 bytes
pub struct Zip64EOCDLocator {
    pub eocd64_offset: u64,
}

impl Zip64EOCDLocator {
    pub const SIGNATURE: &'static [u8] = b"PK\x06\x07";
    pub const SIZE: usize = 20;

    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        if data.len() < Self::SIZE || &data[0..4] != Self::SIGNATURE {
            bail!("Invalid ZIP64 locator");
        }

        let mut cursor = Cursor::new(&data[4..]);
        let _disk_with_eocd64 = cursor.read_u32::<LittleEndian>()?;

        Ok(Self {
            eocd64_offset: cursor.read_u64::<LittleEndian>()?,
        })
    }
}

/// ZIP64 End of Central Directory - 56 bytes minimum
pub struct Zip64EOCD {
    pub total_entries: u64,
    pub cd_size: u64,
    pub cd_offset: u64,
}

impl Zip64EOCD {
    pub const SIGNATURE: &'static [u8] = b"PK\x06\x06";
    pub const MIN_SIZE: usize = 56;

    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        if data.len() < Self::MIN_SIZE || &data[0..4] != Self::SIGNATURE {
            bail!("Invalid ZIP64 End of Central Directory");
        }

        // Skip record size, versions and disk numbers
        let mut cursor = Cursor::new(&data[24..]);
        let _disk_entries = cursor.read_u64::<LittleEndian>()?;

        Ok(Self {
            total_entries: cursor.read_u64::<LittleEndian>()?,
            cd_size: cursor.read_u64::<LittleEndian>()?,
            cd_offset: cursor.read_u64::<LittleEndian>()?,
        })
    }
}

/// Central Directory File Header (CDFH) - 46 bytes minimum
pub const CDFH_SIGNATURE: &[u8] = b"PK\x01\x02";
pub const CDFH_MIN_SIZE: usize = 46;

/// Local File Header (LFH) - 30 bytes
pub const LFH_SIGNATURE: &[u8] = b"PK\x03\x04";
pub const LFH_SIZE: usize = 30;

/// Parsed ZIP file entry information
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZipFileEntry {
    pub file_name: String,
    pub compression_method: CompressionMethod,
    pub compressed_size: u64,
    pub uncompressed_size: u64,
    pub crc32: u32,
    pub lfh_offset: u64,
    pub last_mod_time: u16,
    pub last_mod_date: u16,
    pub is_directory: bool,
}

impl ZipFileEntry {
    /// Parse modification date to (year, month, day)
    pub fn mod_date(&self) -> (u16, u8, u8) {
        let day = (self.last_mod_date & 0x1F) as u8;
        let month = ((self.last_mod_date >> 5) & 0x0F) as u8;
        let year = ((self.last_mod_date >> 9) & 0x7F) + 1980;
        (year, month, day)
    }

    /// Parse modification time to (hour, minute, second)
    pub fn mod_time(&self) -> (u8, u8, u8) {
        let second = ((self.last_mod_time & 0x1F) * 2) as u8;
        let minute = ((self.last_mod_time >> 5) & 0x3F) as u8;
        let hour = ((self.last_mod_time >> 11) & 0x1F) as u8;
        (hour, minute, second)
    }

    /// Modification timestamp, reading the DOS fields as UTC. `None` when
    /// the fields do not form a valid date.
    pub fn modified(&self) -> Option<SystemTime> {
        let (year, month, day) = self.mod_date();
        let (hour, minute, second) = self.mod_time();
        let naive = NaiveDate::from_ymd_opt(year.into(), month.into(), day.into())?
            .and_hms_opt(hour.into(), minute.into(), second.into())?;
        Some(naive.and_utc().into())
    }

    fn external_attrs(&self) -> u32 {
        if self.is_directory {
            EXTERNAL_ATTRS_DIR
        } else {
            EXTERNAL_ATTRS_FILE
        }
    }

    /// Write the Local File Header that precedes the entry data.
    ///
    /// Sizes and CRC are known up front, so no data descriptor is emitted.
    pub fn write_local_header<W: Write>(&self, out: &mut W) -> Result<()> {
        let (compressed, uncompressed, _) = self.narrow_sizes()?;

        out.write_all(LFH_SIGNATURE)?;
        out.write_u16::<LittleEndian>(VERSION_NEEDED)?;
        out.write_u16::<LittleEndian>(FLAG_UTF8)?;
        out.write_u16::<LittleEndian>(self.compression_method.as_u16())?;
        out.write_u16::<LittleEndian>(self.last_mod_time)?;
        out.write_u16::<LittleEndian>(self.last_mod_date)?;
        out.write_u32::<LittleEndian>(self.crc32)?;
        out.write_u32::<LittleEndian>(compressed)?;
        out.write_u32::<LittleEndian>(uncompressed)?;
        out.write_u16::<LittleEndian>(self.file_name.len() as u16)?;
        out.write_u16::<LittleEndian>(0)?; // extra field length
        out.write_all(self.file_name.as_bytes())?;
        Ok(())
    }

    /// Write this entry's record in the Central Directory.
    pub fn write_central_header<W: Write>(&self, out: &mut W) -> Result<()> {
        let (compressed, uncompressed, lfh_offset) = self.narrow_sizes()?;

        out.write_all(CDFH_SIGNATURE)?;
        out.write_u16::<LittleEndian>(VERSION_MADE_BY)?;
        out.write_u16::<LittleEndian>(VERSION_NEEDED)?;
        out.write_u16::<LittleEndian>(FLAG_UTF8)?;
        out.write_u16::<LittleEndian>(self.compression_method.as_u16())?;
        out.write_u16::<LittleEndian>(self.last_mod_time)?;
        out.write_u16::<LittleEndian>(self.last_mod_date)?;
        out.write_u32::<LittleEndian>(self.crc32)?;
        out.write_u32::<LittleEndian>(compressed)?;
        out.write_u32::<LittleEndian>(uncompressed)?;
        out.write_u16::<LittleEndian>(self.file_name.len() as u16)?;
        out.write_u16::<LittleEndian>(0)?; // extra field length
        out.write_u16::<LittleEndian>(0)?; // file comment length
        out.write_u16::<LittleEndian>(0)?; // disk number start
        out.write_u16::<LittleEndian>(0)?; // internal attributes
        out.write_u32::<LittleEndian>(self.external_attrs())?;
        out.write_u32::<LittleEndian>(lfh_offset)?;
        out.write_all(self.file_name.as_bytes())?;
        Ok(())
    }

    fn narrow_sizes(&self) -> Result<(u32, u32, u32)> {
        if self.file_name.len() > u16::MAX as usize {
            bail!("File name too long for ZIP: {}", self.file_name);
        }
        match (
            u32::try_from(self.compressed_size),
            u32::try_from(self.uncompressed_size),
            u32::try_from(self.lfh_offset),
        ) {
            (Ok(c), Ok(u), Ok(o)) if c != u32::MAX && u != u32::MAX && o != u32::MAX => {
                Ok((c, u, o))
            }
            _ => bail!("Entry {} needs ZIP64, which is not written", self.file_name),
        }
    }
}

/// Convert a timestamp to MS-DOS (time, date) fields, in UTC.
///
/// DOS dates cover 1980 to 2107; anything outside is clamped to
/// 1980-01-01 00:00.
pub fn dos_datetime(timestamp: SystemTime) -> (u16, u16) {
    const DOS_EPOCH: (u16, u16) = (0, (1 << 5) | 1);

    let utc = DateTime::<Utc>::from(timestamp);
    let years = match u16::try_from(utc.year() - 1980) {
        Ok(years) if years <= 127 => years,
        _ => return DOS_EPOCH,
    };

    let time =
        ((utc.hour() as u16) << 11) | ((utc.minute() as u16) << 5) | (utc.second() / 2) as u16;
    let date = (years << 9) | ((utc.month() as u16) << 5) | utc.day() as u16;
    (time, date)
}
