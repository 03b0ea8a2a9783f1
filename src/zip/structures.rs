use byteorder::{LittleEndian, ReadBytesExt};
use std::fmt;
use std::io::Cursor;
use std::sync::Arc;

use crate::error::{Error, Result};

/// ZIP compression methods
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompressionMethod {
    Stored,
    Deflate,
    Unknown(u16),
}

impl CompressionMethod {
    /// WinZip AES entries carry this marker instead of the real method.
    pub const AES_MARKER: u16 = 99;

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

impl fmt::Display for CompressionMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompressionMethod::Stored => f.write_str("stored"),
            CompressionMethod::Deflate => f.write_str("deflate"),
            CompressionMethod::Unknown(v) => write!(f, "method {v}"),
        }
    }
}

/// General purpose bit flags that matter for protected entries.
pub mod flags {
    pub const ENCRYPTED: u16 = 1 << 0;
    pub const DATA_DESCRIPTOR: u16 = 1 << 3;
    pub const STRONG_ENCRYPTION: u16 = 1 << 6;
    pub const CENTRAL_DIRECTORY_ENCRYPTED: u16 = 1 << 13;
}

/// How an entry's payload is protected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncryptionScheme {
    None,
    /// Traditional PKWARE stream cipher with a 12-byte header.
    ZipCrypto,
    /// WinZip AE-1/AE-2.
    Aes,
    /// PKWARE strong encryption (SES), including encrypted central directories.
    Strong,
}

impl EncryptionScheme {
    pub fn classify(flags: u16, method: u16) -> Self {
        if flags & flags::ENCRYPTED == 0 {
            EncryptionScheme::None
        } else if method == CompressionMethod::AES_MARKER {
            EncryptionScheme::Aes
        } else if flags & (flags::STRONG_ENCRYPTION | flags::CENTRAL_DIRECTORY_ENCRYPTED) != 0 {
            EncryptionScheme::Strong
        } else {
            EncryptionScheme::ZipCrypto
        }
    }

    pub fn is_encrypted(&self) -> bool {
        *self != EncryptionScheme::None
    }
}

impl fmt::Display for EncryptionScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            EncryptionScheme::None => "no encryption",
            EncryptionScheme::ZipCrypto => "ZipCrypto",
            EncryptionScheme::Aes => "WinZip AES encryption",
            EncryptionScheme::Strong => "PKWARE strong encryption",
        })
    }
}

/// End of Central Directory (EOCD) - 22 bytes minimum
pub struct EndOfCentralDirectory {
    pub disk_number: u16,
    pub disk_with_cd: u16,
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
            return Err(Error::corrupt("invalid end of central directory record"));
        }

        let mut cursor = Cursor::new(&data[4..]);

        Ok(Self {
            disk_number: cursor.read_u16::<LittleEndian>().map_err(truncated)?,
            disk_with_cd: cursor.read_u16::<LittleEndian>().map_err(truncated)?,
            disk_entries: cursor.read_u16::<LittleEndian>().map_err(truncated)?,
            total_entries: cursor.read_u16::<LittleEndian>().map_err(truncated)?,
            cd_size: cursor.read_u32::<LittleEndian>().map_err(truncated)?,
            cd_offset: cursor.read_u32::<LittleEndian>().map_err(truncated)?,
            comment_len: cursor.read_u16::<LittleEndian>().map_err(truncated)?,
        })
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
    pub disk_with_eocd64: u32,
    pub eocd64_offset: u64,
    pub total_disks: u32,
}

impl Zip64EOCDLocator {
    pub const SIGNATURE: &'static [u8] = b"PK\x06\x07";
    pub const SIZE: usize = 20;

    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        if data.len() < Self::SIZE || &data[0..4] != Self::SIGNATURE {
            return Err(Error::corrupt("invalid ZIP64 end of central directory locator"));
        }

        let mut cursor = Cursor::new(&data[4..]);

        Ok(Self {
            disk_with_eocd64: cursor.read_u32::<LittleEndian>().map_err(truncated)?,
            eocd64_offset: cursor.read_u64::<LittleEndian>().map_err(truncated)?,
            total_disks: cursor.read_u32::<LittleEndian>().map_err(truncated)?,
        })
    }
}

/// ZIP64 End of Central Directory - 56 bytes minimum
pub struct Zip64EOCD {
    pub eocd64_size: u64,
    pub version_made_by: u16,
    pub version_needed: u16,
    pub disk_number: u32,
    pub disk_with_cd: u32,
    pub disk_entries: u64,
    pub total_entries: u64,
    pub cd_size: u64,
    pub cd_offset: u64,
}

impl Zip64EOCD {
    pub const SIGNATURE: &'static [u8] = b"PK\x06\x06";
    pub const MIN_SIZE: usize = 56;

    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        if data.len() < Self::MIN_SIZE || &data[0..4] != Self::SIGNATURE {
            return Err(Error::corrupt("invalid ZIP64 end of central directory record"));
        }

        let mut cursor = Cursor::new(&data[4..]);

        Ok(Self {
            eocd64_size: cursor.read_u64::<LittleEndian>().map_err(truncated)?,
            version_made_by: cursor.read_u16::<LittleEndian>().map_err(truncated)?,
            version_needed: cursor.read_u16::<LittleEndian>().map_err(truncated)?,
            disk_number: cursor.read_u32::<LittleEndian>().map_err(truncated)?,
            disk_with_cd: cursor.read_u32::<LittleEndian>().map_err(truncated)?,
            disk_entries: cursor.read_u64::<LittleEndian>().map_err(truncated)?,
            total_entries: cursor.read_u64::<LittleEndian>().map_err(truncated)?,
            cd_size: cursor.read_u64::<LittleEndian>().map_err(truncated)?,
            cd_offset: cursor.read_u64::<LittleEndian>().map_err(truncated)?,
        })
    }
}

/// Central Directory File Header (CDFH) - 46 bytes minimum
pub const CDFH_SIGNATURE: &[u8] = b"PK\x01\x02";
pub const CDFH_MIN_SIZE: usize = 46;

/// Local File Header (LFH) - 30 bytes
pub const LFH_SIGNATURE: &[u8] = b"PK\x03\x04";
pub const LFH_SIZE: usize = 30;

/// Length of the ZipCrypto header prepended to every encrypted payload.
pub const ENCRYPTION_HEADER_LEN: usize = 12;

/// Map a cursor running off the end of a record into a parse failure.
pub(crate) fn truncated(e: std::io::Error) -> Error {
    Error::corrupt(format!("truncated record: {e}"))
}

/// Parsed ZIP file entry information
#[derive(Debug, Clone)]
pub struct ZipFileEntry {
    pub file_name: String,
    pub flags: u16,
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
    pub fn encryption(&self) -> EncryptionScheme {
        EncryptionScheme::classify(self.flags, self.compression_method.as_u16())
    }

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
}

/// Where the last decrypted header byte is taken from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CheckByte {
    /// Modification time when the entry streams a data descriptor, CRC otherwise.
    #[default]
    Auto,
    /// High byte of the stored CRC-32.
    Crc,
    /// High byte of the DOS modification time.
    ModTime,
}

/// A ZipCrypto-protected entry, loaded and ready for password verification.
///
/// Immutable once built; workers share it through an [`Arc`].
#[derive(Debug, Clone)]
pub struct ArchiveEntry {
    pub name: String,
    pub flags: u16,
    pub compression_method: CompressionMethod,
    pub compressed_size: u64,
    pub uncompressed_size: u64,
    pub crc32: u32,
    pub last_mod_time: u16,
    /// Encrypted payload: the 12-byte header followed by the compressed data.
    pub payload: Arc<[u8]>,
    /// Expected value of the last decrypted header byte.
    pub check_byte: u8,
}

impl ArchiveEntry {
    pub fn new(entry: &ZipFileEntry, payload: Vec<u8>, mode: CheckByte) -> Result<Self> {
        if payload.len() < ENCRYPTION_HEADER_LEN {
            return Err(Error::corrupt(format!(
                "encrypted entry `{}` is shorter than its {ENCRYPTION_HEADER_LEN}-byte header",
                entry.file_name
            )));
        }

        let check_byte = resolve_check_byte(entry.flags, entry.crc32, entry.last_mod_time, mode);

        Ok(Self {
            name: entry.file_name.clone(),
            flags: entry.flags,
            compression_method: entry.compression_method,
            compressed_size: payload.len() as u64,
            uncompressed_size: entry.uncompressed_size,
            crc32: entry.crc32,
            last_mod_time: entry.last_mod_time,
            payload: payload.into(),
            check_byte,
        })
    }

    pub fn header(&self) -> &[u8] {
        &self.payload[..ENCRYPTION_HEADER_LEN]
    }

    /// The encrypted compressed stream that follows the header.
    pub fn body(&self) -> &[u8] {
        &self.payload[ENCRYPTION_HEADER_LEN..]
    }
}

fn resolve_check_byte(flags: u16, crc32: u32, last_mod_time: u16, mode: CheckByte) -> u8 {
    let from_time = match mode {
        CheckByte::Auto => flags & flags::DATA_DESCRIPTOR != 0,
        CheckByte::Crc => false,
        CheckByte::ModTime => true,
    };
    if from_time {
        (last_mod_time >> 8) as u8
    } else {
        (crc32 >> 24) as u8
    }
}
