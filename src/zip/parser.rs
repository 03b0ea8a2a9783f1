//! Low-level ZIP archive parser.
//!
//! This module handles the binary parsing of ZIP file structures,
//! reading from any source that implements the [`ReadAt`] trait.
//!
//! ## Parsing Strategy
//!
//! ZIP files are designed to be read from the end:
//! 1. Find the End of Central Directory (EOCD) at the file's end
//! 2. If ZIP64, read the ZIP64 EOCD for large file support
//! 3. Read the Central Directory to get metadata for all files
//! 4. For a protected entry, read its Local File Header and payload range
//!
//! Every offset and length read from the archive is checked against the
//! source size before it is used, so a damaged archive fails with
//! [`Error::CorruptArchive`] instead of a short read or an oversized buffer.

use byteorder::{LittleEndian, ReadBytesExt};
use std::io::{Cursor, Read};
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::io::ReadAt;

use super::structures::*;

/// Maximum ZIP comment size allowed by the format (65535 bytes).
///
/// This limits the search area when looking for EOCD with a comment.
const MAX_COMMENT_SIZE: u64 = 65535;

/// ZIP64 extended information extra field.
const ZIP64_EXTRA_ID: u16 = 0x0001;

/// Low-level ZIP file parser.
///
/// Generic over the reader type so tests can parse in-memory archives.
/// Typically used through [`ArchiveReader`](super::ArchiveReader).
pub struct ZipParser<R: ReadAt> {
    /// The underlying data source
    reader: Arc<R>,
    /// Total size of the archive in bytes
    size: u64,
}

impl<R: ReadAt> ZipParser<R> {
    pub fn new(reader: Arc<R>) -> Self {
        let size = reader.size();
        Self { reader, size }
    }

    /// Read exactly `len` bytes at `offset`, rejecting ranges past the end of the archive.
    pub async fn read_range(&self, offset: u64, len: u64, what: &str) -> Result<Vec<u8>> {
        let end = offset
            .checked_add(len)
            .ok_or_else(|| Error::corrupt(format!("{what} range overflows")))?;
        if end > self.size {
            return Err(Error::corrupt(format!(
                "{what} at {offset}..{end} extends past end of archive ({} bytes)",
                self.size
            )));
        }

        let mut buf = vec![0u8; len as usize];
        self.reader
            .read_exact_at(offset, &mut buf)
            .await
            .map_err(|e| Error::corrupt(format!("reading {what}: {e}")))?;
        Ok(buf)
    }

    /// Find and parse the End of Central Directory record.
    ///
    /// The EOCD is located at the end of the ZIP file. This method
    /// handles both the simple case (no comment) and archives with
    /// comments by searching backwards for the signature.
    ///
    /// # Returns
    ///
    /// A tuple of (EOCD record, offset of EOCD in file).
    pub async fn find_eocd(&self) -> Result<(EndOfCentralDirectory, u64)> {
        if self.size < EndOfCentralDirectory::SIZE as u64 {
            return Err(Error::corrupt("file too small to be a ZIP archive"));
        }

        // Fast path: no archive comment.
        let offset = self.size - EndOfCentralDirectory::SIZE as u64;
        let buf = self
            .read_range(offset, EndOfCentralDirectory::SIZE as u64, "end of central directory")
            .await?;
        if &buf[0..4] == EndOfCentralDirectory::SIGNATURE && &buf[20..22] == b"\x00\x00" {
            let eocd = EndOfCentralDirectory::from_bytes(&buf)?;
            return Ok((eocd, offset));
        }

        // EOCD not at expected location - search backwards through the comment area.
        let search_size = (MAX_COMMENT_SIZE + EndOfCentralDirectory::SIZE as u64).min(self.size);
        let search_start = self.size - search_size;
        let buf = self
            .read_range(search_start, search_size, "archive tail")
            .await?;

        for i in (0..=buf.len() - EndOfCentralDirectory::SIZE).rev() {
            if &buf[i..i + 4] == EndOfCentralDirectory::SIGNATURE {
                // The comment length must account for exactly the remaining bytes.
                let comment_len = u16::from_le_bytes([buf[i + 20], buf[i + 21]]) as usize;

                if comment_len == buf.len() - i - EndOfCentralDirectory::SIZE {
                    let eocd = EndOfCentralDirectory::from_bytes(
                        &buf[i..i + EndOfCentralDirectory::SIZE],
                    )?;
                    return Ok((eocd, search_start + i as u64));
                }
            }
        }

        Err(Error::corrupt("end of central directory signature not found"))
    }

    /// Read the ZIP64 End of Central Directory record.
    ///
    /// Called when the regular EOCD has saturated fields (0xFFFF or 0xFFFFFFFF).
    pub async fn read_zip64_eocd(&self, eocd_offset: u64) -> Result<Zip64EOCD> {
        // The ZIP64 EOCD Locator is located immediately before the regular EOCD
        let locator_offset = eocd_offset
            .checked_sub(Zip64EOCDLocator::SIZE as u64)
            .ok_or_else(|| Error::corrupt("ZIP64 locator missing"))?;
        let locator_buf = self
            .read_range(locator_offset, Zip64EOCDLocator::SIZE as u64, "ZIP64 locator")
            .await?;
        let locator = Zip64EOCDLocator::from_bytes(&locator_buf)?;

        let eocd64_buf = self
            .read_range(locator.eocd64_offset, Zip64EOCD::MIN_SIZE as u64, "ZIP64 end of central directory")
            .await?;
        Zip64EOCD::from_bytes(&eocd64_buf)
    }

    /// List all entries in the ZIP archive from its Central Directory.
    pub async fn list_files(&self) -> Result<Vec<ZipFileEntry>> {
        let (eocd, eocd_offset) = self.find_eocd().await?;

        // Get Central Directory info, using ZIP64 if needed
        let (cd_offset, cd_size, total_entries) = if eocd.is_zip64() {
            let eocd64 = self.read_zip64_eocd(eocd_offset).await?;
            (eocd64.cd_offset, eocd64.cd_size, eocd64.total_entries)
        } else {
            (
                eocd.cd_offset as u64,
                eocd.cd_size as u64,
                eocd.total_entries as u64,
            )
        };

        // Each header takes at least CDFH_MIN_SIZE bytes; a larger count is a lie.
        if total_entries > cd_size / CDFH_MIN_SIZE as u64 {
            return Err(Error::corrupt(format!(
                "central directory of {cd_size} bytes cannot hold {total_entries} entries"
            )));
        }

        let cd_data = self.read_range(cd_offset, cd_size, "central directory").await?;

        let mut entries = Vec::with_capacity(total_entries as usize);
        let mut cursor = Cursor::new(cd_data.as_slice());

        for _ in 0..total_entries {
            entries.push(parse_cdfh(&mut cursor)?);
        }

        Ok(entries)
    }

    /// Get the actual data offset for a file entry.
    ///
    /// The Local File Header has variable-length fields (filename,
    /// extra field) that may differ from the Central Directory entry,
    /// so the offset can only be computed from the LFH itself.
    pub async fn get_data_offset(&self, entry: &ZipFileEntry) -> Result<u64> {
        let lfh_buf = self
            .read_range(entry.lfh_offset, LFH_SIZE as u64, "local file header")
            .await?;

        if &lfh_buf[0..4] != LFH_SIGNATURE {
            return Err(Error::corrupt(format!(
                "invalid local file header for `{}`",
                entry.file_name
            )));
        }

        let mut cursor = Cursor::new(&lfh_buf);
        cursor.set_position(26); // Offset to filename length field

        let file_name_length = cursor.read_u16::<LittleEndian>().map_err(truncated)? as u64;
        let extra_field_length = cursor.read_u16::<LittleEndian>().map_err(truncated)? as u64;

        Ok(entry.lfh_offset + LFH_SIZE as u64 + file_name_length + extra_field_length)
    }

    /// Read the entry's compressed (and, for protected entries, encrypted) bytes.
    pub async fn read_payload(&self, entry: &ZipFileEntry) -> Result<Vec<u8>> {
        let data_offset = self.get_data_offset(entry).await?;
        self.read_range(data_offset, entry.compressed_size, "entry payload")
            .await
    }
}

/// Parse a Central Directory File Header from a cursor.
fn parse_cdfh(cursor: &mut Cursor<&[u8]>) -> Result<ZipFileEntry> {
    let remaining = cursor.get_ref().len() as u64 - cursor.position();
    if remaining < CDFH_MIN_SIZE as u64 {
        return Err(Error::corrupt("central directory truncated"));
    }

    let mut sig = [0u8; 4];
    cursor.read_exact(&mut sig).map_err(truncated)?;
    if sig != CDFH_SIGNATURE {
        return Err(Error::corrupt("invalid central directory file header"));
    }

    let _version_made_by = cursor.read_u16::<LittleEndian>().map_err(truncated)?;
    let _version_needed = cursor.read_u16::<LittleEndian>().map_err(truncated)?;
    let flags = cursor.read_u16::<LittleEndian>().map_err(truncated)?;
    let compression_method = cursor.read_u16::<LittleEndian>().map_err(truncated)?;
    let last_mod_time = cursor.read_u16::<LittleEndian>().map_err(truncated)?;
    let last_mod_date = cursor.read_u16::<LittleEndian>().map_err(truncated)?;
    let crc32 = cursor.read_u32::<LittleEndian>().map_err(truncated)?;
    let mut compressed_size = cursor.read_u32::<LittleEndian>().map_err(truncated)? as u64;
    let mut uncompressed_size = cursor.read_u32::<LittleEndian>().map_err(truncated)? as u64;
    let file_name_length = cursor.read_u16::<LittleEndian>().map_err(truncated)?;
    let extra_field_length = cursor.read_u16::<LittleEndian>().map_err(truncated)?;
    let file_comment_length = cursor.read_u16::<LittleEndian>().map_err(truncated)?;
    let _disk_number_start = cursor.read_u16::<LittleEndian>().map_err(truncated)?;
    let _internal_attrs = cursor.read_u16::<LittleEndian>().map_err(truncated)?;
    let _external_attrs = cursor.read_u32::<LittleEndian>().map_err(truncated)?;
    let mut lfh_offset = cursor.read_u32::<LittleEndian>().map_err(truncated)? as u64;

    let variable_len =
        file_name_length as u64 + extra_field_length as u64 + file_comment_length as u64;
    let remaining = cursor.get_ref().len() as u64 - cursor.position();
    if variable_len > remaining {
        return Err(Error::corrupt("central directory header overruns directory"));
    }

    let mut file_name_bytes = vec![0u8; file_name_length as usize];
    cursor.read_exact(&mut file_name_bytes).map_err(truncated)?;
    // Use lossy conversion to handle non-UTF8 filenames gracefully
    let file_name = String::from_utf8_lossy(&file_name_bytes).to_string();
    let is_directory = file_name.ends_with('/');

    let extra_field_end = cursor.position() + extra_field_length as u64;

    while cursor.position() + 4 <= extra_field_end {
        let header_id = cursor.read_u16::<LittleEndian>().map_err(truncated)?;
        let field_size = cursor.read_u16::<LittleEndian>().map_err(truncated)?;
        let field_end = (cursor.position() + field_size as u64).min(extra_field_end);

        if header_id == ZIP64_EXTRA_ID {
            // Fields are present only if the corresponding header field is saturated
            if uncompressed_size == 0xFFFFFFFF && cursor.position() + 8 <= field_end {
                uncompressed_size = cursor.read_u64::<LittleEndian>().map_err(truncated)?;
            }
            if compressed_size == 0xFFFFFFFF && cursor.position() + 8 <= field_end {
                compressed_size = cursor.read_u64::<LittleEndian>().map_err(truncated)?;
            }
            if lfh_offset == 0xFFFFFFFF && cursor.position() + 8 <= field_end {
                lfh_offset = cursor.read_u64::<LittleEndian>().map_err(truncated)?;
            }
        }
        cursor.set_position(field_end);
    }

    // Skip past the extra field and the file comment (we don't use it)
    cursor.set_position(extra_field_end + file_comment_length as u64);

    Ok(ZipFileEntry {
        file_name,
        flags,
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
