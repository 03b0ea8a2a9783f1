use std::path::Path;
use std::sync::Arc;

use tracing::debug;

use crate::error::{Error, Result};
use crate::io::{LocalFileReader, ReadAt};

use super::parser::ZipParser;
use super::structures::{ArchiveEntry, CheckByte, CompressionMethod, EncryptionScheme, ZipFileEntry};

/// Which member of the archive to attack.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum EntrySelector {
    /// The first file protected with ZipCrypto.
    #[default]
    First,
    /// The entry with exactly this name.
    Named(String),
}

/// Locates and loads the protected entry of an archive.
pub struct ArchiveReader<R: ReadAt> {
    parser: ZipParser<R>,
}

impl ArchiveReader<LocalFileReader> {
    /// Open a local archive and load the entry chosen by `selector`.
    pub async fn open(path: &Path, selector: &EntrySelector, check_byte: CheckByte) -> Result<ArchiveEntry> {
        let reader = Arc::new(LocalFileReader::new(path)?);
        ArchiveReader::new(reader)
            .protected_entry(selector, check_byte)
            .await
    }
}

impl<R: ReadAt> ArchiveReader<R> {
    pub fn new(reader: Arc<R>) -> Self {
        Self {
            parser: ZipParser::new(reader),
        }
    }

    /// List all entries in the archive
    pub async fn list_entries(&self) -> Result<Vec<ZipFileEntry>> {
        self.parser.list_files().await
    }

    /// Select the target entry and read its encrypted payload by byte range.
    pub async fn protected_entry(&self, selector: &EntrySelector, check_byte: CheckByte) -> Result<ArchiveEntry> {
        let entries = self.list_entries().await?;
        let target = select(&entries, selector)?;

        if !matches!(
            target.compression_method,
            CompressionMethod::Stored | CompressionMethod::Deflate
        ) {
            return Err(Error::UnsupportedCompression {
                name: target.file_name.clone(),
                method: target.compression_method.as_u16(),
            });
        }

        debug!(
            entry = %target.file_name,
            method = %target.compression_method,
            compressed = target.compressed_size,
            uncompressed = target.uncompressed_size,
            "selected protected entry"
        );

        let payload = self.parser.read_payload(target).await?;
        ArchiveEntry::new(target, payload, check_byte)
    }
}

fn select<'a>(entries: &'a [ZipFileEntry], selector: &EntrySelector) -> Result<&'a ZipFileEntry> {
    match selector {
        EntrySelector::Named(name) => {
            let entry = entries
                .iter()
                .find(|e| &e.file_name == name)
                .ok_or_else(|| Error::EntryNotFound(name.clone()))?;
            match entry.encryption() {
                EncryptionScheme::ZipCrypto => Ok(entry),
                EncryptionScheme::None => Err(Error::NothingToCrack),
                scheme => Err(Error::UnsupportedEncryption {
                    name: entry.file_name.clone(),
                    scheme,
                }),
            }
        }
        EntrySelector::First => {
            let mut files = entries.iter().filter(|e| !e.is_directory);
            if let Some(entry) = files
                .clone()
                .find(|e| e.encryption() == EncryptionScheme::ZipCrypto)
            {
                return Ok(entry);
            }
            match files.find(|e| e.encryption().is_encrypted()) {
                Some(entry) => Err(Error::UnsupportedEncryption {
                    name: entry.file_name.clone(),
                    scheme: entry.encryption(),
                }),
                None => Err(Error::NothingToCrack),
            }
        }
    }
}
