//! ZIP archive parsing and protected-entry extraction.
//!
//! ## Architecture
//!
//! - [`structures`]: Data structures representing ZIP format elements (EOCD, file headers, etc.)
//! - [`parser`]: Low-level parsing of ZIP structures from raw bytes
//! - [`reader`]: Selection of the entry to attack and loading of its payload
//!
//! ## ZIP Format Overview
//!
//! A ZIP file consists of:
//! 1. Local file headers and compressed data for each file
//! 2. Central Directory with metadata for all files
//! 3. End of Central Directory (EOCD) record at the end
//!
//! The EOCD is read first (from the end of the file), then the Central
//! Directory. Only the selected entry's payload is read from the body of the
//! archive, so its total size does not matter.
//!
//! ## Supported Features
//!
//! - Standard ZIP format (PKZIP APPNOTE 6.3.x compatible)
//! - ZIP64 extensions for files > 4GB
//! - Traditional PKWARE (ZipCrypto) encrypted entries
//! - STORED and DEFLATE compression methods
//!
//! ## Limitations
//!
//! - WinZip AES and PKWARE strong encryption are detected but not attacked
//! - No multi-disk archive support

mod parser;
mod reader;
mod structures;

pub use parser::ZipParser;
pub use reader::{ArchiveReader, EntrySelector};
pub use structures::*;
