use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::zip::EncryptionScheme;

#[derive(Error, Debug)]
pub enum Error {
    #[error("corrupt archive: {0}")]
    CorruptArchive(String),

    #[error("entry `{name}` uses {scheme}, only ZipCrypto can be attacked")]
    UnsupportedEncryption {
        name: String,
        scheme: EncryptionScheme,
    },

    #[error("entry `{name}` uses unsupported compression method {method}")]
    UnsupportedCompression { name: String, method: u16 },

    #[error("archive contains no password-protected entries")]
    NothingToCrack,

    #[error("no entry named `{0}` in archive")]
    EntryNotFound(String),

    #[error("{}: file not found", .0.display())]
    FileNotFound(PathBuf),

    #[error("{}: {source}", path.display())]
    FileNotReadable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("search interrupted before the wordlist was exhausted")]
    Interrupted,

    #[error("worker failed: {0}")]
    Worker(String),
}

impl Error {
    /// Classify an I/O failure on `path` as missing or unreadable.
    pub fn from_io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        let path = path.into();
        if source.kind() == io::ErrorKind::NotFound {
            Error::FileNotFound(path)
        } else {
            Error::FileNotReadable { path, source }
        }
    }

    pub fn corrupt(msg: impl Into<String>) -> Self {
        Error::CorruptArchive(msg.into())
    }
}

// Convenient crate-wide result type
pub type Result<T> = std::result::Result<T, Error>;
