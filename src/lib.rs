//! # zipcrack
//!
//! Dictionary attack on ZIP archives protected with the traditional PKWARE
//! stream cipher (ZipCrypto).
//!
//! Every line of a wordlist is tried as a password against one protected
//! entry. A candidate is first checked against the 12-byte encryption header,
//! which rejects all but about 1 in 256 wrong passwords. Survivors are fully
//! decrypted and decompressed, and the CRC-32 of the result is compared with
//! the one stored in the archive.
//!
//! ## Features
//!
//! - Reads only the central directory and the target entry's bytes, so
//!   archive size does not matter (ZIP64 included)
//! - STORED and DEFLATE entries
//! - Wordlists are streamed, never loaded into memory
//! - Parallel workers over disjoint slices of the wordlist with early exit
//!   as soon as one of them finds the password
//!
//! ## Example
//!
//! ```no_run
//! use std::path::Path;
//! use zipcrack::{CrackConfig, RunResult, Scheduler};
//!
//! #[tokio::main]
//! async fn main() {
//!     let scheduler = Scheduler::new(CrackConfig::default());
//!     let report = zipcrack::crack(Path::new("secret.zip"), Path::new("words.txt"), scheduler).await;
//!
//!     match report.result {
//!         RunResult::Found(password) => println!("{}", password.to_string_lossy()),
//!         RunResult::NotFound => println!("not in the wordlist"),
//!         RunResult::Error(e) => eprintln!("{e}"),
//!     }
//! }
//! ```

pub mod cli;
pub mod config;
pub mod crypto;
pub mod error;
pub mod io;
pub mod oracle;
pub mod progress;
pub mod report;
pub mod scheduler;
pub mod wordlist;
pub mod zip;

use std::path::Path;
use std::sync::Arc;

pub use cli::Cli;
pub use config::CrackConfig;
pub use error::{Error, Result};
pub use io::{LocalFileReader, ReadAt};
pub use oracle::{Verdict, verify};
pub use scheduler::{RunReport, RunResult, RunStats, Scheduler};
pub use wordlist::{Candidate, Wordlist};
pub use zip::{ArchiveEntry, ArchiveReader, EntrySelector};

/// Load the protected entry of `archive` and search `wordlist` for its password.
///
/// Archive and wordlist problems are reported before any worker is started.
pub async fn crack(archive: &Path, wordlist: &Path, scheduler: Scheduler) -> RunReport {
    let config = scheduler.config();
    let entry = match ArchiveReader::open(archive, &config.entry, config.check_byte).await {
        Ok(entry) => Arc::new(entry),
        Err(e) => return RunReport::failed(e),
    };
    let wordlist = match Wordlist::open(wordlist) {
        Ok(wordlist) => wordlist,
        Err(e) => return RunReport::failed(e),
    };

    scheduler.run(entry, &wordlist).await
}
