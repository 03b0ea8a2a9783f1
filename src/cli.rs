use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::config::CrackConfig;
use crate::zip::{CheckByte, EntrySelector};

#[derive(Parser, Debug)]
#[command(name = "zipcrack")]
#[command(version)]
#[command(about = "Recover the password of a ZipCrypto-protected archive from a wordlist", long_about = None)]
#[command(after_help = "Examples:\n  \
  zipcrack secret.zip rockyou.txt          try every line of rockyou.txt\n  \
  zipcrack -w 4 -e data.csv secret.zip words.txt   attack data.csv with 4 workers\n  \
  zipcrack -l secret.zip                   list entries and their protection\n\n\
Exit status: 0 password found, 1 not found, 2 error")]
pub struct Cli {
    /// ZIP archive to attack
    #[arg(value_name = "ARCHIVE")]
    pub archive: PathBuf,

    /// Wordlist with one candidate password per line
    #[arg(value_name = "WORDLIST", required_unless_present = "list")]
    pub wordlist: Option<PathBuf>,

    /// Number of worker threads (default: number of logical CPUs)
    #[arg(short, long, env = "ZIPCRACK_WORKERS", value_parser = clap::value_parser!(u32).range(1..))]
    pub workers: Option<u32>,

    /// Attack this entry instead of the first protected one
    #[arg(short, long, value_name = "NAME")]
    pub entry: Option<String>,

    /// Source of the byte that checks the decrypted header
    #[arg(long, value_enum, default_value_t = CheckByteArg::Auto)]
    pub check_byte: CheckByteArg,

    /// Give up after this many seconds
    #[arg(short, long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// List entries with their protection and exit
    #[arg(short, long)]
    pub list: bool,

    /// Print debug information
    #[arg(short, long)]
    pub verbose: bool,

    /// Only print the password and errors
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckByteArg {
    /// Modification time for streamed entries, CRC otherwise
    Auto,
    /// High byte of the CRC-32
    Crc,
    /// High byte of the modification time
    Time,
}

impl From<CheckByteArg> for CheckByte {
    fn from(arg: CheckByteArg) -> Self {
        match arg {
            CheckByteArg::Auto => CheckByte::Auto,
            CheckByteArg::Crc => CheckByte::Crc,
            CheckByteArg::Time => CheckByte::ModTime,
        }
    }
}

impl Cli {
    pub fn config(&self) -> CrackConfig {
        let mut config = CrackConfig {
            entry: match &self.entry {
                Some(name) => EntrySelector::Named(name.clone()),
                None => EntrySelector::First,
            },
            check_byte: self.check_byte.into(),
            ..CrackConfig::default()
        };
        if let Some(workers) = self.workers {
            config.workers = workers as usize;
        }
        config
    }

    /// Default tracing filter when `RUST_LOG` is unset.
    pub fn log_filter(&self) -> &'static str {
        if self.verbose {
            "zipcrack=debug,info"
        } else if self.quiet {
            "error"
        } else {
            "info"
        }
    }
}
