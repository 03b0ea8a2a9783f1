//! Password verification against a protected entry.
//!
//! Two stages, cheapest first:
//!
//! 1. Decrypt the 12-byte header and compare its last byte with the entry's
//!    check byte. A wrong password survives this with probability 1/256.
//! 2. Decrypt and decompress the whole payload, then compare the CRC-32 and
//!    length of the output with the values stored in the archive.
//!
//! Nothing is cached between calls: the keys are derived from scratch for
//! every candidate.

use std::io::{self, Read, Write};

use flate2::read::DeflateDecoder;

use crate::crypto::{DecryptReader, Keys};
use crate::zip::{ArchiveEntry, CompressionMethod, ENCRYPTION_HEADER_LEN};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Match,
    NoMatch,
}

/// Which stage decided the outcome of a verification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Examination {
    RejectedByHeader,
    /// Passed the header check but the decompressed data did not check out.
    RejectedByChecksum,
    Match,
}

impl From<Examination> for Verdict {
    fn from(e: Examination) -> Self {
        match e {
            Examination::Match => Verdict::Match,
            _ => Verdict::NoMatch,
        }
    }
}

pub fn verify(entry: &ArchiveEntry, password: &[u8]) -> Verdict {
    examine(entry, password).into()
}

pub fn examine(entry: &ArchiveEntry, password: &[u8]) -> Examination {
    let mut keys = Keys::derive(password);

    let mut header = [0u8; ENCRYPTION_HEADER_LEN];
    header.copy_from_slice(entry.header());
    keys.decrypt(&mut header);
    if header[ENCRYPTION_HEADER_LEN - 1] != entry.check_byte {
        return Examination::RejectedByHeader;
    }

    // A corrupt deflate stream only means the header check was a false positive.
    match payload_checks_out(entry, DecryptReader::new(keys, entry.body())) {
        Ok(true) => Examination::Match,
        Ok(false) | Err(_) => Examination::RejectedByChecksum,
    }
}

fn payload_checks_out<R: Read>(entry: &ArchiveEntry, body: R) -> io::Result<bool> {
    // One byte past the declared size is enough to detect an overlong stream.
    let limit = entry.uncompressed_size.saturating_add(1);
    let mut sink = CrcWriter::default();

    let written = match entry.compression_method {
        CompressionMethod::Stored => io::copy(&mut body.take(limit), &mut sink)?,
        CompressionMethod::Deflate => {
            io::copy(&mut DeflateDecoder::new(body).take(limit), &mut sink)?
        }
        CompressionMethod::Unknown(_) => return Ok(false),
    };

    Ok(written == entry.uncompressed_size && sink.hasher.finalize() == entry.crc32)
}

#[derive(Default)]
struct CrcWriter {
    hasher: crc32fast::Hasher,
}

impl Write for CrcWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.hasher.update(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
