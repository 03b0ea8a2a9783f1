//! Builders for encrypted ZIP archives and wordlists used across integration tests.
//!
//! Archives are assembled byte by byte (local headers, payloads, central
//! directory, EOCD) so tests control every field, including the ones a
//! regular ZIP writer would never produce.

#![allow(dead_code)]

use std::io::Write;
use std::path::{Path, PathBuf};

use flate2::Compression;
use flate2::write::DeflateEncoder;
use zipcrack::crypto::Keys;
use zipcrack::zip::flags;

pub const METHOD_STORED: u16 = 0;
pub const METHOD_DEFLATE: u16 = 8;
pub const METHOD_BZIP2: u16 = 12;
pub const METHOD_AES: u16 = 99;

/// DOS time 15:17:34 and date 2025-01-01.
pub const MOD_TIME: u16 = 0x7A31;
pub const MOD_DATE: u16 = 0x5A21;

#[derive(Clone)]
pub struct FixtureEntry {
    pub name: String,
    pub content: Vec<u8>,
    pub password: Option<Vec<u8>>,
    pub method: u16,
    pub extra_flags: u16,
    pub mod_time: u16,
}

impl FixtureEntry {
    pub fn new(name: &str, content: &[u8]) -> Self {
        Self {
            name: name.to_string(),
            content: content.to_vec(),
            password: None,
            method: METHOD_STORED,
            extra_flags: 0,
            mod_time: MOD_TIME,
        }
    }

    pub fn password(mut self, password: &[u8]) -> Self {
        self.password = Some(password.to_vec());
        self
    }

    pub fn deflate(mut self) -> Self {
        self.method = METHOD_DEFLATE;
        self
    }

    pub fn method(mut self, method: u16) -> Self {
        self.method = method;
        self
    }

    /// Mark the entry as streamed, with sizes and CRC in a trailing data descriptor.
    pub fn data_descriptor(mut self) -> Self {
        self.extra_flags |= flags::DATA_DESCRIPTOR;
        self
    }

    pub fn flags(mut self, extra: u16) -> Self {
        self.extra_flags |= extra;
        self
    }

    pub fn crc32(&self) -> u32 {
        crc32fast::hash(&self.content)
    }

    fn compressed(&self) -> Vec<u8> {
        match self.method {
            METHOD_DEFLATE => {
                let mut encoder = DeflateEncoder::new(Vec::new(), Compression::default());
                encoder.write_all(&self.content).unwrap();
                encoder.finish().unwrap()
            }
            _ => self.content.clone(),
        }
    }

    fn flags_word(&self) -> u16 {
        let encrypted = if self.password.is_some() || self.method == METHOD_AES {
            flags::ENCRYPTED
        } else {
            0
        };
        encrypted | self.extra_flags
    }

    /// Compressed bytes, prefixed with an encrypted header when protected.
    fn payload(&self, seed: u32) -> Vec<u8> {
        let compressed = self.compressed();
        let Some(password) = &self.password else {
            return compressed;
        };
        if self.method == METHOD_AES {
            return compressed;
        }

        let mut data = pseudo_random_header(seed);
        data[11] = if self.extra_flags & flags::DATA_DESCRIPTOR != 0 {
            (self.mod_time >> 8) as u8
        } else {
            (self.crc32() >> 24) as u8
        };
        data.extend_from_slice(&compressed);
        Keys::derive(password).encrypt(&mut data);
        data
    }
}

fn pseudo_random_header(seed: u32) -> Vec<u8> {
    let mut state = seed.wrapping_mul(2_654_435_761).wrapping_add(0x9E37_79B9);
    (0..12)
        .map(|_| {
            state ^= state << 13;
            state ^= state >> 17;
            state ^= state << 5;
            (state >> 24) as u8
        })
        .collect()
}

#[derive(Default)]
pub struct ZipBuilder {
    entries: Vec<FixtureEntry>,
    comment: Vec<u8>,
    zip64: bool,
}

impl ZipBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entry(mut self, entry: FixtureEntry) -> Self {
        self.entries.push(entry);
        self
    }

    pub fn comment(mut self, comment: &[u8]) -> Self {
        self.comment = comment.to_vec();
        self
    }

    /// Emit ZIP64 end-of-central-directory records with saturated EOCD fields.
    pub fn zip64(mut self) -> Self {
        self.zip64 = true;
        self
    }

    pub fn build(&self) -> Vec<u8> {
        let mut out = Vec::new();
        let mut central = Vec::new();

        for (i, entry) in self.entries.iter().enumerate() {
            let offset = out.len() as u32;
            let payload = entry.payload(i as u32 + 1);
            let flags = entry.flags_word();
            let streamed = flags & flags::DATA_DESCRIPTOR != 0;
            let crc = entry.crc32();
            let csize = payload.len() as u32;
            let usize_ = entry.content.len() as u32;

            // Local file header
            out.extend_from_slice(b"PK\x03\x04");
            put16(&mut out, 20);
            put16(&mut out, flags);
            put16(&mut out, entry.method);
            put16(&mut out, entry.mod_time);
            put16(&mut out, MOD_DATE);
            if streamed {
                put32(&mut out, 0);
                put32(&mut out, 0);
                put32(&mut out, 0);
            } else {
                put32(&mut out, crc);
                put32(&mut out, csize);
                put32(&mut out, usize_);
            }
            put16(&mut out, entry.name.len() as u16);
            put16(&mut out, 0);
            out.extend_from_slice(entry.name.as_bytes());
            out.extend_from_slice(&payload);
            if streamed {
                out.extend_from_slice(b"PK\x07\x08");
                put32(&mut out, crc);
                put32(&mut out, csize);
                put32(&mut out, usize_);
            }

            // Central directory file header
            central.extend_from_slice(b"PK\x01\x02");
            put16(&mut central, 20);
            put16(&mut central, 20);
            put16(&mut central, flags);
            put16(&mut central, entry.method);
            put16(&mut central, entry.mod_time);
            put16(&mut central, MOD_DATE);
            put32(&mut central, crc);
            put32(&mut central, csize);
            put32(&mut central, usize_);
            put16(&mut central, entry.name.len() as u16);
            put16(&mut central, 0);
            put16(&mut central, 0);
            put16(&mut central, 0);
            put16(&mut central, 0);
            put32(&mut central, 0);
            put32(&mut central, offset);
            central.extend_from_slice(entry.name.as_bytes());
        }

        let cd_offset = out.len() as u64;
        let cd_size = central.len() as u64;
        let count = self.entries.len() as u64;
        out.extend_from_slice(&central);

        if self.zip64 {
            let eocd64_offset = out.len() as u64;
            out.extend_from_slice(b"PK\x06\x06");
            put64(&mut out, 44);
            put16(&mut out, 45);
            put16(&mut out, 45);
            put32(&mut out, 0);
            put32(&mut out, 0);
            put64(&mut out, count);
            put64(&mut out, count);
            put64(&mut out, cd_size);
            put64(&mut out, cd_offset);

            out.extend_from_slice(b"PK\x06\x07");
            put32(&mut out, 0);
            put64(&mut out, eocd64_offset);
            put32(&mut out, 1);
        }

        out.extend_from_slice(b"PK\x05\x06");
        put16(&mut out, 0);
        put16(&mut out, 0);
        if self.zip64 {
            put16(&mut out, 0xFFFF);
            put16(&mut out, 0xFFFF);
            put32(&mut out, 0xFFFF_FFFF);
            put32(&mut out, 0xFFFF_FFFF);
        } else {
            put16(&mut out, count as u16);
            put16(&mut out, count as u16);
            put32(&mut out, cd_size as u32);
            put32(&mut out, cd_offset as u32);
        }
        put16(&mut out, self.comment.len() as u16);
        out.extend_from_slice(&self.comment);
        out
    }

    pub fn write_to(&self, dir: &Path, name: &str) -> PathBuf {
        write_file(dir, name, &self.build())
    }
}

pub fn write_file(dir: &Path, name: &str, bytes: &[u8]) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, bytes).unwrap();
    path
}

/// Write `lines` joined with `\n`, including a final terminator.
pub fn write_wordlist<S: AsRef<[u8]>>(dir: &Path, name: &str, lines: &[S]) -> PathBuf {
    let mut bytes = Vec::new();
    for line in lines {
        bytes.extend_from_slice(line.as_ref());
        bytes.push(b'\n');
    }
    write_file(dir, name, &bytes)
}

/// `count` distinct passwords that are not `avoid`.
pub fn decoys(count: usize, avoid: &[u8]) -> Vec<Vec<u8>> {
    (0..count)
        .map(|i| format!("decoy-{i:05}").into_bytes())
        .filter(|w| w.as_slice() != avoid)
        .collect()
}

/// A poem long enough that deflate actually compresses it.
pub fn sample_text() -> Vec<u8> {
    b"Tyger Tyger, burning bright,\nIn the forests of the night;\n"
        .repeat(20)
}

fn put16(out: &mut Vec<u8>, v: u16) {
    out.extend_from_slice(&v.to_le_bytes());
}

fn put32(out: &mut Vec<u8>, v: u32) {
    out.extend_from_slice(&v.to_le_bytes());
}

fn put64(out: &mut Vec<u8>, v: u64) {
    out.extend_from_slice(&v.to_le_bytes());
}
