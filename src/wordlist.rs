//! Line-oriented password candidates read from a wordlist file.
//!
//! Lines are raw bytes: a trailing `\n` and the `\r` before it are removed,
//! nothing else is touched. An empty line is the empty password. Lines longer
//! than [`MAX_CANDIDATE_LEN`] are counted but skipped, so a file without
//! newlines never ends up in memory.
//!
//! Files are streamed through a bounded buffer and never loaded whole. A
//! single indexing pass counts the lines exactly and records a byte offset
//! every [`INDEX_STRIDE`] lines, so a worker can seek close to the start of
//! its range instead of reading everything before it.

use std::fmt;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::scheduler::WorkRange;

/// Lines between two recorded offsets in a [`LineIndex`].
pub const INDEX_STRIDE: u64 = 4096;

/// Longest line, terminator excluded, that is tried as a password.
pub const MAX_CANDIDATE_LEN: usize = 1024;

const READ_BUFFER: usize = 64 * 1024;

/// One password taken verbatim from a wordlist line.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Candidate(Vec<u8>);

impl Candidate {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }

    pub fn to_string_lossy(&self) -> String {
        String::from_utf8_lossy(&self.0).into_owned()
    }
}

impl fmt::Debug for Candidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Candidate({:?})", self.to_string_lossy())
    }
}

impl From<&str> for Candidate {
    fn from(s: &str) -> Self {
        Self::new(s.as_bytes())
    }
}

/// Exact line count plus a sparse table of line start offsets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineIndex {
    total: u64,
    /// `marks[i]` is the byte offset of line `i * INDEX_STRIDE`.
    marks: Vec<u64>,
}

impl LineIndex {
    pub fn total_lines(&self) -> u64 {
        self.total
    }

    /// Closest recorded `(line, byte offset)` at or before `line`.
    fn seek_point(&self, line: u64) -> (u64, u64) {
        let slot = ((line / INDEX_STRIDE) as usize).min(self.marks.len().saturating_sub(1));
        match self.marks.get(slot) {
            Some(&offset) => (slot as u64 * INDEX_STRIDE, offset),
            None => (0, 0),
        }
    }
}

/// A wordlist on disk. Cheap to clone; every iteration opens its own handle.
#[derive(Debug, Clone)]
pub struct Wordlist {
    path: PathBuf,
}

impl Wordlist {
    /// Check that `path` names a readable file.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let meta = std::fs::metadata(&path).map_err(|e| Error::from_io(&path, e))?;
        if meta.is_dir() {
            return Err(Error::FileNotReadable {
                path,
                source: io::Error::other("is a directory"),
            });
        }
        File::open(&path).map_err(|e| Error::from_io(&path, e))?;
        Ok(Self { path })
    }

    /// Skip the checks of [`open`](Self::open).
    #[cfg(test)]
    pub(crate) fn unchecked(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn count_lines(&self) -> Result<u64> {
        Ok(self.index()?.total_lines())
    }

    /// Scan the file once, counting lines and recording seek marks.
    pub fn index(&self) -> Result<LineIndex> {
        let mut file = self.open_file()?;
        let mut buf = vec![0u8; READ_BUFFER];
        let mut marks = vec![0u64];
        let mut newlines = 0u64;
        let mut position = 0u64;
        let mut last = None;

        loop {
            let n = match file.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(self.unreadable(e)),
            };
            for (i, &b) in buf[..n].iter().enumerate() {
                if b == b'\n' {
                    newlines += 1;
                    if newlines % INDEX_STRIDE == 0 {
                        marks.push(position + i as u64 + 1);
                    }
                }
            }
            position += n as u64;
            last = Some(buf[n - 1]);
        }

        // An unterminated final line still counts.
        let total = match last {
            Some(b'\n') | None => newlines,
            Some(_) => newlines + 1,
        };
        // A mark at end of file would point past the last line.
        if marks.len() > 1 && *marks.last().unwrap_or(&0) >= position {
            marks.pop();
        }

        Ok(LineIndex { total, marks })
    }

    /// Candidates of `range` in file order, reading from the start of the file.
    pub fn iterate(&self, range: WorkRange) -> Result<Candidates> {
        self.candidates_from(range, 0, 0)
    }

    /// Like [`iterate`](Self::iterate), seeking through `index` first.
    pub fn iterate_indexed(&self, range: WorkRange, index: &LineIndex) -> Result<Candidates> {
        let (line, offset) = index.seek_point(range.start);
        self.candidates_from(range, line, offset)
    }

    fn candidates_from(&self, range: WorkRange, line: u64, offset: u64) -> Result<Candidates> {
        let mut file = self.open_file()?;
        if offset > 0 {
            file.seek(SeekFrom::Start(offset))
                .map_err(|e| self.unreadable(e))?;
        }

        let mut candidates = Candidates {
            path: self.path.clone(),
            reader: BufReader::with_capacity(READ_BUFFER, file),
            line,
            end: range.end,
            exhausted: range.is_empty(),
            skipped: 0,
        };
        candidates.skip_to(range.start)?;
        Ok(candidates)
    }

    fn open_file(&self) -> Result<File> {
        File::open(&self.path).map_err(|e| Error::from_io(&self.path, e))
    }

    fn unreadable(&self, source: io::Error) -> Error {
        Error::FileNotReadable {
            path: self.path.clone(),
            source,
        }
    }
}

/// Streaming iterator over the candidates of one [`WorkRange`].
pub struct Candidates {
    path: PathBuf,
    reader: BufReader<File>,
    /// Number of the next line the reader will return.
    line: u64,
    end: u64,
    exhausted: bool,
    skipped: u64,
}

impl Candidates {
    /// Lines passed over for exceeding [`MAX_CANDIDATE_LEN`].
    pub fn skipped(&self) -> u64 {
        self.skipped
    }

    fn skip_to(&mut self, start: u64) -> Result<()> {
        while !self.exhausted && self.line < start {
            let n = self
                .reader
                .skip_until(b'\n')
                .map_err(|e| self.unreadable(e))?;
            if n == 0 {
                self.exhausted = true;
            }
            self.line += 1;
        }
        Ok(())
    }

    fn unreadable(&self, source: io::Error) -> Error {
        Error::FileNotReadable {
            path: self.path.clone(),
            source,
        }
    }

    /// Read one line with its terminator removed.
    ///
    /// Returns `None` at end of file and for an overlong line, which is
    /// drained without being buffered.
    fn read_line(&mut self) -> io::Result<Option<Vec<u8>>> {
        // Room for a trailing "\r\n".
        let limit = MAX_CANDIDATE_LEN as u64 + 2;
        let mut line = Vec::new();
        let n = (&mut self.reader).take(limit).read_until(b'\n', &mut line)?;
        if n == 0 {
            self.exhausted = true;
            return Ok(None);
        }
        self.line += 1;

        let terminated = line.last() == Some(&b'\n');
        if !terminated && n as u64 == limit {
            self.reader.skip_until(b'\n')?;
            self.skipped += 1;
            return Ok(None);
        }
        if terminated {
            line.pop();
            if line.last() == Some(&b'\r') {
                line.pop();
            }
        }
        if line.len() > MAX_CANDIDATE_LEN {
            self.skipped += 1;
            return Ok(None);
        }
        Ok(Some(line))
    }
}

impl Iterator for Candidates {
    type Item = Result<Candidate>;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.exhausted && self.line < self.end {
            match self.read_line() {
                Ok(Some(line)) => return Some(Ok(Candidate(line))),
                Ok(None) => {}
                Err(e) => {
                    self.exhausted = true;
                    return Some(Err(self.unreadable(e)));
                }
            }
        }
        None
    }
}
