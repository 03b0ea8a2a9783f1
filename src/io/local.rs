use super::ReadAt;
use async_trait::async_trait;
use std::io;
use std::path::Path;

use crate::error::{Error, Result};

/// Local file reader with random access support
pub struct LocalFileReader {
    file: std::fs::File,
    size: u64,
}

impl LocalFileReader {
    pub fn new(path: &Path) -> Result<Self> {
        let file = std::fs::File::open(path).map_err(|e| Error::from_io(path, e))?;
        let meta = file.metadata().map_err(|e| Error::from_io(path, e))?;
        if meta.is_dir() {
            return Err(Error::FileNotReadable {
                path: path.to_path_buf(),
                source: io::Error::other("is a directory"),
            });
        }
        Ok(Self {
            file,
            size: meta.len(),
        })
    }
}

#[async_trait]
impl ReadAt for LocalFileReader {
    async fn read_at(&self, offset: u64, buf: &mut [u8]) -> io::Result<usize> {
        #[cfg(unix)]
        {
            use std::os::unix::fs::FileExt;
            self.file.read_at(buf, offset)
        }

        #[cfg(windows)]
        {
            use std::os::windows::fs::FileExt;
            // seek_read moves the cursor, but nothing else reads this handle sequentially
            self.file.seek_read(buf, offset)
        }

        #[cfg(not(any(unix, windows)))]
        {
            use std::io::{Read, Seek, SeekFrom};
            let mut file = &self.file;
            file.seek(SeekFrom::Start(offset))?;
            file.read(buf)
        }
    }

    fn size(&self) -> u64 {
        self.size
    }
}
