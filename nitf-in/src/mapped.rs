//! A read-only [`IoInterface`] over a memory mapped file.
//!
//! Mapping avoids holding large files in memory and makes repeated block
//! reads cheap. Writes are rejected with a permission error.
use nitf_core::errors::*;
use nitf_core::io::{IoInterface, Whence};

use memmap2::{Mmap, MmapOptions};
use std::path::Path;

/// A memory mapped NITF file behind the standard I/O contract.
pub struct MappedIo {
    map: Mmap,
    pos: usize,
    _file: std::fs::File,
}

impl MappedIo {
    /// Map an existing file read-only.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, NitfError> {
        let file = std::fs::File::open(path)?;
        let map = unsafe { MmapOptions::new().map(&file)? };
        Ok(MappedIo {
            map,
            pos: 0,
            _file: file,
        })
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.map
    }
}

impl IoInterface for MappedIo {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, NitfError> {
        if self.pos >= self.map.len() {
            return Err(NitfError::Eof);
        }
        let n = buf.len().min(self.map.len() - self.pos);
        buf[..n].copy_from_slice(&self.map[self.pos..self.pos + n]);
        self.pos += n;
        Ok(n)
    }

    fn write(&mut self, _buf: &[u8]) -> Result<usize, NitfError> {
        Err(NitfError::StdIoError(std::io::Error::new(
            std::io::ErrorKind::PermissionDenied,
            "memory mapped files are read-only",
        )))
    }

    fn seek(&mut self, whence: Whence, offset: i64) -> Result<u64, NitfError> {
        let base = match whence {
            Whence::Set => 0i64,
            Whence::Cur => self.pos as i64,
            Whence::End => self.map.len() as i64,
        };
        let target = base + offset;
        if target < 0 {
            return Err(NitfError::StdIoError(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "seek before start of map",
            )));
        }
        self.pos = target as usize;
        Ok(self.pos as u64)
    }

    fn tell(&mut self) -> Result<u64, NitfError> {
        Ok(self.pos as u64)
    }

    fn size(&mut self) -> Result<u64, NitfError> {
        Ok(self.map.len() as u64)
    }
}
