//! This contains the I/O abstraction the parser, writer and image engine run on.
//!
//! Everything in the engine reads and writes through [`IoInterface`] so that
//! native files, fixed byte buffers and user supplied streams can be swapped
//! freely. All the engine's reads go through [`read_total`], which retries
//! short reads a bounded number of times before reporting truncation.
use crate::errors::*;

use std::fs::File;
use std::io::{Read, Seek, SeekFrom, Write};
use std::ops::Range;
use std::path::Path;

/// How many times a short read is retried before giving up with `Eof`.
pub const MAX_READ_ATTEMPTS: usize = 10;

/// The origin of a seek.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Whence {
    Set,
    Cur,
    End,
}

/// The capability contract every data source or sink must satisfy.
///
/// Read and write may be partial; callers that need a full buffer use
/// [`read_total`] and [`write_total`].
pub trait IoInterface {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, NitfError>;
    fn write(&mut self, buf: &[u8]) -> Result<usize, NitfError>;
    fn seek(&mut self, whence: Whence, offset: i64) -> Result<u64, NitfError>;
    fn tell(&mut self) -> Result<u64, NitfError>;
    fn size(&mut self) -> Result<u64, NitfError>;
    fn can_seek(&self) -> bool {
        true
    }
    fn close(&mut self) -> Result<(), NitfError> {
        Ok(())
    }
}

/// Fill `buf` completely, retrying short reads up to [`MAX_READ_ATTEMPTS`].
pub fn read_total(io: &mut dyn IoInterface, buf: &mut [u8]) -> Result<(), NitfError> {
    let mut done = 0;
    let mut attempts = 0;
    while done < buf.len() {
        let n = io.read(&mut buf[done..])?;
        if n == 0 {
            attempts += 1;
            if attempts >= MAX_READ_ATTEMPTS {
                return Err(NitfError::Eof);
            }
        } else {
            attempts = 0;
            done += n;
        }
    }
    Ok(())
}

/// Write all of `buf`, retrying short writes up to [`MAX_READ_ATTEMPTS`].
pub fn write_total(io: &mut dyn IoInterface, buf: &[u8]) -> Result<(), NitfError> {
    let mut done = 0;
    let mut attempts = 0;
    while done < buf.len() {
        let n = io.write(&buf[done..])?;
        if n == 0 {
            attempts += 1;
            if attempts >= MAX_READ_ATTEMPTS {
                return Err(NitfError::Eof);
            }
        } else {
            attempts = 0;
            done += n;
        }
    }
    Ok(())
}

/// An [`IoInterface`] over a native file handle.
pub struct FileIo {
    file: File,
}

impl FileIo {
    /// Open an existing file read-only.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, NitfError> {
        Ok(FileIo {
            file: File::open(path)?,
        })
    }

    /// Create a new file for reading and writing. Fails if the file exists.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self, NitfError> {
        let file = std::fs::OpenOptions::new()
            .read(true)
            .write(true)
            .create_new(true)
            .open(path)?;
        Ok(FileIo { file })
    }

    pub fn from_file(file: File) -> Self {
        FileIo { file }
    }

    pub fn into_inner(self) -> File {
        self.file
    }
}

impl IoInterface for FileIo {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, NitfError> {
        Ok(self.file.read(buf)?)
    }

    fn write(&mut self, buf: &[u8]) -> Result<usize, NitfError> {
        Ok(self.file.write(buf)?)
    }

    fn seek(&mut self, whence: Whence, offset: i64) -> Result<u64, NitfError> {
        let from = match whence {
            Whence::Set => SeekFrom::Start(offset as u64),
            Whence::Cur => SeekFrom::Current(offset),
            Whence::End => SeekFrom::End(offset),
        };
        Ok(self.file.seek(from)?)
    }

    fn tell(&mut self) -> Result<u64, NitfError> {
        Ok(self.file.stream_position()?)
    }

    fn size(&mut self) -> Result<u64, NitfError> {
        Ok(self.file.metadata()?.len())
    }

    fn close(&mut self) -> Result<(), NitfError> {
        Ok(self.file.flush()?)
    }
}

/// An [`IoInterface`] over an in-memory byte buffer.
///
/// Reads are always allowed; writes may be restricted to a sub-range of the
/// buffer, or disabled entirely for a read-only view. Writing past the end of
/// a growable buffer extends it.
///
/// ```
/// use nitf_core::io::{BufferIo, IoInterface, Whence};
///
/// let mut io = BufferIo::new(b"NITF02.10".to_vec());
/// let mut magic = [0u8; 4];
/// io.read(&mut magic).unwrap();
/// assert_eq!(&magic, b"NITF");
/// assert_eq!(io.tell().unwrap(), 4);
/// io.seek(Whence::End, -5).unwrap();
/// let mut ver = [0u8; 5];
/// io.read(&mut ver).unwrap();
/// assert_eq!(&ver, b"02.10");
/// ```
#[derive(Debug)]
pub struct BufferIo {
    data: Vec<u8>,
    pos: usize,
    writable: Option<Range<usize>>,
    growable: bool,
}

impl BufferIo {
    /// A growable read/write buffer, starting from existing content.
    pub fn new(data: Vec<u8>) -> Self {
        BufferIo {
            data,
            pos: 0,
            writable: None,
            growable: true,
        }
    }

    /// An empty growable buffer for writing a new file.
    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    /// A fixed-size buffer where only `writable` may be overwritten.
    pub fn with_writable_range(data: Vec<u8>, writable: Range<usize>) -> Self {
        BufferIo {
            data,
            pos: 0,
            writable: Some(writable),
            growable: false,
        }
    }

    /// A read-only view of existing bytes.
    pub fn read_only(data: Vec<u8>) -> Self {
        BufferIo {
            data,
            pos: 0,
            writable: Some(0..0),
            growable: false,
        }
    }

    pub fn into_inner(self) -> Vec<u8> {
        self.data
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }
}

impl IoInterface for BufferIo {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, NitfError> {
        if self.pos >= self.data.len() {
            return Err(NitfError::Eof);
        }
        let n = buf.len().min(self.data.len() - self.pos);
        buf[..n].copy_from_slice(&self.data[self.pos..self.pos + n]);
        self.pos += n;
        Ok(n)
    }

    fn write(&mut self, buf: &[u8]) -> Result<usize, NitfError> {
        if let Some(range) = &self.writable {
            if self.pos < range.start || self.pos + buf.len() > range.end {
                return Err(NitfError::StdIoError(std::io::Error::new(
                    std::io::ErrorKind::PermissionDenied,
                    "write outside the writable range of the buffer",
                )));
            }
        }
        let end = self.pos + buf.len();
        if end > self.data.len() {
            if !self.growable {
                return Err(NitfError::Eof);
            }
            self.data.resize(end, 0);
        }
        self.data[self.pos..end].copy_from_slice(buf);
        self.pos = end;
        Ok(buf.len())
    }

    fn seek(&mut self, whence: Whence, offset: i64) -> Result<u64, NitfError> {
        let base = match whence {
            Whence::Set => 0i64,
            Whence::Cur => self.pos as i64,
            Whence::End => self.data.len() as i64,
        };
        let target = base + offset;
        if target < 0 {
            return Err(NitfError::StdIoError(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "seek before start of buffer",
            )));
        }
        self.pos = target as usize;
        Ok(self.pos as u64)
    }

    fn tell(&mut self) -> Result<u64, NitfError> {
        Ok(self.pos as u64)
    }

    fn size(&mut self) -> Result<u64, NitfError> {
        Ok(self.data.len() as u64)
    }
}

/// An adapter that turns any `Read + Write + Seek` stream into an
/// [`IoInterface`].
pub struct StreamIo<T> {
    inner: T,
}

impl<T: Read + Write + Seek> StreamIo<T> {
    pub fn new(inner: T) -> Self {
        StreamIo { inner }
    }

    pub fn into_inner(self) -> T {
        self.inner
    }
}

impl<T: Read + Write + Seek> IoInterface for StreamIo<T> {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, NitfError> {
        Ok(self.inner.read(buf)?)
    }

    fn write(&mut self, buf: &[u8]) -> Result<usize, NitfError> {
        Ok(self.inner.write(buf)?)
    }

    fn seek(&mut self, whence: Whence, offset: i64) -> Result<u64, NitfError> {
        let from = match whence {
            Whence::Set => SeekFrom::Start(offset as u64),
            Whence::Cur => SeekFrom::Current(offset),
            Whence::End => SeekFrom::End(offset),
        };
        Ok(self.inner.seek(from)?)
    }

    fn tell(&mut self) -> Result<u64, NitfError> {
        Ok(self.inner.stream_position()?)
    }

    fn size(&mut self) -> Result<u64, NitfError> {
        let pos = self.inner.stream_position()?;
        let end = self.inner.seek(SeekFrom::End(0))?;
        self.inner.seek(SeekFrom::Start(pos))?;
        Ok(end)
    }

    fn close(&mut self) -> Result<(), NitfError> {
        Ok(self.inner.flush()?)
    }
}
