//! This is a library for writing NITF files from rust. It serialises a
//! [`Record`] built in memory (or parsed by `nitf-in` and edited) back to
//! bit-exact NITF 2.0, NITF 2.1 or NSIF 1.0, and assembles image segment
//! payloads from user pixel buffers.
//!
//! The writer makes one forward pass over the declared segments and then
//! fixes the file header's lengths, counts and offsets in place, so a
//! consistent record writes identically every time.
extern crate log;
#[macro_use]
extern crate tinyvec;
#[cfg(test)]
extern crate nitf_in;
#[cfg(test)]
extern crate tempfile;

#[cfg(test)]
mod integration_tests;
pub mod utils;
pub mod write_data;
pub mod write_headers;

pub use write_data::{pack_image, pack_image_band_sequential, pack_image_with_pad};
pub use write_headers::NitfHeaderToBytes;

pub use nitf_core::enums;
pub use nitf_core::errors::*;
pub use nitf_core::{NitfSettings, Record, SegmentData};

use nitf_core::io::{read_total, write_total, BufferIo, FileIo, IoInterface, Whence};
use std::path::Path;

/// A writer that serialises records onto an [`IoInterface`].
///
/// ```
/// use nitf_core::enums::Version;
/// use nitf_core::Record;
/// use nitf_out::NitfWriter;
///
/// let mut record = Record::new(Version::Nitf21);
/// let mut writer = NitfWriter::in_memory();
/// writer.write_record(&mut record, None).unwrap();
/// // An empty 2.1 record is exactly its 388 byte header.
/// assert_eq!(writer.into_bytes().len(), 388);
/// ```
pub struct NitfWriter<I: IoInterface> {
    io: I,
}

impl NitfWriter<FileIo> {
    /// Create a new file to write a record into. Fails if the file exists.
    pub fn create_file<P: AsRef<Path>>(path: P) -> Result<Self, NitfError> {
        Ok(NitfWriter {
            io: FileIo::create(path)?,
        })
    }
}

impl NitfWriter<BufferIo> {
    /// Write into a growable in-memory buffer.
    pub fn in_memory() -> Self {
        NitfWriter {
            io: BufferIo::empty(),
        }
    }

    /// The written bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.io.into_inner()
    }
}

impl<I: IoInterface> NitfWriter<I> {
    pub fn new(io: I) -> Self {
        NitfWriter { io }
    }

    pub fn into_inner(self) -> I {
        self.io
    }

    /// Serialise a record.
    ///
    /// The record is validated, oversized extension sections are merged
    /// into overflow DES segments, and the header's counts, lengths and
    /// component tables are updated to match what was actually written.
    /// Segments whose payload still lives in another file are copied
    /// through `source`.
    ///
    /// The write happens in one forward pass; re-writing the file header
    /// with the final lengths is the last operation, so a failure part way
    /// leaves no file that parses as complete.
    pub fn write_record(
        &mut self,
        record: &mut Record,
        mut source: Option<&mut dyn IoInterface>,
    ) -> Result<(), NitfError> {
        let version = record.version()?;
        utils::apply_overflow(record)?;
        record.validate()?;

        // Placeholder pass: zero lengths, real counts. The header size does
        // not depend on the values, only on the schema, so the fixup can
        // overwrite it in place.
        record.header.file_length.set_uint(0u64)?;
        record.header.header_length.set_uint(0u64)?;
        for info in record
            .header
            .image_info
            .iter_mut()
            .chain(record.header.graphic_info.iter_mut())
            .chain(record.header.label_info.iter_mut())
            .chain(record.header.text_info.iter_mut())
            .chain(record.header.data_extension_info.iter_mut())
            .chain(record.header.reserved_extension_info.iter_mut())
        {
            info.set_lengths(0, 0)?;
        }

        self.io.seek(Whence::Set, 0)?;
        let header_bytes = record.header.as_bytes(version)?;
        write_total(&mut self.io, &header_bytes)?;
        let header_length = header_bytes.len() as u64;
        let mut total = header_length;

        // Forward pass over the segments in declared order. Each closure
        // returns (subheader length, data length) actually written.
        let mut written: Vec<(usize, (u64, u64))> = Vec::new();
        macro_rules! write_segments {
            ($list:expr, $table:literal) => {
                for segment in $list.iter() {
                    let sub_bytes = segment.subheader.as_bytes(version)?;
                    write_total(&mut self.io, &sub_bytes)?;
                    let reborrowed_source: Option<&mut dyn IoInterface> = match source {
                        Some(ref mut s) => Some(&mut **s),
                        None => None,
                    };
                    let data_len = copy_segment_data(
                        &mut self.io,
                        &segment.data,
                        reborrowed_source,
                    )?;
                    total += sub_bytes.len() as u64 + data_len;
                    written.push(($table, (sub_bytes.len() as u64, data_len)));
                }
            };
        }
        write_segments!(record.images, 0);
        write_segments!(record.graphics, 1);
        write_segments!(record.labels, 2);
        write_segments!(record.texts, 3);
        write_segments!(record.data_extensions, 4);
        write_segments!(record.reserved_extensions, 5);

        // Fixup pass: fill in the real lengths and overwrite the header.
        record.header.file_length.set_uint(total)?;
        record.header.header_length.set_uint(header_length)?;
        let mut cursors = [0usize; 6];
        for (table, (sub_len, data_len)) in written {
            let info = match table {
                0 => &mut record.header.image_info,
                1 => &mut record.header.graphic_info,
                2 => &mut record.header.label_info,
                3 => &mut record.header.text_info,
                4 => &mut record.header.data_extension_info,
                _ => &mut record.header.reserved_extension_info,
            };
            info[cursors[table]].set_lengths(sub_len, data_len)?;
            cursors[table] += 1;
        }

        self.io.seek(Whence::Set, 0)?;
        let final_header = record.header.as_bytes(version)?;
        if final_header.len() as u64 != header_length {
            return Err(NitfError::Structural {
                msg: "file header changed size during fixup".to_string(),
            });
        }
        write_total(&mut self.io, &final_header)?;
        self.io.seek(Whence::Set, total as i64)?;
        Ok(())
    }
}

/// Write a segment payload, copying on-disk ranges through `source`.
fn copy_segment_data(
    io: &mut dyn IoInterface,
    data: &SegmentData,
    source: Option<&mut dyn IoInterface>,
) -> Result<u64, NitfError> {
    match data {
        SegmentData::Empty => Ok(0),
        SegmentData::InMemory(bytes) => {
            write_total(&mut *io, bytes)?;
            Ok(bytes.len() as u64)
        }
        SegmentData::OnDisk { start, end } => {
            let source = source.ok_or_else(|| NitfError::InvalidArgument {
                msg: "segment data lives in a source file, but no source interface was given"
                    .to_string(),
            })?;
            source.seek(Whence::Set, *start as i64)?;
            let mut remaining = end - start;
            let mut buf = vec![0u8; 64 * 1024];
            while remaining > 0 {
                let chunk = remaining.min(buf.len() as u64) as usize;
                read_total(&mut *source, &mut buf[..chunk])?;
                write_total(&mut *io, &buf[..chunk])?;
                remaining -= chunk as u64;
            }
            Ok(end - start)
        }
    }
}
