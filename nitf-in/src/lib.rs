//! This is a library for reading NITF files into rust. It parses NITF 2.0,
//! NITF 2.1 and NSIF 1.0 records into a strongly typed [`Record`] and reads
//! arbitrary sub-windows out of blocked, masked, possibly compressed image
//! segments without holding whole files in memory.
//!
//! The library was designed to follow MIL-STD-2500 (NITF) and STANAG 4545
//! (NSIF); field widths and character classes come from those documents,
//! keyed by the version detected in the first nine bytes of the file.
//!
//! Writing NITF files is the job of the `nitf-out` crate.
extern crate fnv;
extern crate memmap2;

mod cache;
pub mod image_read;
pub mod mapped;
pub mod parse;

pub use image_read::ImageReader;
pub use mapped::MappedIo;

pub use nitf_core::enums;
pub use nitf_core::errors::*;
pub use nitf_core::{NitfSettings, ParseWarning, Record, SubWindow};

use nitf_core::io::{read_total, BufferIo, FileIo, IoInterface, Whence};
use nitf_core::SegmentData;

/// A structure which represents an opened NITF file.
///
/// The structure contains:
///
/// - The I/O interface the file is read through.
///
/// - The parsed [`Record`] with every subheader and TRE materialised.
///
/// - The warnings collected if the file was opened in best-effort mode.
///
/// NB: The subheaders are parsed eagerly, but segment payloads stay on the
/// interface and are only read when asked for.
#[derive(Debug)]
pub struct NitfFile<I: IoInterface> {
    io: I,
    record: Record,
    warnings: Vec<ParseWarning>,
    settings: NitfSettings,
}

impl NitfFile<FileIo> {
    /// Open a NITF file from a path with the given settings.
    ///
    /// ```no_run
    /// use nitf_in::NitfFile;
    ///
    /// let file = NitfFile::open("scene.ntf", Default::default()).unwrap();
    /// println!("{} image segments", file.record().images.len());
    /// ```
    pub fn open(file_name: &str, settings: NitfSettings) -> Result<Self, NitfError> {
        Self::from_io(FileIo::open(file_name)?, settings)
    }
}

impl NitfFile<MappedIo> {
    /// Open a NITF file through a read-only memory map.
    pub fn open_mapped(file_name: &str, settings: NitfSettings) -> Result<Self, NitfError> {
        Self::from_io(MappedIo::open(file_name)?, settings)
    }
}

impl NitfFile<BufferIo> {
    /// Parse a NITF record held in a byte buffer.
    pub fn from_bytes(bytes: Vec<u8>, settings: NitfSettings) -> Result<Self, NitfError> {
        Self::from_io(BufferIo::new(bytes), settings)
    }
}

impl<I: IoInterface> NitfFile<I> {
    /// Parse a record from any [`IoInterface`].
    pub fn from_io(mut io: I, settings: NitfSettings) -> Result<Self, NitfError> {
        let (record, warnings) = parse::read_record(&mut io, &settings)?;
        Ok(NitfFile {
            io,
            record,
            warnings,
            settings,
        })
    }

    /// The parsed record.
    pub fn record(&self) -> &Record {
        &self.record
    }

    /// Mutable access to the record, for edit-then-rewrite workflows.
    pub fn record_mut(&mut self) -> &mut Record {
        &mut self.record
    }

    /// The warnings collected during a best-effort parse. Empty after a
    /// strict parse.
    pub fn warnings(&self) -> &[ParseWarning] {
        &self.warnings
    }

    pub fn settings(&self) -> &NitfSettings {
        &self.settings
    }

    /// The detected file version.
    pub fn version(&self) -> Result<nitf_core::Version, NitfError> {
        self.record.version()
    }

    /// Build an [`ImageReader`] over the image segment at `index`. The
    /// reader owns the segment's mask table and block cache, so it should
    /// be reused across reads of the same segment.
    pub fn image_reader(&mut self, index: usize) -> Result<ImageReader<'_>, NitfError> {
        let segment = self.record.images.get(index).ok_or_else(|| {
            NitfError::InvalidArgument {
                msg: format!("no image segment at index {}", index),
            }
        })?;
        let (start, len) = match &segment.data {
            SegmentData::OnDisk { start, end } => (*start, end - start),
            _ => {
                return Err(NitfError::InvalidArgument {
                    msg: "image segment has no on-disk payload".to_string(),
                })
            }
        };
        ImageReader::new(&mut self.io, &segment.subheader, start, len, &self.settings)
    }

    /// Read a sub-window of an image segment into a band-interleaved
    /// buffer. For repeated reads of one segment prefer [`Self::image_reader`],
    /// which keeps its block cache between calls.
    pub fn read_image(&mut self, index: usize, window: &SubWindow) -> Result<Vec<u8>, NitfError> {
        self.image_reader(index)?.read(window)
    }

    /// Read a sub-window of an image segment into a band-sequential buffer.
    pub fn read_image_band_sequential(
        &mut self,
        index: usize,
        window: &SubWindow,
    ) -> Result<Vec<u8>, NitfError> {
        self.image_reader(index)?.read_band_sequential(window)
    }

    /// Read the raw payload bytes of a text segment.
    pub fn read_text_data(&mut self, index: usize) -> Result<Vec<u8>, NitfError> {
        let data = self
            .record
            .texts
            .get(index)
            .map(|s| s.data.clone())
            .ok_or_else(|| NitfError::InvalidArgument {
                msg: format!("no text segment at index {}", index),
            })?;
        self.read_segment_data(&data)
    }

    /// Read the raw payload bytes of a graphic segment.
    pub fn read_graphic_data(&mut self, index: usize) -> Result<Vec<u8>, NitfError> {
        let data = self
            .record
            .graphics
            .get(index)
            .map(|s| s.data.clone())
            .ok_or_else(|| NitfError::InvalidArgument {
                msg: format!("no graphic segment at index {}", index),
            })?;
        self.read_segment_data(&data)
    }

    /// Read the raw payload bytes of a data extension segment.
    pub fn read_de_data(&mut self, index: usize) -> Result<Vec<u8>, NitfError> {
        let data = self
            .record
            .data_extensions
            .get(index)
            .map(|s| s.data.clone())
            .ok_or_else(|| NitfError::InvalidArgument {
                msg: format!("no data extension segment at index {}", index),
            })?;
        self.read_segment_data(&data)
    }

    /// Read any segment payload, wherever it lives.
    pub fn read_segment_data(&mut self, data: &SegmentData) -> Result<Vec<u8>, NitfError> {
        match data {
            SegmentData::OnDisk { start, end } => {
                self.io.seek(Whence::Set, *start as i64)?;
                let mut buf = vec![0u8; (end - start) as usize];
                read_total(&mut self.io, &mut buf)?;
                Ok(buf)
            }
            SegmentData::InMemory(bytes) => Ok(bytes.clone()),
            SegmentData::Empty => Ok(Vec::new()),
        }
    }

    /// This function gets all the fields of the open file and discards the
    /// instance. Used to take ownership of the record and interface.
    pub fn deconstruct(self) -> (Record, I, Vec<ParseWarning>) {
        let NitfFile {
            io,
            record,
            warnings,
            ..
        } = self;
        (record, io, warnings)
    }
}
