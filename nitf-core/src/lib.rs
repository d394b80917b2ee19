//! This library is the foundation for the `nitf-in` and `nitf-out` crates. It
//! holds the field primitives, the record model, the TRE system, the I/O
//! abstraction and the block geometry that both the parser and the writer are
//! built on. It can be built either with serialization support, or in a
//! slightly more lightweight manner without it (see features).
#![allow(clippy::derive_partial_eq_without_eq)]
extern crate fnv;
extern crate log;
extern crate num;
#[macro_use]
extern crate num_derive;

#[cfg(any(feature = "to_json", feature = "serde"))]
extern crate serde;
#[cfg(feature = "to_json")]
extern crate serde_json;

pub mod bits;
pub mod blocking;
pub mod byteswap;
pub mod datetime;
pub mod enums;
pub mod errors;
pub mod field;
pub mod file_header;
pub mod geo;
pub mod image_subheader;
pub mod io;
pub mod plugin;
pub mod security;
pub mod settings;
pub mod subheaders;
pub mod tre;
#[cfg(test)]
mod tests;

pub use errors::NitfError;

pub use blocking::{BlockGeometry, DownSampler, MaskTable, SubWindow, MASK_PAD_SENTINEL};
pub use enums::*;
pub use field::Field;
pub use file_header::{ComponentInfo, FileHeader};
pub use image_subheader::{BandInfo, ImageSubheader};
pub use security::FileSecurity;
pub use settings::{NitfSettings, ParseWarning};
pub use subheaders::{DeSubheader, GraphicSubheader, LabelSubheader, ReSubheader, TextSubheader};
pub use tre::{Extensions, Tre};

/// The width of the version string at the start of the file (FHDR + FVER).
pub const MAGIC_LEN: usize = 9;
/// The capacity of a five digit extension section length field.
pub const SECTION_CAPACITY: usize = 99_999;
/// The width of an extension section overflow index field.
pub const OVERFLOW_FIELD_LEN: usize = 3;

/// Where the payload bytes of a segment live.
///
/// Segments parsed from a file keep their payload on disk as a byte range;
/// segments built in memory carry their payload directly. `Empty` is for
/// segments with no data (a zero length DES, for instance).
#[derive(Debug, Clone, PartialEq)]
pub enum SegmentData {
    /// Payload bytes `start..end` of the source interface.
    OnDisk { start: u64, end: u64 },
    /// Payload owned in memory.
    InMemory(Vec<u8>),
    Empty,
}

impl SegmentData {
    /// The payload length in bytes.
    pub fn len(&self) -> u64 {
        match self {
            SegmentData::OnDisk { start, end } => end - start,
            SegmentData::InMemory(data) => data.len() as u64,
            SegmentData::Empty => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// One segment of a record: its subheader plus the location of its payload.
#[derive(Debug, Clone, PartialEq)]
pub struct Segment<S> {
    pub subheader: S,
    pub data: SegmentData,
}

impl<S> Segment<S> {
    pub fn new(subheader: S) -> Self {
        Segment {
            subheader,
            data: SegmentData::Empty,
        }
    }

    pub fn with_data(subheader: S, data: SegmentData) -> Self {
        Segment { subheader, data }
    }
}

pub type ImageSegment = Segment<ImageSubheader>;
pub type GraphicSegment = Segment<GraphicSubheader>;
pub type LabelSegment = Segment<LabelSubheader>;
pub type TextSegment = Segment<TextSubheader>;
pub type DeSegment = Segment<DeSubheader>;
pub type ReSegment = Segment<ReSubheader>;

/// A complete in-memory NITF record: the file header plus the ordered
/// segment lists.
///
/// The record owns its subheaders and extension sections exclusively. The
/// counts in the file header are kept coherent by the segment constructors
/// here and by the writer's fixup pass.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub header: FileHeader,
    pub images: Vec<ImageSegment>,
    pub graphics: Vec<GraphicSegment>,
    pub labels: Vec<LabelSegment>,
    pub texts: Vec<TextSegment>,
    pub data_extensions: Vec<DeSegment>,
    pub reserved_extensions: Vec<ReSegment>,
}

impl Record {
    /// Create an empty record for the given version.
    ///
    /// ```
    /// use nitf_core::enums::Version;
    /// use nitf_core::Record;
    ///
    /// let record = Record::new(Version::Nitf21);
    /// assert_eq!(record.version().unwrap(), Version::Nitf21);
    /// assert!(record.images.is_empty());
    /// ```
    pub fn new(version: Version) -> Self {
        Record {
            header: FileHeader::new(version),
            images: Vec::new(),
            graphics: Vec::new(),
            labels: Vec::new(),
            texts: Vec::new(),
            data_extensions: Vec::new(),
            reserved_extensions: Vec::new(),
        }
    }

    /// The version recorded in the file header.
    pub fn version(&self) -> Result<Version, NitfError> {
        self.header.version()
    }

    /// Append a new image segment, keeping the header's length table in
    /// step. Returns a mutable reference to the new segment.
    pub fn new_image_segment(&mut self) -> Result<&mut ImageSegment, NitfError> {
        let version = self.version()?;
        self.header.image_info.push(ComponentInfo::new(SegmentKind::Image));
        self.images.push(Segment::new(ImageSubheader::new(version)));
        Ok(self.images.last_mut().expect("just added"))
    }

    /// Append a new graphic segment.
    pub fn new_graphic_segment(&mut self) -> Result<&mut GraphicSegment, NitfError> {
        let version = self.version()?;
        self.header
            .graphic_info
            .push(ComponentInfo::new(SegmentKind::Graphic));
        self.graphics
            .push(Segment::new(GraphicSubheader::new(version)));
        Ok(self.graphics.last_mut().expect("just added"))
    }

    /// Append a new label segment. Labels only exist in NITF 2.0.
    pub fn new_label_segment(&mut self) -> Result<&mut LabelSegment, NitfError> {
        if !self.version()?.is_legacy() {
            return Err(NitfError::InvalidArgument {
                msg: "label segments only exist in NITF 2.0".to_string(),
            });
        }
        self.header.label_info.push(ComponentInfo::new(SegmentKind::Label));
        self.labels.push(Segment::new(LabelSubheader::new()));
        Ok(self.labels.last_mut().expect("just added"))
    }

    /// Append a new text segment.
    pub fn new_text_segment(&mut self) -> Result<&mut TextSegment, NitfError> {
        let version = self.version()?;
        self.header.text_info.push(ComponentInfo::new(SegmentKind::Text));
        self.texts.push(Segment::new(TextSubheader::new(version)));
        Ok(self.texts.last_mut().expect("just added"))
    }

    /// Append a new data extension segment.
    pub fn new_data_extension_segment(&mut self) -> Result<&mut DeSegment, NitfError> {
        let version = self.version()?;
        self.header
            .data_extension_info
            .push(ComponentInfo::new(SegmentKind::DataExtension));
        self.data_extensions
            .push(Segment::new(DeSubheader::new(version)));
        Ok(self.data_extensions.last_mut().expect("just added"))
    }

    /// Append a new reserved extension segment.
    pub fn new_reserved_extension_segment(&mut self) -> Result<&mut ReSegment, NitfError> {
        let version = self.version()?;
        self.header
            .reserved_extension_info
            .push(ComponentInfo::new(SegmentKind::ReservedExtension));
        self.reserved_extensions
            .push(Segment::new(ReSubheader::new(version)));
        Ok(self.reserved_extensions.last_mut().expect("just added"))
    }

    /// Check the structural invariants a record must satisfy before it can
    /// be written: counts in step with segment lists, labels only under 2.0,
    /// and every nonzero attachment level matching some display level.
    pub fn validate(&self) -> Result<(), NitfError> {
        let structural = |msg: String| Err(NitfError::Structural { msg });
        let version = self.version()?;

        if self.header.image_info.len() != self.images.len()
            || self.header.graphic_info.len() != self.graphics.len()
            || self.header.label_info.len() != self.labels.len()
            || self.header.text_info.len() != self.texts.len()
            || self.header.data_extension_info.len() != self.data_extensions.len()
            || self.header.reserved_extension_info.len() != self.reserved_extensions.len()
        {
            return structural("header length tables disagree with segment lists".to_string());
        }
        if !version.is_legacy() && !self.labels.is_empty() {
            return structural("label segments are not allowed in NITF 2.1/NSIF".to_string());
        }

        // Every nonzero attachment level must name the display level of
        // another segment, so that compositing has a topological order.
        let mut display_levels = Vec::new();
        for image in &self.images {
            display_levels.push(image.subheader.display_level.as_u64()?);
        }
        for graphic in &self.graphics {
            display_levels.push(graphic.subheader.display_level.as_u64()?);
        }
        for label in &self.labels {
            display_levels.push(label.subheader.display_level.as_u64()?);
        }
        let mut check_attachment = |level: u64| -> Result<(), NitfError> {
            if level != 0 && !display_levels.contains(&level) {
                return Err(NitfError::Structural {
                    msg: format!("attachment level {} matches no display level", level),
                });
            }
            Ok(())
        };
        for image in &self.images {
            check_attachment(image.subheader.attachment_level.as_u64()?)?;
        }
        for graphic in &self.graphics {
            check_attachment(graphic.subheader.attachment_level.as_u64()?)?;
        }
        for label in &self.labels {
            check_attachment(label.subheader.attachment_level.as_u64()?)?;
        }
        Ok(())
    }
}
