//! This file contains the definition of the NITF file header.
//!
//! The file header opens the file with the version string, file level
//! metadata, the security group, and one length pair per segment declared in
//! the file. The length pairs are what the parser prefix-sums to find every
//! segment, and what the writer fixes up after the forward pass.
use crate::enums::{CharClass, SegmentKind, Version};
use crate::errors::*;
use crate::field::Field;
use crate::security::FileSecurity;
use crate::tre::Extensions;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// The per-segment length pair from the file header: the subheader length
/// and the data length, in bytes.
#[derive(Debug, Clone, PartialEq)]
pub struct ComponentInfo {
    /// LISH / LSSH / LLSH / LTSH / LDSH / LRESH.
    pub subheader_length: Field,
    /// LI / LS / LL / LT / LD / LRE.
    pub data_length: Field,
}

impl ComponentInfo {
    /// Create a zeroed pair with the field widths of the given segment kind.
    pub fn new(kind: SegmentKind) -> Self {
        let (sub_len, data_len) = Self::field_widths(kind);
        ComponentInfo {
            subheader_length: Field::new(sub_len, CharClass::BcsN),
            data_length: Field::new(data_len, CharClass::BcsN),
        }
    }

    /// The (subheader, data) length field widths per segment kind. These are
    /// identical across versions.
    pub fn field_widths(kind: SegmentKind) -> (usize, usize) {
        match kind {
            SegmentKind::Image => (6, 10),
            SegmentKind::Graphic => (4, 6),
            SegmentKind::Label => (4, 3),
            SegmentKind::Text => (4, 5),
            SegmentKind::DataExtension => (4, 9),
            SegmentKind::ReservedExtension => (4, 7),
            SegmentKind::FileHeader => (0, 0),
        }
    }

    pub fn subheader_len(&self) -> Result<u32, NitfError> {
        Ok(self.subheader_length.as_u64()? as u32)
    }

    pub fn data_len(&self) -> Result<u64, NitfError> {
        self.data_length.as_u64()
    }

    pub fn set_lengths(&mut self, subheader: u64, data: u64) -> Result<(), NitfError> {
        self.subheader_length.set_uint(subheader)?;
        self.data_length.set_uint(data)
    }
}

/// The parsed file header of a NITF record.
///
/// All fields hold their exact on-disk bytes; field widths follow the
/// version the header was constructed for.
#[derive(Debug, Clone, PartialEq)]
pub struct FileHeader {
    /// FHDR (4): `NITF` or `NSIF`.
    pub file_part_type: Field,
    /// FVER (5): `02.00`, `02.10` or `01.00`.
    pub file_version: Field,
    /// CLEVEL (2): complexity level.
    pub complexity_level: Field,
    /// STYPE (4): standard type, `BF01` for 2.1/NSIF.
    pub system_type: Field,
    /// OSTAID (10): originating station.
    pub origin_station_id: Field,
    /// FDT (14): file date and time.
    pub file_date_time: Field,
    /// FTITLE (80).
    pub file_title: Field,
    /// The file security group (FS fields).
    pub security: FileSecurity,
    /// FSCOP (5): copy number.
    pub file_copy_number: Field,
    /// FSCPYS (5): number of copies.
    pub file_num_copies: Field,
    /// ENCRYP (1).
    pub encrypted: Field,
    /// FBKGC (3, binary, 2.1/NSIF only): background colour.
    pub background_color: Field,
    /// ONAME: originator name, 24 bytes in 2.1 and 27 in 2.0.
    pub originator_name: Field,
    /// OPHONE (18): originator phone.
    pub originator_phone: Field,
    /// FL (12): total file length.
    pub file_length: Field,
    /// HL (6): file header length.
    pub header_length: Field,
    /// One entry per image segment (NUMI / LISHn / LIn).
    pub image_info: Vec<ComponentInfo>,
    /// One entry per graphic (symbol) segment (NUMS / LSSHn / LSn).
    pub graphic_info: Vec<ComponentInfo>,
    /// One entry per label segment (NUML / LLSHn / LLn, 2.0 only).
    pub label_info: Vec<ComponentInfo>,
    /// One entry per text segment (NUMT / LTSHn / LTn).
    pub text_info: Vec<ComponentInfo>,
    /// One entry per DES (NUMDES / LDSHn / LDn).
    pub data_extension_info: Vec<ComponentInfo>,
    /// One entry per RES (NUMRES / LRESHn / LREn).
    pub reserved_extension_info: Vec<ComponentInfo>,
    /// UDHOFL (3): overflow DES index of the user-defined section.
    pub user_defined_overflow: Field,
    /// The user-defined header section (UDHD).
    pub user_defined: Extensions,
    /// XHDOFL (3): overflow DES index of the extended section.
    pub extended_overflow: Field,
    /// The extended header section (XHD).
    pub extended: Extensions,
}

impl FileHeader {
    /// Create a blank header for the given version, with the version string
    /// and the version dependent field widths already in place.
    pub fn new(version: Version) -> Self {
        let magic = version.magic();
        let mut file_part_type = Field::new(4, CharClass::BcsA);
        let mut file_version = Field::new(5, CharClass::BcsA);
        // The magic is valid BCS-A of the right widths.
        file_part_type.set_string(&magic[..4]).expect("static magic");
        file_version.set_string(&magic[4..]).expect("static magic");
        let oname_len = if version.is_legacy() { 27 } else { 24 };
        let fbkgc_len = if version.is_legacy() { 0 } else { 3 };

        FileHeader {
            file_part_type,
            file_version,
            complexity_level: Field::new(2, CharClass::BcsN),
            system_type: Field::new(4, CharClass::BcsA),
            origin_station_id: Field::new(10, CharClass::BcsA),
            // Letters appear in the 2.0 date layout, so the class is BCS-A.
            file_date_time: Field::new(14, CharClass::BcsA),
            file_title: Field::new(80, CharClass::BcsA),
            security: FileSecurity::new(version),
            file_copy_number: Field::new(5, CharClass::BcsN),
            file_num_copies: Field::new(5, CharClass::BcsN),
            encrypted: Field::new(1, CharClass::BcsN),
            background_color: Field::new(fbkgc_len, CharClass::Binary),
            originator_name: Field::new(oname_len, CharClass::BcsA),
            originator_phone: Field::new(18, CharClass::BcsA),
            file_length: Field::new(12, CharClass::BcsN),
            header_length: Field::new(6, CharClass::BcsN),
            image_info: Vec::new(),
            graphic_info: Vec::new(),
            label_info: Vec::new(),
            text_info: Vec::new(),
            data_extension_info: Vec::new(),
            reserved_extension_info: Vec::new(),
            user_defined_overflow: Field::new(3, CharClass::BcsN),
            user_defined: Extensions::new(),
            extended_overflow: Field::new(3, CharClass::BcsN),
            extended: Extensions::new(),
        }
    }

    /// Set the file date-time, emitting the layout of this header's version.
    pub fn set_date_time(&mut self, dt: &crate::datetime::NitfDateTime) -> Result<(), NitfError> {
        let version = self.version()?;
        self.file_date_time.set_string(&dt.format(version))
    }

    /// The parsed file date-time, accepting either legacy layout.
    pub fn date_time(&self) -> Result<crate::datetime::NitfDateTime, NitfError> {
        crate::datetime::NitfDateTime::parse(&self.file_date_time.as_string())
    }

    /// The version recorded in the first nine bytes.
    pub fn version(&self) -> Result<Version, NitfError> {
        let mut magic = [0u8; 9];
        magic[..4].copy_from_slice(self.file_part_type.raw());
        magic[4..].copy_from_slice(self.file_version.raw());
        Version::from_magic(&magic)
    }

    /// The encoded size of the header in bytes, counting every conditional
    /// field in its current state.
    pub fn byte_len(&self) -> Result<usize, NitfError> {
        let version = self.version()?;
        let mut len = 0usize;
        len += 4 + 5 + 2 + 4 + 10 + 14 + 80;
        len += self.security.byte_len(version);
        len += 5 + 5 + 1;
        len += self.background_color.len();
        len += self.originator_name.len() + 18;
        len += 12 + 6;
        for (info, _) in [
            (&self.image_info, SegmentKind::Image),
            (&self.graphic_info, SegmentKind::Graphic),
            (&self.label_info, SegmentKind::Label),
            (&self.text_info, SegmentKind::Text),
            (&self.data_extension_info, SegmentKind::DataExtension),
            (&self.reserved_extension_info, SegmentKind::ReservedExtension),
        ] {
            len += 3;
            for entry in info.iter() {
                len += entry.subheader_length.len() + entry.data_length.len();
            }
        }
        len += crate::tre::extensions::section_byte_len(&self.user_defined, &self.user_defined_overflow);
        len += crate::tre::extensions::section_byte_len(&self.extended, &self.extended_overflow);
        Ok(len)
    }
}

/// A typed, owned-string view of the file header for display and
/// serialisation.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ReadableFileHeader {
    pub version: String,
    pub complexity_level: u64,
    pub system_type: String,
    pub origin_station_id: String,
    pub file_date_time: String,
    pub file_title: String,
    pub classification: String,
    pub file_length: u64,
    pub header_length: u64,
    pub image_segments: usize,
    pub graphic_segments: usize,
    pub label_segments: usize,
    pub text_segments: usize,
    pub data_extension_segments: usize,
    pub reserved_extension_segments: usize,
}

impl FileHeader {
    /// Convert the header to a rust readable view.
    pub fn to_readable(&self) -> Result<ReadableFileHeader, NitfError> {
        Ok(ReadableFileHeader {
            version: self.version()?.magic().to_string(),
            complexity_level: self.complexity_level.as_u64()?,
            system_type: self.system_type.as_string(),
            origin_station_id: self.origin_station_id.as_string(),
            file_date_time: self.file_date_time.as_string(),
            file_title: self.file_title.as_string(),
            classification: self.security.classification.as_string(),
            file_length: self.file_length.as_u64()?,
            header_length: self.header_length.as_u64()?,
            image_segments: self.image_info.len(),
            graphic_segments: self.graphic_info.len(),
            label_segments: self.label_info.len(),
            text_segments: self.text_info.len(),
            data_extension_segments: self.data_extension_info.len(),
            reserved_extension_segments: self.reserved_extension_info.len(),
        })
    }

    #[cfg(feature = "to_json")]
    pub fn to_json(&self) -> Result<String, NitfError> {
        serde_json::to_string(&self.to_readable()?).map_err(|e| NitfError::Parse {
            field: "file header".to_string(),
            value: e.to_string(),
        })
    }
}

impl std::fmt::Display for FileHeader {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(
            f,
            "version: {}{}
origin station: {}
date time: {}
title: {}
classification: {}
file length: {}
header length: {}
segments (I/S/L/T/DES/RES): {}/{}/{}/{}/{}/{}",
            self.file_part_type,
            self.file_version,
            self.origin_station_id.as_string(),
            self.file_date_time.as_string(),
            self.file_title.as_string(),
            self.security.classification,
            self.file_length.as_string(),
            self.header_length.as_string(),
            self.image_info.len(),
            self.graphic_info.len(),
            self.label_info.len(),
            self.text_info.len(),
            self.data_extension_info.len(),
            self.reserved_extension_info.len(),
        )
    }
}
