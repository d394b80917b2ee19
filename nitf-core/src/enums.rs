//! This contains the enums that are used in the file header and the segment subheaders.
//!
//! NITF codes its enumerated header values as fixed-width BCS-A strings rather than
//! binary integers, so unlike most binary formats the conversion here is to and from
//! short ASCII codes. As a general rule the enums below return an error when an
//! unknown code is found, since a file with an unknown code cannot be interpreted
//! further. The exhaustive code tables come from MIL-STD-2500 (NITF 2.0/2.1) and
//! STANAG 4545 (NSIF 1.0).
use num::FromPrimitive;
#[cfg(any(feature = "to_json", feature = "serde"))]
use serde::{Deserialize, Serialize};

use crate::errors::*;

/// CLEVEL: the complexity level of the file, one of the values defined in
/// the standard's complexity tables.
#[derive(Debug, Clone, Copy, PartialEq, FromPrimitive, ToPrimitive)]
#[cfg_attr(
    any(feature = "to_json", feature = "serde"),
    derive(Serialize, Deserialize)
)]
pub enum ComplexityLevel {
    Clevel3 = 3,
    Clevel5 = 5,
    Clevel6 = 6,
    Clevel7 = 7,
    Clevel9 = 9,
}

impl ComplexityLevel {
    pub fn new(source: u16) -> Result<Self, NitfError> {
        ComplexityLevel::from_u16(source).ok_or_else(|| NitfError::ParseEnum {
            f: "ComplexityLevel".to_string(),
            code: source.to_string(),
        })
    }
}

/// The file format version, detected from the first nine bytes of the file.
///
/// NSIF 1.0 is wire-compatible with NITF 2.1 and shares its field width tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(
    any(feature = "to_json", feature = "serde"),
    derive(Serialize, Deserialize)
)]
pub enum Version {
    Nitf20,
    Nitf21,
    Nsif10,
}

impl Version {
    /// Detect the version from the first nine bytes (FHDR + FVER) of a file.
    pub fn from_magic(magic: &[u8]) -> Result<Self, NitfError> {
        match magic {
            b"NITF02.00" => Ok(Version::Nitf20),
            b"NITF02.10" => Ok(Version::Nitf21),
            b"NSIF01.00" => Ok(Version::Nsif10),
            other => Err(NitfError::NotNitf {
                magic: String::from_utf8_lossy(other).to_string(),
            }),
        }
    }

    /// The nine byte version string written at the start of the file.
    pub fn magic(self) -> &'static str {
        match self {
            Version::Nitf20 => "NITF02.00",
            Version::Nitf21 => "NITF02.10",
            Version::Nsif10 => "NSIF01.00",
        }
    }

    /// NSIF 1.0 uses the NITF 2.1 field widths everywhere, so most width
    /// selection only cares whether we are in the legacy layout or not.
    pub fn is_legacy(self) -> bool {
        matches!(self, Version::Nitf20)
    }
}

impl std::fmt::Display for Version {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.magic())
    }
}

/// The character class of a header field, per the Basic Character Set tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(
    any(feature = "to_json", feature = "serde"),
    derive(Serialize, Deserialize)
)]
pub enum CharClass {
    /// BCS alphanumeric: space (0x20) through tilde (0x7E).
    BcsA,
    /// BCS-A extended with line feed, form feed and carriage return.
    BcsAPlus,
    /// BCS numeric: digits and space.
    BcsN,
    /// BCS-N extended with sign, decimal point and slash (dates).
    BcsNPlus,
    /// Opaque bytes; no validation.
    Binary,
}

impl CharClass {
    /// Check whether every byte of `bytes` is legal for this class.
    pub fn validate(self, bytes: &[u8]) -> bool {
        match self {
            CharClass::BcsA => bytes.iter().all(|b| (0x20..=0x7e).contains(b)),
            CharClass::BcsAPlus => bytes
                .iter()
                .all(|b| (0x20..=0x7e).contains(b) || matches!(b, 0x0a | 0x0c | 0x0d)),
            CharClass::BcsN => bytes.iter().all(|b| b.is_ascii_digit() || *b == b' '),
            CharClass::BcsNPlus => bytes
                .iter()
                .all(|b| b.is_ascii_digit() || matches!(b, b' ' | b'+' | b'-' | b'.' | b'/')),
            CharClass::Binary => true,
        }
    }

    /// Numeric classes are right-justified and zero padded; everything else is
    /// left-justified and space padded.
    pub fn is_numeric(self) -> bool {
        matches!(self, CharClass::BcsN | CharClass::BcsNPlus)
    }
}

impl std::fmt::Display for CharClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            CharClass::BcsA => "BCS-A",
            CharClass::BcsAPlus => "BCS-A+",
            CharClass::BcsN => "BCS-N",
            CharClass::BcsNPlus => "BCS-N+",
            CharClass::Binary => "binary",
        };
        write!(f, "{}", name)
    }
}

/// Which part of the file an error or a segment belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(
    any(feature = "to_json", feature = "serde"),
    derive(Serialize, Deserialize)
)]
pub enum SegmentKind {
    FileHeader,
    Image,
    Graphic,
    Label,
    Text,
    DataExtension,
    ReservedExtension,
}

impl std::fmt::Display for SegmentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            SegmentKind::FileHeader => "file header",
            SegmentKind::Image => "image segment",
            SegmentKind::Graphic => "graphic segment",
            SegmentKind::Label => "label segment",
            SegmentKind::Text => "text segment",
            SegmentKind::DataExtension => "data extension segment",
            SegmentKind::ReservedExtension => "reserved extension segment",
        };
        write!(f, "{}", name)
    }
}

/// PVTYPE: how the bits of a pixel are to be interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(
    any(feature = "to_json", feature = "serde"),
    derive(Serialize, Deserialize)
)]
pub enum PixelValueType {
    Int,
    SignedInt,
    Real,
    Complex,
    Bilevel,
}

impl PixelValueType {
    pub fn new(source: &str) -> Result<Self, NitfError> {
        match source.trim_end() {
            "INT" => Ok(Self::Int),
            "SI" => Ok(Self::SignedInt),
            "R" => Ok(Self::Real),
            "C" => Ok(Self::Complex),
            "B" => Ok(Self::Bilevel),
            other => Err(NitfError::ParseEnum {
                f: "PixelValueType".to_string(),
                code: other.to_string(),
            }),
        }
    }

    pub fn code(self) -> &'static str {
        match self {
            Self::Int => "INT",
            Self::SignedInt => "SI",
            Self::Real => "R",
            Self::Complex => "C",
            Self::Bilevel => "B",
        }
    }
}

/// IREP: how the bands of an image relate to each other for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(
    any(feature = "to_json", feature = "serde"),
    derive(Serialize, Deserialize)
)]
pub enum ImageRepresentation {
    Mono,
    Rgb,
    RgbLut,
    Multi,
    NoDisplay,
    NVector,
    Polar,
}

impl ImageRepresentation {
    pub fn new(source: &str) -> Result<Self, NitfError> {
        match source.trim_end() {
            "MONO" => Ok(Self::Mono),
            "RGB" => Ok(Self::Rgb),
            "RGB/LUT" => Ok(Self::RgbLut),
            "MULTI" => Ok(Self::Multi),
            "NODISPLY" => Ok(Self::NoDisplay),
            "NVECTOR" => Ok(Self::NVector),
            "POLAR" => Ok(Self::Polar),
            other => Err(NitfError::ParseEnum {
                f: "ImageRepresentation".to_string(),
                code: other.to_string(),
            }),
        }
    }

    pub fn code(self) -> &'static str {
        match self {
            Self::Mono => "MONO",
            Self::Rgb => "RGB",
            Self::RgbLut => "RGB/LUT",
            Self::Multi => "MULTI",
            Self::NoDisplay => "NODISPLY",
            Self::NVector => "NVECTOR",
            Self::Polar => "POLAR",
        }
    }
}

/// IMODE: the on-disk arrangement of bands within and across blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(
    any(feature = "to_json", feature = "serde"),
    derive(Serialize, Deserialize)
)]
pub enum ImageMode {
    /// `B`: band sequential, all blocks of one band before the next band.
    BlockInterleave,
    /// `P`: bands interleaved per pixel within each block.
    PixelInterleave,
    /// `R`: bands interleaved per row within each block.
    RowInterleave,
    /// `S`: band sequential with an independent block mask per band.
    BandSequential,
}

impl ImageMode {
    pub fn new(source: &str) -> Result<Self, NitfError> {
        match source.trim_end() {
            "B" => Ok(Self::BlockInterleave),
            "P" => Ok(Self::PixelInterleave),
            "R" => Ok(Self::RowInterleave),
            "S" => Ok(Self::BandSequential),
            other => Err(NitfError::ParseEnum {
                f: "ImageMode".to_string(),
                code: other.to_string(),
            }),
        }
    }

    pub fn code(self) -> &'static str {
        match self {
            Self::BlockInterleave => "B",
            Self::PixelInterleave => "P",
            Self::RowInterleave => "R",
            Self::BandSequential => "S",
        }
    }

    /// In modes P and R a block carries every band; in B and S a block carries
    /// exactly one band.
    pub fn bands_in_block(self, bands: usize) -> usize {
        match self {
            Self::PixelInterleave | Self::RowInterleave => bands,
            Self::BlockInterleave | Self::BandSequential => 1,
        }
    }
}

impl std::fmt::Display for ImageMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// PJUST: which end of the NBPP container the ABPP significant bits sit at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(
    any(feature = "to_json", feature = "serde"),
    derive(Serialize, Deserialize)
)]
pub enum PixelJustification {
    Left,
    Right,
}

impl PixelJustification {
    pub fn new(source: &str) -> Result<Self, NitfError> {
        match source.trim_end() {
            "L" => Ok(Self::Left),
            "R" => Ok(Self::Right),
            other => Err(NitfError::ParseEnum {
                f: "PixelJustification".to_string(),
                code: other.to_string(),
            }),
        }
    }

    pub fn code(self) -> &'static str {
        match self {
            Self::Left => "L",
            Self::Right => "R",
        }
    }
}

/// IC: the compression code of an image segment.
///
/// Codes beginning with `M` (and `NM`) carry a mask table in front of the
/// pixel stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(
    any(feature = "to_json", feature = "serde"),
    derive(Serialize, Deserialize)
)]
pub enum Compression {
    /// `NC`: no compression.
    None,
    /// `NM`: no compression, masked.
    NoneMasked,
    /// `C1`: bi-level.
    BiLevel,
    /// `M1`: bi-level, masked.
    BiLevelMasked,
    /// `C3`: JPEG.
    Jpeg,
    /// `M3`: JPEG, masked.
    JpegMasked,
    /// `C4`: vector quantization.
    VectorQuant,
    /// `M4`: vector quantization, masked.
    VectorQuantMasked,
    /// `C5`: lossless JPEG.
    LosslessJpeg,
    /// `M5`: lossless JPEG, masked.
    LosslessJpegMasked,
    /// `C7`: reserved for future use.
    Reserved,
    /// `C8`: JPEG 2000.
    Jpeg2000,
    /// `M8`: JPEG 2000, masked.
    Jpeg2000Masked,
    /// `I1`: downsampled JPEG.
    Downsampled,
}

impl Compression {
    pub fn new(source: &str) -> Result<Self, NitfError> {
        match source.trim_end() {
            "NC" => Ok(Self::None),
            "NM" => Ok(Self::NoneMasked),
            "C1" => Ok(Self::BiLevel),
            "M1" => Ok(Self::BiLevelMasked),
            "C3" => Ok(Self::Jpeg),
            "M3" => Ok(Self::JpegMasked),
            "C4" => Ok(Self::VectorQuant),
            "M4" => Ok(Self::VectorQuantMasked),
            "C5" => Ok(Self::LosslessJpeg),
            "M5" => Ok(Self::LosslessJpegMasked),
            "C7" => Ok(Self::Reserved),
            "C8" => Ok(Self::Jpeg2000),
            "M8" => Ok(Self::Jpeg2000Masked),
            "I1" => Ok(Self::Downsampled),
            other => Err(NitfError::ParseEnum {
                f: "Compression".to_string(),
                code: other.to_string(),
            }),
        }
    }

    pub fn code(self) -> &'static str {
        match self {
            Self::None => "NC",
            Self::NoneMasked => "NM",
            Self::BiLevel => "C1",
            Self::BiLevelMasked => "M1",
            Self::Jpeg => "C3",
            Self::JpegMasked => "M3",
            Self::VectorQuant => "C4",
            Self::VectorQuantMasked => "M4",
            Self::LosslessJpeg => "C5",
            Self::LosslessJpegMasked => "M5",
            Self::Reserved => "C7",
            Self::Jpeg2000 => "C8",
            Self::Jpeg2000Masked => "M8",
            Self::Downsampled => "I1",
        }
    }

    /// Whether a mask table precedes the pixel stream.
    pub fn has_mask(self) -> bool {
        matches!(
            self,
            Self::NoneMasked
                | Self::BiLevelMasked
                | Self::JpegMasked
                | Self::VectorQuantMasked
                | Self::LosslessJpegMasked
                | Self::Jpeg2000Masked
        )
    }

    /// `NC` and `NM` are stored as raw pixels and are always handled natively.
    pub fn is_uncompressed(self) -> bool {
        matches!(self, Self::None | Self::NoneMasked)
    }

    /// Whether the COMRAT field follows the IC field in the subheader.
    pub fn has_rate_field(self) -> bool {
        !self.is_uncompressed()
    }
}

impl std::fmt::Display for Compression {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// ICORDS: the coordinate system of the IGEOLO corner string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(
    any(feature = "to_json", feature = "serde"),
    derive(Serialize, Deserialize)
)]
pub enum CoordinateSystem {
    /// Blank (2.1) or `N` (2.0): no coordinates given.
    None,
    /// `U`: UTM in MGRS form.
    UtmMgrs,
    /// `N`: UTM northern hemisphere (2.1 only).
    UtmNorth,
    /// `S`: UTM southern hemisphere (2.1 only).
    UtmSouth,
    /// `G`: geographic degrees/minutes/seconds.
    Geographic,
    /// `D`: decimal degrees.
    Decimal,
    /// `C`: geocentric (2.0 only).
    Geocentric,
}

impl CoordinateSystem {
    pub fn new(source: &str, version: Version) -> Result<Self, NitfError> {
        let legacy = version.is_legacy();
        match source.trim_end() {
            "" => Ok(Self::None),
            "N" if legacy => Ok(Self::None),
            "N" => Ok(Self::UtmNorth),
            "S" if !legacy => Ok(Self::UtmSouth),
            "U" => Ok(Self::UtmMgrs),
            "G" => Ok(Self::Geographic),
            "D" if !legacy => Ok(Self::Decimal),
            "C" if legacy => Ok(Self::Geocentric),
            other => Err(NitfError::ParseEnum {
                f: "CoordinateSystem".to_string(),
                code: other.to_string(),
            }),
        }
    }

    pub fn code(self, version: Version) -> &'static str {
        match self {
            Self::None if version.is_legacy() => "N",
            Self::None => " ",
            Self::UtmMgrs => "U",
            Self::UtmNorth => "N",
            Self::UtmSouth => "S",
            Self::Geographic => "G",
            Self::Decimal => "D",
            Self::Geocentric => "C",
        }
    }

    /// Whether the 60 byte IGEOLO field follows ICORDS.
    pub fn has_igeolo(self) -> bool {
        !matches!(self, Self::None)
    }
}
