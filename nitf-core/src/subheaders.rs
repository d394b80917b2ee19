//! This file contains the definitions of the graphic, label, text, data
//! extension and reserved extension subheaders.
//!
//! Graphics are CGM graphics under 2.1/NSIF and legacy symbols under 2.0;
//! the two layouts share identification, security and placement fields and
//! the legacy-only fields live in [`SymbolFields`]. Labels exist only in
//! NITF 2.0.
use crate::enums::{CharClass, Version};
use crate::errors::*;
use crate::field::Field;
use crate::security::FileSecurity;
use crate::tre::Extensions;

/// The fields a NITF 2.0 symbol subheader carries beyond the shared graphic
/// fields.
#[derive(Debug, Clone, PartialEq)]
pub struct SymbolFields {
    /// STYPE (1): symbol type (bitmap, CGM or object).
    pub symbol_type: Field,
    /// NLIPS (4): number of lines per symbol.
    pub num_lines: Field,
    /// NPIXPL (4): number of pixels per line.
    pub pixels_per_line: Field,
    /// NWDTH (4): line width.
    pub line_width: Field,
    /// NBPP (1): bits per pixel of a bitmap symbol.
    pub bits_per_pixel: Field,
    /// SLOC2 (10): second location.
    pub second_location: Field,
    /// SNUM (6): symbol number.
    pub symbol_number: Field,
    /// SROT (3): symbol rotation.
    pub rotation: Field,
    /// DLUT (3 x NELUT): the symbol lookup table; NELUT (3) is its length.
    pub lut: Vec<u8>,
}

impl SymbolFields {
    pub fn new() -> Self {
        SymbolFields {
            symbol_type: Field::new(1, CharClass::BcsA),
            num_lines: Field::new(4, CharClass::BcsN),
            pixels_per_line: Field::new(4, CharClass::BcsN),
            line_width: Field::new(4, CharClass::BcsN),
            bits_per_pixel: Field::new(1, CharClass::BcsN),
            second_location: Field::new(10, CharClass::BcsN),
            symbol_number: Field::new(6, CharClass::BcsN),
            rotation: Field::new(3, CharClass::BcsN),
            lut: Vec::new(),
        }
    }
}

impl Default for SymbolFields {
    fn default() -> Self {
        Self::new()
    }
}

/// The subheader of a graphic segment (a symbol segment under 2.0).
#[derive(Debug, Clone, PartialEq)]
pub struct GraphicSubheader {
    /// SY (2): file part type.
    pub file_part_type: Field,
    /// SID (10): graphic identifier.
    pub graphic_id: Field,
    /// SNAME (20): graphic name.
    pub graphic_name: Field,
    /// The graphic security group (SS fields).
    pub security: FileSecurity,
    /// ENCRYP (1).
    pub encrypted: Field,
    /// SFMT (1, 2.1 only): graphic format, `C` for CGM.
    pub format: Field,
    /// SSTRUCT (13, 2.1 only): reserved.
    pub structure: Field,
    /// SDLVL (3): display level.
    pub display_level: Field,
    /// SALVL (3): attachment level.
    pub attachment_level: Field,
    /// SLOC (10): location relative to the attachment.
    pub location: Field,
    /// SBND1 (10, 2.1 only): first bound location.
    pub first_bound: Field,
    /// SCOLOR (1): colour flag.
    pub color: Field,
    /// SBND2 (10, 2.1 only): second bound location.
    pub second_bound: Field,
    /// SRES2 (2, 2.1 only): reserved.
    pub reserved: Field,
    /// The legacy symbol fields; populated only under 2.0.
    pub symbol: Option<SymbolFields>,
    /// SXSOFL (3): overflow DES index of the extended section.
    pub extended_overflow: Field,
    /// The graphic extended subheader section (SXSHD).
    pub extended: Extensions,
}

impl GraphicSubheader {
    pub fn new(version: Version) -> Self {
        let mut file_part_type = Field::new(2, CharClass::BcsA);
        file_part_type.set_string("SY").expect("static value");
        GraphicSubheader {
            file_part_type,
            graphic_id: Field::new(10, CharClass::BcsA),
            graphic_name: Field::new(20, CharClass::BcsA),
            security: FileSecurity::new(version),
            encrypted: Field::new(1, CharClass::BcsN),
            format: Field::new(1, CharClass::BcsA),
            structure: Field::new(13, CharClass::BcsN),
            display_level: Field::new(3, CharClass::BcsN),
            attachment_level: Field::new(3, CharClass::BcsN),
            location: Field::new(10, CharClass::BcsN),
            first_bound: Field::new(10, CharClass::BcsN),
            color: Field::new(1, CharClass::BcsA),
            second_bound: Field::new(10, CharClass::BcsN),
            reserved: Field::new(2, CharClass::BcsN),
            symbol: if version.is_legacy() {
                Some(SymbolFields::new())
            } else {
                None
            },
            extended_overflow: Field::new(3, CharClass::BcsN),
            extended: Extensions::new(),
        }
    }

    /// The encoded size of the subheader in bytes for the given version.
    pub fn byte_len(&self, version: Version) -> usize {
        let mut len = 2 + 10 + 20 + self.security.byte_len(version) + 1;
        if let Some(symbol) = &self.symbol {
            // STYPE NLIPS NPIXPL NWDTH NBPP SDLVL SALVL SLOC SLOC2 SCOLOR
            // SNUM SROT NELUT DLUT
            len += 1 + 4 + 4 + 4 + 1 + 3 + 3 + 10 + 10 + 1 + 6 + 3 + 3 + symbol.lut.len();
        } else {
            len += 1 + 13 + 3 + 3 + 10 + 10 + 1 + 10 + 2;
        }
        len += crate::tre::extensions::section_byte_len(&self.extended, &self.extended_overflow);
        len
    }
}

/// The subheader of a label segment. Labels only exist in NITF 2.0; the
/// parser rejects them under 2.1/NSIF.
#[derive(Debug, Clone, PartialEq)]
pub struct LabelSubheader {
    /// LA (2): file part type.
    pub file_part_type: Field,
    /// LID (10): label identifier.
    pub label_id: Field,
    /// The label security group (LS fields).
    pub security: FileSecurity,
    /// ENCRYP (1).
    pub encrypted: Field,
    /// LFS (1): font style.
    pub font_style: Field,
    /// LCW (2): label cell width.
    pub cell_width: Field,
    /// LCH (2): label cell height.
    pub cell_height: Field,
    /// LDLVL (3): display level.
    pub display_level: Field,
    /// LALVL (3): attachment level.
    pub attachment_level: Field,
    /// LLOCR (5) / LLOCC (5): location relative to the attachment.
    pub location_row: Field,
    pub location_column: Field,
    /// LTC (3, binary): label text colour.
    pub text_color: Field,
    /// LBC (3, binary): label background colour.
    pub background_color: Field,
    /// LXSOFL (3): overflow DES index of the extended section.
    pub extended_overflow: Field,
    /// The label extended subheader section (LXSHD).
    pub extended: Extensions,
}

impl LabelSubheader {
    pub fn new() -> Self {
        let mut file_part_type = Field::new(2, CharClass::BcsA);
        file_part_type.set_string("LA").expect("static value");
        LabelSubheader {
            file_part_type,
            label_id: Field::new(10, CharClass::BcsA),
            security: FileSecurity::new(Version::Nitf20),
            encrypted: Field::new(1, CharClass::BcsN),
            font_style: Field::new(1, CharClass::BcsA),
            cell_width: Field::new(2, CharClass::BcsN),
            cell_height: Field::new(2, CharClass::BcsN),
            display_level: Field::new(3, CharClass::BcsN),
            attachment_level: Field::new(3, CharClass::BcsN),
            location_row: Field::new(5, CharClass::BcsN),
            location_column: Field::new(5, CharClass::BcsN),
            text_color: Field::new(3, CharClass::Binary),
            background_color: Field::new(3, CharClass::Binary),
            extended_overflow: Field::new(3, CharClass::BcsN),
            extended: Extensions::new(),
        }
    }

    /// The encoded size of the subheader in bytes.
    pub fn byte_len(&self) -> usize {
        let mut len = 2 + 10 + self.security.byte_len(Version::Nitf20);
        len += 1 + 1 + 2 + 2 + 3 + 3 + 5 + 5 + 3 + 3;
        len += crate::tre::extensions::section_byte_len(&self.extended, &self.extended_overflow);
        len
    }
}

impl Default for LabelSubheader {
    fn default() -> Self {
        Self::new()
    }
}

/// The subheader of a text segment.
#[derive(Debug, Clone, PartialEq)]
pub struct TextSubheader {
    /// TE (2): file part type.
    pub file_part_type: Field,
    /// TEXTID: 10 bytes in 2.0, 7 in 2.1.
    pub text_id: Field,
    /// TXTALVL (3, 2.1 only): attachment level.
    pub attachment_level: Field,
    /// TXTDT (14): text date and time.
    pub date_time: Field,
    /// TXTITL (80): text title.
    pub title: Field,
    /// The text security group (TS fields).
    pub security: FileSecurity,
    /// ENCRYP (1).
    pub encrypted: Field,
    /// TXTFMT (3): text format code.
    pub format: Field,
    /// TXSOFL (3): overflow DES index of the extended section.
    pub extended_overflow: Field,
    /// The text extended subheader section (TXSHD).
    pub extended: Extensions,
}

impl TextSubheader {
    pub fn new(version: Version) -> Self {
        let mut file_part_type = Field::new(2, CharClass::BcsA);
        file_part_type.set_string("TE").expect("static value");
        let (text_id_len, alvl_len) = if version.is_legacy() { (10, 0) } else { (7, 3) };
        TextSubheader {
            file_part_type,
            text_id: Field::new(text_id_len, CharClass::BcsA),
            attachment_level: Field::new(alvl_len, CharClass::BcsN),
            date_time: Field::new(14, CharClass::BcsA),
            title: Field::new(80, CharClass::BcsA),
            security: FileSecurity::new(version),
            encrypted: Field::new(1, CharClass::BcsN),
            format: Field::new(3, CharClass::BcsA),
            extended_overflow: Field::new(3, CharClass::BcsN),
            extended: Extensions::new(),
        }
    }

    /// The encoded size of the subheader in bytes for the given version.
    pub fn byte_len(&self, version: Version) -> usize {
        let mut len = 2 + self.text_id.len() + self.attachment_level.len() + 14 + 80;
        len += self.security.byte_len(version);
        len += 1 + 3;
        len += crate::tre::extensions::section_byte_len(&self.extended, &self.extended_overflow);
        len
    }
}

/// The subheader of a data extension segment.
#[derive(Debug, Clone, PartialEq)]
pub struct DeSubheader {
    /// DE (2): file part type.
    pub file_part_type: Field,
    /// DESID / DESTAG (25): the type of the extension. For a TRE overflow
    /// holder this names the host section (`UDHD`, `XHD`, `UDID`, ...).
    pub type_id: Field,
    /// DESVER (2).
    pub version: Field,
    /// The DES security group.
    pub security: FileSecurity,
    /// DESOFLW (6): overflowed header type; present for overflow holders.
    pub overflowed_header_type: Field,
    /// DESITEM (3): index of the data item that overflowed; present for
    /// overflow holders.
    pub data_item_overflowed: Field,
    /// DESSHF: the user-defined subheader fields (DESSHL is their length).
    pub subheader_fields: Field,
}

/// The host section names a TRE overflow DES may carry in its type-id.
pub const OVERFLOW_SECTION_NAMES: [&str; 6] = ["UDHD", "XHD", "UDID", "IXSHD", "SXSHD", "TXSHD"];

impl DeSubheader {
    pub fn new(version: Version) -> Self {
        let mut file_part_type = Field::new(2, CharClass::BcsA);
        file_part_type.set_string("DE").expect("static value");
        DeSubheader {
            file_part_type,
            type_id: Field::new(25, CharClass::BcsA),
            version: Field::new(2, CharClass::BcsN),
            security: FileSecurity::new(version),
            overflowed_header_type: Field::new(0, CharClass::BcsA),
            data_item_overflowed: Field::new(0, CharClass::BcsN),
            subheader_fields: Field::resizable(CharClass::Binary),
        }
    }

    /// Whether this DES is a TRE overflow holder for a host section.
    pub fn is_overflow(&self) -> bool {
        let type_id = self.type_id.as_string();
        OVERFLOW_SECTION_NAMES.contains(&type_id.as_str())
    }

    /// Turn the DES into an overflow holder for the named host section.
    pub fn set_overflow(&mut self, section: &str, item: u32) -> Result<(), NitfError> {
        if !OVERFLOW_SECTION_NAMES.contains(&section) {
            return Err(NitfError::InvalidArgument {
                msg: format!("{} is not an overflowable section", section),
            });
        }
        self.type_id.set_string(section)?;
        self.overflowed_header_type.resize(6);
        self.overflowed_header_type.set_string(section)?;
        self.data_item_overflowed.resize(3);
        self.data_item_overflowed.set_uint(item)
    }

    /// The encoded size of the subheader in bytes for the given version.
    pub fn byte_len(&self, version: Version) -> usize {
        2 + 25
            + 2
            + self.security.byte_len(version)
            + self.overflowed_header_type.len()
            + self.data_item_overflowed.len()
            + 4
            + self.subheader_fields.len()
    }
}

/// The subheader of a reserved extension segment. Minimal by design; the
/// payload is opaque.
#[derive(Debug, Clone, PartialEq)]
pub struct ReSubheader {
    /// RE (2): file part type.
    pub file_part_type: Field,
    /// RESTAG (25): the type of the extension.
    pub type_id: Field,
    /// RESVER (2).
    pub version: Field,
    /// The RES security group.
    pub security: FileSecurity,
    /// RESSHF: the user-defined subheader fields (RESSHL is their length).
    pub subheader_fields: Field,
}

impl ReSubheader {
    pub fn new(version: Version) -> Self {
        let mut file_part_type = Field::new(2, CharClass::BcsA);
        file_part_type.set_string("RE").expect("static value");
        ReSubheader {
            file_part_type,
            type_id: Field::new(25, CharClass::BcsA),
            version: Field::new(2, CharClass::BcsN),
            security: FileSecurity::new(version),
            subheader_fields: Field::resizable(CharClass::Binary),
        }
    }

    /// The encoded size of the subheader in bytes for the given version.
    pub fn byte_len(&self, version: Version) -> usize {
        2 + 25 + 2 + self.security.byte_len(version) + 4 + self.subheader_fields.len()
    }
}
