//! This submodule exists for converting headers and subheaders to bytes.
//!
//! Every field already holds its exact on-disk representation, so emission
//! is a matter of concatenating raw fields in schema order, with the same
//! conditional-field rules the parser applies. Running lengths are checked
//! against the structs' `byte_len` accounting as we go.
use nitf_core::enums::Version;
use nitf_core::errors::*;
use nitf_core::field::Field;
use nitf_core::security::FileSecurity;
use nitf_core::subheaders::*;
use nitf_core::tre::Extensions;
use nitf_core::{FileHeader, ImageSubheader};

/// Conversion of a header or subheader to its on-disk bytes.
pub trait NitfHeaderToBytes {
    fn as_bytes(&self, version: Version) -> Result<Vec<u8>, NitfError>;
}

/// Emit the security group in the width schema of the version.
pub(crate) fn security_bytes(security: &FileSecurity, version: Version) -> Vec<u8> {
    let mut out = Vec::with_capacity(security.byte_len(version));
    if version.is_legacy() {
        out.extend_from_slice(security.classification.raw());
        out.extend_from_slice(security.codewords.raw()); // 40
        out.extend_from_slice(security.control_and_handling.raw()); // 40
        out.extend_from_slice(security.releasing_instructions.raw()); // 40
        out.extend_from_slice(security.class_authority.raw()); // 20
        out.extend_from_slice(security.security_control_number.raw()); // 20
        out.extend_from_slice(security.downgrade.raw()); // 6
        if security.has_downgrade_event() {
            out.extend_from_slice(security.downgrade_date.raw()); // 40
        }
    } else {
        out.extend_from_slice(security.classification.raw());
        out.extend_from_slice(security.class_system.raw()); // 2
        out.extend_from_slice(security.codewords.raw()); // 11
        out.extend_from_slice(security.control_and_handling.raw()); // 2
        out.extend_from_slice(security.releasing_instructions.raw()); // 20
        out.extend_from_slice(security.declass_type.raw()); // 2
        out.extend_from_slice(security.declass_date.raw()); // 8
        out.extend_from_slice(security.declass_exemption.raw()); // 4
        out.extend_from_slice(security.downgrade.raw()); // 1
        out.extend_from_slice(security.downgrade_date.raw()); // 8
        out.extend_from_slice(security.classification_text.raw()); // 43
        out.extend_from_slice(security.class_authority_type.raw()); // 1
        out.extend_from_slice(security.class_authority.raw()); // 40
        out.extend_from_slice(security.class_reason.raw()); // 1
        out.extend_from_slice(security.security_source_date.raw()); // 8
        out.extend_from_slice(security.security_control_number.raw()); // 15
    }
    debug_assert_eq!(out.len(), security.byte_len(version));
    out
}

/// Emit one extension section: the five digit length field, then (when the
/// section is populated) the overflow index and the TRE wire records.
pub(crate) fn extension_section_bytes(
    extensions: &Extensions,
    overflow: &Field,
    out: &mut Vec<u8>,
) -> Result<(), NitfError> {
    let overflow_index = overflow.as_u64().unwrap_or(0);
    if extensions.is_empty() && overflow_index == 0 {
        out.extend_from_slice(b"00000");
        return Ok(());
    }
    let section_len = 3 + extensions.wire_length();
    if section_len > nitf_core::SECTION_CAPACITY {
        return Err(NitfError::Structural {
            msg: format!(
                "extension section of {} bytes exceeds its length field",
                section_len
            ),
        });
    }
    out.extend_from_slice(format!("{:05}", section_len).as_bytes());
    out.extend_from_slice(overflow.raw());
    out.extend_from_slice(&extensions.to_wire_bytes());
    Ok(())
}

impl NitfHeaderToBytes for FileHeader {
    fn as_bytes(&self, version: Version) -> Result<Vec<u8>, NitfError> {
        let mut out = Vec::with_capacity(self.byte_len()?);
        out.extend_from_slice(self.file_part_type.raw()); // FHDR
        out.extend_from_slice(self.file_version.raw()); // FVER
        out.extend_from_slice(self.complexity_level.raw()); // CLEVEL
        out.extend_from_slice(self.system_type.raw()); // STYPE
        out.extend_from_slice(self.origin_station_id.raw()); // OSTAID
        out.extend_from_slice(self.file_date_time.raw()); // FDT
        out.extend_from_slice(self.file_title.raw()); // FTITLE
        out.extend_from_slice(&security_bytes(&self.security, version));
        out.extend_from_slice(self.file_copy_number.raw()); // FSCOP
        out.extend_from_slice(self.file_num_copies.raw()); // FSCPYS
        out.extend_from_slice(self.encrypted.raw()); // ENCRYP
        out.extend_from_slice(self.background_color.raw()); // FBKGC (2.1)
        out.extend_from_slice(self.originator_name.raw()); // ONAME
        out.extend_from_slice(self.originator_phone.raw()); // OPHONE
        out.extend_from_slice(self.file_length.raw()); // FL
        out.extend_from_slice(self.header_length.raw()); // HL

        for (info, name) in [
            (&self.image_info, "image"),
            (&self.graphic_info, "graphic"),
            (&self.label_info, "label"),
            (&self.text_info, "text"),
            (&self.data_extension_info, "DES"),
            (&self.reserved_extension_info, "RES"),
        ] {
            if info.len() > 999 {
                return Err(NitfError::Structural {
                    msg: format!("{} {} segments exceed the count field", info.len(), name),
                });
            }
            out.extend_from_slice(format!("{:03}", info.len()).as_bytes());
            for entry in info.iter() {
                out.extend_from_slice(entry.subheader_length.raw());
                out.extend_from_slice(entry.data_length.raw());
            }
        }

        extension_section_bytes(&self.user_defined, &self.user_defined_overflow, &mut out)?;
        extension_section_bytes(&self.extended, &self.extended_overflow, &mut out)?;
        debug_assert_eq!(out.len(), self.byte_len()?);
        Ok(out)
    }
}

impl NitfHeaderToBytes for ImageSubheader {
    fn as_bytes(&self, version: Version) -> Result<Vec<u8>, NitfError> {
        let mut out = Vec::with_capacity(self.byte_len(version));
        out.extend_from_slice(self.file_part_type.raw()); // IM
        out.extend_from_slice(self.image_id.raw()); // IID1
        out.extend_from_slice(self.image_date_time.raw()); // IDATIM
        out.extend_from_slice(self.target_id.raw()); // TGTID
        out.extend_from_slice(self.image_title.raw()); // IID2
        out.extend_from_slice(&security_bytes(&self.security, version));
        out.extend_from_slice(self.encrypted.raw()); // ENCRYP
        out.extend_from_slice(self.image_source.raw()); // ISORCE
        out.extend_from_slice(self.num_rows.raw()); // NROWS
        out.extend_from_slice(self.num_cols.raw()); // NCOLS
        out.extend_from_slice(self.pixel_value_type.raw()); // PVTYPE
        out.extend_from_slice(self.image_representation.raw()); // IREP
        out.extend_from_slice(self.image_category.raw()); // ICAT
        out.extend_from_slice(self.actual_bits_per_pixel.raw()); // ABPP
        out.extend_from_slice(self.pixel_justification.raw()); // PJUST
        out.extend_from_slice(self.image_coordinate_system.raw()); // ICORDS
        out.extend_from_slice(self.corner_coordinates.raw()); // IGEOLO (cond)

        if self.comments.len() > 9 {
            return Err(NitfError::Structural {
                msg: format!("{} image comments exceed NICOM", self.comments.len()),
            });
        }
        out.extend_from_slice(format!("{}", self.comments.len()).as_bytes()); // NICOM
        for comment in &self.comments {
            out.extend_from_slice(comment.raw());
        }

        out.extend_from_slice(self.image_compression.raw()); // IC
        out.extend_from_slice(self.compression_rate.raw()); // COMRAT (cond)

        // NBANDS, or 0 plus XBANDS for more than nine bands.
        if self.bands.len() > 9 {
            if self.bands.len() > 99_999 {
                return Err(NitfError::Structural {
                    msg: format!("{} bands exceed XBANDS", self.bands.len()),
                });
            }
            out.extend_from_slice(b"0");
            out.extend_from_slice(format!("{:05}", self.bands.len()).as_bytes());
        } else {
            out.extend_from_slice(format!("{}", self.bands.len()).as_bytes());
        }
        for band in &self.bands {
            out.extend_from_slice(band.representation.raw()); // IREPBAND
            out.extend_from_slice(band.subcategory.raw()); // ISUBCAT
            out.extend_from_slice(band.filter_condition.raw()); // IFC
            out.extend_from_slice(band.filter_code.raw()); // IMFLT
            out.extend_from_slice(band.num_luts.raw()); // NLUTS
            if !band.luts.is_empty() {
                out.extend_from_slice(band.lut_entries.raw()); // NELUT
                for lut in &band.luts {
                    out.extend_from_slice(lut);
                }
            }
        }

        out.extend_from_slice(self.image_sync.raw()); // ISYNC
        out.extend_from_slice(self.image_mode.raw()); // IMODE
        out.extend_from_slice(self.blocks_per_row.raw()); // NBPR
        out.extend_from_slice(self.blocks_per_col.raw()); // NBPC
        out.extend_from_slice(self.pixels_per_block_horz.raw()); // NPPBH
        out.extend_from_slice(self.pixels_per_block_vert.raw()); // NPPBV
        out.extend_from_slice(self.bits_per_pixel.raw()); // NBPP
        out.extend_from_slice(self.display_level.raw()); // IDLVL
        out.extend_from_slice(self.attachment_level.raw()); // IALVL
        out.extend_from_slice(self.image_location.raw()); // ILOC
        out.extend_from_slice(self.image_magnification.raw()); // IMAG

        extension_section_bytes(&self.user_defined, &self.user_defined_overflow, &mut out)?;
        extension_section_bytes(&self.extended, &self.extended_overflow, &mut out)?;
        debug_assert_eq!(out.len(), self.byte_len(version));
        Ok(out)
    }
}

impl NitfHeaderToBytes for GraphicSubheader {
    fn as_bytes(&self, version: Version) -> Result<Vec<u8>, NitfError> {
        let mut out = Vec::with_capacity(self.byte_len(version));
        out.extend_from_slice(self.file_part_type.raw()); // SY
        out.extend_from_slice(self.graphic_id.raw()); // SID
        out.extend_from_slice(self.graphic_name.raw()); // SNAME
        out.extend_from_slice(&security_bytes(&self.security, version));
        out.extend_from_slice(self.encrypted.raw()); // ENCRYP
        match &self.symbol {
            // The 2.0 symbol layout.
            Some(symbol) => {
                out.extend_from_slice(symbol.symbol_type.raw()); // STYPE
                out.extend_from_slice(symbol.num_lines.raw()); // NLIPS
                out.extend_from_slice(symbol.pixels_per_line.raw()); // NPIXPL
                out.extend_from_slice(symbol.line_width.raw()); // NWDTH
                out.extend_from_slice(symbol.bits_per_pixel.raw()); // NBPP
                out.extend_from_slice(self.display_level.raw()); // SDLVL
                out.extend_from_slice(self.attachment_level.raw()); // SALVL
                out.extend_from_slice(self.location.raw()); // SLOC
                out.extend_from_slice(symbol.second_location.raw()); // SLOC2
                out.extend_from_slice(self.color.raw()); // SCOLOR
                out.extend_from_slice(symbol.symbol_number.raw()); // SNUM
                out.extend_from_slice(symbol.rotation.raw()); // SROT
                out.extend_from_slice(format!("{:03}", symbol.lut.len() / 3).as_bytes()); // NELUT
                out.extend_from_slice(&symbol.lut); // DLUT
            }
            // The 2.1 CGM graphic layout.
            None => {
                out.extend_from_slice(self.format.raw()); // SFMT
                out.extend_from_slice(self.structure.raw()); // SSTRUCT
                out.extend_from_slice(self.display_level.raw()); // SDLVL
                out.extend_from_slice(self.attachment_level.raw()); // SALVL
                out.extend_from_slice(self.location.raw()); // SLOC
                out.extend_from_slice(self.first_bound.raw()); // SBND1
                out.extend_from_slice(self.color.raw()); // SCOLOR
                out.extend_from_slice(self.second_bound.raw()); // SBND2
                out.extend_from_slice(self.reserved.raw()); // SRES2
            }
        }
        extension_section_bytes(&self.extended, &self.extended_overflow, &mut out)?;
        debug_assert_eq!(out.len(), self.byte_len(version));
        Ok(out)
    }
}

impl NitfHeaderToBytes for LabelSubheader {
    fn as_bytes(&self, _version: Version) -> Result<Vec<u8>, NitfError> {
        // Labels only exist in 2.0.
        let mut out = Vec::with_capacity(self.byte_len());
        out.extend_from_slice(self.file_part_type.raw()); // LA
        out.extend_from_slice(self.label_id.raw()); // LID
        out.extend_from_slice(&security_bytes(&self.security, Version::Nitf20));
        out.extend_from_slice(self.encrypted.raw()); // ENCRYP
        out.extend_from_slice(self.font_style.raw()); // LFS
        out.extend_from_slice(self.cell_width.raw()); // LCW
        out.extend_from_slice(self.cell_height.raw()); // LCH
        out.extend_from_slice(self.display_level.raw()); // LDLVL
        out.extend_from_slice(self.attachment_level.raw()); // LALVL
        out.extend_from_slice(self.location_row.raw()); // LLOCR
        out.extend_from_slice(self.location_column.raw()); // LLOCC
        out.extend_from_slice(self.text_color.raw()); // LTC
        out.extend_from_slice(self.background_color.raw()); // LBC
        extension_section_bytes(&self.extended, &self.extended_overflow, &mut out)?;
        debug_assert_eq!(out.len(), self.byte_len());
        Ok(out)
    }
}

impl NitfHeaderToBytes for TextSubheader {
    fn as_bytes(&self, version: Version) -> Result<Vec<u8>, NitfError> {
        let mut out = Vec::with_capacity(self.byte_len(version));
        out.extend_from_slice(self.file_part_type.raw()); // TE
        out.extend_from_slice(self.text_id.raw()); // TEXTID
        out.extend_from_slice(self.attachment_level.raw()); // TXTALVL (2.1)
        out.extend_from_slice(self.date_time.raw()); // TXTDT
        out.extend_from_slice(self.title.raw()); // TXTITL
        out.extend_from_slice(&security_bytes(&self.security, version));
        out.extend_from_slice(self.encrypted.raw()); // ENCRYP
        out.extend_from_slice(self.format.raw()); // TXTFMT
        extension_section_bytes(&self.extended, &self.extended_overflow, &mut out)?;
        debug_assert_eq!(out.len(), self.byte_len(version));
        Ok(out)
    }
}

impl NitfHeaderToBytes for DeSubheader {
    fn as_bytes(&self, version: Version) -> Result<Vec<u8>, NitfError> {
        let mut out = Vec::with_capacity(self.byte_len(version));
        out.extend_from_slice(self.file_part_type.raw()); // DE
        out.extend_from_slice(self.type_id.raw()); // DESID
        out.extend_from_slice(self.version.raw()); // DESVER
        out.extend_from_slice(&security_bytes(&self.security, version));
        out.extend_from_slice(self.overflowed_header_type.raw()); // DESOFLW (cond)
        out.extend_from_slice(self.data_item_overflowed.raw()); // DESITEM (cond)
        out.extend_from_slice(format!("{:04}", self.subheader_fields.len()).as_bytes()); // DESSHL
        out.extend_from_slice(self.subheader_fields.raw()); // DESSHF
        debug_assert_eq!(out.len(), self.byte_len(version));
        Ok(out)
    }
}

impl NitfHeaderToBytes for ReSubheader {
    fn as_bytes(&self, version: Version) -> Result<Vec<u8>, NitfError> {
        let mut out = Vec::with_capacity(self.byte_len(version));
        out.extend_from_slice(self.file_part_type.raw()); // RE
        out.extend_from_slice(self.type_id.raw()); // RESTAG
        out.extend_from_slice(self.version.raw()); // RESVER
        out.extend_from_slice(&security_bytes(&self.security, version));
        out.extend_from_slice(format!("{:04}", self.subheader_fields.len()).as_bytes()); // RESSHL
        out.extend_from_slice(self.subheader_fields.raw()); // RESSHF
        debug_assert_eq!(out.len(), self.byte_len(version));
        Ok(out)
    }
}
