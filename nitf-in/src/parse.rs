//! Deserialisation of a [`Record`] from an I/O interface.
//!
//! The parser reads the file header one field at a time, validating the
//! character class of each against the width table selected by the detected
//! version, prefix-sums the declared segment lengths into byte ranges, then
//! walks every subheader. TRE blocks are materialised through the
//! process-wide registry, and overflow DES segments are unmerged back into
//! their host sections at the end.
use nitf_core::enums::*;
use nitf_core::errors::*;
use nitf_core::field::Field;
use nitf_core::file_header::ComponentInfo;
use nitf_core::image_subheader::{BandInfo, ImageSubheader};
use nitf_core::io::{read_total, IoInterface, Whence};
use nitf_core::plugin;
use nitf_core::security::FileSecurity;
use nitf_core::settings::{NitfSettings, ParseWarning};
use nitf_core::subheaders::*;
use nitf_core::tre::{Extensions, TRE_LENGTH_LEN, TRE_TAG_LEN};
use nitf_core::{Record, Segment, SegmentData, MAGIC_LEN};

/// Sequential field reader with offset bookkeeping and the strict /
/// best-effort failure policy.
pub(crate) struct FieldReader<'a> {
    io: &'a mut dyn IoInterface,
    offset: u64,
    segment: SegmentKind,
    strict: bool,
    warnings: &'a mut Vec<ParseWarning>,
}

impl<'a> FieldReader<'a> {
    fn new(
        io: &'a mut dyn IoInterface,
        offset: u64,
        strict: bool,
        warnings: &'a mut Vec<ParseWarning>,
    ) -> Self {
        FieldReader {
            io,
            offset,
            segment: SegmentKind::FileHeader,
            strict,
            warnings,
        }
    }

    fn seek_to(&mut self, offset: u64) -> Result<(), NitfError> {
        self.io.seek(Whence::Set, offset as i64)?;
        self.offset = offset;
        Ok(())
    }

    fn read_bytes(&mut self, len: usize) -> Result<Vec<u8>, NitfError> {
        let mut buf = vec![0u8; len];
        read_total(&mut *self.io, &mut buf)?;
        self.offset += len as u64;
        Ok(buf)
    }

    /// Read one field in place: the field's current width says how many
    /// bytes to consume, its class says what they may contain. A class
    /// violation aborts in strict mode and becomes a warning otherwise.
    fn read_field(&mut self, name: &str, field: &mut Field) -> Result<(), NitfError> {
        let at = self.offset;
        let buf = self.read_bytes(field.len())?;
        match field.set_raw(&buf) {
            Ok(()) => Ok(()),
            Err(error) => {
                if self.strict {
                    return Err(error.at(self.segment, name, at));
                }
                self.warnings.push(ParseWarning {
                    segment: self.segment,
                    field: name.to_string(),
                    offset: at,
                    error,
                });
                *field = Field::from_bytes_unchecked(&buf, field.class());
                Ok(())
            }
        }
    }

    /// Read a numeric count field. Counts shape everything that follows, so
    /// a count that does not parse is fatal even in best-effort mode.
    fn read_count(&mut self, name: &str, width: usize) -> Result<u64, NitfError> {
        let at = self.offset;
        let buf = self.read_bytes(width)?;
        let text = String::from_utf8_lossy(&buf);
        text.trim()
            .parse::<u64>()
            .or_else(|e| if text.trim().is_empty() { Ok(0) } else { Err(e) })
            .map_err(|_| {
                NitfError::Parse {
                    field: name.to_string(),
                    value: text.to_string(),
                }
                .at(self.segment, name, at)
            })
    }

    fn error(&self, name: &str, error: NitfError) -> NitfError {
        error.at(self.segment, name, self.offset)
    }
}

/// Parse a [`Record`] from the interface. Returns the record together with
/// the warnings collected in best-effort mode.
pub fn read_record(
    io: &mut dyn IoInterface,
    settings: &NitfSettings,
) -> Result<(Record, Vec<ParseWarning>), NitfError> {
    io.seek(Whence::Set, 0)?;
    let mut magic = [0u8; MAGIC_LEN];
    read_total(&mut *io, &mut magic)?;
    let version = Version::from_magic(&magic)?;

    let mut record = Record::new(version);
    let mut warnings = Vec::new();
    let mut r = FieldReader::new(&mut *io, MAGIC_LEN as u64, settings.get_strict(), &mut warnings);

    read_file_header(&mut r, &mut record, version, settings)?;

    // Prefix-sum the declared lengths into segment byte ranges, starting at
    // the declared header length.
    let header_length = record.header.header_length.as_u64().map_err(|e| {
        e.at(SegmentKind::FileHeader, "HL", 0)
    })?;
    let mut offset = header_length;

    for i in 0..record.header.image_info.len() {
        let (sub_len, data_len) = info_lengths(&record.header.image_info[i])?;
        r.segment = SegmentKind::Image;
        r.seek_to(offset)?;
        let subheader = read_image_subheader(&mut r, version, settings)?;
        record.images.push(Segment::with_data(
            subheader,
            SegmentData::OnDisk {
                start: offset + sub_len,
                end: offset + sub_len + data_len,
            },
        ));
        offset += sub_len + data_len;
    }
    for i in 0..record.header.graphic_info.len() {
        let (sub_len, data_len) = info_lengths(&record.header.graphic_info[i])?;
        r.segment = SegmentKind::Graphic;
        r.seek_to(offset)?;
        let subheader = read_graphic_subheader(&mut r, version, settings)?;
        record.graphics.push(Segment::with_data(
            subheader,
            SegmentData::OnDisk {
                start: offset + sub_len,
                end: offset + sub_len + data_len,
            },
        ));
        offset += sub_len + data_len;
    }
    for i in 0..record.header.label_info.len() {
        let (sub_len, data_len) = info_lengths(&record.header.label_info[i])?;
        r.segment = SegmentKind::Label;
        r.seek_to(offset)?;
        let subheader = read_label_subheader(&mut r, settings)?;
        record.labels.push(Segment::with_data(
            subheader,
            SegmentData::OnDisk {
                start: offset + sub_len,
                end: offset + sub_len + data_len,
            },
        ));
        offset += sub_len + data_len;
    }
    for i in 0..record.header.text_info.len() {
        let (sub_len, data_len) = info_lengths(&record.header.text_info[i])?;
        r.segment = SegmentKind::Text;
        r.seek_to(offset)?;
        let subheader = read_text_subheader(&mut r, version, settings)?;
        record.texts.push(Segment::with_data(
            subheader,
            SegmentData::OnDisk {
                start: offset + sub_len,
                end: offset + sub_len + data_len,
            },
        ));
        offset += sub_len + data_len;
    }
    for i in 0..record.header.data_extension_info.len() {
        let (sub_len, data_len) = info_lengths(&record.header.data_extension_info[i])?;
        r.segment = SegmentKind::DataExtension;
        r.seek_to(offset)?;
        let subheader = read_de_subheader(&mut r, version)?;
        record.data_extensions.push(Segment::with_data(
            subheader,
            SegmentData::OnDisk {
                start: offset + sub_len,
                end: offset + sub_len + data_len,
            },
        ));
        offset += sub_len + data_len;
    }
    for i in 0..record.header.reserved_extension_info.len() {
        let (sub_len, data_len) = info_lengths(&record.header.reserved_extension_info[i])?;
        r.segment = SegmentKind::ReservedExtension;
        r.seek_to(offset)?;
        let subheader = read_re_subheader(&mut r, version)?;
        record.reserved_extensions.push(Segment::with_data(
            subheader,
            SegmentData::OnDisk {
                start: offset + sub_len,
                end: offset + sub_len + data_len,
            },
        ));
        offset += sub_len + data_len;
    }

    unmerge_overflows(io, &mut record, settings, &mut warnings)?;

    Ok((record, warnings))
}

fn info_lengths(info: &ComponentInfo) -> Result<(u64, u64), NitfError> {
    Ok((info.subheader_len()? as u64, info.data_len()?))
}

fn read_file_header(
    r: &mut FieldReader,
    record: &mut Record,
    version: Version,
    settings: &NitfSettings,
) -> Result<(), NitfError> {
    let h = &mut record.header;
    r.read_field("CLEVEL", &mut h.complexity_level)?;
    r.read_field("STYPE", &mut h.system_type)?;
    r.read_field("OSTAID", &mut h.origin_station_id)?;
    r.read_field("FDT", &mut h.file_date_time)?;
    r.read_field("FTITLE", &mut h.file_title)?;
    read_security(r, &mut h.security, version)?;
    r.read_field("FSCOP", &mut h.file_copy_number)?;
    r.read_field("FSCPYS", &mut h.file_num_copies)?;
    r.read_field("ENCRYP", &mut h.encrypted)?;
    if !version.is_legacy() {
        r.read_field("FBKGC", &mut h.background_color)?;
    }
    r.read_field("ONAME", &mut h.originator_name)?;
    r.read_field("OPHONE", &mut h.originator_phone)?;
    r.read_field("FL", &mut h.file_length)?;
    r.read_field("HL", &mut h.header_length)?;

    let numi = r.read_count("NUMI", 3)?;
    for _ in 0..numi {
        let mut info = ComponentInfo::new(SegmentKind::Image);
        r.read_field("LISH", &mut info.subheader_length)?;
        r.read_field("LI", &mut info.data_length)?;
        h.image_info.push(info);
    }
    let nums = r.read_count("NUMS", 3)?;
    for _ in 0..nums {
        let mut info = ComponentInfo::new(SegmentKind::Graphic);
        r.read_field("LSSH", &mut info.subheader_length)?;
        r.read_field("LS", &mut info.data_length)?;
        h.graphic_info.push(info);
    }
    // NUMX holds the label count in 2.0 and is reserved (always zero) in
    // 2.1/NSIF; labels under 2.1 are a parse error.
    let numx = r.read_count("NUMX", 3)?;
    if version.is_legacy() {
        for _ in 0..numx {
            let mut info = ComponentInfo::new(SegmentKind::Label);
            r.read_field("LLSH", &mut info.subheader_length)?;
            r.read_field("LL", &mut info.data_length)?;
            h.label_info.push(info);
        }
    } else if numx != 0 {
        return Err(r.error(
            "NUMX",
            NitfError::Parse {
                field: "NUMX".to_string(),
                value: numx.to_string(),
            },
        ));
    }
    let numt = r.read_count("NUMT", 3)?;
    for _ in 0..numt {
        let mut info = ComponentInfo::new(SegmentKind::Text);
        r.read_field("LTSH", &mut info.subheader_length)?;
        r.read_field("LT", &mut info.data_length)?;
        h.text_info.push(info);
    }
    let numdes = r.read_count("NUMDES", 3)?;
    for _ in 0..numdes {
        let mut info = ComponentInfo::new(SegmentKind::DataExtension);
        r.read_field("LDSH", &mut info.subheader_length)?;
        r.read_field("LD", &mut info.data_length)?;
        h.data_extension_info.push(info);
    }
    let numres = r.read_count("NUMRES", 3)?;
    for _ in 0..numres {
        let mut info = ComponentInfo::new(SegmentKind::ReservedExtension);
        r.read_field("LRESH", &mut info.subheader_length)?;
        r.read_field("LRE", &mut info.data_length)?;
        h.reserved_extension_info.push(info);
    }

    read_extension_section(
        r,
        "UDHDL",
        &mut h.user_defined,
        &mut h.user_defined_overflow,
        settings,
    )?;
    read_extension_section(r, "XHDL", &mut h.extended, &mut h.extended_overflow, settings)?;
    Ok(())
}

pub(crate) fn read_security(
    r: &mut FieldReader,
    security: &mut FileSecurity,
    version: Version,
) -> Result<(), NitfError> {
    if version.is_legacy() {
        r.read_field("CLAS", &mut security.classification)?;
        r.read_field("CODE", &mut security.codewords)?;
        r.read_field("CTLH", &mut security.control_and_handling)?;
        r.read_field("REL", &mut security.releasing_instructions)?;
        r.read_field("CAUT", &mut security.class_authority)?;
        r.read_field("CTLN", &mut security.security_control_number)?;
        r.read_field("DWNG", &mut security.downgrade)?;
        if security.has_downgrade_event() {
            security.downgrade_date.resize(40);
            r.read_field("DEVT", &mut security.downgrade_date)?;
        }
    } else {
        r.read_field("CLAS", &mut security.classification)?;
        r.read_field("CLSY", &mut security.class_system)?;
        r.read_field("CODE", &mut security.codewords)?;
        r.read_field("CTLH", &mut security.control_and_handling)?;
        r.read_field("REL", &mut security.releasing_instructions)?;
        r.read_field("DCTP", &mut security.declass_type)?;
        r.read_field("DCDT", &mut security.declass_date)?;
        r.read_field("DCXM", &mut security.declass_exemption)?;
        r.read_field("DG", &mut security.downgrade)?;
        r.read_field("DGDT", &mut security.downgrade_date)?;
        r.read_field("CLTX", &mut security.classification_text)?;
        r.read_field("CATP", &mut security.class_authority_type)?;
        r.read_field("CAUT", &mut security.class_authority)?;
        r.read_field("CRSN", &mut security.class_reason)?;
        r.read_field("SRDT", &mut security.security_source_date)?;
        r.read_field("CTLN", &mut security.security_control_number)?;
    }
    Ok(())
}

/// Read one extension section: a five digit length, then (when nonzero) the
/// three digit overflow index and the TRE block filling the rest.
fn read_extension_section(
    r: &mut FieldReader,
    name: &str,
    extensions: &mut Extensions,
    overflow: &mut Field,
    settings: &NitfSettings,
) -> Result<(), NitfError> {
    let section_len = r.read_count(name, 5)? as usize;
    if section_len == 0 {
        return Ok(());
    }
    if section_len < 3 {
        return Err(r.error(
            name,
            NitfError::Structural {
                msg: format!("extension section of {} bytes cannot hold its overflow field", section_len),
            },
        ));
    }
    r.read_field("OFL", overflow)?;
    let block_start = r.offset;
    let block = r.read_bytes(section_len - 3)?;
    parse_tre_block(&block, block_start, r.segment, extensions, settings, r.warnings)
}

/// Split a TRE block into `tag(6) || length(5) || bytes` records and
/// materialise each through the registry.
pub(crate) fn parse_tre_block(
    block: &[u8],
    base_offset: u64,
    segment: SegmentKind,
    extensions: &mut Extensions,
    settings: &NitfSettings,
    warnings: &mut Vec<ParseWarning>,
) -> Result<(), NitfError> {
    let mut cursor = 0usize;
    while cursor < block.len() {
        let at = base_offset + cursor as u64;
        if cursor + TRE_TAG_LEN + TRE_LENGTH_LEN > block.len() {
            return Err(NitfError::Structural {
                msg: "truncated TRE header".to_string(),
            }
            .at(segment, "TRE", at));
        }
        let tag = String::from_utf8_lossy(&block[cursor..cursor + TRE_TAG_LEN])
            .trim_end()
            .to_string();
        let length_text =
            String::from_utf8_lossy(&block[cursor + TRE_TAG_LEN..cursor + TRE_TAG_LEN + TRE_LENGTH_LEN])
                .to_string();
        let length: usize = length_text.trim().parse().map_err(|_| {
            NitfError::Parse {
                field: "TRE length".to_string(),
                value: length_text.clone(),
            }
            .at(segment, &tag, at)
        })?;
        cursor += TRE_TAG_LEN + TRE_LENGTH_LEN;
        if cursor + length > block.len() {
            return Err(NitfError::Structural {
                msg: format!("TRE {} of {} bytes overruns its section", tag, length),
            }
            .at(segment, &tag, at));
        }
        let payload = &block[cursor..cursor + length];
        match plugin::materialize_tre(&tag, payload, settings.get_strict_tres()) {
            Ok(tre) => extensions.append(tre),
            Err(error) => {
                if settings.get_strict() {
                    return Err(error.at(segment, &tag, at));
                }
                warnings.push(ParseWarning {
                    segment,
                    field: tag.clone(),
                    offset: at,
                    error,
                });
            }
        }
        cursor += length;
    }
    Ok(())
}

fn read_image_subheader(
    r: &mut FieldReader,
    version: Version,
    settings: &NitfSettings,
) -> Result<ImageSubheader, NitfError> {
    let mut sub = ImageSubheader::new(version);
    r.read_field("IM", &mut sub.file_part_type)?;
    if sub.file_part_type.raw() != b"IM" {
        return Err(r.error(
            "IM",
            NitfError::Parse {
                field: "IM".to_string(),
                value: sub.file_part_type.as_string(),
            },
        ));
    }
    r.read_field("IID1", &mut sub.image_id)?;
    r.read_field("IDATIM", &mut sub.image_date_time)?;
    r.read_field("TGTID", &mut sub.target_id)?;
    r.read_field("IID2", &mut sub.image_title)?;
    read_security(r, &mut sub.security, version)?;
    r.read_field("ENCRYP", &mut sub.encrypted)?;
    r.read_field("ISORCE", &mut sub.image_source)?;
    r.read_field("NROWS", &mut sub.num_rows)?;
    r.read_field("NCOLS", &mut sub.num_cols)?;
    r.read_field("PVTYPE", &mut sub.pixel_value_type)?;
    r.read_field("IREP", &mut sub.image_representation)?;
    r.read_field("ICAT", &mut sub.image_category)?;
    r.read_field("ABPP", &mut sub.actual_bits_per_pixel)?;
    r.read_field("PJUST", &mut sub.pixel_justification)?;
    r.read_field("ICORDS", &mut sub.image_coordinate_system)?;
    let icords = CoordinateSystem::new(&sub.image_coordinate_system.as_string(), version)
        .map_err(|e| r.error("ICORDS", e))?;
    if icords.has_igeolo() {
        sub.corner_coordinates.resize(60);
        r.read_field("IGEOLO", &mut sub.corner_coordinates)?;
    }
    let nicom = r.read_count("NICOM", 1)?;
    for _ in 0..nicom {
        let mut comment = Field::new(80, CharClass::BcsA);
        r.read_field("ICOM", &mut comment)?;
        sub.comments.push(comment);
    }
    r.read_field("IC", &mut sub.image_compression)?;
    let compression = Compression::new(&sub.image_compression.as_string())
        .map_err(|e| r.error("IC", e))?;
    if compression.has_rate_field() {
        sub.compression_rate.resize(4);
        r.read_field("COMRAT", &mut sub.compression_rate)?;
    }
    let nbands = r.read_count("NBANDS", 1)?;
    let nbands = if nbands == 0 {
        r.read_count("XBANDS", 5)?
    } else {
        nbands
    };
    for _ in 0..nbands {
        let mut band = BandInfo::new();
        r.read_field("IREPBAND", &mut band.representation)?;
        r.read_field("ISUBCAT", &mut band.subcategory)?;
        r.read_field("IFC", &mut band.filter_condition)?;
        r.read_field("IMFLT", &mut band.filter_code)?;
        r.read_field("NLUTS", &mut band.num_luts)?;
        let nluts = band.lut_count().map_err(|e| r.error("NLUTS", e))?;
        if nluts > 0 {
            r.read_field("NELUT", &mut band.lut_entries)?;
            let entries = band.lut_entries.as_u64().map_err(|e| r.error("NELUT", e))? as usize;
            for _ in 0..nluts {
                band.luts.push(r.read_bytes(entries)?);
            }
        }
        sub.bands.push(band);
    }
    r.read_field("ISYNC", &mut sub.image_sync)?;
    r.read_field("IMODE", &mut sub.image_mode)?;
    r.read_field("NBPR", &mut sub.blocks_per_row)?;
    r.read_field("NBPC", &mut sub.blocks_per_col)?;
    r.read_field("NPPBH", &mut sub.pixels_per_block_horz)?;
    r.read_field("NPPBV", &mut sub.pixels_per_block_vert)?;
    r.read_field("NBPP", &mut sub.bits_per_pixel)?;
    r.read_field("IDLVL", &mut sub.display_level)?;
    r.read_field("IALVL", &mut sub.attachment_level)?;
    r.read_field("ILOC", &mut sub.image_location)?;
    r.read_field("IMAG", &mut sub.image_magnification)?;
    read_extension_section(
        r,
        "UDIDL",
        &mut sub.user_defined,
        &mut sub.user_defined_overflow,
        settings,
    )?;
    read_extension_section(r, "IXSHDL", &mut sub.extended, &mut sub.extended_overflow, settings)?;
    Ok(sub)
}

fn read_graphic_subheader(
    r: &mut FieldReader,
    version: Version,
    settings: &NitfSettings,
) -> Result<GraphicSubheader, NitfError> {
    let mut sub = GraphicSubheader::new(version);
    r.read_field("SY", &mut sub.file_part_type)?;
    r.read_field("SID", &mut sub.graphic_id)?;
    r.read_field("SNAME", &mut sub.graphic_name)?;
    read_security(r, &mut sub.security, version)?;
    r.read_field("ENCRYP", &mut sub.encrypted)?;
    if let Some(symbol) = sub.symbol.as_mut() {
        r.read_field("STYPE", &mut symbol.symbol_type)?;
        r.read_field("NLIPS", &mut symbol.num_lines)?;
        r.read_field("NPIXPL", &mut symbol.pixels_per_line)?;
        r.read_field("NWDTH", &mut symbol.line_width)?;
        r.read_field("NBPP", &mut symbol.bits_per_pixel)?;
        r.read_field("SDLVL", &mut sub.display_level)?;
        r.read_field("SALVL", &mut sub.attachment_level)?;
        r.read_field("SLOC", &mut sub.location)?;
        r.read_field("SLOC2", &mut symbol.second_location)?;
        r.read_field("SCOLOR", &mut sub.color)?;
        r.read_field("SNUM", &mut symbol.symbol_number)?;
        r.read_field("SROT", &mut symbol.rotation)?;
        let nelut = r.read_count("NELUT", 3)? as usize;
        symbol.lut = r.read_bytes(nelut * 3)?;
    } else {
        r.read_field("SFMT", &mut sub.format)?;
        r.read_field("SSTRUCT", &mut sub.structure)?;
        r.read_field("SDLVL", &mut sub.display_level)?;
        r.read_field("SALVL", &mut sub.attachment_level)?;
        r.read_field("SLOC", &mut sub.location)?;
        r.read_field("SBND1", &mut sub.first_bound)?;
        r.read_field("SCOLOR", &mut sub.color)?;
        r.read_field("SBND2", &mut sub.second_bound)?;
        r.read_field("SRES2", &mut sub.reserved)?;
    }
    read_extension_section(r, "SXSHDL", &mut sub.extended, &mut sub.extended_overflow, settings)?;
    Ok(sub)
}

fn read_label_subheader(
    r: &mut FieldReader,
    settings: &NitfSettings,
) -> Result<LabelSubheader, NitfError> {
    let mut sub = LabelSubheader::new();
    r.read_field("LA", &mut sub.file_part_type)?;
    r.read_field("LID", &mut sub.label_id)?;
    read_security(r, &mut sub.security, Version::Nitf20)?;
    r.read_field("ENCRYP", &mut sub.encrypted)?;
    r.read_field("LFS", &mut sub.font_style)?;
    r.read_field("LCW", &mut sub.cell_width)?;
    r.read_field("LCH", &mut sub.cell_height)?;
    r.read_field("LDLVL", &mut sub.display_level)?;
    r.read_field("LALVL", &mut sub.attachment_level)?;
    r.read_field("LLOCR", &mut sub.location_row)?;
    r.read_field("LLOCC", &mut sub.location_column)?;
    r.read_field("LTC", &mut sub.text_color)?;
    r.read_field("LBC", &mut sub.background_color)?;
    read_extension_section(r, "LXSHDL", &mut sub.extended, &mut sub.extended_overflow, settings)?;
    Ok(sub)
}

fn read_text_subheader(
    r: &mut FieldReader,
    version: Version,
    settings: &NitfSettings,
) -> Result<TextSubheader, NitfError> {
    let mut sub = TextSubheader::new(version);
    r.read_field("TE", &mut sub.file_part_type)?;
    r.read_field("TEXTID", &mut sub.text_id)?;
    if !version.is_legacy() {
        r.read_field("TXTALVL", &mut sub.attachment_level)?;
    }
    r.read_field("TXTDT", &mut sub.date_time)?;
    r.read_field("TXTITL", &mut sub.title)?;
    read_security(r, &mut sub.security, version)?;
    r.read_field("ENCRYP", &mut sub.encrypted)?;
    r.read_field("TXTFMT", &mut sub.format)?;
    read_extension_section(r, "TXSHDL", &mut sub.extended, &mut sub.extended_overflow, settings)?;
    Ok(sub)
}

fn read_de_subheader(r: &mut FieldReader, version: Version) -> Result<DeSubheader, NitfError> {
    let mut sub = DeSubheader::new(version);
    r.read_field("DE", &mut sub.file_part_type)?;
    r.read_field("DESID", &mut sub.type_id)?;
    r.read_field("DESVER", &mut sub.version)?;
    read_security(r, &mut sub.security, version)?;
    if sub.is_overflow() {
        sub.overflowed_header_type.resize(6);
        sub.data_item_overflowed.resize(3);
        r.read_field("DESOFLW", &mut sub.overflowed_header_type)?;
        r.read_field("DESITEM", &mut sub.data_item_overflowed)?;
    }
    let desshl = r.read_count("DESSHL", 4)? as usize;
    let fields = r.read_bytes(desshl)?;
    sub.subheader_fields.set_raw(&fields)?;
    Ok(sub)
}

fn read_re_subheader(r: &mut FieldReader, version: Version) -> Result<ReSubheader, NitfError> {
    let mut sub = ReSubheader::new(version);
    r.read_field("RE", &mut sub.file_part_type)?;
    r.read_field("RESTAG", &mut sub.type_id)?;
    r.read_field("RESVER", &mut sub.version)?;
    read_security(r, &mut sub.security, version)?;
    let resshl = r.read_count("RESSHL", 4)? as usize;
    let fields = r.read_bytes(resshl)?;
    sub.subheader_fields.set_raw(&fields)?;
    Ok(sub)
}

/// Move the TREs of every overflow DES back into its host section. The DES
/// itself stays in the record as the overflow holder, with its payload
/// cleared; the writer regenerates it from the host section on the way out.
fn unmerge_overflows(
    io: &mut dyn IoInterface,
    record: &mut Record,
    settings: &NitfSettings,
    warnings: &mut Vec<ParseWarning>,
) -> Result<(), NitfError> {
    for i in 0..record.data_extensions.len() {
        if !record.data_extensions[i].subheader.is_overflow() {
            continue;
        }
        let (start, end) = match record.data_extensions[i].data {
            SegmentData::OnDisk { start, end } => (start, end),
            _ => continue,
        };
        io.seek(Whence::Set, start as i64)?;
        let mut payload = vec![0u8; (end - start) as usize];
        read_total(&mut *io, &mut payload)?;

        let section = record.data_extensions[i].subheader.type_id.as_string();
        let item = record.data_extensions[i]
            .subheader
            .data_item_overflowed
            .as_u64()
            .unwrap_or(0) as usize;

        let mut recovered = Extensions::new();
        parse_tre_block(
            &payload,
            start,
            SegmentKind::DataExtension,
            &mut recovered,
            settings,
            warnings,
        )?;

        let host = host_section(record, &section, item)?;
        for tre in recovered {
            host.append(tre);
        }
        record.data_extensions[i].data = SegmentData::Empty;
    }
    Ok(())
}

/// Resolve an overflow DES target to the host section's extension list.
/// `item` is the one-based segment index, or zero for the file header.
fn host_section<'a>(
    record: &'a mut Record,
    section: &str,
    item: usize,
) -> Result<&'a mut Extensions, NitfError> {
    let bad_item = || NitfError::Structural {
        msg: format!("overflow DES for {} names missing segment {}", section, item),
    };
    match section {
        "UDHD" => Ok(&mut record.header.user_defined),
        "XHD" => Ok(&mut record.header.extended),
        "UDID" => record
            .images
            .get_mut(item.wrapping_sub(1))
            .map(|s| &mut s.subheader.user_defined)
            .ok_or_else(bad_item),
        "IXSHD" => record
            .images
            .get_mut(item.wrapping_sub(1))
            .map(|s| &mut s.subheader.extended)
            .ok_or_else(bad_item),
        "SXSHD" => record
            .graphics
            .get_mut(item.wrapping_sub(1))
            .map(|s| &mut s.subheader.extended)
            .ok_or_else(bad_item),
        "TXSHD" => record
            .texts
            .get_mut(item.wrapping_sub(1))
            .map(|s| &mut s.subheader.extended)
            .ok_or_else(bad_item),
        other => Err(NitfError::Structural {
            msg: format!("{} is not an overflowable section", other),
        }),
    }
}
