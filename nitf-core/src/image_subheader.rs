//! This file contains the definition of the image segment subheader.
//!
//! The image subheader carries the pixel structure (dimensions, bands, bit
//! depth, block grid, mode and compression) that drives the image I/O
//! engine, along with identification, security and geolocation metadata.
use crate::blocking::BlockGeometry;
use crate::enums::*;
use crate::errors::*;
use crate::field::Field;
use crate::security::FileSecurity;
use crate::tre::Extensions;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Per-band information: representation, subcategory, filter data and the
/// optional lookup tables.
#[derive(Debug, Clone, PartialEq)]
pub struct BandInfo {
    /// IREPBANDn (2).
    pub representation: Field,
    /// ISUBCATn (6).
    pub subcategory: Field,
    /// IFCn (1): image filter condition.
    pub filter_condition: Field,
    /// IMFLTn (3): standard image filter code.
    pub filter_code: Field,
    /// NLUTSn (1): number of lookup tables, 0 to 4.
    pub num_luts: Field,
    /// NELUTn (5): entries per lookup table; present when NLUTS > 0.
    pub lut_entries: Field,
    /// The lookup tables themselves, `num_luts` tables of `lut_entries`
    /// bytes each.
    pub luts: Vec<Vec<u8>>,
}

impl BandInfo {
    pub fn new() -> Self {
        BandInfo {
            representation: Field::new(2, CharClass::BcsA),
            subcategory: Field::new(6, CharClass::BcsA),
            filter_condition: Field::new(1, CharClass::BcsA),
            filter_code: Field::new(3, CharClass::BcsA),
            num_luts: Field::new(1, CharClass::BcsN),
            lut_entries: Field::new(5, CharClass::BcsN),
            luts: Vec::new(),
        }
    }

    /// Populate the band in one call, the common construction path.
    pub fn init(
        &mut self,
        representation: &str,
        subcategory: &str,
        filter_condition: &str,
        filter_code: &str,
        luts: Vec<Vec<u8>>,
    ) -> Result<(), NitfError> {
        self.representation.set_string(representation)?;
        self.subcategory.set_string(subcategory)?;
        self.filter_condition.set_string(filter_condition)?;
        self.filter_code.set_string(filter_code)?;
        self.num_luts.set_uint(luts.len() as u64)?;
        if let Some(first) = luts.first() {
            if luts.iter().any(|l| l.len() != first.len()) {
                return Err(NitfError::InvalidArgument {
                    msg: "all lookup tables of a band must have the same length".to_string(),
                });
            }
            self.lut_entries.set_uint(first.len() as u64)?;
        } else {
            self.lut_entries.set_uint(0u64)?;
        }
        self.luts = luts;
        Ok(())
    }

    pub fn lut_count(&self) -> Result<usize, NitfError> {
        Ok(self.num_luts.as_u64()? as usize)
    }

    /// The encoded width of this band entry.
    pub fn byte_len(&self) -> usize {
        let lut_bytes: usize = self.luts.iter().map(|l| l.len()).sum();
        let nelut = if self.luts.is_empty() { 0 } else { 5 };
        2 + 6 + 1 + 3 + 1 + nelut + lut_bytes
    }
}

impl Default for BandInfo {
    fn default() -> Self {
        Self::new()
    }
}

/// The parsed subheader of one image segment.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageSubheader {
    /// IM (2): file part type, always `IM`.
    pub file_part_type: Field,
    /// IID1 (10): image identifier.
    pub image_id: Field,
    /// IDATIM (14): image date and time.
    pub image_date_time: Field,
    /// TGTID (17): target identifier.
    pub target_id: Field,
    /// IID2 (80): image title (ITITLE in 2.0).
    pub image_title: Field,
    /// The image security group (IS fields).
    pub security: FileSecurity,
    /// ENCRYP (1).
    pub encrypted: Field,
    /// ISORCE (42): image source.
    pub image_source: Field,
    /// NROWS (8).
    pub num_rows: Field,
    /// NCOLS (8).
    pub num_cols: Field,
    /// PVTYPE (3): pixel value type.
    pub pixel_value_type: Field,
    /// IREP (8): image representation.
    pub image_representation: Field,
    /// ICAT (8): image category.
    pub image_category: Field,
    /// ABPP (2): actual bits per pixel.
    pub actual_bits_per_pixel: Field,
    /// PJUST (1): pixel justification.
    pub pixel_justification: Field,
    /// ICORDS (1): coordinate system of IGEOLO.
    pub image_coordinate_system: Field,
    /// IGEOLO (60): corner coordinates; present when ICORDS says so.
    pub corner_coordinates: Field,
    /// The image comments (ICOMn, 80 bytes each; NICOM is their count).
    pub comments: Vec<Field>,
    /// IC (2): compression code.
    pub image_compression: Field,
    /// COMRAT (4): compression rate; present for compressed codes.
    pub compression_rate: Field,
    /// The per-band information (NBANDS / XBANDS entries).
    pub bands: Vec<BandInfo>,
    /// ISYNC (1): image sync code, always 0.
    pub image_sync: Field,
    /// IMODE (1): B, P, R or S.
    pub image_mode: Field,
    /// NBPR (4): blocks per row.
    pub blocks_per_row: Field,
    /// NBPC (4): blocks per column.
    pub blocks_per_col: Field,
    /// NPPBH (4): pixels per block horizontally.
    pub pixels_per_block_horz: Field,
    /// NPPBV (4): pixels per block vertically.
    pub pixels_per_block_vert: Field,
    /// NBPP (2): container bits per pixel.
    pub bits_per_pixel: Field,
    /// IDLVL (3): display level.
    pub display_level: Field,
    /// IALVL (3): attachment level.
    pub attachment_level: Field,
    /// ILOC (10): row/column location relative to the attachment.
    pub image_location: Field,
    /// IMAG (4): image magnification.
    pub image_magnification: Field,
    /// UDOFL (3): overflow DES index of the user-defined section.
    pub user_defined_overflow: Field,
    /// The user-defined image data section (UDID).
    pub user_defined: Extensions,
    /// IXSOFL (3): overflow DES index of the extended section.
    pub extended_overflow: Field,
    /// The image extended subheader section (IXSHD).
    pub extended: Extensions,
}

impl ImageSubheader {
    /// Create a blank image subheader for the given version.
    pub fn new(version: Version) -> Self {
        let mut file_part_type = Field::new(2, CharClass::BcsA);
        file_part_type.set_string("IM").expect("static value");
        let mut magnification = Field::new(4, CharClass::BcsAPlus);
        magnification.set_string("1.0 ").expect("static value");
        ImageSubheader {
            file_part_type,
            image_id: Field::new(10, CharClass::BcsA),
            image_date_time: Field::new(14, CharClass::BcsA),
            target_id: Field::new(17, CharClass::BcsA),
            image_title: Field::new(80, CharClass::BcsA),
            security: FileSecurity::new(version),
            encrypted: Field::new(1, CharClass::BcsN),
            image_source: Field::new(42, CharClass::BcsA),
            num_rows: Field::new(8, CharClass::BcsN),
            num_cols: Field::new(8, CharClass::BcsN),
            pixel_value_type: Field::new(3, CharClass::BcsA),
            image_representation: Field::new(8, CharClass::BcsA),
            image_category: Field::new(8, CharClass::BcsA),
            actual_bits_per_pixel: Field::new(2, CharClass::BcsN),
            pixel_justification: Field::new(1, CharClass::BcsA),
            image_coordinate_system: Field::new(1, CharClass::BcsA),
            corner_coordinates: Field::new(0, CharClass::BcsA),
            comments: Vec::new(),
            image_compression: Field::new(2, CharClass::BcsA),
            compression_rate: Field::new(0, CharClass::BcsA),
            bands: Vec::new(),
            image_sync: Field::new(1, CharClass::BcsN),
            image_mode: Field::new(1, CharClass::BcsA),
            blocks_per_row: Field::new(4, CharClass::BcsN),
            blocks_per_col: Field::new(4, CharClass::BcsN),
            pixels_per_block_horz: Field::new(4, CharClass::BcsN),
            pixels_per_block_vert: Field::new(4, CharClass::BcsN),
            bits_per_pixel: Field::new(2, CharClass::BcsN),
            display_level: Field::new(3, CharClass::BcsN),
            attachment_level: Field::new(3, CharClass::BcsN),
            image_location: Field::new(10, CharClass::BcsN),
            image_magnification: magnification,
            user_defined_overflow: Field::new(3, CharClass::BcsN),
            user_defined: Extensions::new(),
            extended_overflow: Field::new(3, CharClass::BcsN),
            extended: Extensions::new(),
        }
    }

    /// Set the image dimensions and block grid in one call, computing NBPR
    /// and NBPC from the block size.
    pub fn set_blocking(
        &mut self,
        rows: u32,
        cols: u32,
        rows_per_block: u32,
        cols_per_block: u32,
        mode: ImageMode,
    ) -> Result<(), NitfError> {
        if rows_per_block == 0 || cols_per_block == 0 {
            return Err(NitfError::InvalidArgument {
                msg: "block dimensions must be nonzero".to_string(),
            });
        }
        let nbpc = (rows + rows_per_block - 1) / rows_per_block;
        let nbpr = (cols + cols_per_block - 1) / cols_per_block;
        self.num_rows.set_uint(rows)?;
        self.num_cols.set_uint(cols)?;
        self.pixels_per_block_vert.set_uint(rows_per_block)?;
        self.pixels_per_block_horz.set_uint(cols_per_block)?;
        self.blocks_per_col.set_uint(nbpc)?;
        self.blocks_per_row.set_uint(nbpr)?;
        self.image_mode.set_string(mode.code())
    }

    /// Set the pixel structure and band table in one call.
    #[allow(clippy::too_many_arguments)]
    pub fn set_pixel_information(
        &mut self,
        pixel_value_type: PixelValueType,
        bits_per_pixel: u32,
        actual_bits_per_pixel: u32,
        justification: PixelJustification,
        representation: ImageRepresentation,
        category: &str,
        bands: Vec<BandInfo>,
    ) -> Result<(), NitfError> {
        if !(1..=64).contains(&bits_per_pixel) || actual_bits_per_pixel > bits_per_pixel {
            return Err(NitfError::InvalidArgument {
                msg: format!(
                    "invalid bit depths (NBPP {}, ABPP {})",
                    bits_per_pixel, actual_bits_per_pixel
                ),
            });
        }
        self.pixel_value_type.set_string(pixel_value_type.code())?;
        self.bits_per_pixel.set_uint(bits_per_pixel)?;
        self.actual_bits_per_pixel.set_uint(actual_bits_per_pixel)?;
        self.pixel_justification.set_string(justification.code())?;
        self.image_representation.set_string(representation.code())?;
        self.image_category.set_string(category)?;
        self.bands = bands;
        Ok(())
    }

    /// Set the compression code, resizing the conditional COMRAT field.
    pub fn set_compression(&mut self, compression: Compression, rate: &str) -> Result<(), NitfError> {
        self.image_compression.set_string(compression.code())?;
        if compression.has_rate_field() {
            self.compression_rate.resize(4);
            self.compression_rate.set_string(rate)?;
        } else {
            self.compression_rate.resize(0);
        }
        Ok(())
    }

    /// Append an image comment, keeping NICOM at most 9.
    pub fn insert_comment(&mut self, comment: &str) -> Result<usize, NitfError> {
        if self.comments.len() >= 9 {
            return Err(NitfError::InvalidArgument {
                msg: "an image subheader holds at most 9 comments".to_string(),
            });
        }
        let mut field = Field::new(80, CharClass::BcsA);
        field.set_string(comment)?;
        self.comments.push(field);
        Ok(self.comments.len())
    }

    /// Remove the comment at `index`.
    pub fn remove_comment(&mut self, index: usize) -> Result<(), NitfError> {
        if index >= self.comments.len() {
            return Err(NitfError::InvalidArgument {
                msg: format!("no comment at index {}", index),
            });
        }
        self.comments.remove(index);
        Ok(())
    }

    /// Set the corner coordinates, resizing IGEOLO and recording the
    /// coordinate system code for this subheader's version.
    pub fn set_corners(
        &mut self,
        corners: &[crate::geo::GeoPoint; 4],
        system: CoordinateSystem,
        version: Version,
    ) -> Result<(), NitfError> {
        self.image_coordinate_system
            .set_string(system.code(version).trim_end())?;
        self.corner_coordinates.resize(60);
        self.corner_coordinates
            .set_string(&crate::geo::format_igeolo(corners, system)?)
    }

    /// The parsed corner coordinates, when ICORDS declares a convertible
    /// system.
    pub fn corners(&self, version: Version) -> Result<[crate::geo::GeoPoint; 4], NitfError> {
        let system =
            CoordinateSystem::new(&self.image_coordinate_system.as_string(), version)?;
        crate::geo::parse_igeolo(
            &String::from_utf8_lossy(self.corner_coordinates.raw()),
            system,
        )
    }

    /// Set the image date-time in the layout of the target version.
    pub fn set_date_time(
        &mut self,
        dt: &crate::datetime::NitfDateTime,
        version: Version,
    ) -> Result<(), NitfError> {
        self.image_date_time.set_string(&dt.format(version))
    }

    /// The number of stored bands (NBANDS, or XBANDS via the band table).
    pub fn band_count(&self) -> usize {
        self.bands.len()
    }

    pub fn mode(&self) -> Result<ImageMode, NitfError> {
        ImageMode::new(&self.image_mode.as_string())
    }

    pub fn compression(&self) -> Result<Compression, NitfError> {
        Compression::new(&self.image_compression.as_string())
    }

    pub fn pixel_type(&self) -> Result<PixelValueType, NitfError> {
        PixelValueType::new(&self.pixel_value_type.as_string())
    }

    pub fn representation(&self) -> Result<ImageRepresentation, NitfError> {
        ImageRepresentation::new(&self.image_representation.as_string())
    }

    pub fn justification(&self) -> Result<PixelJustification, NitfError> {
        PixelJustification::new(&self.pixel_justification.as_string())
    }

    /// Build the validated block geometry the image engines run on.
    pub fn geometry(&self) -> Result<BlockGeometry, NitfError> {
        let geometry = BlockGeometry {
            rows: self.num_rows.as_u64()? as u32,
            cols: self.num_cols.as_u64()? as u32,
            bands: self.band_count(),
            blocks_per_row: self.blocks_per_row.as_u64()? as u32,
            blocks_per_col: self.blocks_per_col.as_u64()? as u32,
            block_width: self.pixels_per_block_horz.as_u64()? as u32,
            block_height: self.pixels_per_block_vert.as_u64()? as u32,
            bits_per_pixel: self.bits_per_pixel.as_u64()? as u32,
            mode: self.mode()?,
        };
        geometry.validate()?;
        // ABPP never exceeds the container depth.
        let abpp = self.actual_bits_per_pixel.as_u64()? as u32;
        if abpp > geometry.bits_per_pixel {
            return Err(NitfError::Structural {
                msg: format!("ABPP {} exceeds NBPP {}", abpp, geometry.bits_per_pixel),
            });
        }
        Ok(geometry)
    }

    /// The encoded size of the subheader in bytes for the given version.
    pub fn byte_len(&self, version: Version) -> usize {
        let mut len = 2 + 10 + 14 + 17 + 80;
        len += self.security.byte_len(version);
        len += 1 + 42 + 8 + 8 + 3 + 8 + 8 + 2 + 1;
        len += 1 + self.corner_coordinates.len();
        len += 1 + self.comments.len() * 80;
        len += 2 + self.compression_rate.len();
        len += 1; // NBANDS
        if self.bands.len() > 9 {
            len += 5; // XBANDS
        }
        len += self.bands.iter().map(|b| b.byte_len()).sum::<usize>();
        len += 1 + 1 + 4 + 4 + 4 + 4 + 2 + 3 + 3 + 10 + 4;
        len += crate::tre::extensions::section_byte_len(&self.user_defined, &self.user_defined_overflow);
        len += crate::tre::extensions::section_byte_len(&self.extended, &self.extended_overflow);
        len
    }
}

/// A typed, owned-string view of the pixel structure for display and
/// serialisation.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ReadableImageSubheader {
    pub image_id: String,
    pub date_time: String,
    pub title: String,
    pub rows: u64,
    pub cols: u64,
    pub bands: usize,
    pub pixel_value_type: String,
    pub representation: String,
    pub bits_per_pixel: u64,
    pub actual_bits_per_pixel: u64,
    pub mode: String,
    pub compression: String,
    pub blocks_per_row: u64,
    pub blocks_per_col: u64,
    pub block_width: u64,
    pub block_height: u64,
}

impl ImageSubheader {
    /// Convert the subheader to a rust readable view.
    pub fn to_readable(&self) -> Result<ReadableImageSubheader, NitfError> {
        Ok(ReadableImageSubheader {
            image_id: self.image_id.as_string(),
            date_time: self.image_date_time.as_string(),
            title: self.image_title.as_string(),
            rows: self.num_rows.as_u64()?,
            cols: self.num_cols.as_u64()?,
            bands: self.band_count(),
            pixel_value_type: self.pixel_value_type.as_string(),
            representation: self.image_representation.as_string(),
            bits_per_pixel: self.bits_per_pixel.as_u64()?,
            actual_bits_per_pixel: self.actual_bits_per_pixel.as_u64()?,
            mode: self.image_mode.as_string(),
            compression: self.image_compression.as_string(),
            blocks_per_row: self.blocks_per_row.as_u64()?,
            blocks_per_col: self.blocks_per_col.as_u64()?,
            block_width: self.pixels_per_block_horz.as_u64()?,
            block_height: self.pixels_per_block_vert.as_u64()?,
        })
    }

    #[cfg(feature = "to_json")]
    pub fn to_json(&self) -> Result<String, NitfError> {
        serde_json::to_string(&self.to_readable()?).map_err(|e| NitfError::Parse {
            field: "image subheader".to_string(),
            value: e.to_string(),
        })
    }
}

impl std::fmt::Display for ImageSubheader {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(
            f,
            "image id: {}
title: {}
rows: {}
cols: {}
bands: {}
pixel value type: {}
representation: {}
bits per pixel: {}
mode: {}
compression: {}
blocking: {} x {} blocks of {} x {}",
            self.image_id.as_string(),
            self.image_title.as_string(),
            self.num_rows.as_string(),
            self.num_cols.as_string(),
            self.band_count(),
            self.pixel_value_type.as_string(),
            self.image_representation.as_string(),
            self.bits_per_pixel.as_string(),
            self.image_mode,
            self.image_compression.as_string(),
            self.blocks_per_col.as_string(),
            self.blocks_per_row.as_string(),
            self.pixels_per_block_vert.as_string(),
            self.pixels_per_block_horz.as_string(),
        )
    }
}
