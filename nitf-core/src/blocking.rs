//! Block geometry, mask tables and sub-window requests for image segments.
//!
//! An image segment is a grid of blocks, each `NPPBH x NPPBV` pixels, laid
//! out on disk according to the image mode. Everything the read and write
//! engines need to turn `(row, col, band)` into a byte-and-bit position goes
//! through [`BlockGeometry`], so the layout equations live in exactly one
//! place.
use crate::enums::ImageMode;
use crate::errors::*;
use crate::io::{read_total, IoInterface};

use std::convert::TryInto;

/// The block offset value that marks a block as entirely pad pixels.
pub const MASK_PAD_SENTINEL: u32 = 0xFFFF_FFFF;

/// The dimensions and layout of one image segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockGeometry {
    /// NROWS: significant rows in the image.
    pub rows: u32,
    /// NCOLS: significant columns in the image.
    pub cols: u32,
    /// Band count (NBANDS, or XBANDS when NBANDS is zero).
    pub bands: usize,
    /// NBPR: blocks across one row of blocks.
    pub blocks_per_row: u32,
    /// NBPC: blocks down one column of blocks.
    pub blocks_per_col: u32,
    /// NPPBH: pixels per block horizontally.
    pub block_width: u32,
    /// NPPBV: pixels per block vertically.
    pub block_height: u32,
    /// NBPP: container bits per pixel on disk.
    pub bits_per_pixel: u32,
    /// IMODE.
    pub mode: ImageMode,
}

impl BlockGeometry {
    /// Check the structural invariants of the grid.
    pub fn validate(&self) -> Result<(), NitfError> {
        let structural = |msg: String| Err(NitfError::Structural { msg });
        if self.bands == 0 {
            return structural("image has zero bands".to_string());
        }
        if !(1..=64).contains(&self.bits_per_pixel) {
            return structural(format!("NBPP {} outside 1..=64", self.bits_per_pixel));
        }
        if self.block_width == 0 || self.block_height == 0 {
            return structural("zero block dimensions".to_string());
        }
        if self.blocks_per_row == 0 || self.blocks_per_col == 0 {
            return structural("zero block counts".to_string());
        }
        if u64::from(self.blocks_per_row) * u64::from(self.block_width) < u64::from(self.cols) {
            return structural(format!(
                "{} blocks of {} pixels cannot cover {} columns",
                self.blocks_per_row, self.block_width, self.cols
            ));
        }
        if u64::from(self.blocks_per_col) * u64::from(self.block_height) < u64::from(self.rows) {
            return structural(format!(
                "{} blocks of {} pixels cannot cover {} rows",
                self.blocks_per_col, self.block_height, self.rows
            ));
        }
        Ok(())
    }

    /// The byte width of the smallest power-of-two container that holds one
    /// unpacked pixel sample.
    pub fn container_bytes(&self) -> usize {
        match self.bits_per_pixel {
            1..=8 => 1,
            9..=16 => 2,
            17..=32 => 4,
            _ => 8,
        }
    }

    /// Samples in one on-disk line of a block. In mode P the bands of a
    /// pixel are adjacent, so a line carries every band.
    fn line_samples(&self) -> usize {
        match self.mode {
            ImageMode::PixelInterleave => self.block_width as usize * self.bands,
            _ => self.block_width as usize,
        }
    }

    /// Lines in one on-disk block. In mode R every image row contributes one
    /// line per band.
    fn lines_per_block(&self) -> usize {
        match self.mode {
            ImageMode::RowInterleave => self.block_height as usize * self.bands,
            _ => self.block_height as usize,
        }
    }

    /// Bits in one on-disk line. One-bit data pads every line to a byte
    /// boundary; all other depths pack lines back to back.
    fn line_bits(&self) -> usize {
        let bits = self.line_samples() * self.bits_per_pixel as usize;
        if self.bits_per_pixel == 1 {
            (bits + 7) / 8 * 8
        } else {
            bits
        }
    }

    /// Bytes of one on-disk block instance. For modes B and S this is one
    /// band of one block; for P and R it covers every band.
    pub fn block_bytes(&self) -> usize {
        (self.lines_per_block() * self.line_bits() + 7) / 8
    }

    /// How many separately stored planes of blocks the segment has: one per
    /// band for B and S, a single interleaved plane for P and R.
    pub fn planes(&self) -> usize {
        match self.mode {
            ImageMode::BlockInterleave | ImageMode::BandSequential => self.bands,
            _ => 1,
        }
    }

    /// Blocks in one plane.
    pub fn blocks_per_plane(&self) -> usize {
        self.blocks_per_row as usize * self.blocks_per_col as usize
    }

    /// Total block instances on disk.
    pub fn block_instances(&self) -> usize {
        self.blocks_per_plane() * self.planes()
    }

    /// Total pixel payload bytes, excluding any mask table.
    pub fn payload_bytes(&self) -> u64 {
        self.block_instances() as u64 * self.block_bytes() as u64
    }

    /// The flat block index of `(block_row, block_col)` within a plane.
    pub fn block_index(&self, block_row: u32, block_col: u32) -> usize {
        block_row as usize * self.blocks_per_row as usize + block_col as usize
    }

    /// The natural (unmasked) byte offset of a block instance from the start
    /// of the pixel stream.
    pub fn natural_offset(&self, plane: usize, block_row: u32, block_col: u32) -> u64 {
        let plane_bytes = self.blocks_per_plane() as u64 * self.block_bytes() as u64;
        plane as u64 * plane_bytes
            + self.block_index(block_row, block_col) as u64 * self.block_bytes() as u64
    }

    /// The bit position of a sample within its block instance.
    ///
    /// `band` is the band index within the block and is only meaningful for
    /// modes P and R; for B and S the plane selection happens outside.
    pub fn sample_bit_index(&self, row_in_block: u32, col_in_block: u32, band: usize) -> usize {
        let (line, sample) = match self.mode {
            ImageMode::PixelInterleave => (
                row_in_block as usize,
                col_in_block as usize * self.bands + band,
            ),
            ImageMode::RowInterleave => (
                row_in_block as usize * self.bands + band,
                col_in_block as usize,
            ),
            _ => (row_in_block as usize, col_in_block as usize),
        };
        line * self.line_bits() + sample * self.bits_per_pixel as usize
    }

    /// The range of block rows and block columns a sub-window touches:
    /// `(first_block_row..=last_block_row, first_block_col..=last_block_col)`.
    pub fn covering_blocks(&self, window: &SubWindow) -> (std::ops::RangeInclusive<u32>, std::ops::RangeInclusive<u32>) {
        let r0 = window.start_row / self.block_height;
        let r1 = (window.start_row + window.num_rows - 1) / self.block_height;
        let c0 = window.start_col / self.block_width;
        let c1 = (window.start_col + window.num_cols - 1) / self.block_width;
        (r0..=r1, c0..=c1)
    }
}

/// A pixel-skip down-sampler: every `row_skip`-th row and `col_skip`-th
/// column of the window is kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DownSampler {
    pub row_skip: u32,
    pub col_skip: u32,
}

/// A rectangular, band-selecting read or write request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubWindow {
    pub start_row: u32,
    pub num_rows: u32,
    pub start_col: u32,
    pub num_cols: u32,
    /// Band indices to transfer, in output order.
    pub bands: Vec<u32>,
    pub downsample: Option<DownSampler>,
}

impl SubWindow {
    pub fn new(start_row: u32, num_rows: u32, start_col: u32, num_cols: u32, bands: Vec<u32>) -> Self {
        SubWindow {
            start_row,
            num_rows,
            start_col,
            num_cols,
            bands,
            downsample: None,
        }
    }

    /// A window covering the whole segment and every band.
    pub fn full(geometry: &BlockGeometry) -> Self {
        SubWindow::new(
            0,
            geometry.rows,
            0,
            geometry.cols,
            (0..geometry.bands as u32).collect(),
        )
    }

    /// Validate the window against the segment geometry. `band_limit` is the
    /// number of addressable bands (which can exceed the stored band count
    /// when a lookup table expands a band).
    pub fn validate(&self, geometry: &BlockGeometry, band_limit: usize) -> Result<(), NitfError> {
        let invalid = |msg: String| Err(NitfError::InvalidArgument { msg });
        if self.num_rows == 0 || self.num_cols == 0 {
            return invalid("empty sub-window".to_string());
        }
        if u64::from(self.start_row) + u64::from(self.num_rows) > u64::from(geometry.rows)
            || u64::from(self.start_col) + u64::from(self.num_cols) > u64::from(geometry.cols)
        {
            return invalid(format!(
                "window {}+{} x {}+{} exceeds image {} x {}",
                self.start_row, self.num_rows, self.start_col, self.num_cols,
                geometry.rows, geometry.cols
            ));
        }
        if self.bands.is_empty() {
            return invalid("empty band list".to_string());
        }
        if self.bands.len() > 1 && self.bands.windows(2).all(|w| w[0] > w[1]) {
            return invalid("strictly decreasing band list".to_string());
        }
        if let Some(bad) = self.bands.iter().find(|b| **b as usize >= band_limit) {
            return invalid(format!(
                "band {} out of range (image has {} bands)",
                bad, band_limit
            ));
        }
        if let Some(ds) = &self.downsample {
            if ds.row_skip == 0 || ds.col_skip == 0 {
                return invalid("down-sampler skip factors must be nonzero".to_string());
            }
        }
        Ok(())
    }

    /// Output rows after down-sampling.
    pub fn out_rows(&self) -> usize {
        match &self.downsample {
            Some(ds) => ((self.num_rows + ds.row_skip - 1) / ds.row_skip) as usize,
            None => self.num_rows as usize,
        }
    }

    /// Output columns after down-sampling.
    pub fn out_cols(&self) -> usize {
        match &self.downsample {
            Some(ds) => ((self.num_cols + ds.col_skip - 1) / ds.col_skip) as usize,
            None => self.num_cols as usize,
        }
    }

    /// Whether the window covers the full extent with no down-sampling.
    pub fn is_full_extent(&self, geometry: &BlockGeometry) -> bool {
        self.start_row == 0
            && self.start_col == 0
            && self.num_rows == geometry.rows
            && self.num_cols == geometry.cols
            && self.downsample.is_none()
    }
}

/// The mask table that prefixes the pixel stream of `M*`-coded segments.
///
/// The table holds the byte offset of every stored block instance, relative
/// to the end of the mask table itself. A [`MASK_PAD_SENTINEL`] offset marks
/// a block that holds only pad pixels and is not stored at all.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaskTable {
    /// IMDATOFF: bytes from the start of the masked stream to the pixels.
    pub image_data_offset: u32,
    /// BMRLNTH: 4 when the block offset table is present, else 0.
    pub block_record_length: u16,
    /// TMRLNTH: 4 when the pad pixel offset table is present, else 0.
    pub pad_record_length: u16,
    /// TPXCDLNTH: pad pixel code length in bits.
    pub pad_code_length: u16,
    /// TPXCD: the declared pad pixel value, `ceil(TPXCDLNTH / 8)` bytes.
    pub pad_pixel: Vec<u8>,
    /// Block offsets, one per block instance, plane-major.
    pub block_offsets: Vec<u32>,
    /// Offsets of blocks containing at least one pad pixel.
    pub pad_offsets: Vec<u32>,
}

impl MaskTable {
    /// A mask with a full offset table, all blocks initially pad.
    pub fn new_all_pad(instances: usize, pad_pixel: Vec<u8>) -> Self {
        let pad_code_length = (pad_pixel.len() * 8) as u16;
        let mut mask = MaskTable {
            image_data_offset: 0,
            block_record_length: 4,
            pad_record_length: 0,
            pad_code_length,
            pad_pixel,
            block_offsets: vec![MASK_PAD_SENTINEL; instances],
            pad_offsets: Vec::new(),
        };
        mask.image_data_offset = mask.byte_len() as u32;
        mask
    }

    /// Read a mask table for `instances` block instances from the interface.
    pub fn read(io: &mut dyn IoInterface, instances: usize) -> Result<Self, NitfError> {
        let mut header = [0u8; 10];
        read_total(&mut *io, &mut header)?;
        let image_data_offset = u32::from_be_bytes(header[0..4].try_into()?);
        let block_record_length = u16::from_be_bytes(header[4..6].try_into()?);
        let pad_record_length = u16::from_be_bytes(header[6..8].try_into()?);
        let pad_code_length = u16::from_be_bytes(header[8..10].try_into()?);

        if block_record_length != 0 && block_record_length != 4 {
            return Err(NitfError::Structural {
                msg: format!("mask block record length {} is not 0 or 4", block_record_length),
            });
        }
        if pad_record_length != 0 && pad_record_length != 4 {
            return Err(NitfError::Structural {
                msg: format!("mask pad record length {} is not 0 or 4", pad_record_length),
            });
        }

        let mut pad_pixel = vec![0u8; (pad_code_length as usize + 7) / 8];
        read_total(&mut *io, &mut pad_pixel)?;

        fn read_table(
            io: &mut dyn IoInterface,
            present: bool,
            instances: usize,
        ) -> Result<Vec<u32>, NitfError> {
            if !present {
                return Ok(Vec::new());
            }
            let mut bytes = vec![0u8; instances * 4];
            read_total(&mut *io, &mut bytes)?;
            Ok(bytes
                .chunks_exact(4)
                .map(|c| u32::from_be_bytes(c.try_into().expect("chunks of four")))
                .collect())
        }
        let block_offsets = read_table(&mut *io, block_record_length == 4, instances)?;
        let pad_offsets = read_table(&mut *io, pad_record_length == 4, instances)?;

        let mask = MaskTable {
            image_data_offset,
            block_record_length,
            pad_record_length,
            pad_code_length,
            pad_pixel,
            block_offsets,
            pad_offsets,
        };
        if mask.image_data_offset as usize != mask.byte_len() {
            return Err(NitfError::Structural {
                msg: format!(
                    "mask IMDATOFF {} disagrees with table size {}",
                    mask.image_data_offset,
                    mask.byte_len()
                ),
            });
        }
        Ok(mask)
    }

    /// Serialise the mask table.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.byte_len());
        out.extend_from_slice(&self.image_data_offset.to_be_bytes());
        out.extend_from_slice(&self.block_record_length.to_be_bytes());
        out.extend_from_slice(&self.pad_record_length.to_be_bytes());
        out.extend_from_slice(&self.pad_code_length.to_be_bytes());
        out.extend_from_slice(&self.pad_pixel);
        for offset in &self.block_offsets {
            out.extend_from_slice(&offset.to_be_bytes());
        }
        for offset in &self.pad_offsets {
            out.extend_from_slice(&offset.to_be_bytes());
        }
        out
    }

    /// The encoded size of the table. This is also the pixel stream offset.
    pub fn byte_len(&self) -> usize {
        10 + self.pad_pixel.len() + 4 * self.block_offsets.len() + 4 * self.pad_offsets.len()
    }

    /// The stored offset of a block instance, or `None` for an all-pad block.
    /// When no offset table is present every block is stored at its natural
    /// position.
    pub fn block_offset(&self, instance: usize, natural: u64) -> Option<u64> {
        if self.block_offsets.is_empty() {
            return Some(natural);
        }
        match self.block_offsets[instance] {
            MASK_PAD_SENTINEL => None,
            offset => Some(offset as u64),
        }
    }

    /// Whether a block instance is entirely pad pixels.
    pub fn is_pad(&self, instance: usize) -> bool {
        !self.block_offsets.is_empty() && self.block_offsets[instance] == MASK_PAD_SENTINEL
    }
}
