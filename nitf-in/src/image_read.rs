//! The image read engine: sub-window reads over blocked, masked, possibly
//! compressed image segments.
//!
//! A read walks the blocks covering the requested window, resolves each
//! block's stored position through the mask table (or the natural layout
//! equation), decodes it, and scatters the requested rectangle into the user
//! buffer, unpacking bits, applying per-band lookup tables and normalising
//! endianness on the way. Blocks marked all-pad by the mask never touch the
//! decompressor.
use crate::cache::BlockCache;

use nitf_core::bits::unpack_sample;
use nitf_core::blocking::{BlockGeometry, MaskTable, SubWindow};
use nitf_core::byteswap::{swap_striped, HOST_IS_LE};
use nitf_core::enums::{Compression, ImageMode, ImageRepresentation, SegmentKind};
use nitf_core::errors::NitfError;
use nitf_core::image_subheader::ImageSubheader;
use nitf_core::io::{read_total, IoInterface, Whence};
use nitf_core::plugin;
use nitf_core::settings::{NitfSettings, ParseWarning};

/// How a requested band maps onto the stored data: the stored band to read
/// and the lookup table to push each sample through.
#[derive(Clone)]
struct BandRoute {
    stored_band: usize,
    lut: Option<Vec<u8>>,
}

/// A reader over one image segment of an open record.
///
/// Holds the parsed mask table and a small LRU cache of decoded blocks; both
/// live as long as the reader.
pub struct ImageReader<'a> {
    io: &'a mut dyn IoInterface,
    geometry: BlockGeometry,
    compression: Compression,
    mask: Option<MaskTable>,
    /// File offset of the pixel stream (past the mask table, if any).
    pixel_start: u64,
    /// Length of the pixel stream in bytes.
    stream_len: u64,
    routes: Vec<BandRoute>,
    pad_sample: Vec<u8>,
    cache: BlockCache,
    settings: NitfSettings,
    warnings: Vec<ParseWarning>,
}

impl<'a> ImageReader<'a> {
    /// Build a reader for a segment whose payload spans
    /// `data_start..data_start + data_len` on `io`.
    pub fn new(
        io: &'a mut dyn IoInterface,
        subheader: &ImageSubheader,
        data_start: u64,
        data_len: u64,
        settings: &NitfSettings,
    ) -> Result<Self, NitfError> {
        let geometry = subheader.geometry()?;
        let compression = subheader.compression()?;

        let mask = if compression.has_mask() {
            io.seek(Whence::Set, data_start as i64)?;
            Some(MaskTable::read(&mut *io, geometry.block_instances())?)
        } else {
            None
        };
        let mask_len = mask.as_ref().map(|m| m.byte_len() as u64).unwrap_or(0);
        if data_len < mask_len {
            return Err(NitfError::Structural {
                msg: "segment data is shorter than its mask table".to_string(),
            });
        }

        let routes = band_routes(subheader, &geometry)?;
        let pad_sample = pad_sample(&mask, geometry.container_bytes());

        Ok(ImageReader {
            io,
            geometry,
            compression,
            mask,
            pixel_start: data_start + mask_len,
            stream_len: data_len - mask_len,
            routes,
            pad_sample,
            cache: BlockCache::new(settings.get_block_cache_size()),
            settings: settings.clone(),
            warnings: Vec::new(),
        })
    }

    pub fn geometry(&self) -> &BlockGeometry {
        &self.geometry
    }

    /// The declared pad pixel value, unpacked to container width.
    pub fn pad_sample(&self) -> &[u8] {
        &self.pad_sample
    }

    /// The number of bands a window may address. A three-table RGB/LUT band
    /// expands to three addressable bands.
    pub fn addressable_bands(&self) -> usize {
        self.routes.len()
    }

    /// Warnings collected by opted-in per-block recovery.
    pub fn warnings(&self) -> &[ParseWarning] {
        &self.warnings
    }

    /// Read a sub-window into a band-interleaved-by-pixel buffer.
    pub fn read(&mut self, window: &SubWindow) -> Result<Vec<u8>, NitfError> {
        self.read_impl(window, false)
    }

    /// Read a sub-window into a band-sequential buffer.
    pub fn read_band_sequential(&mut self, window: &SubWindow) -> Result<Vec<u8>, NitfError> {
        self.read_impl(window, true)
    }

    fn read_impl(&mut self, window: &SubWindow, sequential: bool) -> Result<Vec<u8>, NitfError> {
        window.validate(&self.geometry, self.routes.len())?;

        let container = self.geometry.container_bytes();
        let out_rows = window.out_rows();
        let out_cols = window.out_cols();
        let out_bands = window.bands.len();
        let mut out = vec![0u8; out_rows * out_cols * out_bands * container];

        // Full-extent byte-aligned reads of an unmasked uncompressed stream
        // come in with one contiguous read; the block walk below then runs
        // over memory instead of the interface.
        let preloaded = if window.is_full_extent(&self.geometry)
            && self.geometry.bits_per_pixel % 8 == 0
            && self.compression.is_uncompressed()
            && self.mask.is_none()
        {
            self.io.seek(Whence::Set, self.pixel_start as i64)?;
            let mut all = vec![0u8; self.stream_len as usize];
            read_total(&mut *self.io, &mut all)?;
            Some(all)
        } else {
            None
        };

        // The routes stay fixed for the whole read; a local copy keeps the
        // borrow on `self` free for block fetching.
        let routes = self.routes.clone();
        let (block_rows, block_cols) = self.geometry.covering_blocks(window);
        let (row_skip, col_skip) = match &window.downsample {
            Some(ds) => (ds.row_skip, ds.col_skip),
            None => (1, 1),
        };
        let row_end = window.start_row + window.num_rows;
        let col_end = window.start_col + window.num_cols;

        for brow in block_rows {
            for bcol in block_cols.clone() {
                let r_lo = window.start_row.max(brow * self.geometry.block_height);
                let r_hi = row_end.min((brow + 1) * self.geometry.block_height);
                let c_lo = window.start_col.max(bcol * self.geometry.block_width);
                let c_hi = col_end.min((bcol + 1) * self.geometry.block_width);

                for (out_band, requested) in window.bands.iter().enumerate() {
                    let route = &routes[*requested as usize];
                    let (plane, band_in_block) = match self.geometry.mode {
                        ImageMode::BlockInterleave | ImageMode::BandSequential => {
                            (route.stored_band, 0)
                        }
                        _ => (0, route.stored_band),
                    };
                    let block = self.fetch_block(plane, brow, bcol, preloaded.as_deref())?;

                    for r in (r_lo..r_hi).filter(|r| (r - window.start_row) % row_skip == 0) {
                        let out_r = ((r - window.start_row) / row_skip) as usize;
                        for c in (c_lo..c_hi).filter(|c| (c - window.start_col) % col_skip == 0) {
                            let out_c = ((c - window.start_col) / col_skip) as usize;
                            let out_px = if sequential {
                                (out_band * out_rows + out_r) * out_cols + out_c
                            } else {
                                (out_r * out_cols + out_c) * out_bands + out_band
                            };
                            let dst = &mut out[out_px * container..(out_px + 1) * container];
                            match &block {
                                Some(data) => {
                                    let bit = self.geometry.sample_bit_index(
                                        r - brow * self.geometry.block_height,
                                        c - bcol * self.geometry.block_width,
                                        band_in_block,
                                    );
                                    unpack_sample(
                                        data,
                                        bit,
                                        self.geometry.bits_per_pixel as usize,
                                        container,
                                        dst,
                                    );
                                }
                                None => dst.copy_from_slice(&self.pad_sample),
                            }
                            if let (Some(lut), true) = (&route.lut, block.is_some()) {
                                if let Some(mapped) = lut.get(dst[0] as usize) {
                                    dst[0] = *mapped;
                                }
                            }
                        }
                    }
                }
            }
        }

        // Stored order is big-endian; normalise multi-byte containers to
        // host order.
        if container > 1 && HOST_IS_LE {
            swap_striped(&mut out, container, self.settings.get_swap_threads());
        }
        Ok(out)
    }

    /// Fetch one decoded block instance, or `None` for an all-pad block.
    fn fetch_block(
        &mut self,
        plane: usize,
        brow: u32,
        bcol: u32,
        preloaded: Option<&[u8]>,
    ) -> Result<Option<Vec<u8>>, NitfError> {
        let key = (plane as u32, brow, bcol);
        if preloaded.is_none() {
            if let Some(block) = self.cache.get(key) {
                return Ok(Some(block.clone()));
            }
        }

        // A compression code nobody registered a decoder for is reported
        // before any layout question about the stream.
        let decoder = if self.compression.is_uncompressed() {
            None
        } else {
            Some(
                plugin::lookup_codec(self.compression)
                    .and_then(|h| h.decompress)
                    .ok_or_else(|| NitfError::UnsupportedCompression {
                        code: self.compression.code().to_string(),
                    })?,
            )
        };

        let natural = self.geometry.natural_offset(plane, brow, bcol);
        let instance =
            plane * self.geometry.blocks_per_plane() + self.geometry.block_index(brow, bcol);
        let offset = match &self.mask {
            Some(mask) => match mask.block_offset(instance, natural) {
                // All-pad blocks are never stored and never decompressed.
                None => return Ok(None),
                Some(offset) => offset,
            },
            None => natural,
        };

        let stored_len = self.stored_length(offset, instance)?;
        let raw = match preloaded {
            Some(all) => {
                let start = offset as usize;
                let end = start + stored_len as usize;
                if end > all.len() {
                    return Err(NitfError::Structural {
                        msg: format!("block at offset {} runs past the pixel stream", offset),
                    });
                }
                all[start..end].to_vec()
            }
            None => {
                if offset + stored_len > self.stream_len {
                    return Err(NitfError::Structural {
                        msg: format!("block at offset {} runs past the pixel stream", offset),
                    });
                }
                self.io
                    .seek(Whence::Set, (self.pixel_start + offset) as i64)?;
                let mut buf = vec![0u8; stored_len as usize];
                read_total(&mut *self.io, &mut buf)?;
                buf
            }
        };

        let decoded = match decoder {
            None => raw,
            Some(handler) => match handler(&raw, &self.geometry) {
                Ok(decoded) if decoded.len() == self.geometry.block_bytes() => decoded,
                Ok(decoded) => {
                    return Err(NitfError::Structural {
                        msg: format!(
                            "decoder produced {} bytes for a {} byte block",
                            decoded.len(),
                            self.geometry.block_bytes()
                        ),
                    });
                }
                Err(err) if self.settings.get_recover_bad_blocks() => {
                    // Opt-in recovery: the block becomes pad pixels and the
                    // failure is recorded as a warning.
                    self.warnings.push(ParseWarning {
                        segment: SegmentKind::Image,
                        field: format!("block ({}, {}) band {}", brow, bcol, plane),
                        offset: self.pixel_start + offset,
                        error: err,
                    });
                    return Ok(None);
                }
                Err(err) => return Err(err),
            }
        };

        if preloaded.is_none() {
            self.cache.put(key, decoded.clone());
        }
        Ok(Some(decoded))
    }

    /// The stored byte length of the block instance starting at `offset`.
    /// Uncompressed blocks have a fixed size; compressed blocks run to the
    /// next stored offset (or the end of the stream).
    fn stored_length(&self, offset: u64, instance: usize) -> Result<u64, NitfError> {
        if self.compression.is_uncompressed() {
            return Ok(self.geometry.block_bytes() as u64);
        }
        match &self.mask {
            Some(mask) if !mask.block_offsets.is_empty() => {
                let next = mask
                    .block_offsets
                    .iter()
                    .map(|o| *o as u64)
                    .filter(|o| *o != nitf_core::MASK_PAD_SENTINEL as u64 && *o > offset)
                    .min()
                    .unwrap_or(self.stream_len);
                Ok(next - offset)
            }
            _ if self.geometry.block_instances() == 1 && instance == 0 => Ok(self.stream_len),
            _ => Err(NitfError::Structural {
                msg: "compressed multi-block segment without a block offset table".to_string(),
            }),
        }
    }
}

/// Resolve how requested bands map onto stored bands and lookup tables.
///
/// A single-band RGB/LUT image with three tables expands to three
/// addressable bands, one per table. A band with exactly one byte-to-byte
/// table is mapped through it. Two-table (MSB/LSB) bands pass through raw:
/// the user buffer element width is fixed by NBPP, which a widening table
/// would break.
fn band_routes(
    subheader: &ImageSubheader,
    geometry: &BlockGeometry,
) -> Result<Vec<BandRoute>, NitfError> {
    let byte_samples = geometry.container_bytes() == 1;
    let representation = subheader.representation().ok();
    if representation == Some(ImageRepresentation::RgbLut)
        && geometry.bands == 1
        && subheader.bands[0].luts.len() == 3
        && byte_samples
    {
        return Ok(subheader.bands[0]
            .luts
            .iter()
            .map(|lut| BandRoute {
                stored_band: 0,
                lut: Some(lut.clone()),
            })
            .collect());
    }
    Ok(subheader
        .bands
        .iter()
        .enumerate()
        .map(|(i, band)| BandRoute {
            stored_band: i,
            lut: match band.luts.as_slice() {
                [single] if byte_samples => Some(single.clone()),
                _ => None,
            },
        })
        .collect())
}

/// The declared pad pixel, right-aligned in a container-sized sample.
/// Absent a mask (or a pad code) the pad is zero.
fn pad_sample(mask: &Option<MaskTable>, container: usize) -> Vec<u8> {
    let mut sample = vec![0u8; container];
    if let Some(mask) = mask {
        let pad = &mask.pad_pixel;
        if !pad.is_empty() {
            let n = pad.len().min(container);
            sample[container - n..].copy_from_slice(&pad[pad.len() - n..]);
        }
    }
    sample
}
