//! The image write engine: turning a user pixel buffer into an on-disk
//! segment payload.
//!
//! Writing inverts the read pipeline. A lossless single lookup table is
//! applied in reverse, samples are packed back to NBPP bits, blocks are
//! reassembled with pad fill for the ragged edge of the grid, and masked
//! modes compute the mask table in a first pass so all-pad blocks can be
//! skipped with the sentinel. Uncompressed payloads are produced natively;
//! other codes go through the encoder registered for the compression code.
use nitf_core::bits::pack_sample;
#[cfg(test)]
use nitf_core::bits::unpack_sample;
use nitf_core::blocking::{BlockGeometry, MaskTable, MASK_PAD_SENTINEL};
use nitf_core::byteswap::{swap_in_place, HOST_IS_LE};
use nitf_core::enums::ImageMode;
use nitf_core::errors::NitfError;
use nitf_core::image_subheader::ImageSubheader;
use nitf_core::plugin;

use tinyvec::TinyVec;

/// Assemble the full payload of an image segment (mask table included for
/// masked codes) from a band-interleaved-by-pixel buffer covering the whole
/// extent. Pad pixels are zero.
pub fn pack_image(subheader: &ImageSubheader, user: &[u8]) -> Result<Vec<u8>, NitfError> {
    pack_image_with_pad(subheader, user, None)
}

/// Like [`pack_image`] but from a band-sequential buffer.
pub fn pack_image_band_sequential(
    subheader: &ImageSubheader,
    user: &[u8],
) -> Result<Vec<u8>, NitfError> {
    pack(subheader, user, true, None)
}

/// Assemble with an explicit pad sample (container-width bytes). For masked
/// codes the pad value is declared in the mask table and blocks holding
/// nothing but pad are skipped.
pub fn pack_image_with_pad(
    subheader: &ImageSubheader,
    user: &[u8],
    pad: Option<&[u8]>,
) -> Result<Vec<u8>, NitfError> {
    pack(subheader, user, false, pad)
}

fn pack(
    subheader: &ImageSubheader,
    user: &[u8],
    sequential: bool,
    pad: Option<&[u8]>,
) -> Result<Vec<u8>, NitfError> {
    let geometry = subheader.geometry()?;
    let compression = subheader.compression()?;
    let container = geometry.container_bytes();
    let rows = geometry.rows as usize;
    let cols = geometry.cols as usize;
    let bands = geometry.bands;

    let expected = rows * cols * bands * container;
    if user.len() != expected {
        return Err(NitfError::InvalidArgument {
            msg: format!(
                "user buffer is {} bytes, the segment needs {}",
                user.len(),
                expected
            ),
        });
    }
    let mut pad_sample: TinyVec<[u8; 8]> = tiny_vec!();
    pad_sample.resize(container, 0u8);
    if let Some(pad) = pad {
        if pad.len() != container {
            return Err(NitfError::InvalidArgument {
                msg: format!("pad sample must be {} bytes", container),
            });
        }
        pad_sample.copy_from_slice(pad);
    }

    let encoder = if compression.is_uncompressed() {
        None
    } else {
        Some(
            plugin::lookup_codec(compression)
                .and_then(|h| h.compress)
                .ok_or_else(|| NitfError::UnsupportedCompression {
                    code: compression.code().to_string(),
                })?,
        )
    };

    // Back to the stored sample order: big-endian, lookup tables reversed.
    let mut stored = user.to_vec();
    if container > 1 && HOST_IS_LE {
        swap_in_place(&mut stored, container);
    }
    apply_reverse_luts(subheader, &geometry, &mut stored, sequential)?;

    // Assemble every block instance, tracking which are entirely pad.
    let block_bytes = geometry.block_bytes();
    let mut blocks: Vec<(Vec<u8>, bool)> = Vec::with_capacity(geometry.block_instances());
    for plane in 0..geometry.planes() {
        for brow in 0..geometry.blocks_per_col {
            for bcol in 0..geometry.blocks_per_row {
                let mut block = vec![0u8; block_bytes];
                let mut all_pad = true;
                let bands_here = geometry.mode.bands_in_block(bands);
                for r in 0..geometry.block_height {
                    for c in 0..geometry.block_width {
                        let row = (brow * geometry.block_height + r) as usize;
                        let col = (bcol * geometry.block_width + c) as usize;
                        for band_in_block in 0..bands_here {
                            let band = match geometry.mode {
                                ImageMode::BlockInterleave | ImageMode::BandSequential => plane,
                                _ => band_in_block,
                            };
                            let sample = if row < rows && col < cols {
                                let px = if sequential {
                                    (band * rows + row) * cols + col
                                } else {
                                    (row * cols + col) * bands + band
                                };
                                &stored[px * container..(px + 1) * container]
                            } else {
                                // The ragged edge of the grid is pad fill.
                                &pad_sample[..]
                            };
                            if sample != &pad_sample[..] {
                                all_pad = false;
                            }
                            let bit = geometry.sample_bit_index(r, c, band_in_block);
                            pack_sample(
                                &mut block,
                                bit,
                                geometry.bits_per_pixel as usize,
                                sample,
                            );
                        }
                    }
                }
                let encoded = match encoder {
                    Some(encode) => encode(&block, &geometry)?,
                    None => block,
                };
                blocks.push((encoded, all_pad));
            }
        }
    }

    if !compression.has_mask() {
        let mut out = Vec::with_capacity(blocks.iter().map(|(b, _)| b.len()).sum());
        for (block, _) in blocks {
            out.extend_from_slice(&block);
        }
        return Ok(out);
    }

    // Masked: first the offset table (all-pad blocks get the sentinel),
    // then the stored blocks.
    let mut mask = MaskTable::new_all_pad(blocks.len(), pad_sample.to_vec());
    let mut offset = 0u64;
    for (i, (block, all_pad)) in blocks.iter().enumerate() {
        if *all_pad {
            mask.block_offsets[i] = MASK_PAD_SENTINEL;
        } else {
            mask.block_offsets[i] = offset as u32;
            offset += block.len() as u64;
        }
    }
    let mut out = mask.to_bytes();
    for (block, all_pad) in blocks {
        if !all_pad {
            out.extend_from_slice(&block);
        }
    }
    Ok(out)
}

/// Apply single lookup tables in reverse where they are lossless. A table
/// with duplicate entries cannot be inverted and is skipped; a sample value
/// the table never produces cannot be encoded and is an error.
fn apply_reverse_luts(
    subheader: &ImageSubheader,
    geometry: &BlockGeometry,
    stored: &mut [u8],
    sequential: bool,
) -> Result<(), NitfError> {
    if geometry.container_bytes() != 1 {
        return Ok(());
    }
    let rows = geometry.rows as usize;
    let cols = geometry.cols as usize;
    let bands = geometry.bands;

    for (band, info) in subheader.bands.iter().enumerate() {
        let lut = match info.luts.as_slice() {
            [single] => single,
            _ => continue,
        };
        let mut inverse = [None::<u8>; 256];
        let mut bijective = lut.len() <= 256;
        for (index, value) in lut.iter().enumerate().take(256) {
            if inverse[*value as usize].is_some() {
                bijective = false;
                break;
            }
            inverse[*value as usize] = Some(index as u8);
        }
        if !bijective {
            log::warn!(
                "band {} lookup table is not invertible; writing samples as they are",
                band
            );
            continue;
        }
        for row in 0..rows {
            for col in 0..cols {
                let px = if sequential {
                    (band * rows + row) * cols + col
                } else {
                    (row * cols + col) * bands + band
                };
                let value = stored[px];
                stored[px] = inverse[value as usize].ok_or_else(|| NitfError::InvalidArgument {
                    msg: format!(
                        "sample {:#04x} is not produced by the band {} lookup table",
                        value, band
                    ),
                })?;
            }
        }
    }
    Ok(())
}

/// Test helper: extract one sample back out of a stored block.
#[cfg(test)]
pub(crate) fn sample_of(
    geometry: &BlockGeometry,
    block: &[u8],
    r: u32,
    c: u32,
    band_in_block: usize,
) -> Vec<u8> {
    let container = geometry.container_bytes();
    let mut out = vec![0u8; container];
    unpack_sample(
        block,
        geometry.sample_bit_index(r, c, band_in_block),
        geometry.bits_per_pixel as usize,
        container,
        &mut out,
    );
    out
}
