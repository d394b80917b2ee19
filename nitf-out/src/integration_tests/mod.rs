//! This module uses `nitf-in` and `nitf-out` together to make roundtrip
//! tests and observe whether the crates work in a compatible manner. The
//! records cover image segments in every mode, text payloads, TREs and the
//! section overflow machinery.
use crate::write_data;
use crate::NitfWriter;

use nitf_core::enums::*;
use nitf_core::image_subheader::{BandInfo, ImageSubheader};
use nitf_core::plugin;
use nitf_core::tre::Tre;
use nitf_core::{Record, SegmentData};

use nitf_in::NitfFile;

mod roundtrip;

/// The logical pixel value the synthetic images use.
fn pixel_value(r: u32, c: u32, band: u32) -> u8 {
    (r.wrapping_mul(31) ^ c.wrapping_mul(7) ^ band.wrapping_mul(101)) as u8
}

/// A band-interleaved buffer over a rows x cols x bands extent.
fn interleaved_buffer(rows: u32, cols: u32, bands: u32) -> Vec<u8> {
    let mut out = Vec::with_capacity((rows * cols * bands) as usize);
    for r in 0..rows {
        for c in 0..cols {
            for band in 0..bands {
                out.push(pixel_value(r, c, band));
            }
        }
    }
    out
}

/// Populate an image subheader for a synthetic uncompressed segment.
fn fill_image_subheader(
    sub: &mut ImageSubheader,
    rows: u32,
    cols: u32,
    block: u32,
    mode: ImageMode,
    bands: usize,
    display_level: u32,
) {
    sub.set_blocking(rows, cols, block, block, mode).unwrap();
    let mut band_info = Vec::new();
    for _ in 0..bands {
        let mut info = BandInfo::new();
        info.init("M", "", "N", "", vec![]).unwrap();
        band_info.push(info);
    }
    sub.set_pixel_information(
        PixelValueType::Int,
        8,
        8,
        PixelJustification::Right,
        if bands == 1 {
            ImageRepresentation::Mono
        } else {
            ImageRepresentation::NoDisplay
        },
        "VIS",
        band_info,
    )
    .unwrap();
    sub.set_compression(Compression::None, "").unwrap();
    sub.display_level.set_uint(display_level).unwrap();
    sub.image_id.set_string("SYNTH").unwrap();
    sub.image_date_time.set_string("20240101120000").unwrap();
    sub.security.classification.set_string("U").unwrap();
}

/// A record holding one synthetic image segment with its packed payload.
fn image_record(mode: ImageMode, bands: usize) -> (Record, Vec<u8>) {
    let mut record = Record::new(Version::Nitf21);
    record
        .header
        .origin_station_id
        .set_string("GIGASTATN")
        .unwrap();
    record
        .header
        .file_date_time
        .set_string("20240101120000")
        .unwrap();
    record.header.security.classification.set_string("U").unwrap();
    record.header.complexity_level.set_uint(3u32).unwrap();
    record.header.system_type.set_string("BF01").unwrap();

    let user = interleaved_buffer(16, 16, bands as u32);
    {
        let image = record.new_image_segment().unwrap();
        fill_image_subheader(&mut image.subheader, 16, 16, 4, mode, bands, 1);
        let payload = write_data::pack_image(&image.subheader, &user).unwrap();
        image.data = SegmentData::InMemory(payload);
    }
    (record, user)
}

/// A PIATGA instance built through the registry, as a client would.
fn piatga_instance() -> Tre {
    let mut payload = Vec::new();
    payload.extend_from_slice(format!("{:<15}", "55HFA1234567890").as_bytes());
    payload.extend_from_slice(format!("{:<15}", "TGT0001").as_bytes());
    payload.extend_from_slice(b"US");
    payload.extend_from_slice(format!("{:<5}", "700").as_bytes());
    payload.extend_from_slice(format!("{:<15}", "512830N0061530W").as_bytes());
    payload.extend_from_slice(b"WGE");
    payload.extend_from_slice(format!("{:<38}", "TEST RANGE").as_bytes());
    payload.extend_from_slice(b"085");
    plugin::materialize_tre("PIATGA", &payload, true).unwrap()
}

/// Write a record into memory.
fn write_to_bytes(record: &mut Record) -> Vec<u8> {
    let mut writer = NitfWriter::in_memory();
    writer.write_record(record, None).unwrap();
    writer.into_bytes()
}

/// Parse bytes produced by the writer.
fn parse_bytes(bytes: Vec<u8>) -> NitfFile<nitf_core::io::BufferIo> {
    NitfFile::from_bytes(bytes, Default::default()).unwrap()
}
