//! Write-then-read roundtrips through `nitf-in`, covering the testable
//! record-level laws: byte-identical rewrites, component sums, segment
//! ordering, TRE preservation and section overflow.
use super::*;
use crate::write_headers::NitfHeaderToBytes;
use crate::{pack_image_with_pad, NitfWriter};

use nitf_core::blocking::SubWindow;
use nitf_core::io::BufferIo;
use nitf_core::Version;

use nitf_in::NitfFile;

#[test]
fn empty_record_is_the_bare_header() {
    let mut record = Record::new(Version::Nitf21);
    let bytes = write_to_bytes(&mut record);
    assert_eq!(bytes.len(), 388);
    assert_eq!(&bytes[..9], b"NITF02.10");
    assert_eq!(record.header.file_length.as_u64().unwrap(), 388);
    assert_eq!(record.header.header_length.as_u64().unwrap(), 388);

    let file = parse_bytes(bytes);
    assert_eq!(file.version().unwrap(), Version::Nitf21);
}

#[test]
fn writing_twice_is_byte_identical() {
    let (mut record, _) = image_record(ImageMode::PixelInterleave, 2);
    let first = write_to_bytes(&mut record);
    let second = write_to_bytes(&mut record);
    assert_eq!(first, second);
}

#[test]
fn component_sums_hold_after_write() {
    let (mut record, _) = image_record(ImageMode::BlockInterleave, 3);
    {
        let text = record.new_text_segment().unwrap();
        text.subheader.text_id.set_string("T0001").unwrap();
        text.subheader.security.classification.set_string("U").unwrap();
        text.data = SegmentData::InMemory(b"HELLO NITF".to_vec());
    }
    let bytes = write_to_bytes(&mut record);

    let header = &record.header;
    let mut sum = header.header_length.as_u64().unwrap();
    for info in header.image_info.iter().chain(header.text_info.iter()) {
        sum += info.subheader_len().unwrap() as u64 + info.data_len().unwrap();
    }
    assert_eq!(header.file_length.as_u64().unwrap(), sum);
    assert_eq!(header.file_length.as_u64().unwrap(), bytes.len() as u64);
}

#[test]
fn parse_write_parse_fixed_point() {
    let (mut record, user) = image_record(ImageMode::BandSequential, 2);
    {
        let text = record.new_text_segment().unwrap();
        text.subheader.text_id.set_string("T0001").unwrap();
        text.subheader.security.classification.set_string("U").unwrap();
        text.data = SegmentData::InMemory(b"payload".to_vec());
    }
    record.images[0].subheader.extended.append(piatga_instance());

    let first = write_to_bytes(&mut record);

    // Re-writing what was parsed, copying payloads from the first file,
    // reproduces it bit for bit.
    let (mut reparsed, _, warnings) = parse_bytes(first.clone()).deconstruct();
    assert!(warnings.is_empty());
    let mut source = BufferIo::new(first.clone());
    let mut writer = NitfWriter::in_memory();
    writer.write_record(&mut reparsed, Some(&mut source)).unwrap();
    let second = writer.into_bytes();
    assert_eq!(first, second);

    // And the parsed records agree with each other.
    let mut file = parse_bytes(second);
    let full = SubWindow::new(0, 16, 0, 16, vec![0, 1]);
    assert_eq!(file.read_image(0, &full).unwrap(), user);
}

#[test]
fn piatga_survives_a_roundtrip() {
    let (mut record, _) = image_record(ImageMode::PixelInterleave, 1);
    record.images[0].subheader.extended.append(piatga_instance());
    let bytes = write_to_bytes(&mut record);

    let file = parse_bytes(bytes);
    let ext = &file.record().images[0].subheader.extended;
    assert_eq!(ext.len(), 1);
    let tre = ext.find("PIATGA").unwrap();
    assert_eq!(tre.get("TGTUTM").unwrap().as_string(), "55HFA1234567890");
    assert_eq!(tre.get("PIATGAID").unwrap().as_string(), "TGT0001");
    assert_eq!(tre.get("PIACTRY").unwrap().as_string(), "US");
    assert_eq!(tre.get("PIACAT").unwrap().as_string(), "700");
    assert_eq!(tre.get("TGTGEO").unwrap().as_string(), "512830N0061530W");
    assert_eq!(tre.get("DATUM").unwrap().as_string(), "WGE");
    assert_eq!(tre.get("TGTNAME").unwrap().as_string(), "TEST RANGE");
    assert_eq!(tre.get("PERCOVER").unwrap().as_u64().unwrap(), 85);
    assert_eq!(tre, &piatga_instance());
}

#[test]
fn every_mode_writes_what_the_reader_reads() {
    for mode in [
        ImageMode::BlockInterleave,
        ImageMode::PixelInterleave,
        ImageMode::RowInterleave,
        ImageMode::BandSequential,
    ] {
        let (mut record, user) = image_record(mode, 3);
        let bytes = write_to_bytes(&mut record);
        let mut file = parse_bytes(bytes);
        let full = SubWindow::new(0, 16, 0, 16, vec![0, 1, 2]);
        assert_eq!(file.read_image(0, &full).unwrap(), user, "mode {}", mode);
    }
}

#[test]
fn masked_write_skips_all_pad_blocks() {
    // An 8x8 single band NM image of 4x4 blocks; the lower right block is
    // entirely pad.
    let mut record = Record::new(Version::Nitf21);
    record.header.security.classification.set_string("U").unwrap();
    let mut user = vec![0x11u8; 64];
    for r in 4..8 {
        for c in 4..8 {
            user[r * 8 + c] = 0x00;
        }
    }
    {
        let image = record.new_image_segment().unwrap();
        fill_image_subheader(&mut image.subheader, 8, 8, 4, ImageMode::BlockInterleave, 1, 1);
        image
            .subheader
            .set_compression(Compression::NoneMasked, "")
            .unwrap();
        let payload = pack_image_with_pad(&image.subheader, &user, Some(&[0x00])).unwrap();
        // Mask header (10) + pad pixel (1) + 4 offsets (16) + 3 stored
        // blocks of 16 bytes.
        assert_eq!(payload.len(), 10 + 1 + 16 + 3 * 16);
        image.data = SegmentData::InMemory(payload);
    }

    let bytes = write_to_bytes(&mut record);
    let mut file = parse_bytes(bytes);
    let out = file
        .read_image(0, &SubWindow::new(0, 8, 0, 8, vec![0]))
        .unwrap();
    assert_eq!(out, user);
}

#[test]
fn twelve_bit_payloads_roundtrip() {
    let mut record = Record::new(Version::Nitf21);
    record.header.security.classification.set_string("U").unwrap();
    // 4x4, one block, 12 bits per pixel: the user buffer holds 16 bit
    // containers in host order.
    let values: Vec<u16> = (0..16).map(|i| (i * 257 % 4096) as u16).collect();
    let mut user = Vec::with_capacity(32);
    for v in &values {
        user.extend_from_slice(&v.to_ne_bytes());
    }
    {
        let image = record.new_image_segment().unwrap();
        fill_image_subheader(
            &mut image.subheader,
            4,
            4,
            4,
            ImageMode::BlockInterleave,
            1,
            1,
        );
        image
            .subheader
            .set_pixel_information(
                PixelValueType::Int,
                12,
                12,
                PixelJustification::Right,
                ImageRepresentation::Mono,
                "VIS",
                {
                    let mut band = BandInfo::new();
                    band.init("M", "", "N", "", vec![]).unwrap();
                    vec![band]
                },
            )
            .unwrap();
        let payload = write_data::pack_image(&image.subheader, &user).unwrap();
        // 16 samples of 12 bits pack into 24 bytes.
        assert_eq!(payload.len(), 24);
        image.data = SegmentData::InMemory(payload);
    }

    let bytes = write_to_bytes(&mut record);
    let mut file = parse_bytes(bytes);
    let out = file
        .read_image(0, &SubWindow::new(0, 4, 0, 4, vec![0]))
        .unwrap();
    assert_eq!(out, user);
}

#[test]
fn lut_bands_reverse_on_write_and_reapply_on_read() {
    let mut record = Record::new(Version::Nitf21);
    record.header.security.classification.set_string("U").unwrap();
    // A bijective table; the user buffer holds table outputs.
    let lut: Vec<u8> = (0..=255u8).map(|v| v.wrapping_mul(13).wrapping_add(7)).collect();
    let user: Vec<u8> = (0..64u32).map(|i| lut[(i % 256) as usize]).collect();
    {
        let image = record.new_image_segment().unwrap();
        fill_image_subheader(&mut image.subheader, 8, 8, 4, ImageMode::BlockInterleave, 1, 1);
        image.subheader.bands[0]
            .init("M", "", "N", "", vec![lut.clone()])
            .unwrap();
        let payload = write_data::pack_image(&image.subheader, &user).unwrap();
        // The stored payload holds table indices, not table outputs.
        assert_eq!(payload[0], 0);
        assert_eq!(payload[1], 1);
        image.data = SegmentData::InMemory(payload);
    }

    let bytes = write_to_bytes(&mut record);
    let mut file = parse_bytes(bytes);
    let out = file
        .read_image(0, &SubWindow::new(0, 8, 0, 8, vec![0]))
        .unwrap();
    assert_eq!(out, user);
}

#[test]
fn stored_blocks_hold_the_expected_samples() {
    let (record, user) = image_record(ImageMode::PixelInterleave, 2);
    let geometry = record.images[0].subheader.geometry().unwrap();
    let payload = match &record.images[0].data {
        SegmentData::InMemory(payload) => payload.clone(),
        _ => unreachable!(),
    };
    // Block (1, 2) starts at instance 6; its (1, 3) pixel of band 1 is the
    // image pixel (5, 11).
    let start = geometry.natural_offset(0, 1, 2) as usize;
    let block = &payload[start..start + geometry.block_bytes()];
    let sample = write_data::sample_of(&geometry, block, 1, 3, 1);
    assert_eq!(sample, vec![pixel_value(5, 11, 1)]);
    assert_eq!(user.len(), 16 * 16 * 2);
}

#[test]
fn oversized_user_defined_section_overflows_into_a_des() {
    // Two opaque TREs of 99985 payload bytes: each is 99996 wire bytes, so
    // the first fills UDHD to exactly its 99999 capacity and the second
    // must move into an overflow DES.
    let big = |fill: u8| {
        plugin::materialize_tre("BIGTRE", &vec![fill; 99_985], false).unwrap()
    };
    let mut record = Record::new(Version::Nitf21);
    record.header.security.classification.set_string("U").unwrap();
    record.header.user_defined.append(big(b'A'));
    record.header.user_defined.append(big(b'B'));
    let original: Vec<_> = record.header.user_defined.iter().cloned().collect();

    let bytes = write_to_bytes(&mut record);

    // (a) A DES was created with the host section name as its type id.
    assert_eq!(record.data_extensions.len(), 1);
    let des = &record.data_extensions[0].subheader;
    assert_eq!(des.type_id.as_string(), "UDHD");
    assert!(des.is_overflow());
    assert_eq!(des.overflowed_header_type.as_string(), "UDHD");

    // (b) The UDHDL field on disk reads 99999. It sits after the six count
    // tables: 360 fixed bytes, five empty 3 byte counts and one DES entry
    // (3 + 4 + 9).
    let udhdl_at = 360 + 5 * 3 + (3 + 4 + 9);
    assert_eq!(&bytes[udhdl_at..udhdl_at + 5], b"99999");

    // The DES subheader itself carries the section name; it follows the
    // header directly.
    let header_length = record.header.header_length.as_u64().unwrap() as usize;
    assert_eq!(&bytes[header_length..header_length + 2], b"DE");
    assert_eq!(&bytes[header_length + 2..header_length + 6], b"UDHD");

    // (c) The overflowed TRE is reachable through the DES linkage.
    let file = parse_bytes(bytes.clone());
    let parsed = file.record();
    assert_eq!(
        parsed.header.user_defined_overflow.as_u64().unwrap(),
        1,
        "the host section points at the first DES"
    );
    assert!(parsed.data_extensions[0].subheader.is_overflow());

    // (d) Unmerge reproduces the original extension list.
    let unmerged: Vec<_> = parsed.header.user_defined.iter().cloned().collect();
    assert_eq!(unmerged, original);

    // And merging again is byte identical.
    let (mut reparsed, _, _) = file.deconstruct();
    let mut source = BufferIo::new(bytes.clone());
    let mut writer = NitfWriter::in_memory();
    writer.write_record(&mut reparsed, Some(&mut source)).unwrap();
    assert_eq!(writer.into_bytes(), bytes);
}

#[test]
fn labels_roundtrip_under_nitf20() {
    let mut record = Record::new(Version::Nitf20);
    record.header.security.classification.set_string("U").unwrap();
    record
        .header
        .file_date_time
        .set_string("01120000ZJAN24")
        .unwrap();
    {
        let label = record.new_label_segment().unwrap();
        label.subheader.label_id.set_string("LBL1").unwrap();
        label.subheader.display_level.set_uint(1u32).unwrap();
        label.subheader.security.classification.set_string("U").unwrap();
        label.data = SegmentData::InMemory(b"HI".to_vec());
    }
    let first = write_to_bytes(&mut record);
    assert_eq!(&first[..9], b"NITF02.00");

    let (mut reparsed, _, _) = parse_bytes(first.clone()).deconstruct();
    assert_eq!(reparsed.labels.len(), 1);
    assert_eq!(
        reparsed.labels[0].subheader.label_id.as_string(),
        "LBL1"
    );
    let mut source = BufferIo::new(first.clone());
    let mut writer = NitfWriter::in_memory();
    writer.write_record(&mut reparsed, Some(&mut source)).unwrap();
    assert_eq!(writer.into_bytes(), first);
}

#[test]
fn file_backed_writes_reopen() {
    let dir = tempfile::tempdir().expect("Couldn't get tempfile.");
    let path = dir.path().join("roundtrip.ntf");

    let (mut record, user) = image_record(ImageMode::PixelInterleave, 2);
    {
        let text = record.new_text_segment().unwrap();
        text.subheader.text_id.set_string("T0001").unwrap();
        text.subheader.security.classification.set_string("U").unwrap();
        text.data = SegmentData::InMemory(b"HELLO NITF".to_vec());
    }
    let mut writer = NitfWriter::create_file(&path).unwrap();
    writer.write_record(&mut record, None).unwrap();
    drop(writer);

    let mut file = NitfFile::open(path.to_str().unwrap(), Default::default()).unwrap();
    assert_eq!(file.read_text_data(0).unwrap(), b"HELLO NITF");
    let full = SubWindow::new(0, 16, 0, 16, vec![0, 1]);
    assert_eq!(file.read_image(0, &full).unwrap(), user);
}

#[test]
fn subheader_bytes_match_their_accounting() {
    let (record, _) = image_record(ImageMode::PixelInterleave, 2);
    let version = record.version().unwrap();
    let bytes = record.images[0].subheader.as_bytes(version).unwrap();
    assert_eq!(bytes.len(), record.images[0].subheader.byte_len(version));
    assert_eq!(&bytes[..2], b"IM");
}
