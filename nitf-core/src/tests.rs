mod field {
    use crate::enums::CharClass;
    use crate::errors::NitfError;
    use crate::field::Field;

    #[test]
    fn string_padding_and_trimming() {
        let mut f = Field::new(10, CharClass::BcsA);
        f.set_string("HELLO").unwrap();
        assert_eq!(f.raw(), b"HELLO     ");
        assert_eq!(f.as_string(), "HELLO");
        assert!(!f.is_blank());
    }

    #[test]
    fn numeric_padding() {
        let mut f = Field::new(6, CharClass::BcsN);
        f.set_uint(314u32).unwrap();
        assert_eq!(f.raw(), b"000314");
        assert_eq!(f.as_u64().unwrap(), 314);
        assert_eq!(f.as_i64().unwrap(), 314);
    }

    #[test]
    fn signed_values_need_the_plus_class() {
        let mut plain = Field::new(5, CharClass::BcsN);
        assert!(matches!(
            plain.set_int(-12),
            Err(NitfError::WrongClass { .. })
        ));
        let mut plus = Field::new(5, CharClass::BcsNPlus);
        plus.set_int(-12).unwrap();
        assert_eq!(plus.raw(), b"-0012");
        assert_eq!(plus.as_i64().unwrap(), -12);
    }

    #[test]
    fn truncation_is_detected() {
        let mut f = Field::new(3, CharClass::BcsN);
        let err = f.set_uint(12345u32).unwrap_err();
        assert!(matches!(
            err,
            NitfError::Truncation {
                width: 3,
                needed: 5,
                ..
            }
        ));
        // The field content is untouched on failure.
        assert_eq!(f.raw(), b"000");
    }

    #[test]
    fn class_violation_is_detected() {
        let mut f = Field::new(4, CharClass::BcsN);
        assert!(matches!(
            f.set_string("12a4"),
            Err(NitfError::WrongClass { .. })
        ));
        assert!(Field::from_bytes(b"12a4", CharClass::BcsN).is_err());
        assert!(Field::from_bytes(b"12a4", CharClass::BcsA).is_ok());
    }

    #[test]
    fn binary_fields_read_big_endian() {
        let f = Field::from_bytes(&[0x01, 0x02], CharClass::Binary).unwrap();
        assert_eq!(f.as_u64().unwrap(), 0x0102);
        let f = Field::from_bytes(&[0, 0, 0x30, 0x39], CharClass::Binary).unwrap();
        assert_eq!(f.as_u64().unwrap(), 12345);
        let f = Field::from_bytes(&[1, 2, 3], CharClass::Binary).unwrap();
        assert!(f.as_u64().is_err());
    }

    #[test]
    fn blank_fields_decode_as_unset() {
        let f = Field::new(5, CharClass::BcsA);
        assert!(f.is_blank());
        assert_eq!(f.as_string(), "");
        let n = Field::new(5, CharClass::BcsN);
        assert!(n.is_blank());
        assert_eq!(n.as_u64().unwrap(), 0);
        let spaces = Field::from_bytes(b"     ", CharClass::BcsN).unwrap();
        assert_eq!(spaces.as_u64().unwrap(), 0);
    }

    #[test]
    fn real_values_fit_the_width() {
        let mut f = Field::new(7, CharClass::BcsNPlus);
        f.set_real(12.625).unwrap();
        assert_eq!(f.len(), 7);
        assert!((f.as_f64().unwrap() - 12.625).abs() < 1e-9);
    }

    #[test]
    fn resize_pads_with_the_class_pad() {
        let mut f = Field::new(3, CharClass::BcsA);
        f.set_string("ABC").unwrap();
        f.resize(5);
        assert_eq!(f.raw(), b"ABC  ");
        f.resize(2);
        assert_eq!(f.raw(), b"AB");
    }
}

mod enums {
    use crate::enums::*;

    #[test]
    fn version_magic_round_trip() {
        for version in [Version::Nitf20, Version::Nitf21, Version::Nsif10] {
            assert_eq!(
                Version::from_magic(version.magic().as_bytes()).unwrap(),
                version
            );
        }
        assert!(Version::from_magic(b"NITF01.10").is_err());
        assert!(Version::from_magic(b"GIF89a...").is_err());
    }

    #[test]
    fn compression_codes() {
        assert_eq!(Compression::new("NC").unwrap(), Compression::None);
        assert_eq!(Compression::new("M3").unwrap(), Compression::JpegMasked);
        assert_eq!(Compression::new("I1").unwrap(), Compression::Downsampled);
        assert!(Compression::new("XX").is_err());

        assert!(Compression::NoneMasked.has_mask());
        assert!(Compression::JpegMasked.has_mask());
        assert!(!Compression::Jpeg.has_mask());
        assert!(Compression::None.is_uncompressed());
        assert!(Compression::NoneMasked.is_uncompressed());
        assert!(!Compression::None.has_rate_field());
        assert!(Compression::Jpeg.has_rate_field());
    }

    #[test]
    fn image_mode_codes() {
        for (code, mode) in [
            ("B", ImageMode::BlockInterleave),
            ("P", ImageMode::PixelInterleave),
            ("R", ImageMode::RowInterleave),
            ("S", ImageMode::BandSequential),
        ] {
            assert_eq!(ImageMode::new(code).unwrap(), mode);
            assert_eq!(mode.code(), code);
        }
        assert_eq!(ImageMode::PixelInterleave.bands_in_block(3), 3);
        assert_eq!(ImageMode::BlockInterleave.bands_in_block(3), 1);
    }

    #[test]
    fn coordinate_system_versioned_codes() {
        // `N` means "none" in 2.0 and "UTM north" in 2.1.
        assert_eq!(
            CoordinateSystem::new("N", Version::Nitf20).unwrap(),
            CoordinateSystem::None
        );
        assert_eq!(
            CoordinateSystem::new("N", Version::Nitf21).unwrap(),
            CoordinateSystem::UtmNorth
        );
        assert_eq!(
            CoordinateSystem::new("", Version::Nitf21).unwrap(),
            CoordinateSystem::None
        );
        assert!(CoordinateSystem::new("D", Version::Nitf20).is_err());
        assert!(!CoordinateSystem::None.has_igeolo());
        assert!(CoordinateSystem::Geographic.has_igeolo());
    }

    #[test]
    fn complexity_level_new() {
        assert_eq!(ComplexityLevel::new(3).unwrap(), ComplexityLevel::Clevel3);
        assert_eq!(ComplexityLevel::new(9).unwrap(), ComplexityLevel::Clevel9);
        assert!(ComplexityLevel::new(4).is_err());
    }

    #[test]
    fn char_class_tables() {
        assert!(CharClass::BcsA.validate(b"Hello world 123!?"));
        assert!(!CharClass::BcsA.validate(b"tab\there"));
        assert!(CharClass::BcsAPlus.validate(b"line\x0abreak"));
        assert!(CharClass::BcsN.validate(b"0123 "));
        assert!(!CharClass::BcsN.validate(b"+123"));
        assert!(CharClass::BcsNPlus.validate(b"+12.5"));
        assert!(CharClass::Binary.validate(&[0xff, 0x00]));
    }
}

mod security {
    use crate::enums::Version;
    use crate::security::FileSecurity;

    #[test]
    fn widths_follow_the_version() {
        let modern = FileSecurity::new(Version::Nitf21);
        assert_eq!(modern.codewords.len(), 11);
        assert_eq!(modern.class_authority.len(), 40);
        assert_eq!(modern.byte_len(Version::Nitf21), 167);

        let legacy = FileSecurity::new(Version::Nitf20);
        assert_eq!(legacy.codewords.len(), 40);
        assert_eq!(legacy.class_authority.len(), 20);
        assert_eq!(legacy.downgrade.len(), 6);
        assert_eq!(legacy.byte_len(Version::Nitf20), 167);
    }

    #[test]
    fn downgrade_event_is_conditional() {
        let mut legacy = FileSecurity::new(Version::Nitf20);
        assert!(!legacy.has_downgrade_event());
        legacy.downgrade.set_string("999998").unwrap();
        assert!(legacy.has_downgrade_event());
        assert_eq!(legacy.byte_len(Version::Nitf20), 167 + 40);
    }

    #[test]
    fn resize_between_versions() {
        let mut sec = FileSecurity::new(Version::Nitf21);
        sec.codewords.set_string("ABC").unwrap();
        sec.resize_for_version(Version::Nitf20);
        assert_eq!(sec.codewords.len(), 40);
        assert_eq!(sec.codewords.as_string(), "ABC");
        sec.resize_for_version(Version::Nitf21);
        assert_eq!(sec.codewords.len(), 11);
    }
}

mod datetime {
    use crate::datetime::NitfDateTime;
    use crate::enums::Version;

    #[test]
    fn both_layouts_parse() {
        let modern = NitfDateTime::parse("19990908070513").unwrap();
        assert_eq!(modern, NitfDateTime::new(1999, 9, 8, 7, 5, 13));
        let legacy = NitfDateTime::parse("08070513ZSEP99").unwrap();
        assert_eq!(legacy, modern);
    }

    #[test]
    fn century_window() {
        assert_eq!(NitfDateTime::parse("01000000ZJAN69").unwrap().year, 1969);
        assert_eq!(NitfDateTime::parse("01000000ZJAN68").unwrap().year, 2068);
        assert_eq!(NitfDateTime::parse("01000000ZJAN02").unwrap().year, 2002);
    }

    #[test]
    fn emission_follows_the_target_version() {
        let dt = NitfDateTime::new(1999, 9, 8, 7, 5, 13);
        assert_eq!(dt.format(Version::Nitf21), "19990908070513");
        assert_eq!(dt.format(Version::Nsif10), "19990908070513");
        assert_eq!(dt.format(Version::Nitf20), "08070513ZSEP99");
        assert_eq!(dt.format(Version::Nitf20).len(), 14);
    }

    #[test]
    fn nonsense_is_rejected() {
        assert!(NitfDateTime::parse("19991308070513").is_err()); // month 13
        assert!(NitfDateTime::parse("08070513ZXXX99").is_err()); // bad month
        assert!(NitfDateTime::parse("1999090807051").is_err()); // short
        assert!(NitfDateTime::parse("08256099ZSEP99").is_err()); // minute 60
    }
}

mod geo {
    use crate::enums::CoordinateSystem;
    use crate::geo::*;

    #[test]
    fn dms_round_trip() {
        let lat = dms_to_decimal("513030", 'N').unwrap();
        assert!((lat - 51.508333).abs() < 1e-4);
        assert_eq!(decimal_to_dms_lat(lat), "513030N");
        let lon = dms_to_decimal("0061530", 'W').unwrap();
        assert_eq!(decimal_to_dms_lon(lon), "0061530W");
    }

    #[test]
    fn geographic_corner() {
        let p = parse_corner("513030N0061530W", CoordinateSystem::Geographic).unwrap();
        assert!(p.lat > 0.0 && p.lon < 0.0);
        let s = format_corner(p, CoordinateSystem::Geographic).unwrap();
        assert_eq!(s, "513030N0061530W");
    }

    #[test]
    fn decimal_corner() {
        let p = parse_corner("+51.508-006.258", CoordinateSystem::Decimal).unwrap();
        assert!((p.lat - 51.508).abs() < 1e-9);
        assert!((p.lon + 6.258).abs() < 1e-9);
        let s = format_corner(p, CoordinateSystem::Decimal).unwrap();
        assert_eq!(s.len(), 15);
        assert_eq!(s, "+51.508-006.258");
    }

    #[test]
    fn igeolo_round_trip() {
        let corner = "513030N0061530W";
        let igeolo: String = std::iter::repeat(corner).take(4).collect();
        let corners = parse_igeolo(&igeolo, CoordinateSystem::Geographic).unwrap();
        let back = format_igeolo(&corners, CoordinateSystem::Geographic).unwrap();
        assert_eq!(back, igeolo);
    }
}

mod tre {
    use crate::enums::CharClass;
    use crate::tre::*;

    fn looped_descriptor() -> TreDescriptor {
        let body = TreDescriptionBuilder::new()
            .field("PT", "Point", CharClass::BcsA, 3)
            .unwrap();
        let description = TreDescriptionBuilder::new()
            .numeric("NPTS", "Number of points", 2)
            .unwrap()
            .repeat(CountSource::FieldRef("NPTS".to_string()), body)
            .unwrap()
            .build();
        TreDescriptor::new("LOOPED", description)
    }

    #[test]
    fn builder_rejects_duplicates_and_dangling_refs() {
        let dup = TreDescriptionBuilder::new()
            .numeric("A", "a", 2)
            .unwrap()
            .numeric("A", "again", 2);
        assert!(dup.is_err());

        let body = TreDescriptionBuilder::new()
            .field("X", "x", CharClass::BcsA, 1)
            .unwrap();
        let dangling =
            TreDescriptionBuilder::new().repeat(CountSource::FieldRef("NOPE".to_string()), body);
        assert!(dangling.is_err());
    }

    #[test]
    fn loops_carry_index_suffixes() {
        let descriptor = looped_descriptor();
        let tre = Tre::from_bytes(&descriptor, b"02AAABBB").unwrap();
        assert_eq!(tre.get("NPTS").unwrap().as_u64().unwrap(), 2);
        // Internal storage keeps the bracket form, iteration rewrites it.
        assert!(tre.fields().iter().any(|(k, _)| k == "PT[0]"));
        let keys: Vec<String> = tre.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["NPTS", "PT_0", "PT_1"]);
        // Lookup accepts both forms.
        assert_eq!(tre.get("PT[1]").unwrap().as_string(), "BBB");
        assert_eq!(tre.get("PT_1").unwrap().as_string(), "BBB");
    }

    #[test]
    fn length_mismatch_reports_the_failing_offset() {
        let descriptor = looped_descriptor();
        // Count says three points but only two are present.
        let err = Tre::from_bytes(&descriptor, b"03AAABBB").unwrap_err();
        match err {
            crate::errors::NitfError::MalformedTre { tag, length, offset } => {
                assert_eq!(tag, "LOOPED");
                assert_eq!(length, 8);
                assert_eq!(offset, 8);
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn conditionals_follow_prior_fields() {
        let body = TreDescriptionBuilder::new()
            .field("EXTRA", "extra", CharClass::BcsA, 4)
            .unwrap();
        let description = TreDescriptionBuilder::new()
            .field("FLAG", "flag", CharClass::BcsA, 1)
            .unwrap()
            .conditional(
                Predicate::Eq {
                    field: "FLAG".to_string(),
                    value: "Y".to_string(),
                },
                body,
            )
            .unwrap()
            .build();
        let descriptor = TreDescriptor::new("CONDTL", description);

        let with = Tre::from_bytes(&descriptor, b"YDATA").unwrap();
        assert_eq!(with.get("EXTRA").unwrap().as_string(), "DATA");
        let without = Tre::from_bytes(&descriptor, b"N").unwrap();
        assert!(without.get("EXTRA").is_none());
    }

    #[test]
    fn alternates_select_by_description_id() {
        let short = TreDescriptionBuilder::with_id("short")
            .field("BODY", "body", CharClass::BcsA, 4)
            .unwrap()
            .build();
        let long = TreDescriptionBuilder::with_id("long")
            .field("BODY", "body", CharClass::BcsA, 8)
            .unwrap()
            .build();
        let mut descriptor = TreDescriptor::new("TWOWAY", short);
        descriptor.push_alternate(long);

        let a = Tre::from_bytes(&descriptor, b"ABCD").unwrap();
        assert_eq!(a.description_id(), Some("short"));
        let b = Tre::from_bytes(&descriptor, b"ABCDEFGH").unwrap();
        assert_eq!(b.description_id(), Some("long"));
        assert!(Tre::from_bytes(&descriptor, b"ABCDEF").is_err());
    }

    #[test]
    fn wire_encoding() {
        let descriptor = looped_descriptor();
        let tre = Tre::from_bytes(&descriptor, b"01AAA").unwrap();
        assert_eq!(tre.data_length(), 5);
        assert_eq!(tre.wire_length(), 6 + 5 + 5);
        let expected: Vec<u8> = b"LOOPED00005".iter().chain(b"01AAA").copied().collect();
        assert_eq!(tre.to_wire_bytes(), expected);
    }

    #[test]
    fn registry_falls_back_to_raw() {
        let registry = TreRegistry::empty();
        let tre = registry.materialize("MYSTRY", b"\x01\x02\x03", false).unwrap();
        assert_eq!(tre.tag(), "MYSTRY");
        assert_eq!(tre.get("raw").unwrap().raw(), &[1, 2, 3]);
        // Strict mode reports the unknown tag instead.
        assert!(matches!(
            registry.materialize("MYSTRY", b"\x01", true),
            Err(crate::errors::NitfError::UnknownTre { .. })
        ));
    }

    #[test]
    fn registry_keeps_the_first_registration() {
        let mut registry = TreRegistry::empty();
        assert!(registry.register(looped_descriptor()));
        assert!(!registry.register(looped_descriptor()));
        assert!(registry.knows("LOOPED"));
    }

    #[test]
    fn builtin_piatga_decodes() {
        let registry = TreRegistry::with_builtins();
        let mut payload = Vec::new();
        payload.extend_from_slice(format!("{:<15}", "55HFA1234567890").as_bytes());
        payload.extend_from_slice(format!("{:<15}", "TGT0001").as_bytes());
        payload.extend_from_slice(b"US");
        payload.extend_from_slice(format!("{:<5}", "700").as_bytes());
        payload.extend_from_slice(format!("{:<15}", "512830N0061530W").as_bytes());
        payload.extend_from_slice(b"WGE");
        payload.extend_from_slice(format!("{:<38}", "TEST RANGE").as_bytes());
        payload.extend_from_slice(b"085");
        assert_eq!(payload.len(), 96);

        let tre = registry.materialize("PIATGA", &payload, true).unwrap();
        assert_eq!(tre.get("PIACTRY").unwrap().as_string(), "US");
        assert_eq!(tre.get("PERCOVER").unwrap().as_u64().unwrap(), 85);
        assert_eq!(tre.data_bytes(), payload);
    }

    #[test]
    fn builtin_piatga_range_is_enforced() {
        let registry = TreRegistry::with_builtins();
        let mut payload = vec![b' '; 93];
        payload.extend_from_slice(b"101"); // PERCOVER over 100
        assert!(registry.materialize("PIATGA", &payload, true).is_err());
    }

    #[test]
    fn extensions_preserve_order_and_duplicates() {
        let mut ext = Extensions::new();
        let mut first = Tre::new("PIATGA").unwrap();
        first.push_field("raw", crate::field::Field::from_bytes(b"1", CharClass::BcsA).unwrap());
        let mut second = Tre::new("OTHER").unwrap();
        second.push_field("raw", crate::field::Field::from_bytes(b"22", CharClass::BcsA).unwrap());
        let mut third = Tre::new("PIATGA").unwrap();
        third.push_field("raw", crate::field::Field::from_bytes(b"3", CharClass::BcsA).unwrap());

        ext.append(first);
        ext.append(second);
        ext.append(third);

        let tags: Vec<&str> = ext.iter().map(|t| t.tag()).collect();
        assert_eq!(tags, vec!["PIATGA", "OTHER", "PIATGA"]);
        assert_eq!(ext.find("PIATGA").unwrap().get("raw").unwrap().raw(), b"1");
        let dupes: Vec<&[u8]> = ext
            .find_all("PIATGA")
            .map(|t| t.get("raw").unwrap().raw())
            .collect();
        assert_eq!(dupes, vec![b"1" as &[u8], b"3" as &[u8]]);
        // 11 byte wire header per TRE plus payloads.
        assert_eq!(ext.wire_length(), 11 + 1 + 11 + 2 + 11 + 1);
    }

    #[test]
    fn canonical_key_rewriting() {
        assert_eq!(canonical_key("BASE"), "BASE");
        assert_eq!(canonical_key("BASE[3]"), "BASE_3");
        assert_eq!(canonical_key("BASE[3][12]"), "BASE_3_12");
    }
}

mod blocking {
    use crate::blocking::*;
    use crate::enums::ImageMode;
    use crate::io::BufferIo;

    fn geometry(mode: ImageMode, bands: usize, nbpp: u32) -> BlockGeometry {
        BlockGeometry {
            rows: 16,
            cols: 16,
            bands,
            blocks_per_row: 4,
            blocks_per_col: 4,
            block_width: 4,
            block_height: 4,
            bits_per_pixel: nbpp,
            mode,
        }
    }

    #[test]
    fn geometry_invariants() {
        assert!(geometry(ImageMode::BlockInterleave, 1, 8).validate().is_ok());
        let mut bad = geometry(ImageMode::BlockInterleave, 1, 8);
        bad.blocks_per_row = 3; // 3 * 4 < 16 columns
        assert!(bad.validate().is_err());
        let mut bad = geometry(ImageMode::BlockInterleave, 1, 8);
        bad.bits_per_pixel = 65;
        assert!(bad.validate().is_err());
    }

    #[test]
    fn container_sizes() {
        assert_eq!(geometry(ImageMode::BlockInterleave, 1, 1).container_bytes(), 1);
        assert_eq!(geometry(ImageMode::BlockInterleave, 1, 8).container_bytes(), 1);
        assert_eq!(geometry(ImageMode::BlockInterleave, 1, 12).container_bytes(), 2);
        assert_eq!(geometry(ImageMode::BlockInterleave, 1, 24).container_bytes(), 4);
        assert_eq!(geometry(ImageMode::BlockInterleave, 1, 64).container_bytes(), 8);
    }

    #[test]
    fn block_bytes_per_mode() {
        // One band of a 4x4 block at 8 bpp is 16 bytes.
        assert_eq!(geometry(ImageMode::BlockInterleave, 2, 8).block_bytes(), 16);
        // P and R blocks carry every band.
        assert_eq!(geometry(ImageMode::PixelInterleave, 2, 8).block_bytes(), 32);
        assert_eq!(geometry(ImageMode::RowInterleave, 2, 8).block_bytes(), 32);
        // 1 bit data pads each 4 pixel line to a byte.
        assert_eq!(geometry(ImageMode::BlockInterleave, 1, 1).block_bytes(), 4);
    }

    #[test]
    fn natural_offsets_per_mode() {
        let b = geometry(ImageMode::BlockInterleave, 2, 8);
        // Band planes are 16 blocks of 16 bytes.
        assert_eq!(b.natural_offset(0, 0, 1), 16);
        assert_eq!(b.natural_offset(0, 1, 0), 4 * 16);
        assert_eq!(b.natural_offset(1, 0, 0), 16 * 16);

        let p = geometry(ImageMode::PixelInterleave, 2, 8);
        assert_eq!(p.natural_offset(0, 0, 1), 32);
        assert_eq!(p.natural_offset(0, 1, 1), 5 * 32);
    }

    #[test]
    fn sample_positions_per_mode() {
        let b = geometry(ImageMode::BlockInterleave, 2, 8);
        assert_eq!(b.sample_bit_index(1, 2, 0), (4 + 2) * 8);

        let p = geometry(ImageMode::PixelInterleave, 2, 8);
        // Row 1, col 2, band 1 of a 4 pixel wide 2 band block.
        assert_eq!(p.sample_bit_index(1, 2, 1), (8 + 2 * 2 + 1) * 8);

        let r = geometry(ImageMode::RowInterleave, 2, 8);
        // Row 1 of band 1 is the third line of the block.
        assert_eq!(r.sample_bit_index(1, 2, 1), ((1 * 2 + 1) * 4 + 2) * 8);
    }

    #[test]
    fn covering_blocks_of_a_window() {
        let g = geometry(ImageMode::BlockInterleave, 1, 8);
        let w = SubWindow::new(0, 2, 4, 4, vec![0]);
        let (rows, cols) = g.covering_blocks(&w);
        assert_eq!(rows, 0..=0);
        assert_eq!(cols, 1..=1);
        let w = SubWindow::new(3, 6, 0, 16, vec![0]);
        let (rows, cols) = g.covering_blocks(&w);
        assert_eq!(rows, 0..=2);
        assert_eq!(cols, 0..=3);
    }

    #[test]
    fn window_validation() {
        let g = geometry(ImageMode::BlockInterleave, 3, 8);
        assert!(SubWindow::new(0, 16, 0, 16, vec![0, 1, 2]).validate(&g, 3).is_ok());
        // Out of range.
        assert!(SubWindow::new(8, 9, 0, 16, vec![0]).validate(&g, 3).is_err());
        // Band out of range.
        assert!(SubWindow::new(0, 1, 0, 1, vec![3]).validate(&g, 3).is_err());
        // Strictly decreasing lists are rejected; other orders read fine.
        assert!(SubWindow::new(0, 1, 0, 1, vec![2, 0]).validate(&g, 3).is_err());
        assert!(SubWindow::new(0, 1, 0, 1, vec![2, 0, 1]).validate(&g, 3).is_ok());
        // Empty.
        assert!(SubWindow::new(0, 0, 0, 1, vec![0]).validate(&g, 3).is_err());
    }

    #[test]
    fn downsampled_output_dimensions() {
        let mut w = SubWindow::new(0, 16, 0, 16, vec![0]);
        w.downsample = Some(DownSampler {
            row_skip: 2,
            col_skip: 3,
        });
        assert_eq!(w.out_rows(), 8);
        assert_eq!(w.out_cols(), 6);
    }

    #[test]
    fn mask_table_round_trip() {
        let mut mask = MaskTable::new_all_pad(4, vec![0x7f]);
        mask.block_offsets[0] = 0;
        mask.block_offsets[2] = 16;
        let bytes = mask.to_bytes();
        assert_eq!(bytes.len(), mask.byte_len());
        assert_eq!(mask.image_data_offset as usize, bytes.len());

        let mut io = BufferIo::new(bytes);
        let parsed = MaskTable::read(&mut io, 4).unwrap();
        assert_eq!(parsed, mask);
        assert_eq!(parsed.block_offset(0, 999), Some(0));
        assert_eq!(parsed.block_offset(1, 999), None);
        assert!(parsed.is_pad(1));
        assert!(!parsed.is_pad(2));
    }

    #[test]
    fn mask_table_rejects_inconsistent_offsets() {
        let mask = MaskTable::new_all_pad(4, vec![0]);
        let mut bytes = mask.to_bytes();
        // Corrupt IMDATOFF.
        bytes[3] = bytes[3].wrapping_add(1);
        let mut io = BufferIo::new(bytes);
        assert!(MaskTable::read(&mut io, 4).is_err());
    }
}

mod io {
    use crate::errors::NitfError;
    use crate::io::*;

    #[test]
    fn buffer_read_write_seek() {
        let mut io = BufferIo::empty();
        write_total(&mut io, b"0123456789").unwrap();
        assert_eq!(io.size().unwrap(), 10);
        io.seek(Whence::Set, 2).unwrap();
        let mut buf = [0u8; 3];
        read_total(&mut io, &mut buf).unwrap();
        assert_eq!(&buf, b"234");
        assert_eq!(io.tell().unwrap(), 5);
        io.seek(Whence::Cur, -1).unwrap();
        assert_eq!(io.tell().unwrap(), 4);
        io.seek(Whence::End, -2).unwrap();
        let mut buf = [0u8; 2];
        read_total(&mut io, &mut buf).unwrap();
        assert_eq!(&buf, b"89");
    }

    #[test]
    fn reading_past_the_end_is_eof() {
        let mut io = BufferIo::new(b"abc".to_vec());
        let mut buf = [0u8; 4];
        assert!(matches!(
            read_total(&mut io, &mut buf),
            Err(NitfError::Eof)
        ));
    }

    #[test]
    fn writable_range_is_enforced() {
        let mut io = BufferIo::with_writable_range(vec![0u8; 10], 2..6);
        io.seek(Whence::Set, 2).unwrap();
        write_total(&mut io, b"abcd").unwrap();
        assert_eq!(&io.as_slice()[2..6], b"abcd");
        io.seek(Whence::Set, 0).unwrap();
        assert!(write_total(&mut io, b"x").is_err());
        io.seek(Whence::Set, 5).unwrap();
        assert!(write_total(&mut io, b"xy").is_err());
    }

    #[test]
    fn read_only_buffers_reject_writes() {
        let mut io = BufferIo::read_only(b"data".to_vec());
        assert!(write_total(&mut io, b"x").is_err());
        let mut buf = [0u8; 4];
        read_total(&mut io, &mut buf).unwrap();
        assert_eq!(&buf, b"data");
    }
}

mod bits {
    use crate::bits::*;

    #[test]
    fn extract_and_insert_are_inverse() {
        let mut data = vec![0u8; 4];
        insert_bits(&mut data, 3, 12, 0xabc);
        assert_eq!(extract_bits(&data, 3, 12), 0xabc);
        // Neighbouring bits stay untouched.
        assert_eq!(extract_bits(&data, 0, 3), 0);
        assert_eq!(extract_bits(&data, 15, 8), 0);
    }

    #[test]
    fn unpack_into_container() {
        // Two 12 bit samples: 0x123, 0x456.
        let mut data = vec![0u8; 3];
        insert_bits(&mut data, 0, 12, 0x123);
        insert_bits(&mut data, 12, 12, 0x456);
        assert_eq!(data, vec![0x12, 0x34, 0x56]);

        let mut out = [0u8; 2];
        unpack_sample(&data, 12, 12, 2, &mut out);
        assert_eq!(out, [0x04, 0x56]);

        let mut packed = vec![0u8; 3];
        pack_sample(&mut packed, 0, 12, &[0x01, 0x23]);
        pack_sample(&mut packed, 12, 12, &[0x04, 0x56]);
        assert_eq!(packed, data);
    }
}

mod byteswap {
    use crate::byteswap::*;

    #[test]
    fn swap_is_an_involution() {
        let original: Vec<u8> = (0..64).collect();
        for elem in [2usize, 4, 8] {
            let mut buf = original.clone();
            swap_in_place(&mut buf, elem);
            assert_ne!(buf, original);
            swap_in_place(&mut buf, elem);
            assert_eq!(buf, original);
        }
    }

    #[test]
    fn striping_does_not_change_the_result() {
        let original: Vec<u8> = (0..=255).cycle().take(1024).collect();
        let mut reference = original.clone();
        swap_in_place(&mut reference, 4);
        for threads in [1usize, 2, 3, 7, 64] {
            let mut buf = original.clone();
            swap_striped(&mut buf, 4, threads);
            assert_eq!(buf, reference, "thread count {}", threads);
        }
    }

    #[test]
    fn single_byte_elements_are_untouched() {
        let mut buf = vec![1u8, 2, 3];
        swap_in_place(&mut buf, 1);
        assert_eq!(buf, vec![1, 2, 3]);
    }
}

mod record {
    use crate::enums::Version;
    use crate::Record;

    #[test]
    fn segment_constructors_keep_counts_in_step() {
        let mut record = Record::new(Version::Nitf21);
        record.new_image_segment().unwrap();
        record.new_image_segment().unwrap();
        record.new_text_segment().unwrap();
        assert_eq!(record.header.image_info.len(), 2);
        assert_eq!(record.header.text_info.len(), 1);
        assert!(record.validate().is_ok());
    }

    #[test]
    fn labels_only_under_20() {
        let mut modern = Record::new(Version::Nitf21);
        assert!(modern.new_label_segment().is_err());
        let mut legacy = Record::new(Version::Nitf20);
        assert!(legacy.new_label_segment().is_ok());
        assert!(legacy.validate().is_ok());
    }

    #[test]
    fn attachment_levels_must_resolve() {
        let mut record = Record::new(Version::Nitf21);
        {
            let image = record.new_image_segment().unwrap();
            image.subheader.display_level.set_uint(1u32).unwrap();
        }
        {
            let graphic = record.new_graphic_segment().unwrap();
            graphic.subheader.display_level.set_uint(2u32).unwrap();
            graphic.subheader.attachment_level.set_uint(1u32).unwrap();
        }
        assert!(record.validate().is_ok());

        record.graphics[0]
            .subheader
            .attachment_level
            .set_uint(7u32)
            .unwrap();
        assert!(record.validate().is_err());
    }

    #[test]
    fn file_header_byte_len_matches_the_schema() {
        let record = Record::new(Version::Nitf21);
        // An empty 2.1 file header is the well known 388 bytes.
        let len = record.header.byte_len().unwrap();
        assert_eq!(len, 388);
    }
}

mod image_subheader {
    use crate::enums::*;
    use crate::image_subheader::{BandInfo, ImageSubheader};

    fn subheader() -> ImageSubheader {
        let mut sub = ImageSubheader::new(Version::Nitf21);
        sub.set_blocking(16, 16, 4, 4, ImageMode::PixelInterleave)
            .unwrap();
        let mut band = BandInfo::new();
        band.init("M", "", "N", "", vec![]).unwrap();
        sub.set_pixel_information(
            PixelValueType::Int,
            8,
            8,
            PixelJustification::Right,
            ImageRepresentation::Mono,
            "VIS",
            vec![band],
        )
        .unwrap();
        sub.set_compression(Compression::None, "").unwrap();
        sub
    }

    #[test]
    fn blocking_computes_the_grid() {
        let mut sub = subheader();
        assert_eq!(sub.blocks_per_row.as_u64().unwrap(), 4);
        assert_eq!(sub.blocks_per_col.as_u64().unwrap(), 4);
        // Non-divisible dimensions round the grid up.
        sub.set_blocking(17, 15, 4, 4, ImageMode::BlockInterleave)
            .unwrap();
        assert_eq!(sub.blocks_per_col.as_u64().unwrap(), 5);
        assert_eq!(sub.blocks_per_row.as_u64().unwrap(), 4);
    }

    #[test]
    fn geometry_reflects_the_fields() {
        let sub = subheader();
        let g = sub.geometry().unwrap();
        assert_eq!(g.rows, 16);
        assert_eq!(g.cols, 16);
        assert_eq!(g.bands, 1);
        assert_eq!(g.mode, ImageMode::PixelInterleave);
        assert_eq!(g.block_bytes(), 16);
    }

    #[test]
    fn abpp_cannot_exceed_nbpp() {
        let mut sub = subheader();
        sub.actual_bits_per_pixel.set_uint(12u32).unwrap();
        assert!(sub.geometry().is_err());
        let err = sub.set_pixel_information(
            PixelValueType::Int,
            8,
            12,
            PixelJustification::Right,
            ImageRepresentation::Mono,
            "VIS",
            vec![],
        );
        assert!(err.is_err());
    }

    #[test]
    fn comments_are_bounded() {
        let mut sub = subheader();
        for i in 0..9 {
            sub.insert_comment(&format!("comment {}", i)).unwrap();
        }
        assert!(sub.insert_comment("one too many").is_err());
        sub.remove_comment(0).unwrap();
        assert_eq!(sub.comments.len(), 8);
        assert!(sub.remove_comment(8).is_err());
    }

    #[test]
    fn corners_round_trip_through_igeolo() {
        use crate::geo::GeoPoint;
        let mut sub = subheader();
        let corners = [
            GeoPoint::new(51.5083, -0.1280),
            GeoPoint::new(51.5083, -0.1200),
            GeoPoint::new(51.5000, -0.1200),
            GeoPoint::new(51.5000, -0.1280),
        ];
        sub.set_corners(&corners, CoordinateSystem::Geographic, Version::Nitf21)
            .unwrap();
        assert_eq!(sub.image_coordinate_system.as_string(), "G");
        assert_eq!(sub.corner_coordinates.len(), 60);
        let back = sub.corners(Version::Nitf21).unwrap();
        for (a, b) in back.iter().zip(corners.iter()) {
            // DMS quantises to one arc second.
            assert!((a.lat - b.lat).abs() < 1.0 / 3600.0);
            assert!((a.lon - b.lon).abs() < 1.0 / 3600.0);
        }
    }

    #[test]
    fn date_time_helpers_emit_the_version_layout() {
        use crate::datetime::NitfDateTime;
        let dt = NitfDateTime::new(2024, 1, 1, 12, 0, 0);
        let mut sub = subheader();
        sub.set_date_time(&dt, Version::Nitf21).unwrap();
        assert_eq!(sub.image_date_time.as_string(), "20240101120000");
        sub.set_date_time(&dt, Version::Nitf20).unwrap();
        assert_eq!(sub.image_date_time.as_string(), "01120000ZJAN24");

        let mut header = crate::FileHeader::new(Version::Nitf20);
        header.set_date_time(&dt).unwrap();
        assert_eq!(header.file_date_time.as_string(), "01120000ZJAN24");
        assert_eq!(header.date_time().unwrap(), dt);
    }

    #[test]
    fn compression_rate_field_is_conditional() {
        let mut sub = subheader();
        assert_eq!(sub.compression_rate.len(), 0);
        sub.set_compression(Compression::Jpeg, "00.5").unwrap();
        assert_eq!(sub.compression_rate.len(), 4);
        sub.set_compression(Compression::NoneMasked, "").unwrap();
        assert_eq!(sub.compression_rate.len(), 0);
    }

    #[test]
    fn band_lut_shapes_are_checked() {
        let mut band = BandInfo::new();
        assert!(band
            .init("LU", "", "N", "", vec![vec![0; 16], vec![0; 8]])
            .is_err());
        band.init("LU", "", "N", "", vec![vec![1; 16], vec![2; 16], vec![3; 16]])
            .unwrap();
        assert_eq!(band.lut_count().unwrap(), 3);
        assert_eq!(band.byte_len(), 2 + 6 + 1 + 3 + 1 + 5 + 48);
    }
}

mod plugin {
    use crate::blocking::BlockGeometry;
    use crate::enums::{Compression, ImageMode};
    use crate::errors::NitfError;
    use crate::plugin::*;

    fn fail_decoder(_: &[u8], _: &BlockGeometry) -> Result<Vec<u8>, NitfError> {
        Err(NitfError::PluginLoad {
            msg: "always fails".to_string(),
        })
    }

    #[test]
    fn codec_registration_is_first_wins() {
        // C7 is reserved, so nothing else in the tests registers it.
        let handler = CodecHandler::decoder(fail_decoder);
        assert!(register_codec(Compression::Reserved, handler).unwrap());
        assert!(!register_codec(Compression::Reserved, handler).unwrap());
        assert!(lookup_codec(Compression::Reserved).is_some());
        assert!(lookup_codec(Compression::Jpeg2000Masked).is_none());
    }

    #[test]
    fn version_mismatch_is_rejected() {
        let mut handler = CodecHandler::decoder(fail_decoder);
        handler.api = (PLUGIN_API_MAJOR + 1, 0);
        assert!(register_codec(Compression::Downsampled, handler).is_err());
        // Major-only matching tolerates a minor skew.
        let mut handler = CodecHandler::decoder(fail_decoder);
        handler.api = (PLUGIN_API_MAJOR, PLUGIN_API_MINOR + 7);
        handler.major_only = true;
        assert!(register_codec(Compression::Downsampled, handler).unwrap());
    }

    #[test]
    fn process_wide_tre_registration() {
        use crate::tre::TreDescriptor;
        let descriptor = TreDescriptor::raw("GLBTRE", 4);
        assert!(register_tre_descriptor(descriptor.clone()));
        // First registration wins; the duplicate is refused.
        assert!(!register_tre_descriptor(descriptor));
        assert!(tre_is_known("GLBTRE"));
        let tre = materialize_tre("GLBTRE", b"ABCD", true).unwrap();
        assert_eq!(tre.get("raw").unwrap().raw(), b"ABCD");
    }

    #[test]
    fn error_handler_hooks_collect() {
        #[derive(Default)]
        struct Recorder {
            missing: usize,
            failed: usize,
        }
        impl ErrorHandler for Recorder {
            fn directory_missing(&mut self, _: &std::path::Path) {
                self.missing += 1;
            }
            fn load_failed(&mut self, _: &std::path::Path, _: &str) {
                self.failed += 1;
            }
            fn already_loaded(&mut self, _: &str) {}
            fn version_unsupported(&mut self, _: &str, _: (u16, u16)) {}
            fn plugin_error(&mut self, _: &str, _: &str) {}
        }

        let mut recorder = Recorder::default();
        recorder.directory_missing(std::path::Path::new("/nonexistent"));
        recorder.load_failed(std::path::Path::new("/bad.so"), "nope");
        assert_eq!(recorder.missing, 1);
        assert_eq!(recorder.failed, 1);

        let _ = geometry_smoke();
    }

    // Keep a tiny use of BlockGeometry here so the decoder signature stays
    // honest in the test.
    fn geometry_smoke() -> BlockGeometry {
        BlockGeometry {
            rows: 1,
            cols: 1,
            bands: 1,
            blocks_per_row: 1,
            blocks_per_col: 1,
            block_width: 1,
            block_height: 1,
            bits_per_pixel: 8,
            mode: ImageMode::BlockInterleave,
        }
    }
}
