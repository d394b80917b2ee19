//! TRE overflow handling on the write path.
//!
//! An extension section's length field caps it at 99999 bytes. When a
//! section outgrows that, the tail of its TRE list moves into a data
//! extension segment whose type-id names the host section; the host keeps
//! its leading TREs and records the one-based index of the overflow DES in
//! its overflow field. The split always fills the host to capacity in
//! order, so merging after an unmerge reproduces the original bytes.
use nitf_core::errors::NitfError;
use nitf_core::tre::Tre;
use nitf_core::{Record, SegmentData, OVERFLOW_FIELD_LEN, SECTION_CAPACITY};

/// The sections of a record that can overflow into a DES.
#[derive(Debug, Clone, Copy, PartialEq)]
enum SectionRef {
    FileUserDefined,
    FileExtended,
    ImageUserDefined(usize),
    ImageExtended(usize),
    GraphicExtended(usize),
    TextExtended(usize),
}

impl SectionRef {
    fn name(self) -> &'static str {
        match self {
            SectionRef::FileUserDefined => "UDHD",
            SectionRef::FileExtended => "XHD",
            SectionRef::ImageUserDefined(_) => "UDID",
            SectionRef::ImageExtended(_) => "IXSHD",
            SectionRef::GraphicExtended(_) => "SXSHD",
            SectionRef::TextExtended(_) => "TXSHD",
        }
    }

    /// The one-based index of the host segment; zero for the file header.
    fn item(self) -> usize {
        match self {
            SectionRef::FileUserDefined | SectionRef::FileExtended => 0,
            SectionRef::ImageUserDefined(i)
            | SectionRef::ImageExtended(i)
            | SectionRef::GraphicExtended(i)
            | SectionRef::TextExtended(i) => i + 1,
        }
    }
}

fn sections_of(record: &Record) -> Vec<SectionRef> {
    let mut refs = vec![SectionRef::FileUserDefined, SectionRef::FileExtended];
    for i in 0..record.images.len() {
        refs.push(SectionRef::ImageUserDefined(i));
        refs.push(SectionRef::ImageExtended(i));
    }
    for i in 0..record.graphics.len() {
        refs.push(SectionRef::GraphicExtended(i));
    }
    for i in 0..record.texts.len() {
        refs.push(SectionRef::TextExtended(i));
    }
    refs
}

fn host_mut(
    record: &mut Record,
    which: SectionRef,
) -> (&mut nitf_core::Extensions, &mut nitf_core::Field) {
    match which {
        SectionRef::FileUserDefined => (
            &mut record.header.user_defined,
            &mut record.header.user_defined_overflow,
        ),
        SectionRef::FileExtended => (
            &mut record.header.extended,
            &mut record.header.extended_overflow,
        ),
        SectionRef::ImageUserDefined(i) => {
            let sub = &mut record.images[i].subheader;
            (&mut sub.user_defined, &mut sub.user_defined_overflow)
        }
        SectionRef::ImageExtended(i) => {
            let sub = &mut record.images[i].subheader;
            (&mut sub.extended, &mut sub.extended_overflow)
        }
        SectionRef::GraphicExtended(i) => {
            let sub = &mut record.graphics[i].subheader;
            (&mut sub.extended, &mut sub.extended_overflow)
        }
        SectionRef::TextExtended(i) => {
            let sub = &mut record.texts[i].subheader;
            (&mut sub.extended, &mut sub.extended_overflow)
        }
    }
}

/// Merge oversized sections into overflow DES segments, record-wide.
pub(crate) fn apply_overflow(record: &mut Record) -> Result<(), NitfError> {
    for which in sections_of(record) {
        section_overflow(record, which)?;
    }
    Ok(())
}

fn section_overflow(record: &mut Record, which: SectionRef) -> Result<(), NitfError> {
    // TRE content capacity: the length field also counts the overflow index.
    let capacity = SECTION_CAPACITY - OVERFLOW_FIELD_LEN;

    let moved: Vec<Tre> = {
        let (extensions, _) = host_mut(record, which);
        if extensions.wire_length() <= capacity {
            Vec::new()
        } else {
            // Fill the host section to capacity in order; the first TRE that
            // does not fit starts the overflow, and everything after it
            // follows to keep section order intact.
            let mut kept_len = 0usize;
            let mut moved = Vec::new();
            let all = extensions.take_all();
            for tre in all {
                if moved.is_empty() && kept_len + tre.wire_length() <= capacity {
                    kept_len += tre.wire_length();
                    extensions.append(tre);
                } else {
                    moved.push(tre);
                }
            }
            moved
        }
    };
    if moved.is_empty() {
        return Ok(());
    }

    let mut payload = Vec::new();
    for tre in &moved {
        payload.extend_from_slice(&tre.to_wire_bytes());
    }

    // Reuse the overflow DES a previous unmerge left behind, or append a
    // fresh one.
    let existing = record.data_extensions.iter().position(|des| {
        des.subheader.type_id.as_string() == which.name()
            && des.subheader.data_item_overflowed.as_u64().unwrap_or(0) as usize == which.item()
    });
    let des_index = match existing {
        Some(index) => index,
        None => {
            let des = record.new_data_extension_segment()?;
            des.subheader.set_overflow(which.name(), which.item() as u32)?;
            des.subheader.version.set_uint(1u32)?;
            record.data_extensions.len() - 1
        }
    };
    record.data_extensions[des_index].data = SegmentData::InMemory(payload);

    let des_number = des_index as u64 + 1;
    let (_, overflow) = host_mut(record, which);
    overflow.set_uint(des_number)?;
    Ok(())
}
