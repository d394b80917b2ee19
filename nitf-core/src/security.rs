//! The security classification group shared by the file header and every subheader.
//!
//! NITF 2.0 and 2.1 use entirely different width tables for this group. The
//! structure below carries the union of both schemas; fields that only exist
//! in one version stay blank in the other, and [`FileSecurity::resize_for_version`]
//! re-sizes the shared fields when a record is converted between versions.
use crate::enums::{CharClass, Version};
use crate::field::Field;

/// The classification group of a header or subheader.
///
/// Field widths are those of the version the group was constructed for.
/// The NITF 2.0 schema covers `classification`, `codewords`,
/// `control_and_handling`, `releasing_instructions`, `class_authority`,
/// `security_control_number` and `downgrade` (with the conditional forty
/// byte `downgrade_event`); the remaining fields belong to the 2.1 schema.
#[derive(Debug, Clone, PartialEq)]
pub struct FileSecurity {
    /// CLAS (1).
    pub classification: Field,
    /// CLSY (2, 2.1 only).
    pub class_system: Field,
    /// CODE (40 in 2.0, 11 in 2.1).
    pub codewords: Field,
    /// CTLH (40 in 2.0, 2 in 2.1).
    pub control_and_handling: Field,
    /// REL (40 in 2.0, 20 in 2.1).
    pub releasing_instructions: Field,
    /// DCTP (2, 2.1 only).
    pub declass_type: Field,
    /// DCDT (8, 2.1 only).
    pub declass_date: Field,
    /// DCXM (4, 2.1 only).
    pub declass_exemption: Field,
    /// DWNG: 6 in 2.0, 1 (DG) in 2.1.
    pub downgrade: Field,
    /// DGDT (8, 2.1); in 2.0 this is the conditional forty byte DEVT.
    pub downgrade_date: Field,
    /// CLTX (43, 2.1 only).
    pub classification_text: Field,
    /// CATP (1, 2.1 only).
    pub class_authority_type: Field,
    /// CAUT (20 in 2.0, 40 in 2.1).
    pub class_authority: Field,
    /// CRSN (1, 2.1 only).
    pub class_reason: Field,
    /// SRDT (8, 2.1 only).
    pub security_source_date: Field,
    /// CTLN (20 in 2.0, 15 in 2.1).
    pub security_control_number: Field,
}

/// The 2.0 downgrade value that announces the conditional DEVT field.
pub const DOWNGRADE_EVENT_MARKER: &str = "999998";

impl FileSecurity {
    /// Create a blank security group with the widths of the given version.
    pub fn new(version: Version) -> Self {
        let mut sec = FileSecurity {
            classification: Field::new(1, CharClass::BcsA),
            class_system: Field::new(2, CharClass::BcsA),
            codewords: Field::new(11, CharClass::BcsA),
            control_and_handling: Field::new(2, CharClass::BcsA),
            releasing_instructions: Field::new(20, CharClass::BcsA),
            declass_type: Field::new(2, CharClass::BcsA),
            declass_date: Field::new(8, CharClass::BcsA),
            declass_exemption: Field::new(4, CharClass::BcsA),
            downgrade: Field::new(1, CharClass::BcsA),
            downgrade_date: Field::new(8, CharClass::BcsA),
            classification_text: Field::new(43, CharClass::BcsA),
            class_authority_type: Field::new(1, CharClass::BcsA),
            class_authority: Field::new(40, CharClass::BcsA),
            class_reason: Field::new(1, CharClass::BcsA),
            security_source_date: Field::new(8, CharClass::BcsA),
            security_control_number: Field::new(15, CharClass::BcsA),
        };
        if version.is_legacy() {
            sec.resize_for_version(version);
        }
        sec
    }

    /// Change the shared field widths to those of the target version.
    /// Content is truncated or padded on the right.
    pub fn resize_for_version(&mut self, version: Version) {
        if version.is_legacy() {
            self.codewords.resize(40);
            self.control_and_handling.resize(40);
            self.releasing_instructions.resize(40);
            self.class_authority.resize(20);
            self.security_control_number.resize(20);
            self.downgrade.resize(6);
            // DEVT is conditional; blank until the downgrade marker is set.
            self.downgrade_date.resize(0);
        } else {
            self.codewords.resize(11);
            self.control_and_handling.resize(2);
            self.releasing_instructions.resize(20);
            self.class_authority.resize(40);
            self.security_control_number.resize(15);
            self.downgrade.resize(1);
            self.downgrade_date.resize(8);
        }
    }

    /// Whether the 2.0 conditional DEVT field is present.
    pub fn has_downgrade_event(&self) -> bool {
        self.downgrade.as_string() == DOWNGRADE_EVENT_MARKER
    }

    /// The total encoded width of the group for the given version.
    pub fn byte_len(&self, version: Version) -> usize {
        if version.is_legacy() {
            let devt = if self.has_downgrade_event() { 40 } else { 0 };
            1 + 40 + 40 + 40 + 20 + 20 + 6 + devt
        } else {
            1 + 2 + 11 + 2 + 20 + 2 + 8 + 4 + 1 + 8 + 43 + 1 + 40 + 1 + 8 + 15
        }
    }
}

impl std::fmt::Display for FileSecurity {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(
            f,
            "classification: {}
codewords: {}
control and handling: {}
releasing instructions: {}
classification authority: {}
security control number: {}",
            self.classification,
            self.codewords.as_string(),
            self.control_and_handling.as_string(),
            self.releasing_instructions.as_string(),
            self.class_authority.as_string(),
            self.security_control_number.as_string(),
        )
    }
}
