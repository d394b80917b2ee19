//! A decoded TRE instance: a tag plus an ordered mapping of named fields.
use crate::enums::CharClass;
use crate::errors::*;
use crate::field::Field;
use crate::tre::descriptor::{CountSource, TreDescription, TreDescriptor, TreEntry, TreValues};

/// The fixed width of a TRE tag on the wire.
pub const TRE_TAG_LEN: usize = 6;
/// The fixed width of the TRE length field on the wire.
pub const TRE_LENGTH_LEN: usize = 5;

/// Rewrite an array-indexed key (`BASE[i]` or `BASE[i][j]`) into the
/// bracket-free form (`BASE_i`, `BASE_i_j`) used at iteration boundaries.
pub fn canonical_key(key: &str) -> String {
    key.replace('[', "_").replace(']', "")
}

/// One decoded Tagged Record Extension.
///
/// Field iteration order matches the on-disk layout, so an instance can be
/// re-encoded bit for bit. Keys produced by descriptor loops are stored in
/// the `BASE[i]` form and canonicalised to `BASE_i` only when iterated.
#[derive(Debug, Clone, PartialEq)]
pub struct Tre {
    tag: String,
    description_id: Option<String>,
    fields: Vec<(String, Field)>,
}

impl Tre {
    /// Create an empty instance for a tag of at most six BCS-A characters.
    pub fn new(tag: &str) -> Result<Self, NitfError> {
        if tag.is_empty() || tag.len() > TRE_TAG_LEN || !CharClass::BcsA.validate(tag.as_bytes()) {
            return Err(NitfError::InvalidArgument {
                msg: format!("invalid TRE tag {:?}", tag),
            });
        }
        Ok(Tre {
            tag: tag.to_string(),
            description_id: None,
            fields: Vec::new(),
        })
    }

    /// Decode an instance by walking a description over raw bytes. Every
    /// alternate description of the descriptor is tried in order; the first
    /// one that consumes exactly the declared length wins.
    pub fn from_bytes(descriptor: &TreDescriptor, bytes: &[u8]) -> Result<Self, NitfError> {
        let mut deepest = 0;
        for description in &descriptor.descriptions {
            match walk_description(description, bytes) {
                Ok(fields) => {
                    return Ok(Tre {
                        tag: descriptor.tag.clone(),
                        description_id: description.id.clone(),
                        fields,
                    });
                }
                Err(offset) => deepest = deepest.max(offset),
            }
        }
        Err(NitfError::MalformedTre {
            tag: descriptor.tag.clone(),
            length: bytes.len(),
            offset: deepest,
        })
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Which alternate description matched, for tags with several layouts.
    pub fn description_id(&self) -> Option<&str> {
        self.description_id.as_deref()
    }

    /// Append a field under the given key. Used when building an instance by
    /// hand rather than from a descriptor.
    pub fn push_field(&mut self, key: &str, field: Field) {
        self.fields.push((key.to_string(), field));
    }

    /// Look a field up by key. Both the stored `BASE[i]` form and the
    /// canonical `BASE_i` form are accepted.
    pub fn get(&self, key: &str) -> Option<&Field> {
        self.fields
            .iter()
            .find(|(k, _)| k == key || canonical_key(k) == key)
            .map(|(_, f)| f)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut Field> {
        self.fields
            .iter_mut()
            .find(|(k, _)| k == key || canonical_key(k) == key)
            .map(|(_, f)| f)
    }

    /// Iterate the fields in on-disk order with canonicalised keys.
    pub fn iter(&self) -> impl Iterator<Item = (String, &Field)> {
        self.fields.iter().map(|(k, f)| (canonical_key(k), f))
    }

    /// The fields in on-disk order with their stored keys.
    pub fn fields(&self) -> &[(String, Field)] {
        &self.fields
    }

    /// The payload length in bytes.
    pub fn data_length(&self) -> usize {
        self.fields.iter().map(|(_, f)| f.len()).sum()
    }

    /// The payload bytes in on-disk order.
    pub fn data_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.data_length());
        for (_, field) in &self.fields {
            out.extend_from_slice(field.raw());
        }
        out
    }

    /// The full wire length: tag, length field and payload.
    pub fn wire_length(&self) -> usize {
        TRE_TAG_LEN + TRE_LENGTH_LEN + self.data_length()
    }

    /// Encode as `tag(6) || length(5) || payload`.
    pub fn to_wire_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.wire_length());
        out.extend_from_slice(format!("{:<6}", self.tag).as_bytes());
        out.extend_from_slice(format!("{:05}", self.data_length()).as_bytes());
        out.extend_from_slice(&self.data_bytes());
        out
    }
}

/// Walk one description over the payload. On success returns the decoded
/// fields; on failure returns the byte offset of the first failure.
fn walk_description(
    description: &TreDescription,
    bytes: &[u8],
) -> Result<Vec<(String, Field)>, usize> {
    let mut fields = Vec::new();
    let mut cursor = 0usize;
    walk_entries(&description.entries, bytes, &mut cursor, &mut fields, "")?;
    if cursor == bytes.len() {
        Ok(fields)
    } else {
        Err(cursor)
    }
}

fn walk_entries(
    entries: &[TreEntry],
    bytes: &[u8],
    cursor: &mut usize,
    fields: &mut Vec<(String, Field)>,
    suffix: &str,
) -> Result<(), usize> {
    for entry in entries {
        match entry {
            TreEntry::Field(spec) => {
                let end = *cursor + spec.length;
                if end > bytes.len() {
                    return Err(*cursor);
                }
                let raw = &bytes[*cursor..end];
                let field = Field::from_bytes(raw, spec.class).map_err(|_| *cursor)?;
                if let Some((lo, hi)) = spec.range {
                    match field.as_i64() {
                        Ok(v) if (lo..=hi).contains(&v) => {}
                        _ if field.is_blank() => {}
                        _ => return Err(*cursor),
                    }
                }
                fields.push((format!("{}{}", spec.key, suffix), field));
                *cursor = end;
            }
            TreEntry::Loop { count, body } => {
                let n = match count {
                    CountSource::Literal(n) => *n,
                    CountSource::FieldRef(key) => {
                        // Prefer the count field of the current iteration,
                        // fall back to one defined at an outer level.
                        let scoped = format!("{}{}", key, suffix);
                        let values = TreValues(fields);
                        let count = values
                            .get_u64(&scoped)
                            .or_else(|_| values.get_u64(key))
                            .map_err(|_| *cursor)?;
                        count as usize
                    }
                    CountSource::Compute(f) => f(&TreValues(fields)).map_err(|_| *cursor)?,
                };
                for i in 0..n {
                    let inner = format!("{}[{}]", suffix, i);
                    walk_entries(body, bytes, cursor, fields, &inner)?;
                }
            }
            TreEntry::If { cond, body } => {
                if cond.evaluate(&TreValues(fields)) {
                    walk_entries(body, bytes, cursor, fields, suffix)?;
                }
            }
        }
    }
    Ok(())
}
