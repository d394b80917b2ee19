//! The descriptor mini-language that turns an opaque TRE blob into named fields.
//!
//! A descriptor is an ordered list of entries: plain fields, loops whose
//! count comes from a literal, an earlier field or a computation, and
//! conditional groups gated on earlier field values. Descriptors are built
//! through [`TreDescriptionBuilder`], which checks key uniqueness and
//! reference well-formedness once, at construction time.
use crate::enums::CharClass;
use crate::errors::*;
use crate::field::Field;

/// Read-only access to the fields decoded so far, for resolving loop counts
/// and conditionals.
pub struct TreValues<'a>(pub(crate) &'a [(String, Field)]);

impl<'a> TreValues<'a> {
    pub fn get(&self, key: &str) -> Option<&Field> {
        self.0.iter().rev().find(|(k, _)| k == key).map(|(_, f)| f)
    }

    pub fn get_u64(&self, key: &str) -> Result<u64, NitfError> {
        self.get(key)
            .ok_or_else(|| NitfError::InvalidArgument {
                msg: format!("no decoded field named {}", key),
            })?
            .as_u64()
    }
}

/// Where a loop takes its iteration count from.
#[derive(Clone)]
pub enum CountSource {
    /// A fixed number of iterations.
    Literal(usize),
    /// The numeric value of an earlier field in the same instance.
    FieldRef(String),
    /// A computation over the fields decoded so far.
    Compute(fn(&TreValues) -> Result<usize, NitfError>),
}

impl std::fmt::Debug for CountSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CountSource::Literal(n) => write!(f, "Literal({})", n),
            CountSource::FieldRef(k) => write!(f, "FieldRef({})", k),
            CountSource::Compute(_) => write!(f, "Compute(..)"),
        }
    }
}

/// A predicate over fields decoded earlier in the same instance.
#[derive(Clone)]
pub enum Predicate {
    /// True when the named field's trimmed value equals `value`.
    Eq { field: String, value: String },
    /// True when the named field's trimmed value differs from `value`.
    Ne { field: String, value: String },
    /// An arbitrary test over the decoded fields.
    Fn(fn(&TreValues) -> bool),
}

impl Predicate {
    pub(crate) fn evaluate(&self, values: &TreValues) -> bool {
        match self {
            Predicate::Eq { field, value } => {
                values.get(field).map(|f| f.as_string() == *value) == Some(true)
            }
            Predicate::Ne { field, value } => {
                values.get(field).map(|f| f.as_string() != *value) == Some(true)
            }
            Predicate::Fn(f) => f(values),
        }
    }

    fn referenced_field(&self) -> Option<&str> {
        match self {
            Predicate::Eq { field, .. } | Predicate::Ne { field, .. } => Some(field),
            Predicate::Fn(_) => None,
        }
    }
}

impl std::fmt::Debug for Predicate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Predicate::Eq { field, value } => write!(f, "{} == {:?}", field, value),
            Predicate::Ne { field, value } => write!(f, "{} != {:?}", field, value),
            Predicate::Fn(_) => write!(f, "fn(..)"),
        }
    }
}

/// One plain field of a descriptor.
#[derive(Debug, Clone)]
pub struct FieldSpec {
    /// The key the decoded field is stored under.
    pub key: String,
    /// A human readable label, carried for dump tooling.
    pub label: String,
    pub class: CharClass,
    pub length: usize,
    /// An optional inclusive numeric range the decoded value must satisfy.
    pub range: Option<(i64, i64)>,
}

/// One entry of a descriptor.
#[derive(Debug, Clone)]
pub enum TreEntry {
    Field(FieldSpec),
    Loop {
        count: CountSource,
        body: Vec<TreEntry>,
    },
    If {
        cond: Predicate,
        body: Vec<TreEntry>,
    },
}

/// One complete description of a TRE layout. A tag can carry several
/// alternate descriptions; the `id` records which one matched.
#[derive(Debug, Clone)]
pub struct TreDescription {
    pub id: Option<String>,
    pub entries: Vec<TreEntry>,
}

/// All registered descriptions for one tag.
#[derive(Debug, Clone)]
pub struct TreDescriptor {
    pub tag: String,
    pub descriptions: Vec<TreDescription>,
}

impl TreDescriptor {
    pub fn new(tag: &str, description: TreDescription) -> Self {
        TreDescriptor {
            tag: tag.to_string(),
            descriptions: vec![description],
        }
    }

    /// Add an alternate description for the same tag.
    pub fn push_alternate(&mut self, description: TreDescription) {
        self.descriptions.push(description);
    }

    /// A descriptor consisting of a single opaque binary field, used as the
    /// registry fallback for unknown tags.
    pub fn raw(tag: &str, length: usize) -> Self {
        TreDescriptor {
            tag: tag.to_string(),
            descriptions: vec![TreDescription {
                id: None,
                entries: vec![TreEntry::Field(FieldSpec {
                    key: "raw".to_string(),
                    label: "Raw data".to_string(),
                    class: CharClass::Binary,
                    length,
                    range: None,
                })],
            }],
        }
    }
}

/// Builds a [`TreDescription`], validating as it goes.
///
/// ```
/// use nitf_core::enums::CharClass;
/// use nitf_core::tre::descriptor::{CountSource, TreDescriptionBuilder};
///
/// let body = TreDescriptionBuilder::new()
///     .field("PT", "Point", CharClass::BcsA, 15).unwrap();
/// let desc = TreDescriptionBuilder::new()
///     .numeric("NPTS", "Number of points", 3).unwrap()
///     .repeat(CountSource::FieldRef("NPTS".to_string()), body).unwrap()
///     .build();
/// assert_eq!(desc.entries.len(), 2);
/// ```
#[derive(Debug, Default)]
pub struct TreDescriptionBuilder {
    id: Option<String>,
    entries: Vec<TreEntry>,
    keys: Vec<String>,
}

impl TreDescriptionBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a description carrying a description-id, for tags with several
    /// alternate layouts.
    pub fn with_id(id: &str) -> Self {
        TreDescriptionBuilder {
            id: Some(id.to_string()),
            entries: Vec::new(),
            keys: Vec::new(),
        }
    }

    fn check_new_key(&self, key: &str) -> Result<(), NitfError> {
        if key.is_empty() {
            return Err(NitfError::InvalidArgument {
                msg: "empty TRE field key".to_string(),
            });
        }
        if self.keys.iter().any(|k| k == key) {
            return Err(NitfError::InvalidArgument {
                msg: format!("duplicate TRE field key {}", key),
            });
        }
        Ok(())
    }

    /// Append a plain field.
    pub fn field(
        mut self,
        key: &str,
        label: &str,
        class: CharClass,
        length: usize,
    ) -> Result<Self, NitfError> {
        self.check_new_key(key)?;
        if length == 0 {
            return Err(NitfError::InvalidArgument {
                msg: format!("zero-length TRE field {}", key),
            });
        }
        self.keys.push(key.to_string());
        self.entries.push(TreEntry::Field(FieldSpec {
            key: key.to_string(),
            label: label.to_string(),
            class,
            length,
            range: None,
        }));
        Ok(self)
    }

    /// Append a BCS-N field; the common case gets a shorthand.
    pub fn numeric(self, key: &str, label: &str, length: usize) -> Result<Self, NitfError> {
        self.field(key, label, CharClass::BcsN, length)
    }

    /// Append a BCS-N field with an inclusive value range.
    pub fn numeric_range(
        mut self,
        key: &str,
        label: &str,
        length: usize,
        lo: i64,
        hi: i64,
    ) -> Result<Self, NitfError> {
        self.check_new_key(key)?;
        if lo > hi {
            return Err(NitfError::InvalidArgument {
                msg: format!("empty range for TRE field {}", key),
            });
        }
        self.keys.push(key.to_string());
        self.entries.push(TreEntry::Field(FieldSpec {
            key: key.to_string(),
            label: label.to_string(),
            class: CharClass::BcsN,
            length,
            range: Some((lo, hi)),
        }));
        Ok(self)
    }

    /// Append a loop. A `FieldRef` count must name a field defined earlier.
    pub fn repeat(
        mut self,
        count: CountSource,
        body: TreDescriptionBuilder,
    ) -> Result<Self, NitfError> {
        if let CountSource::FieldRef(key) = &count {
            if !self.keys.iter().any(|k| k == key) {
                return Err(NitfError::InvalidArgument {
                    msg: format!("loop count refers to undefined field {}", key),
                });
            }
        }
        for key in &body.keys {
            // Loop keys repeat per iteration with an index suffix, but must
            // still not shadow an outer field.
            if self.keys.iter().any(|k| k == key) {
                return Err(NitfError::InvalidArgument {
                    msg: format!("loop body redefines field {}", key),
                });
            }
        }
        self.keys.extend(body.keys);
        self.entries.push(TreEntry::Loop {
            count,
            body: body.entries,
        });
        Ok(self)
    }

    /// Append a conditional group. The predicate must reference a field
    /// defined earlier.
    pub fn conditional(
        mut self,
        cond: Predicate,
        body: TreDescriptionBuilder,
    ) -> Result<Self, NitfError> {
        if let Some(field) = cond.referenced_field() {
            if !self.keys.iter().any(|k| k == field) {
                return Err(NitfError::InvalidArgument {
                    msg: format!("condition refers to undefined field {}", field),
                });
            }
        }
        for key in &body.keys {
            if self.keys.iter().any(|k| k == key) {
                return Err(NitfError::InvalidArgument {
                    msg: format!("conditional body redefines field {}", key),
                });
            }
        }
        self.keys.extend(body.keys);
        self.entries.push(TreEntry::If {
            cond,
            body: body.entries,
        });
        Ok(self)
    }

    pub fn build(self) -> TreDescription {
        TreDescription {
            id: self.id,
            entries: self.entries,
        }
    }
}
