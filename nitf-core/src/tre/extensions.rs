//! The ordered, duplicate-tolerant container for the TREs of one extension section.
use crate::tre::instance::Tre;

/// The TREs of a user-defined or extended header section.
///
/// Insertion order is preserved and defines the on-disk order; the same tag
/// may appear several times.
///
/// ```
/// use nitf_core::tre::{Extensions, Tre};
///
/// let mut ext = Extensions::new();
/// ext.append(Tre::new("PIATGA").unwrap());
/// ext.append(Tre::new("PIATGA").unwrap());
/// assert_eq!(ext.len(), 2);
/// assert_eq!(ext.find_all("PIATGA").count(), 2);
/// assert!(ext.find("MISSNG").is_none());
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Extensions {
    tres: Vec<Tre>,
}

impl Extensions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.tres.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tres.is_empty()
    }

    /// Append a TRE at the end of the section.
    pub fn append(&mut self, tre: Tre) {
        self.tres.push(tre);
    }

    /// The first TRE with the given tag.
    pub fn find(&self, tag: &str) -> Option<&Tre> {
        self.tres.iter().find(|t| t.tag() == tag)
    }

    /// All TREs with the given tag, in section order.
    pub fn find_all<'a>(&'a self, tag: &'a str) -> impl Iterator<Item = &'a Tre> + 'a {
        self.tres.iter().filter(move |t| t.tag() == tag)
    }

    pub fn iter(&self) -> std::slice::Iter<Tre> {
        self.tres.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<Tre> {
        self.tres.iter_mut()
    }

    /// Remove and return the TRE at `index`.
    pub fn remove(&mut self, index: usize) -> Tre {
        self.tres.remove(index)
    }

    /// Remove all TREs, returning them in order.
    pub fn take_all(&mut self) -> Vec<Tre> {
        std::mem::take(&mut self.tres)
    }

    /// The summed wire length of the section content (tags, length fields
    /// and payloads; the section's own length field is not included).
    pub fn wire_length(&self) -> usize {
        self.tres.iter().map(|t| t.wire_length()).sum()
    }

    /// Encode the whole section as concatenated TRE wire records.
    pub fn to_wire_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.wire_length());
        for tre in &self.tres {
            out.extend_from_slice(&tre.to_wire_bytes());
        }
        out
    }
}

/// The encoded size of a whole extension section: the five digit length
/// field plus, when the section is populated (or points at an overflow
/// DES), the three digit overflow index and the TRE records.
pub fn section_byte_len(extensions: &Extensions, overflow: &crate::field::Field) -> usize {
    if extensions.is_empty() && overflow.as_u64().unwrap_or(0) == 0 {
        5
    } else {
        5 + 3 + extensions.wire_length()
    }
}

impl<'a> IntoIterator for &'a Extensions {
    type Item = &'a Tre;
    type IntoIter = std::slice::Iter<'a, Tre>;

    fn into_iter(self) -> Self::IntoIter {
        self.tres.iter()
    }
}

impl IntoIterator for Extensions {
    type Item = Tre;
    type IntoIter = std::vec::IntoIter<Tre>;

    fn into_iter(self) -> Self::IntoIter {
        self.tres.into_iter()
    }
}
