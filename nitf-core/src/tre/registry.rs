//! The tag to descriptor lookup used to materialise TRE blobs.
use crate::errors::*;
use crate::tre::descriptor::TreDescriptor;
use crate::tre::instance::Tre;
use crate::tre::shared;

use fnv::FnvHashMap;

/// A lookup table from TRE tag to descriptor.
///
/// Lookup order is: the static built-in table (domain TREs shipped as
/// source), then descriptors registered by plug-ins, then a generic
/// fallback consisting of a single opaque binary field of the unknown
/// length. Conflicting registrations keep the first descriptor and log a
/// warning; there is never a silent override.
#[derive(Debug, Default)]
pub struct TreRegistry {
    descriptors: FnvHashMap<String, TreDescriptor>,
}

impl TreRegistry {
    /// An empty registry with no built-ins. Mostly useful in tests.
    pub fn empty() -> Self {
        Self::default()
    }

    /// A registry pre-loaded with the built-in descriptor table.
    pub fn with_builtins() -> Self {
        let mut registry = Self::default();
        shared::register_builtins(&mut registry);
        registry
    }

    /// Register a descriptor. Returns false (and keeps the existing entry)
    /// when the tag is already registered.
    pub fn register(&mut self, descriptor: TreDescriptor) -> bool {
        let tag = descriptor.tag.clone();
        if self.descriptors.contains_key(&tag) {
            log::warn!(
                "TRE descriptor for {} already registered; keeping the first registration",
                tag
            );
            return false;
        }
        self.descriptors.insert(tag, descriptor);
        true
    }

    /// Add an alternate description to an already registered tag, or
    /// register it fresh.
    pub fn register_alternate(&mut self, descriptor: TreDescriptor) {
        match self.descriptors.get_mut(&descriptor.tag) {
            Some(existing) => {
                for description in descriptor.descriptions {
                    existing.push_alternate(description);
                }
            }
            None => {
                self.descriptors.insert(descriptor.tag.clone(), descriptor);
            }
        }
    }

    /// Whether a real (non-fallback) description exists for the tag.
    pub fn knows(&self, tag: &str) -> bool {
        self.descriptors.contains_key(tag)
    }

    /// Look up the descriptor for a tag. Unknown tags fall back to a
    /// generic single-binary-field descriptor of the given length, unless
    /// strict mode asks for an error instead.
    pub fn describe(&self, tag: &str, length: usize, strict: bool) -> Result<TreDescriptor, NitfError> {
        if let Some(descriptor) = self.descriptors.get(tag) {
            return Ok(descriptor.clone());
        }
        if strict {
            return Err(NitfError::UnknownTre {
                tag: tag.to_string(),
            });
        }
        Ok(TreDescriptor::raw(tag, length))
    }

    /// Materialise a TRE instance from its tag and payload bytes.
    pub fn materialize(&self, tag: &str, bytes: &[u8], strict: bool) -> Result<Tre, NitfError> {
        let descriptor = self.describe(tag, bytes.len(), strict)?;
        match Tre::from_bytes(&descriptor, bytes) {
            Ok(tre) => Ok(tre),
            // A known tag whose content does not fit any description is
            // reported as malformed in strict mode; otherwise the blob is
            // still usable opaquely.
            Err(err) if !strict => {
                log::warn!("{}; keeping the TRE as an opaque blob", err);
                Tre::from_bytes(&TreDescriptor::raw(tag, bytes.len()), bytes)
            }
            Err(err) => Err(err),
        }
    }
}
