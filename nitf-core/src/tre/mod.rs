//! The Tagged Record Extension system: descriptor DSL, decoded instances,
//! the tag registry and the per-section container.
pub mod descriptor;
pub mod extensions;
pub mod instance;
pub mod registry;
pub mod shared;

pub use descriptor::{CountSource, FieldSpec, Predicate, TreDescription, TreDescriptionBuilder, TreDescriptor, TreEntry};
pub use extensions::Extensions;
pub use instance::{canonical_key, Tre, TRE_LENGTH_LEN, TRE_TAG_LEN};
pub use registry::TreRegistry;
