//! This module contains the [`NitfSettings`] structure which customises parsing
//! and image reading.
//!
//! NB: Most of these knobs trade strictness for the ability to get data out
//! of files that bend the format. Loosening them can make the engine accept
//! files it would otherwise reject, so they should be changed with care.
use crate::enums::SegmentKind;
use crate::errors::NitfError;

/// How many decompressed blocks the per-segment LRU cache keeps.
pub const DEFAULT_BLOCK_CACHE: usize = 4;

/// Settings for parsing records and reading image segments.
#[derive(Debug, Clone, PartialEq)]
pub struct NitfSettings {
    /// Abort on the first violation, or collect warnings and carry on.
    pub(crate) strict: bool,
    /// Unknown TREs become opaque blobs when false; errors when true.
    pub(crate) strict_tres: bool,
    /// Capacity of the decompressed block cache. Zero disables caching.
    pub(crate) block_cache_size: usize,
    /// Worker threads for the byte-swap stage of image reads.
    pub(crate) swap_threads: usize,
    /// Convert a failed block decode into pad pixels plus a warning.
    pub(crate) recover_bad_blocks: bool,
}

impl Default for NitfSettings {
    fn default() -> Self {
        NitfSettings {
            strict: true,
            strict_tres: false,
            block_cache_size: DEFAULT_BLOCK_CACHE,
            swap_threads: 1,
            recover_bad_blocks: false,
        }
    }
}

impl NitfSettings {
    /// Best-effort parsing: violations become warnings on the parsed record.
    pub fn best_effort() -> Self {
        NitfSettings {
            strict: false,
            ..Default::default()
        }
    }

    pub fn get_strict(&self) -> bool {
        self.strict
    }

    pub fn set_strict(&mut self, strict: bool) {
        self.strict = strict;
    }

    pub fn get_strict_tres(&self) -> bool {
        self.strict_tres
    }

    /// Require a registered description for every TRE instead of falling
    /// back to an opaque blob.
    pub fn set_strict_tres(&mut self, strict: bool) {
        self.strict_tres = strict;
    }

    pub fn get_block_cache_size(&self) -> usize {
        self.block_cache_size
    }

    pub fn set_block_cache_size(&mut self, size: usize) {
        self.block_cache_size = size;
    }

    pub fn get_swap_threads(&self) -> usize {
        self.swap_threads
    }

    /// The byte-swap stage stripes rows over this many workers. The result
    /// does not depend on the count.
    pub fn set_swap_threads(&mut self, threads: usize) {
        self.swap_threads = threads.max(1);
    }

    pub fn get_recover_bad_blocks(&self) -> bool {
        self.recover_bad_blocks
    }

    /// Opt in to converting per-block decode failures into pad pixels.
    pub fn set_recover_bad_blocks(&mut self, recover: bool) {
        self.recover_bad_blocks = recover;
    }
}

/// One recoverable violation collected during best-effort parsing or an
/// opted-in block recovery.
#[derive(Debug)]
pub struct ParseWarning {
    pub segment: SegmentKind,
    pub field: String,
    pub offset: u64,
    pub error: NitfError,
}

impl std::fmt::Display for ParseWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} (in {} field {} at file offset {})",
            self.error, self.segment, self.field, self.offset
        )
    }
}
