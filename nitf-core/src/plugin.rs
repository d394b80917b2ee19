//! The plug-in boundary: process-wide registries for TRE descriptors and
//! compression codecs.
//!
//! Descriptors and codecs are contributed at start-up through compile-time
//! registration; an optional directory scan over `NITF_PLUGIN_PATH` reports
//! what it finds through an [`ErrorHandler`] but never aborts the host.
//! Registration takes the registry write lock; the read path after
//! initialisation only ever takes uncontended read locks.
use crate::blocking::BlockGeometry;
use crate::enums::Compression;
use crate::errors::*;
use crate::tre::{Tre, TreDescriptor, TreRegistry};

use fnv::FnvHashMap;
use std::path::{Path, PathBuf};
use std::sync::{OnceLock, RwLock};

/// The plug-in API version of this host.
pub const PLUGIN_API_MAJOR: u16 = 1;
pub const PLUGIN_API_MINOR: u16 = 0;

/// The environment variable holding the plug-in search path.
pub const PLUGIN_PATH_VAR: &str = "NITF_PLUGIN_PATH";

/// Decompress one block instance. Receives the stored bytes and the segment
/// geometry; must return exactly `geometry.block_bytes()` bytes.
pub type Decompressor = fn(&[u8], &BlockGeometry) -> Result<Vec<u8>, NitfError>;

/// Compress one block instance.
pub type Compressor = fn(&[u8], &BlockGeometry) -> Result<Vec<u8>, NitfError>;

/// A registered codec for one compression code.
#[derive(Clone, Copy)]
pub struct CodecHandler {
    pub decompress: Option<Decompressor>,
    pub compress: Option<Compressor>,
    /// The (major, minor) plug-in API version the handler was built against.
    pub api: (u16, u16),
    /// Opt-in to major-only version matching.
    pub major_only: bool,
}

impl CodecHandler {
    pub fn decoder(decompress: Decompressor) -> Self {
        CodecHandler {
            decompress: Some(decompress),
            compress: None,
            api: (PLUGIN_API_MAJOR, PLUGIN_API_MINOR),
            major_only: false,
        }
    }

    fn version_ok(&self) -> bool {
        if self.major_only {
            self.api.0 == PLUGIN_API_MAJOR
        } else {
            self.api == (PLUGIN_API_MAJOR, PLUGIN_API_MINOR)
        }
    }
}

/// Hooks through which plug-in loading reports its progress and failures.
/// The loader calls these and carries on; a failed plug-in never brings the
/// host down.
pub trait ErrorHandler {
    fn directory_missing(&mut self, path: &Path);
    fn load_failed(&mut self, path: &Path, msg: &str);
    fn already_loaded(&mut self, name: &str);
    fn version_unsupported(&mut self, name: &str, api: (u16, u16));
    fn plugin_error(&mut self, name: &str, msg: &str);
}

/// The default handler: every hook goes to the log.
#[derive(Debug, Default)]
pub struct LogErrorHandler;

impl ErrorHandler for LogErrorHandler {
    fn directory_missing(&mut self, path: &Path) {
        log::warn!("plug-in directory {} does not exist", path.display());
    }

    fn load_failed(&mut self, path: &Path, msg: &str) {
        log::warn!("could not load plug-in {}: {}", path.display(), msg);
    }

    fn already_loaded(&mut self, name: &str) {
        log::warn!("plug-in {} is already loaded", name);
    }

    fn version_unsupported(&mut self, name: &str, api: (u16, u16)) {
        log::warn!(
            "plug-in {} was built against API {}.{}, host is {}.{}",
            name,
            api.0,
            api.1,
            PLUGIN_API_MAJOR,
            PLUGIN_API_MINOR
        );
    }

    fn plugin_error(&mut self, name: &str, msg: &str) {
        log::warn!("plug-in {} reported: {}", name, msg);
    }
}

fn tre_registry() -> &'static RwLock<TreRegistry> {
    static REGISTRY: OnceLock<RwLock<TreRegistry>> = OnceLock::new();
    REGISTRY.get_or_init(|| RwLock::new(TreRegistry::with_builtins()))
}

fn codec_registry() -> &'static RwLock<FnvHashMap<Compression, CodecHandler>> {
    static REGISTRY: OnceLock<RwLock<FnvHashMap<Compression, CodecHandler>>> = OnceLock::new();
    REGISTRY.get_or_init(|| RwLock::new(FnvHashMap::default()))
}

/// Register a TRE descriptor process-wide. First registration wins; a
/// conflict is logged and returns false.
pub fn register_tre_descriptor(descriptor: TreDescriptor) -> bool {
    tre_registry()
        .write()
        .expect("TRE registry poisoned")
        .register(descriptor)
}

/// Register a codec for a compression code. First registration wins.
/// Handlers with an incompatible API version are rejected.
pub fn register_codec(code: Compression, handler: CodecHandler) -> Result<bool, NitfError> {
    if !handler.version_ok() {
        return Err(NitfError::PluginLoad {
            msg: format!(
                "codec for {} built against API {}.{}, host is {}.{}",
                code, handler.api.0, handler.api.1, PLUGIN_API_MAJOR, PLUGIN_API_MINOR
            ),
        });
    }
    let mut registry = codec_registry().write().expect("codec registry poisoned");
    if registry.contains_key(&code) {
        log::warn!(
            "codec for {} already registered; keeping the first registration",
            code
        );
        return Ok(false);
    }
    registry.insert(code, handler);
    Ok(true)
}

/// Look up the codec registered for a compression code.
pub fn lookup_codec(code: Compression) -> Option<CodecHandler> {
    codec_registry()
        .read()
        .expect("codec registry poisoned")
        .get(&code)
        .copied()
}

/// Materialise a TRE through the process-wide registry.
pub fn materialize_tre(tag: &str, bytes: &[u8], strict: bool) -> Result<Tre, NitfError> {
    tre_registry()
        .read()
        .expect("TRE registry poisoned")
        .materialize(tag, bytes, strict)
}

/// Whether a real description is registered for the tag.
pub fn tre_is_known(tag: &str) -> bool {
    tre_registry()
        .read()
        .expect("TRE registry poisoned")
        .knows(tag)
}

/// The configured plug-in search directories, from [`PLUGIN_PATH_VAR`].
/// The separator follows the host convention (`;` on Windows, `:` elsewhere),
/// with the other separator accepted as well.
pub fn plugin_search_path() -> Vec<PathBuf> {
    match std::env::var(PLUGIN_PATH_VAR) {
        Ok(value) => value
            .split(|c| c == ':' || c == ';')
            .filter(|s| !s.is_empty())
            .map(PathBuf::from)
            .collect(),
        Err(_) => Vec::new(),
    }
}

/// Scan the configured plug-in directories, reporting through `handler`.
///
/// The engine registers plug-ins at compile time, so the scan validates the
/// configuration rather than loading shared objects: a missing directory or
/// an unreadable entry is reported and skipped, and the host carries on.
pub fn scan_plugin_directories(handler: &mut dyn ErrorHandler) {
    for dir in plugin_search_path() {
        if !dir.is_dir() {
            handler.directory_missing(&dir);
            continue;
        }
        let entries = match std::fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) => {
                handler.load_failed(&dir, &e.to_string());
                continue;
            }
        };
        for entry in entries {
            match entry {
                Ok(entry) => {
                    let name = entry.file_name().to_string_lossy().to_string();
                    let known = entry
                        .path()
                        .file_stem()
                        .map(|stem| tre_is_known(&stem.to_string_lossy().to_uppercase()))
                        .unwrap_or(false);
                    if known {
                        handler.already_loaded(&name);
                    } else {
                        handler.load_failed(
                            entry.path().as_path(),
                            "no compile-time registration for this plug-in",
                        );
                    }
                }
                Err(e) => handler.load_failed(&dir, &e.to_string()),
            }
        }
    }
}
