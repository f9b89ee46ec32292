//! Local file materialization
//!
//! Resolves caller-supplied filenames against a platform-chosen storage root
//! and writes base64 audio payloads to them.

mod materializer;
mod root;

pub use materializer::{validate_filename, FileMaterializer, DEFAULT_CHUNK_SIZE};
pub use root::{package_cache_dir, PlatformStorage, StorageRoot};
