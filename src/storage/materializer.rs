use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use base64::read::DecoderReader;
use std::borrow::Cow;
use std::fs::{self, OpenOptions};
use std::io::{self, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::root::StorageRoot;
use crate::error::{BridgeError, BridgeResult};

/// Default write buffer size in bytes
pub const DEFAULT_CHUNK_SIZE: usize = 8 * 1024;

/// Standard alphabet, padding optional, non-zero trailing bits accepted
const PAYLOAD_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new()
        .with_decode_padding_mode(DecodePaddingMode::Indifferent)
        .with_decode_allow_trailing_bits(true),
);

/// Materializes named files under the storage root
///
/// Filenames form a single flat namespace directly below the root. Writes
/// decode the base64 payload incrementally into a temporary sibling file and
/// link it into place only once the whole payload decoded and flushed. A file
/// that is already in place is never replaced.
#[derive(Clone)]
pub struct FileMaterializer {
    root: Arc<dyn StorageRoot>,
    chunk_size: usize,
}

impl FileMaterializer {
    pub fn new(root: Arc<dyn StorageRoot>) -> Self {
        Self {
            root,
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }

    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    /// Absolute path of `filename` under the current storage root
    pub fn resolve_full_path(&self, filename: &str) -> PathBuf {
        self.root.storage_root().join(filename)
    }

    /// Path of `filename` if a file exists there, `None` otherwise
    pub fn exists(&self, filename: &str) -> BridgeResult<Option<PathBuf>> {
        validate_filename(filename)?;

        let path = self.resolve_full_path(filename);
        if path.is_file() {
            debug!("File exists: {}", path.display());
            Ok(Some(path))
        } else {
            debug!("File not found: {}", path.display());
            Ok(None)
        }
    }

    /// Write the decoded payload to `filename` unless a file is already there
    ///
    /// An existing file is returned untouched and the payload is ignored.
    pub fn download_audio_file(&self, filename: &str, base64: &str) -> BridgeResult<PathBuf> {
        validate_filename(filename)?;

        let path = self.resolve_full_path(filename);
        if path.is_file() {
            info!("File already present, skipping write: {}", path.display());
            return Ok(path);
        }

        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir).map_err(|e| {
                BridgeError::Io(format!(
                    "Failed to create storage directory {}: {}",
                    dir.display(),
                    e
                ))
            })?;
        }

        let part = part_path(&path);
        match self.write_payload(&part, base64) {
            Ok(bytes) => {
                let published = fs::hard_link(&part, &path);
                remove_part(&part);
                match published {
                    Ok(()) => {
                        info!("Wrote {} bytes to {}", bytes, path.display());
                        Ok(path)
                    }
                    Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                        info!("File appeared during write, keeping it: {}", path.display());
                        Ok(path)
                    }
                    Err(e) => Err(BridgeError::Io(format!(
                        "Failed to move file into place {}: {}",
                        path.display(),
                        e
                    ))),
                }
            }
            Err(e) => {
                remove_part(&part);
                warn!("Failed to write {}: {}", path.display(), e);
                Err(write_error(&path, e))
            }
        }
    }

    fn write_payload(&self, path: &Path, base64: &str) -> io::Result<u64> {
        let file = OpenOptions::new().write(true).create_new(true).open(path)?;
        let mut out = BufWriter::with_capacity(self.chunk_size, file);

        let encoded = strip_whitespace(base64);
        let mut decoder = DecoderReader::new(&encoded[..], &PAYLOAD_ENGINE);
        let mut buffer = vec![0u8; self.chunk_size];
        let mut written = 0u64;

        loop {
            let read = decoder.read(&mut buffer)?;
            if read == 0 {
                break;
            }
            out.write_all(&buffer[..read])?;
            written += read as u64;
        }

        let file = out.into_inner().map_err(|e| e.into_error())?;
        file.sync_all()?;

        Ok(written)
    }
}

/// Reject names that would leave the flat namespace
pub fn validate_filename(filename: &str) -> BridgeResult<()> {
    let invalid = filename.is_empty()
        || filename == "."
        || filename == ".."
        || filename.contains(|c: char| c == '/' || c == '\\' || c == '\0');

    if invalid {
        return Err(BridgeError::InvalidFilename(filename.to_string()));
    }
    Ok(())
}

fn part_path(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!(".{}.{}.part", name, uuid::Uuid::new_v4().simple()))
}

fn remove_part(part: &Path) {
    if let Err(e) = fs::remove_file(part) {
        if e.kind() != io::ErrorKind::NotFound {
            warn!("Failed to remove partial file {}: {}", part.display(), e);
        }
    }
}

fn write_error(path: &Path, err: io::Error) -> BridgeError {
    if err.kind() == io::ErrorKind::InvalidData {
        BridgeError::Io(format!("Invalid base64 payload for {}: {}", path.display(), err))
    } else {
        BridgeError::Io(format!("Failed to write {}: {}", path.display(), err))
    }
}

fn strip_whitespace(payload: &str) -> Cow<'_, [u8]> {
    if payload.bytes().any(|b| b.is_ascii_whitespace()) {
        Cow::Owned(
            payload
                .bytes()
                .filter(|b| !b.is_ascii_whitespace())
                .collect(),
        )
    } else {
        Cow::Borrowed(payload.as_bytes())
    }
}
