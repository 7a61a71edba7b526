//! Reading and persisting target documents.
//!
//! Reads decode the whole file as UTF-8. Writes are atomic: a tempfile in the
//! same directory is written, fsynced and renamed over the target, so readers
//! see either the old contents or the new ones. Before the rename the target
//! is re-read and compared against the fingerprint taken at read time; if
//! another writer got in between, nothing is written.

use serde::Serialize;
use std::fmt;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};
use xxhash_rust::xxh3::xxh3_64;

/// xxh3 hash of a document's bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Fingerprint(pub u64);

impl Fingerprint {
    pub fn of(text: &str) -> Self {
        Self::of_bytes(text.as_bytes())
    }

    pub fn of_bytes(bytes: &[u8]) -> Self {
        Fingerprint(xxh3_64(bytes))
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("cannot read source {path}: {source}")]
    SourceUnavailable {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("cannot write destination {path}: {source}")]
    DestinationUnwritable {
        path: PathBuf,
        source: std::io::Error,
    },

    /// `found` is `None` when the file was removed after it was read.
    #[error(
        "{path} changed on disk since it was read (expected {expected}, found {})",
        .found.map_or_else(|| "no file".to_string(), |f| f.to_string())
    )]
    ConcurrentModification {
        path: PathBuf,
        expected: Fingerprint,
        found: Option<Fingerprint>,
    },
}

/// A document loaded from disk, with the fingerprint it had at read time.
#[derive(Debug, Clone)]
pub struct SourceDocument {
    pub path: PathBuf,
    pub text: String,
    pub fingerprint: Fingerprint,
}

pub fn read_document(path: impl AsRef<Path>) -> Result<SourceDocument, StoreError> {
    let path = path.as_ref();
    // read_to_string reports invalid UTF-8 as ErrorKind::InvalidData
    let text = fs::read_to_string(path).map_err(|source| StoreError::SourceUnavailable {
        path: path.to_path_buf(),
        source,
    })?;
    let fingerprint = Fingerprint::of(&text);
    debug!(path = %path.display(), bytes = text.len(), %fingerprint, "read document");

    Ok(SourceDocument {
        path: path.to_path_buf(),
        text,
        fingerprint,
    })
}

/// Replace the contents of `path` with `text`.
///
/// When `expected` is given, the write only goes ahead if the file on disk
/// still hashes to it.
pub fn write_document(
    path: impl AsRef<Path>,
    text: &str,
    expected: Option<Fingerprint>,
) -> Result<(), StoreError> {
    let path = path.as_ref();
    let unwritable = |source: std::io::Error| StoreError::DestinationUnwritable {
        path: path.to_path_buf(),
        source,
    };

    if let Some(expected) = expected {
        // Raw bytes: a rewrite to invalid UTF-8 is still a modification
        let found = match fs::read(path) {
            Ok(bytes) => Some(Fingerprint::of_bytes(&bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => None,
            Err(e) => return Err(unwritable(e)),
        };
        if found != Some(expected) {
            return Err(StoreError::ConcurrentModification {
                path: path.to_path_buf(),
                expected,
                found,
            });
        }
    }

    atomic_write(path, text.as_bytes()).map_err(unwritable)?;

    // Bump mtime so watchers and incremental builds notice the change.
    // The contents are already in place, so a failure here is not a write failure.
    if let Err(e) = filetime::set_file_mtime(path, filetime::FileTime::now()) {
        warn!(path = %path.display(), error = %e, "could not update mtime");
    }

    info!(path = %path.display(), bytes = text.len(), "wrote document");
    Ok(())
}

/// Atomic file write: tempfile + fsync + rename.
fn atomic_write(path: &Path, content: &[u8]) -> std::io::Result<()> {
    // Same directory keeps the rename on one filesystem
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        Some(_) => Path::new("."),
        None => {
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "path has no parent directory",
            ))
        }
    };

    let mut temp = tempfile::NamedTempFile::new_in(parent)?;
    temp.write_all(content)?;

    // tempfiles are created 0600; keep the target's mode
    if let Ok(meta) = fs::metadata(path) {
        temp.as_file().set_permissions(meta.permissions())?;
    }

    temp.as_file().sync_all()?;
    temp.persist(path).map_err(|e| e.error)?;

    Ok(())
}
