//! Blob persistence backends for the Shelf catalog.
//!
//! The catalog treats its durable copy as a single opaque blob: it is read once
//! at startup and rewritten in full after every mutation. This crate provides
//! the [`BlobStore`] seam plus a file-backed and an in-memory implementation.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use thiserror::Error;

/// Errors raised by blob backends.
#[derive(Error, Debug)]
pub enum BlobError {
    #[error("blob '{location}' does not exist")]
    Missing { location: String },

    #[error("i/o failure on blob '{location}': {source}")]
    Io {
        location: String,
        #[source]
        source: io::Error,
    },
}

/// Durable home of the catalog document.
pub trait BlobStore: Send + Sync {
    /// Read the whole blob.
    fn load(&self) -> Result<Vec<u8>, BlobError>;

    /// Replace the whole blob with `bytes`.
    fn save(&self, bytes: &[u8]) -> Result<(), BlobError>;

    /// Human-readable location used in logs and error messages.
    fn describe(&self) -> String;
}

/// Blob stored as a single file on the local filesystem.
#[derive(Debug, Clone)]
pub struct FileBlobStore {
    path: PathBuf,
}

impl FileBlobStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    fn io_error(&self, source: io::Error) -> BlobError {
        BlobError::Io {
            location: self.describe(),
            source,
        }
    }
}

impl BlobStore for FileBlobStore {
    fn load(&self) -> Result<Vec<u8>, BlobError> {
        match fs::read(&self.path) {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Err(BlobError::Missing {
                location: self.describe(),
            }),
            Err(e) => Err(self.io_error(e)),
        }
    }

    /// Write-to-temp, fsync, rename. Readers never observe a half-written file.
    fn save(&self, bytes: &[u8]) -> Result<(), BlobError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| self.io_error(e))?;
            }
        }

        let temp_path = self.temp_path();
        let written = write_synced(&temp_path, bytes)
            .and_then(|()| fs::rename(&temp_path, &self.path));
        if let Err(e) = written {
            // the old blob is intact; drop the partial sibling
            let _ = fs::remove_file(&temp_path);
            return Err(self.io_error(e));
        }

        if let Some(parent) = self.path.parent() {
            if let Ok(dir) = File::open(parent) {
                let _ = dir.sync_all();
            }
        }

        tracing::debug!(
            target: "shelf-db",
            path = %self.path.display(),
            bytes = bytes.len(),
            "blob saved"
        );
        Ok(())
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

fn write_synced(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let mut file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(path)?;
    file.write_all(bytes)?;
    file.sync_all()
}

/// Blob held in process memory. `None` models a blob that was never written.
#[derive(Debug, Default)]
pub struct MemoryBlobStore {
    bytes: Mutex<Option<Vec<u8>>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            bytes: Mutex::new(Some(bytes.into())),
        }
    }

    /// Current contents, if any.
    pub fn contents(&self) -> Option<Vec<u8>> {
        self.bytes.lock().clone()
    }
}

impl BlobStore for MemoryBlobStore {
    fn load(&self) -> Result<Vec<u8>, BlobError> {
        self.bytes.lock().clone().ok_or_else(|| BlobError::Missing {
            location: self.describe(),
        })
    }

    fn save(&self, bytes: &[u8]) -> Result<(), BlobError> {
        *self.bytes.lock() = Some(bytes.to_vec());
        Ok(())
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}
