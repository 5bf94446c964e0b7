//! Disk store for originals and rendered variants.
//!
//! A rendition is served from its own path when it already exists. On a miss
//! the original is read instead and flagged so the caller knows a transform
//! is needed. Rendered bytes are written back so the next request is a hit.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Original not found: {0}")]
    OriginalNotFound(PathBuf),
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

fn io_error(path: &Path) -> impl FnOnce(io::Error) -> StoreError + '_ {
    move |source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// Bytes fetched from the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fetched {
    /// The rendition already exists; serve as-is.
    Cached(Vec<u8>),
    /// Only the original exists; it must be transformed.
    Original(Vec<u8>),
}

/// A rendition path paired with the original it is derived from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiskImage {
    pub rendition: PathBuf,
    pub original: PathBuf,
}

impl DiskImage {
    pub fn new(rendition: PathBuf, original: PathBuf) -> Self {
        Self {
            rendition,
            original,
        }
    }

    /// Fetch the rendition, falling back to the original. `force` skips the
    /// rendition lookup entirely.
    pub fn read(&self, force: bool) -> Result<Fetched, StoreError> {
        if !force {
            match fs::read(&self.rendition) {
                Ok(bytes) => {
                    debug!(path = %self.rendition.display(), "Found rendition");
                    return Ok(Fetched::Cached(bytes));
                }
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => return Err(io_error(&self.rendition)(e)),
            }
        }
        self.read_original().map(Fetched::Original)
    }

    pub fn read_original(&self) -> Result<Vec<u8>, StoreError> {
        match fs::read(&self.original) {
            Ok(bytes) => {
                debug!(path = %self.original.display(), "Found original");
                Ok(bytes)
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                Err(StoreError::OriginalNotFound(self.original.clone()))
            }
            Err(e) => Err(io_error(&self.original)(e)),
        }
    }

    /// Persist rendered bytes at the rendition path, creating directories.
    pub fn write(&self, bytes: &[u8]) -> Result<(), StoreError> {
        if let Some(parent) = self.rendition.parent() {
            fs::create_dir_all(parent).map_err(io_error(parent))?;
        }
        fs::write(&self.rendition, bytes).map_err(io_error(&self.rendition))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn setup() -> (TempDir, DiskImage) {
        let tmp = TempDir::new().unwrap();
        let image = DiskImage::new(
            tmp.path().join("100x100/a.jpg"),
            tmp.path().join("original/a.jpg"),
        );
        (tmp, image)
    }

    #[test]
    fn miss_falls_back_to_original() {
        let (_tmp, image) = setup();
        fs::create_dir_all(image.original.parent().unwrap()).unwrap();
        fs::write(&image.original, b"orig").unwrap();

        assert_eq!(image.read(false).unwrap(), Fetched::Original(b"orig".to_vec()));
    }

    #[test]
    fn write_then_read_hits_cache() {
        let (_tmp, image) = setup();
        fs::create_dir_all(image.original.parent().unwrap()).unwrap();
        fs::write(&image.original, b"orig").unwrap();

        image.write(b"rendered").unwrap();
        assert_eq!(image.read(false).unwrap(), Fetched::Cached(b"rendered".to_vec()));
    }

    #[test]
    fn force_ignores_existing_rendition() {
        let (_tmp, image) = setup();
        fs::create_dir_all(image.original.parent().unwrap()).unwrap();
        fs::write(&image.original, b"orig").unwrap();
        image.write(b"rendered").unwrap();

        assert_eq!(image.read(true).unwrap(), Fetched::Original(b"orig".to_vec()));
    }

    #[test]
    fn missing_original_is_reported() {
        let (_tmp, image) = setup();
        assert!(matches!(image.read(false), Err(StoreError::OriginalNotFound(_))));
    }
}
