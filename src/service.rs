//! The image service: collections + disk store + pipeline.
//!
//! Each request names a collection and an image. The service resolves the
//! rendition and original paths, serves a stored rendition when one exists,
//! and otherwise runs the pipeline over the original and stores the result.

use crate::collection::{Collection, CollectionError, Collections};
use crate::config::ServiceConfig;
use crate::imaging::{
    AxisPreference, CapError, CapRequest, Codec, FitRequest, cap_image, resize_image,
};
use crate::store::{DiskImage, Fetched, StoreError};
use std::path::PathBuf;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Unknown collection: {0}")]
    UnknownCollection(String),
    #[error("Requested {width}x{height} exceeds the {max_width}x{max_height} limit")]
    TooLarge {
        width: u32,
        height: u32,
        max_width: u32,
        max_height: u32,
    },
    #[error(transparent)]
    Collection(#[from] CollectionError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("Failed to resize {0}")]
    ResizeFailed(String),
    #[error("Failed to cap {name}: {error}")]
    Cap { name: String, error: CapError },
}

/// Outcome of one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rendered {
    pub path: PathBuf,
    pub bytes: Vec<u8>,
    /// True when served from the store without running the pipeline.
    pub cached: bool,
}

pub struct ImageService<C: Codec> {
    codec: C,
    config: ServiceConfig,
    collections: Collections,
}

impl<C: Codec> ImageService<C> {
    pub fn new(codec: C, config: ServiceConfig, collections: Collections) -> Self {
        Self {
            codec,
            config,
            collections,
        }
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    fn collection(&self, name: &str) -> Result<&Collection, ServiceError> {
        self.collections
            .get(name)
            .ok_or_else(|| ServiceError::UnknownCollection(name.to_string()))
    }

    fn disk_image(&self, rendition: PathBuf, original: PathBuf) -> DiskImage {
        DiskImage::new(self.config.root.join(rendition), self.config.root.join(original))
    }

    /// Store freshly rendered bytes; a failed write is logged, not fatal.
    fn keep(&self, file: &DiskImage, bytes: &[u8]) {
        if let Err(e) = file.write(bytes) {
            warn!(error = %e, "Could not store rendition");
        }
    }

    /// Fit-and-crop `name` to exactly `width × height`.
    pub fn resize(
        &self,
        collection: &str,
        name: &str,
        width: u32,
        height: u32,
        force: bool,
    ) -> Result<Rendered, ServiceError> {
        let (max_width, max_height) = (self.config.max_width, self.config.max_height);
        if (max_width != 0 && width > max_width) || (max_height != 0 && height > max_height) {
            return Err(ServiceError::TooLarge {
                width,
                height,
                max_width,
                max_height,
            });
        }

        let c = self.collection(collection)?;
        let file = self.disk_image(c.resized_path(name, width, height)?, c.original_path(name)?);

        let original = match file.read(force)? {
            Fetched::Cached(bytes) => return Ok(cached(file, bytes)),
            Fetched::Original(bytes) => bytes,
        };

        info!(collection, name, width, height, "Resizing");
        let request = FitRequest {
            filter: self.config.encoding.filter,
            blur: self.config.encoding.blur,
            ..FitRequest::new(width, height)
        };
        let bytes = resize_image(&self.codec, &self.config.pipeline(), &original, &request)
            .ok_or_else(|| ServiceError::ResizeFailed(name.to_string()))?;

        self.keep(&file, &bytes);
        Ok(Rendered {
            path: file.rendition,
            bytes,
            cached: false,
        })
    }

    /// Cap `name` so its dominant axis equals `cap`.
    pub fn cap(
        &self,
        collection: &str,
        name: &str,
        cap: u32,
        axis: AxisPreference,
        force: bool,
    ) -> Result<Rendered, ServiceError> {
        let c = self.collection(collection)?;
        let file = self.disk_image(c.capped_path(name, cap, axis)?, c.original_path(name)?);

        let original = match file.read(force)? {
            Fetched::Cached(bytes) => return Ok(cached(file, bytes)),
            Fetched::Original(bytes) => bytes,
        };

        info!(collection, name, cap, ?axis, "Capping");
        let request = CapRequest {
            filter: self.config.encoding.filter,
            blur: self.config.encoding.blur,
            bounds: self.config.bounds(),
            ..CapRequest::new(cap, axis)
        };
        let bytes = cap_image(&self.codec, &self.config.pipeline(), &original, &request).map_err(
            |error| ServiceError::Cap {
                name: name.to_string(),
                error,
            },
        )?;

        self.keep(&file, &bytes);
        Ok(Rendered {
            path: file.rendition,
            bytes,
            cached: false,
        })
    }

    /// The untouched original.
    pub fn original(&self, collection: &str, name: &str) -> Result<Rendered, ServiceError> {
        let c = self.collection(collection)?;
        let path = c.original_path(name)?;
        let file = self.disk_image(path.clone(), path);
        let bytes = file.read_original()?;
        Ok(Rendered {
            path: file.original,
            bytes,
            cached: true,
        })
    }
}

fn cached(file: DiskImage, bytes: Vec<u8>) -> Rendered {
    Rendered {
        path: file.rendition,
        bytes,
        cached: true,
    }
}
