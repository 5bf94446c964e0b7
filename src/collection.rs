//! Image collections: named sets of path templates.
//!
//! A collection file is JSON mapping each collection name to the templates
//! used to locate its originals and renditions:
//!
//! ```json
//! {
//!   "products": {
//!     "resized":  "products/{width}x{height}/{name}",
//!     "capped":   "products/cap{cap}/{name}",
//!     "width":    "products/width{cap}/{name}",
//!     "height":   "products/height{cap}/{name}",
//!     "original": "products/original/{name}"
//!   }
//! }
//! ```
//!
//! Placeholders are `{width}`, `{height}`, `{cap}` and `{name}`. All five
//! templates are required.

use crate::imaging::AxisPreference;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CollectionError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Collection '{name}' is missing the '{field}' template")]
    Incomplete { name: String, field: &'static str },
    #[error("Image name '{0}' is not a plain file name")]
    InvalidName(String),
}

/// Path templates for one collection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Collection {
    pub resized: String,
    pub capped: String,
    pub width: String,
    pub height: String,
    pub original: String,
}

/// All collections, keyed by name.
pub type Collections = BTreeMap<String, Collection>;

/// Reject names that could escape the collection directory.
fn check_name(name: &str) -> Result<(), CollectionError> {
    let plain = !name.is_empty()
        && !name.contains(['/', '\\'])
        && name != "."
        && name != "..";
    if plain {
        Ok(())
    } else {
        Err(CollectionError::InvalidName(name.to_string()))
    }
}

impl Collection {
    fn validate(&self, name: &str) -> Result<(), CollectionError> {
        let fields = [
            ("resized", &self.resized),
            ("capped", &self.capped),
            ("width", &self.width),
            ("height", &self.height),
            ("original", &self.original),
        ];
        for (field, template) in fields {
            if template.trim().is_empty() {
                return Err(CollectionError::Incomplete {
                    name: name.to_string(),
                    field,
                });
            }
        }
        Ok(())
    }

    /// Path of the `width × height` fit rendition.
    pub fn resized_path(&self, name: &str, width: u32, height: u32) -> Result<PathBuf, CollectionError> {
        check_name(name)?;
        Ok(PathBuf::from(
            self.resized
                .replace("{width}", &width.to_string())
                .replace("{height}", &height.to_string())
                .replace("{name}", name),
        ))
    }

    /// Path of a capped rendition; the axis picks the template.
    pub fn capped_path(
        &self,
        name: &str,
        cap: u32,
        axis: AxisPreference,
    ) -> Result<PathBuf, CollectionError> {
        check_name(name)?;
        let template = match axis {
            AxisPreference::Auto => &self.capped,
            AxisPreference::Width => &self.width,
            AxisPreference::Height => &self.height,
        };
        Ok(PathBuf::from(
            template
                .replace("{cap}", &cap.to_string())
                .replace("{name}", name),
        ))
    }

    pub fn original_path(&self, name: &str) -> Result<PathBuf, CollectionError> {
        check_name(name)?;
        Ok(PathBuf::from(self.original.replace("{name}", name)))
    }
}

/// Parse and validate a collection file's contents.
pub fn parse_collections(json: &str) -> Result<Collections, CollectionError> {
    let collections: Collections = serde_json::from_str(json)?;
    for (name, collection) in &collections {
        collection.validate(name)?;
    }
    Ok(collections)
}

/// Read and validate the collection file at `path`.
pub fn load_collections(path: &Path) -> Result<Collections, CollectionError> {
    let json = fs::read_to_string(path).map_err(|source| CollectionError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_collections(&json)
}
