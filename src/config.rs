//! Service configuration module.
//!
//! Handles loading, validating, and merging `fitcrop.toml`. Stock defaults are
//! overridden by whatever the user file sets; everything else keeps its
//! default.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! root = "images"                # Base directory for collection path templates
//! collections = "collections.json"
//! max_width = 10000              # Largest rendition width (0 = unlimited)
//! max_height = 10000             # Largest rendition height (0 = unlimited)
//!
//! [encoding]
//! default_quality = 75           # Used when a request asks for quality <= 0
//! filter = "lanczos"             # Resampling kernel name
//! blur = 1.0                     # > 1.0 softens, < 1.0 sharpens
//!
//! [processing]
//! max_processes = 4              # Max parallel renders (omit for auto = CPU cores)
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::imaging::{Bounds, Filter, PipelineConfig, Quality};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Service configuration loaded from `fitcrop.toml`.
///
/// All fields have sensible defaults. User config files need only specify
/// the values they want to override. Unknown keys are rejected.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServiceConfig {
    /// Directory collection path templates are resolved against.
    pub root: PathBuf,
    /// JSON file describing the image collections.
    pub collections: PathBuf,
    /// Largest width a rendition may have; 0 disables the check.
    pub max_width: u32,
    /// Largest height a rendition may have; 0 disables the check.
    pub max_height: u32,
    /// Encoding and resampling defaults.
    pub encoding: EncodingConfig,
    /// Parallel processing settings.
    pub processing: ProcessingConfig,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("images"),
            collections: PathBuf::from("collections.json"),
            max_width: 10_000,
            max_height: 10_000,
            encoding: EncodingConfig::default(),
            processing: ProcessingConfig::default(),
        }
    }
}

impl ServiceConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=100).contains(&self.encoding.default_quality) {
            return Err(ConfigError::Validation(
                "encoding.default_quality must be 1-100".into(),
            ));
        }
        if !self.encoding.blur.is_finite() || self.encoding.blur <= 0.0 {
            return Err(ConfigError::Validation(
                "encoding.blur must be a positive number".into(),
            ));
        }
        if self.processing.max_processes == Some(0) {
            return Err(ConfigError::Validation(
                "processing.max_processes must be at least 1".into(),
            ));
        }
        Ok(())
    }

    pub fn bounds(&self) -> Bounds {
        Bounds::new(self.max_width, self.max_height)
    }

    /// Pipeline settings. The pixel budget is `max_width * max_height`, so no
    /// intermediate resize can outgrow the largest allowed rendition; either
    /// limit being 0 lifts it.
    pub fn pipeline(&self) -> PipelineConfig {
        let max_pixels = if self.max_width == 0 || self.max_height == 0 {
            0
        } else {
            u64::from(self.max_width) * u64::from(self.max_height)
        };
        PipelineConfig {
            default_quality: Quality::new(self.encoding.default_quality),
            max_pixels,
        }
    }
}

/// Encoding and resampling defaults applied to every request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EncodingConfig {
    /// Quality used when a request does not pick one (1 = worst, 100 = best).
    pub default_quality: u32,
    /// Resampling kernel.
    pub filter: Filter,
    /// Blur factor; 1.0 is neutral.
    pub blur: f64,
}

impl Default for EncodingConfig {
    fn default() -> Self {
        Self {
            default_quality: Quality::default().value(),
            filter: Filter::default(),
            blur: 1.0,
        }
    }
}

/// Parallel processing settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of parallel renders.
    /// When absent, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    pub max_processes: Option<usize>,
}

/// Resolve the effective thread count from config.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)` (user can constrain down, not up)
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config.max_processes.map(|n| n.min(cores)).unwrap_or(cores)
}

/// Returns the stock default config as a `toml::Value::Table`.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    toml::Value::try_from(ServiceConfig::default())
        .map_err(|e| ConfigError::Validation(format!("stock defaults: {e}")))
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load config from `path`.
///
/// A missing file yields the stock defaults. Otherwise user values are merged
/// on top of the defaults, unknown keys are rejected, and the result is
/// validated.
pub fn load_config(path: &Path) -> Result<ServiceConfig, ConfigError> {
    let base = stock_defaults_value()?;
    let merged = if path.exists() {
        let content = fs::read_to_string(path)?;
        let overlay: toml::Value = toml::from_str(&content)?;
        merge_toml(base, overlay)
    } else {
        base
    };
    let config: ServiceConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Returns a fully-commented stock `fitcrop.toml`.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# fitcrop configuration
# =====================
# All settings are optional. Values shown below are the defaults.
# Unknown keys will cause an error.

# Directory that collection path templates are resolved against.
root = "images"

# JSON file mapping collection names to path templates:
#   { "products": { "resized": "products/{width}x{height}/{name}",
#                   "capped": "products/cap{cap}/{name}",
#                   "width": "products/width{cap}/{name}",
#                   "height": "products/height{cap}/{name}",
#                   "original": "products/original/{name}" } }
collections = "collections.json"

# Largest rendition allowed, in pixels. 0 disables the check.
max_width = 10000
max_height = 10000

[encoding]
# Quality used when a request does not choose one (1-100).
default_quality = 75

# Resampling kernel: point, box, triangle, hermite, hanning, hamming,
# blackman, gaussian, quadratic, cubic, catrom, mitchell, lanczos,
# bessel, sinc.
filter = "lanczos"

# Blur factor. 1.0 is neutral, > 1.0 softens, < 1.0 sharpens.
blur = 1.0

[processing]
# Maximum number of images rendered in parallel.
# Omit to use all CPU cores. Values above the core count are clamped.
# max_processes = 4
"##
}
