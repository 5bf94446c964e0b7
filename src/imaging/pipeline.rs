//! The two pipeline entry points: [`resize_image`] and [`cap_image`].
//!
//! Both run the same prologue, `decode → normalize orientation → plan`, then
//! diverge:
//!
//! ```text
//! resize_image:  … → resize → [crop] → encode
//! cap_image:     … → resize → encode
//! ```
//!
//! Exactly one decoded image is owned at any time. Each codec transform
//! consumes the current image and returns its replacement, so the
//! predecessor is released as soon as the step returns, and an early `?`
//! releases whatever is current. No cleanup code is written by hand.
//!
//! The first failure wins; nothing partial is ever returned. `resize_image`
//! reports only success or failure (`None`), while `cap_image` returns a
//! specific [`CapError`].

use super::calculations::{PlanError, check_pixel_budget, plan_cap, plan_fit};
use super::codec::{Codec, CodecError, Dimensions, Raster};
use super::orientation::normalize;
use super::params::{CapRequest, EncodingOptions, Filter, FitRequest, Quality};
use thiserror::Error;
use tracing::{debug, instrument, warn};

/// Pipeline-wide settings that would otherwise be process globals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineConfig {
    /// Quality used when a request asks for `<= 0`.
    pub default_quality: Quality,
    /// Largest pixel count any resize may produce; `0` means unlimited.
    pub max_pixels: u64,
}

/// 10000 x 10000, matching the default size limits.
pub const DEFAULT_MAX_PIXELS: u64 = 10_000 * 10_000;

impl PipelineConfig {
    /// Take the default encoding quality from the codec.
    pub fn for_codec(codec: &impl Codec) -> Self {
        Self {
            default_quality: codec.default_image_info().quality,
            max_pixels: DEFAULT_MAX_PIXELS,
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            default_quality: Quality::default(),
            max_pixels: DEFAULT_MAX_PIXELS,
        }
    }
}

/// Every way a pipeline run can fail, in the order the steps run.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("No input image supplied")]
    InputMissing,
    #[error("Could not decode image: {0}")]
    Decode(#[source] CodecError),
    #[error("Orientation correction failed: {0}")]
    Rotate(#[source] CodecError),
    #[error(transparent)]
    Plan(#[from] PlanError),
    #[error("Resize failed: {0}")]
    Resize(#[source] CodecError),
    #[error("Crop failed: {0}")]
    Crop(#[source] CodecError),
    #[error("Encode failed: {0}")]
    Encode(#[source] CodecError),
}

/// Failure reported by [`cap_image`].
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CapError {
    #[error("no image data")]
    UnexpectedNull,
    #[error("bad image")]
    BadImage,
    #[error("resize failed")]
    ResizeFail,
    #[error("capped image would be too large")]
    TooLarge,
}

impl CapError {
    /// Numeric code for hosts that speak the classic error enumeration
    /// (`0` is success and never produced here).
    pub fn code(self) -> i32 {
        match self {
            CapError::UnexpectedNull => 1,
            CapError::BadImage => 2,
            CapError::ResizeFail => 3,
            CapError::TooLarge => 4,
        }
    }
}

impl From<PipelineError> for CapError {
    fn from(err: PipelineError) -> Self {
        match err {
            PipelineError::InputMissing => CapError::UnexpectedNull,
            PipelineError::Decode(_) => CapError::BadImage,
            PipelineError::Plan(PlanError::InvalidSourceDimensions { .. }) => CapError::BadImage,
            PipelineError::Plan(PlanError::TooLarge { .. } | PlanError::OverBudget { .. }) => {
                CapError::TooLarge
            }
            PipelineError::Plan(_)
            | PipelineError::Rotate(_)
            | PipelineError::Resize(_)
            | PipelineError::Crop(_)
            | PipelineError::Encode(_) => CapError::ResizeFail,
        }
    }
}

/// Decode and orientation-correct; the shared prologue.
fn decode_upright<C: Codec>(codec: &C, blob: &[u8]) -> Result<C::Image, PipelineError> {
    if blob.is_empty() {
        return Err(PipelineError::InputMissing);
    }
    let image = codec.decode(blob).map_err(PipelineError::Decode)?;
    debug!(
        width = image.columns(),
        height = image.rows(),
        orientation = ?image.orientation(),
        "Decoded"
    );
    normalize(codec, image).map_err(PipelineError::Rotate)
}

fn resize_to<C: Codec>(
    codec: &C,
    image: C::Image,
    size: Dimensions,
    filter: Filter,
    blur: f64,
) -> Result<C::Image, PipelineError> {
    if size.is_empty() {
        return Err(PipelineError::Resize(CodecError::Transform(format!(
            "cannot resize to {}x{}",
            size.width, size.height
        ))));
    }
    codec
        .resize(image, size, filter, blur)
        .map_err(PipelineError::Resize)
}

/// Fit-and-crop with the specific failure reason.
pub fn try_resize_image<C: Codec>(
    codec: &C,
    config: &PipelineConfig,
    blob: &[u8],
    request: &FitRequest,
) -> Result<Vec<u8>, PipelineError> {
    let image = decode_upright(codec, blob)?;

    let plan = plan_fit(
        image.dimensions(),
        Dimensions::new(request.width, request.height),
    )?;
    debug!(?plan, "Planned fit");
    check_pixel_budget(plan.resize, config.max_pixels)?;

    let image = resize_to(codec, image, plan.resize, request.filter, request.blur)?;
    let image = if plan.needs_crop() {
        codec.crop(image, plan.crop).map_err(PipelineError::Crop)?
    } else {
        image
    };

    let options = EncodingOptions {
        quality: Quality::or_default(request.quality, config.default_quality),
    };
    codec.encode(&image, &options).map_err(PipelineError::Encode)
}

/// Resize `blob` to cover exactly `request.width × request.height`, cropping
/// the overflow centered, and re-encode.
///
/// Returns `None` on any failure; the reason is logged and dropped.
#[instrument(skip_all, fields(width = request.width, height = request.height, len = blob.len()))]
pub fn resize_image<C: Codec>(
    codec: &C,
    config: &PipelineConfig,
    blob: &[u8],
    request: &FitRequest,
) -> Option<Vec<u8>> {
    match try_resize_image(codec, config, blob, request) {
        Ok(out) => {
            debug!(out_len = out.len(), "Resized");
            Some(out)
        }
        Err(err) => {
            warn!(error = %err, "resize_image failed");
            None
        }
    }
}

/// Cap with the specific failure reason.
pub fn try_cap_image<C: Codec>(
    codec: &C,
    config: &PipelineConfig,
    blob: &[u8],
    request: &CapRequest,
) -> Result<Vec<u8>, PipelineError> {
    let image = decode_upright(codec, blob)?;

    let size = plan_cap(image.dimensions(), request.cap, request.axis, request.bounds)?;
    debug!(width = size.width, height = size.height, "Planned cap");
    check_pixel_budget(size, config.max_pixels)?;

    let image = resize_to(codec, image, size, request.filter, request.blur)?;

    let options = EncodingOptions {
        quality: Quality::or_default(request.quality, config.default_quality),
    };
    codec.encode(&image, &options).map_err(PipelineError::Encode)
}

/// Resize `blob` so its dominant axis equals `request.cap`, keeping the aspect
/// ratio, and re-encode. Fails with [`CapError::TooLarge`] before any resize
/// when the result would exceed `request.bounds`.
#[instrument(skip_all, fields(cap = request.cap, axis = ?request.axis, len = blob.len()))]
pub fn cap_image<C: Codec>(
    codec: &C,
    config: &PipelineConfig,
    blob: &[u8],
    request: &CapRequest,
) -> Result<Vec<u8>, CapError> {
    try_cap_image(codec, config, blob, request).map_err(|err| {
        warn!(error = %err, "cap_image failed");
        CapError::from(err)
    })
}
