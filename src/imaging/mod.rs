//! Image processing — orientation, fit-and-crop, cap, re-encode.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Decode / encode** | `image` crate, output keeps the input format |
//! | **Orientation** | EXIF tag → 90/180/270° clockwise rotation, then strip |
//! | **Fit** | [`plan_fit`] → resize → centered crop |
//! | **Cap** | [`plan_cap`] → resize, bounded by `max_width`/`max_height` |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for resize/crop geometry (unit testable)
//! - **Parameters**: Data structures describing a request
//! - **Codec**: [`Codec`] trait + [`RustCodec`]
//! - **Orientation**: the upright-correction step
//! - **Pipeline**: [`resize_image`] and [`cap_image`], combining all of the above

mod calculations;
pub mod codec;
pub mod orientation;
mod params;
pub mod pipeline;
pub mod rust_codec;

pub use calculations::{FitPlan, PlanError, check_pixel_budget, plan_cap, plan_fit};
pub use codec::{Codec, CodecError, Dimensions, Orientation, Raster, Rectangle, Rotation};
pub use params::{AxisPreference, Bounds, CapRequest, EncodingOptions, Filter, FitRequest, Quality};
pub use pipeline::{
    CapError, PipelineConfig, PipelineError, cap_image, resize_image, try_cap_image,
    try_resize_image,
};
pub use rust_codec::{PixelImage, RustCodec};
