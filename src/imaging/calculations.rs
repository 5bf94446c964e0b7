//! Pure calculation functions for resize and crop geometry.
//!
//! All functions here are pure and testable without any I/O or images. The
//! arithmetic is integer-only with floor division so identical inputs always
//! produce identical pixel geometry. Products are widened to `u64` before
//! dividing, so large targets cannot wrap.

use super::codec::{Dimensions, Rectangle};
use super::params::{AxisPreference, Bounds};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PlanError {
    #[error("Source image has zero width or height ({width}x{height})")]
    InvalidSourceDimensions { width: u32, height: u32 },
    #[error("Target size must be positive ({width}x{height})")]
    InvalidTarget { width: u32, height: u32 },
    #[error("Planned size does not fit in 32 bits")]
    Overflow,
    #[error("Capped size {width}x{height} exceeds bound {max_width}x{max_height}")]
    TooLarge {
        width: u32,
        height: u32,
        max_width: u32,
        max_height: u32,
    },
    #[error("Planned size {width}x{height} exceeds the {max_pixels} pixel budget")]
    OverBudget {
        width: u32,
        height: u32,
        max_pixels: u64,
    },
}

/// Resize-then-crop plan produced by [`plan_fit`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FitPlan {
    /// Intermediate size that covers the target box without distortion.
    pub resize: Dimensions,
    /// Centered crop taking the resized image down to the target box.
    pub crop: Rectangle,
}

impl FitPlan {
    /// False when the resize already hits the target exactly.
    pub fn needs_crop(&self) -> bool {
        self.resize.width != self.crop.width || self.resize.height != self.crop.height
    }
}

fn scale(value: u32, numerator: u32, denominator: u32) -> Result<u32, PlanError> {
    let scaled = u64::from(value) * u64::from(numerator) / u64::from(denominator);
    u32::try_from(scaled).map_err(|_| PlanError::Overflow)
}

fn check_source(source: Dimensions) -> Result<(), PlanError> {
    if source.is_empty() {
        return Err(PlanError::InvalidSourceDimensions {
            width: source.width,
            height: source.height,
        });
    }
    Ok(())
}

/// Reject a planned size whose pixel count exceeds `max_pixels` (`0` means
/// unlimited). Run on every size before it reaches the codec.
pub fn check_pixel_budget(size: Dimensions, max_pixels: u64) -> Result<(), PlanError> {
    let pixels = u64::from(size.width) * u64::from(size.height);
    if max_pixels != 0 && pixels > max_pixels {
        return Err(PlanError::OverBudget {
            width: size.width,
            height: size.height,
            max_pixels,
        });
    }
    Ok(())
}

/// Plan a fit-and-crop: resize so one axis matches the target exactly and the
/// other meets or exceeds it, then center-crop the overflow.
///
/// # Examples
/// ```
/// # use fitcrop::imaging::{Dimensions, Rectangle, plan_fit};
/// let plan = plan_fit(Dimensions::new(400, 300), Dimensions::new(100, 100)).unwrap();
/// assert_eq!(plan.resize, Dimensions::new(133, 100));
/// assert_eq!(plan.crop, Rectangle { x: 16, y: 0, width: 100, height: 100 });
/// ```
pub fn plan_fit(source: Dimensions, target: Dimensions) -> Result<FitPlan, PlanError> {
    check_source(source)?;
    if target.is_empty() {
        return Err(PlanError::InvalidTarget {
            width: target.width,
            height: target.height,
        });
    }

    let (src_w, src_h) = (source.width, source.height);
    let (tgt_w, tgt_h) = (target.width, target.height);

    let resize = if u64::from(tgt_w) * u64::from(src_h) < u64::from(tgt_h) * u64::from(src_w) {
        // Source is wider than the box: height matches, width overflows
        Dimensions::new(scale(tgt_h, src_w, src_h)?, tgt_h)
    } else {
        // Source is taller (or same aspect): width matches, height overflows
        Dimensions::new(tgt_w, scale(tgt_w, src_h, src_w)?)
    };

    let crop_x = resize.width - tgt_w;
    let crop_y = resize.height - tgt_h;

    Ok(FitPlan {
        resize,
        crop: Rectangle {
            x: crop_x / 2,
            y: crop_y / 2,
            width: tgt_w,
            height: tgt_h,
        },
    })
}

/// Plan a cap: bound the dominant axis to `cap`, scale the other to preserve
/// the aspect ratio, and reject results larger than `bounds`.
///
/// The dominant axis is height when `axis` is [`AxisPreference::Height`], or
/// when it is [`AxisPreference::Auto`] and the source is taller than wide;
/// width otherwise.
pub fn plan_cap(
    source: Dimensions,
    cap: u32,
    axis: AxisPreference,
    bounds: Bounds,
) -> Result<Dimensions, PlanError> {
    check_source(source)?;

    let cap_height = match axis {
        AxisPreference::Height => true,
        AxisPreference::Width => false,
        AxisPreference::Auto => source.width < source.height,
    };

    let size = if cap_height {
        Dimensions::new(scale(cap, source.width, source.height)?, cap)
    } else {
        Dimensions::new(cap, scale(cap, source.height, source.width)?)
    };

    let too_wide = bounds.max_width != 0 && size.width > bounds.max_width;
    let too_tall = bounds.max_height != 0 && size.height > bounds.max_height;
    if too_wide || too_tall {
        return Err(PlanError::TooLarge {
            width: size.width,
            height: size.height,
            max_width: bounds.max_width,
            max_height: bounds.max_height,
        });
    }

    Ok(size)
}
