//! Orientation correction.
//!
//! Only the three pure rotations are corrected; mirrored orientations are left
//! as stored. After this step the orientation metadata is always stripped, so
//! a viewer will not apply the same correction a second time.

use super::codec::{Codec, CodecError, Orientation, Raster, Rotation};
use tracing::debug;

/// Clockwise rotation that brings stored pixels upright, if one is needed.
pub fn corrective_rotation(orientation: Orientation) -> Option<Rotation> {
    match orientation {
        Orientation::BottomRight => Some(Rotation::Half),
        Orientation::RightTop => Some(Rotation::Quarter),
        Orientation::LeftBottom => Some(Rotation::ThreeQuarter),
        _ => None,
    }
}

/// Rotate `image` upright and strip its orientation metadata.
///
/// Consumes the image; on rotation failure it has already been released.
pub fn normalize<C: Codec>(codec: &C, image: C::Image) -> Result<C::Image, CodecError> {
    let image = match corrective_rotation(image.orientation()) {
        Some(rotation) => {
            debug!(
                orientation = ?image.orientation(),
                degrees = rotation.degrees(),
                "Correcting orientation"
            );
            codec.rotate(image, rotation)?
        }
        None => image,
    };
    Ok(codec.strip_metadata(image))
}
