//! Pure Rust codec built on the `image` crate.
//!
//! Everything is statically linked into the binary.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Decode (JPEG, PNG, TIFF, WebP) | `image::ImageReader` with format sniffing |
//! | Orientation tag | `image::ImageDecoder::orientation` (EXIF 0x0112) |
//! | Resize | `image::DynamicImage::resize_exact` |
//! | Blur factor | `image::imageops::blur` (> 1.0) / `unsharpen` (< 1.0) |
//! | Crop | `image::DynamicImage::crop_imm` |
//! | Rotate | `rotate90` / `rotate180` / `rotate270` |
//! | Encode | same format as decoded; JPEG honours quality |

use super::codec::{Codec, CodecError, Dimensions, Orientation, Raster, Rectangle, Rotation};
use super::params::{EncodingOptions, Filter};
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, ImageDecoder, ImageFormat, ImageReader};
use std::io::Cursor;

/// Decoded image plus what the pipeline needs to know about its origin.
#[derive(Debug, Clone)]
pub struct PixelImage {
    pub pixels: DynamicImage,
    /// Format the blob was decoded from; output is encoded the same way.
    pub format: ImageFormat,
    pub orientation: Orientation,
}

impl Raster for PixelImage {
    fn columns(&self) -> u32 {
        self.pixels.width()
    }

    fn rows(&self) -> u32 {
        self.pixels.height()
    }

    fn orientation(&self) -> Orientation {
        self.orientation
    }
}

impl PixelImage {
    fn replace(self, pixels: DynamicImage) -> Self {
        Self { pixels, ..self }
    }
}

/// Pure Rust codec using the `image` crate ecosystem.
///
/// See the [module docs](self) for the crate-to-operation mapping.
pub struct RustCodec;

impl RustCodec {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RustCodec {
    fn default() -> Self {
        Self::new()
    }
}

fn filter_type(filter: Filter) -> FilterType {
    match filter {
        Filter::Point | Filter::Box => FilterType::Nearest,
        Filter::Triangle | Filter::Hermite => FilterType::Triangle,
        Filter::Hanning
        | Filter::Hamming
        | Filter::Blackman
        | Filter::Gaussian
        | Filter::Quadratic => FilterType::Gaussian,
        Filter::Cubic | Filter::Catrom | Filter::Mitchell => FilterType::CatmullRom,
        Filter::Undefined | Filter::Lanczos | Filter::Bessel | Filter::Sinc => {
            FilterType::Lanczos3
        }
    }
}

/// Apply the blur factor: 1.0 leaves the resampled image alone, larger values
/// soften it, smaller values sharpen it.
fn apply_blur(pixels: DynamicImage, blur: f64) -> DynamicImage {
    let delta = (blur - 1.0) as f32;
    if !delta.is_finite() || delta.abs() < f32::EPSILON {
        pixels
    } else if delta > 0.0 {
        pixels.blur(delta)
    } else {
        pixels.unsharpen(-delta, 0)
    }
}

/// JPEG has no alpha channel and only 8-bit samples.
fn jpeg_compatible(pixels: &DynamicImage) -> DynamicImage {
    match pixels {
        DynamicImage::ImageLuma8(_) | DynamicImage::ImageRgb8(_) => pixels.clone(),
        _ if pixels.color().has_color() => DynamicImage::ImageRgb8(pixels.to_rgb8()),
        _ => DynamicImage::ImageLuma8(pixels.to_luma8()),
    }
}

impl Codec for RustCodec {
    type Image = PixelImage;

    fn decode(&self, blob: &[u8]) -> Result<PixelImage, CodecError> {
        let reader = ImageReader::new(Cursor::new(blob))
            .with_guessed_format()
            .map_err(|e| CodecError::Decode(e.to_string()))?;
        let format = reader
            .format()
            .ok_or_else(|| CodecError::Decode("unrecognised image format".into()))?;
        let mut decoder = reader
            .into_decoder()
            .map_err(|e| CodecError::Decode(e.to_string()))?;
        let orientation = decoder
            .orientation()
            .map(|o| Orientation::from_exif(u16::from(o.to_exif())))
            .unwrap_or_default();
        let pixels =
            DynamicImage::from_decoder(decoder).map_err(|e| CodecError::Decode(e.to_string()))?;

        Ok(PixelImage {
            pixels,
            format,
            orientation,
        })
    }

    fn encode(
        &self,
        image: &PixelImage,
        options: &EncodingOptions,
    ) -> Result<Vec<u8>, CodecError> {
        let mut out = Vec::new();
        match image.format {
            ImageFormat::Jpeg => {
                let quality = u8::try_from(options.quality.value()).unwrap_or(100);
                let encoder = JpegEncoder::new_with_quality(&mut out, quality);
                jpeg_compatible(&image.pixels)
                    .write_with_encoder(encoder)
                    .map_err(|e| CodecError::Encode(e.to_string()))?;
            }
            ImageFormat::Png | ImageFormat::Tiff => {
                image
                    .pixels
                    .write_to(&mut Cursor::new(&mut out), image.format)
                    .map_err(|e| CodecError::Encode(e.to_string()))?;
            }
            ImageFormat::WebP => {
                // The pure-Rust WebP encoder is lossless and 8-bit RGB(A) only
                DynamicImage::ImageRgba8(image.pixels.to_rgba8())
                    .write_to(&mut Cursor::new(&mut out), ImageFormat::WebP)
                    .map_err(|e| CodecError::Encode(e.to_string()))?;
            }
            other => return Err(CodecError::UnsupportedFormat(format!("{other:?}"))),
        }
        Ok(out)
    }

    fn resize(
        &self,
        image: PixelImage,
        size: Dimensions,
        filter: Filter,
        blur: f64,
    ) -> Result<PixelImage, CodecError> {
        if size.is_empty() {
            return Err(CodecError::Transform(format!(
                "cannot resize to {}x{}",
                size.width, size.height
            )));
        }
        let resized = image
            .pixels
            .resize_exact(size.width, size.height, filter_type(filter));
        let pixels = apply_blur(resized, blur);
        Ok(image.replace(pixels))
    }

    fn crop(&self, image: PixelImage, rect: Rectangle) -> Result<PixelImage, CodecError> {
        if rect.width == 0 || rect.height == 0 || !rect.fits_within(image.dimensions()) {
            return Err(CodecError::Transform(format!(
                "crop {}x{}+{}+{} outside {}x{}",
                rect.width,
                rect.height,
                rect.x,
                rect.y,
                image.columns(),
                image.rows()
            )));
        }
        let cropped = image.pixels.crop_imm(rect.x, rect.y, rect.width, rect.height);
        Ok(image.replace(cropped))
    }

    fn rotate(&self, image: PixelImage, rotation: Rotation) -> Result<PixelImage, CodecError> {
        let rotated = match rotation {
            Rotation::Quarter => image.pixels.rotate90(),
            Rotation::Half => image.pixels.rotate180(),
            Rotation::ThreeQuarter => image.pixels.rotate270(),
        };
        Ok(image.replace(rotated))
    }

    fn strip_metadata(&self, image: PixelImage) -> PixelImage {
        PixelImage {
            orientation: Orientation::Unspecified,
            ..image
        }
    }
}
