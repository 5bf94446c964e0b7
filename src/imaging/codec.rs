//! Codec trait and shared geometry types.
//!
//! The [`Codec`] trait is the narrow capability the pipeline calls through:
//! decode, encode, resize, crop, rotate and strip-metadata. It knows nothing
//! about fit or cap planning.
//!
//! Transforms take their input image **by value** and hand back a new owned
//! image. Whatever the outcome, the input is gone when the call returns, so
//! the pipeline only ever holds one live image and every exit path releases
//! it through `Drop`.
//!
//! The production implementation is [`RustCodec`](super::rust_codec::RustCodec).

use super::params::{EncodingOptions, Filter};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CodecError {
    #[error("Decode failed: {0}")]
    Decode(String),
    #[error("Encode failed: {0}")]
    Encode(String),
    #[error("Transform failed: {0}")]
    Transform(String),
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),
}

/// Width and height in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// True when either side is zero.
    pub fn is_empty(self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// Crop rectangle in pixel offsets of the image being cropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rectangle {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Rectangle {
    /// Whether the rectangle lies entirely inside an image of `size`.
    pub fn fits_within(&self, size: Dimensions) -> bool {
        u64::from(self.x) + u64::from(self.width) <= u64::from(size.width)
            && u64::from(self.y) + u64::from(self.height) <= u64::from(size.height)
    }
}

/// Stored orientation tag, named after where row 0 / column 0 of the stored
/// pixels should be displayed (EXIF tag 0x0112 values 1–8, 0 = unspecified).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Orientation {
    #[default]
    Unspecified,
    TopLeft,
    TopRight,
    BottomRight,
    BottomLeft,
    LeftTop,
    RightTop,
    RightBottom,
    LeftBottom,
}

impl Orientation {
    /// Map a raw EXIF orientation value. Out-of-range values are unspecified.
    pub fn from_exif(value: u16) -> Self {
        match value {
            1 => Self::TopLeft,
            2 => Self::TopRight,
            3 => Self::BottomRight,
            4 => Self::BottomLeft,
            5 => Self::LeftTop,
            6 => Self::RightTop,
            7 => Self::RightBottom,
            8 => Self::LeftBottom,
            _ => Self::Unspecified,
        }
    }
}

/// Clockwise quarter-turn rotations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Rotation {
    Quarter,
    Half,
    ThreeQuarter,
}

impl Rotation {
    pub fn degrees(self) -> u32 {
        match self {
            Rotation::Quarter => 90,
            Rotation::Half => 180,
            Rotation::ThreeQuarter => 270,
        }
    }
}

/// Read access every decoded image must offer the pipeline.
pub trait Raster {
    /// Width in pixels.
    fn columns(&self) -> u32;

    /// Height in pixels.
    fn rows(&self) -> u32;

    fn orientation(&self) -> Orientation;

    fn dimensions(&self) -> Dimensions {
        Dimensions::new(self.columns(), self.rows())
    }
}

/// Trait for image codecs.
///
/// `Sync` so a single codec can serve parallel renders (rayon); each call
/// works on its own image, so no state is shared between calls.
pub trait Codec: Sync {
    type Image: Raster;

    /// Decode an encoded blob into a pixel image.
    fn decode(&self, blob: &[u8]) -> Result<Self::Image, CodecError>;

    /// Encode the image, normally in the format it was decoded from.
    fn encode(&self, image: &Self::Image, options: &EncodingOptions)
    -> Result<Vec<u8>, CodecError>;

    /// Resample to exactly `size`.
    fn resize(
        &self,
        image: Self::Image,
        size: Dimensions,
        filter: Filter,
        blur: f64,
    ) -> Result<Self::Image, CodecError>;

    fn crop(&self, image: Self::Image, rect: Rectangle) -> Result<Self::Image, CodecError>;

    fn rotate(&self, image: Self::Image, rotation: Rotation) -> Result<Self::Image, CodecError>;

    /// Drop orientation (and any other carried) metadata.
    fn strip_metadata(&self, image: Self::Image) -> Self::Image;

    /// Encoding options used when the caller does not choose.
    fn default_image_info(&self) -> EncodingOptions {
        EncodingOptions::default()
    }
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Image handed out by [`MockCodec`]. Tracks how many are alive so tests
    /// can assert nothing leaks and nothing is released twice.
    #[derive(Debug)]
    pub struct MockImage {
        pub columns: u32,
        pub rows: u32,
        pub orientation: Orientation,
        live: Arc<AtomicUsize>,
        released: Arc<AtomicUsize>,
    }

    impl Raster for MockImage {
        fn columns(&self) -> u32 {
            self.columns
        }

        fn rows(&self) -> u32 {
            self.rows
        }

        fn orientation(&self) -> Orientation {
            self.orientation
        }
    }

    impl Drop for MockImage {
        fn drop(&mut self) {
            self.live.fetch_sub(1, Ordering::SeqCst);
            self.released.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum Step {
        Decode,
        Encode,
        Resize,
        Crop,
        Rotate,
    }

    #[derive(Debug, Clone, PartialEq)]
    pub enum RecordedOp {
        Decode(usize),
        Encode { width: u32, height: u32, quality: u32 },
        Resize { width: u32, height: u32, filter: Filter, blur: f64 },
        Crop(Rectangle),
        Rotate(u32),
        StripMetadata,
    }

    /// Mock codec that records operations and fabricates images without
    /// touching pixels. Uses Mutex (not RefCell) so it is Sync.
    #[derive(Default)]
    pub struct MockCodec {
        pub source: Mutex<Option<(u32, u32, Orientation)>>,
        pub fail_on: Mutex<Option<Step>>,
        pub operations: Mutex<Vec<RecordedOp>>,
        live: Arc<AtomicUsize>,
        created: Arc<AtomicUsize>,
        released: Arc<AtomicUsize>,
    }

    impl MockCodec {
        pub fn new() -> Self {
            Self::default()
        }

        /// Every decode yields an image of this size and orientation.
        pub fn with_source(width: u32, height: u32, orientation: Orientation) -> Self {
            let codec = Self::default();
            *codec.source.lock().unwrap() = Some((width, height, orientation));
            codec
        }

        pub fn failing_on(self, step: Step) -> Self {
            *self.fail_on.lock().unwrap() = Some(step);
            self
        }

        pub fn get_operations(&self) -> Vec<RecordedOp> {
            self.operations.lock().unwrap().clone()
        }

        pub fn live_images(&self) -> usize {
            self.live.load(Ordering::SeqCst)
        }

        pub fn created_images(&self) -> usize {
            self.created.load(Ordering::SeqCst)
        }

        pub fn released_images(&self) -> usize {
            self.released.load(Ordering::SeqCst)
        }

        fn record(&self, op: RecordedOp) {
            self.operations.lock().unwrap().push(op);
        }

        fn fails(&self, step: Step) -> bool {
            *self.fail_on.lock().unwrap() == Some(step)
        }

        fn make(&self, columns: u32, rows: u32, orientation: Orientation) -> MockImage {
            self.live.fetch_add(1, Ordering::SeqCst);
            self.created.fetch_add(1, Ordering::SeqCst);
            MockImage {
                columns,
                rows,
                orientation,
                live: Arc::clone(&self.live),
                released: Arc::clone(&self.released),
            }
        }
    }

    impl Codec for MockCodec {
        type Image = MockImage;

        fn decode(&self, blob: &[u8]) -> Result<MockImage, CodecError> {
            self.record(RecordedOp::Decode(blob.len()));
            if self.fails(Step::Decode) {
                return Err(CodecError::Decode("injected".into()));
            }
            let source = *self.source.lock().unwrap();
            let (w, h, orientation) =
                source.ok_or_else(|| CodecError::Decode("No mock source".into()))?;
            Ok(self.make(w, h, orientation))
        }

        fn encode(
            &self,
            image: &MockImage,
            options: &EncodingOptions,
        ) -> Result<Vec<u8>, CodecError> {
            self.record(RecordedOp::Encode {
                width: image.columns,
                height: image.rows,
                quality: options.quality.value(),
            });
            if self.fails(Step::Encode) {
                return Err(CodecError::Encode("injected".into()));
            }
            Ok(format!("{}x{}", image.columns, image.rows).into_bytes())
        }

        fn resize(
            &self,
            image: MockImage,
            size: Dimensions,
            filter: Filter,
            blur: f64,
        ) -> Result<MockImage, CodecError> {
            self.record(RecordedOp::Resize {
                width: size.width,
                height: size.height,
                filter,
                blur,
            });
            if self.fails(Step::Resize) {
                return Err(CodecError::Transform("injected".into()));
            }
            Ok(self.make(size.width, size.height, image.orientation))
        }

        fn crop(&self, image: MockImage, rect: Rectangle) -> Result<MockImage, CodecError> {
            self.record(RecordedOp::Crop(rect));
            if self.fails(Step::Crop) || !rect.fits_within(image.dimensions()) {
                return Err(CodecError::Transform("crop".into()));
            }
            Ok(self.make(rect.width, rect.height, image.orientation))
        }

        fn rotate(&self, image: MockImage, rotation: Rotation) -> Result<MockImage, CodecError> {
            self.record(RecordedOp::Rotate(rotation.degrees()));
            if self.fails(Step::Rotate) {
                return Err(CodecError::Transform("injected".into()));
            }
            let (w, h) = match rotation {
                Rotation::Half => (image.columns, image.rows),
                _ => (image.rows, image.columns),
            };
            Ok(self.make(w, h, image.orientation))
        }

        fn strip_metadata(&self, mut image: MockImage) -> MockImage {
            self.record(RecordedOp::StripMetadata);
            image.orientation = Orientation::Unspecified;
            image
        }
    }

    #[test]
    fn mock_tracks_image_lifetimes() {
        let codec = MockCodec::with_source(40, 30, Orientation::TopLeft);
        let image = codec.decode(b"blob").unwrap();
        assert_eq!(codec.live_images(), 1);

        let rotated = codec.rotate(image, Rotation::Quarter).unwrap();
        assert_eq!(rotated.dimensions(), Dimensions::new(30, 40));
        assert_eq!(codec.live_images(), 1);

        drop(rotated);
        assert_eq!(codec.live_images(), 0);
        assert_eq!(codec.created_images(), 2);
        assert_eq!(codec.released_images(), 2);
    }

    #[test]
    fn mock_records_resize() {
        let codec = MockCodec::with_source(800, 600, Orientation::Unspecified);
        let image = codec.decode(b"x").unwrap();
        codec
            .resize(image, Dimensions::new(400, 300), Filter::Mitchell, 0.9)
            .unwrap();

        let ops = codec.get_operations();
        assert_eq!(ops.len(), 2);
        assert!(matches!(
            &ops[1],
            RecordedOp::Resize {
                width: 400,
                height: 300,
                filter: Filter::Mitchell,
                ..
            }
        ));
    }

    #[test]
    fn rectangle_bounds_check() {
        let size = Dimensions::new(100, 50);
        let inside = Rectangle { x: 10, y: 0, width: 90, height: 50 };
        let outside = Rectangle { x: 11, y: 0, width: 90, height: 50 };
        assert!(inside.fits_within(size));
        assert!(!outside.fits_within(size));
    }

    #[test]
    fn orientation_from_exif_values() {
        assert_eq!(Orientation::from_exif(3), Orientation::BottomRight);
        assert_eq!(Orientation::from_exif(6), Orientation::RightTop);
        assert_eq!(Orientation::from_exif(8), Orientation::LeftBottom);
        assert_eq!(Orientation::from_exif(0), Orientation::Unspecified);
        assert_eq!(Orientation::from_exif(42), Orientation::Unspecified);
    }

    #[test]
    fn default_image_info_is_quality_75() {
        let codec = MockCodec::new();
        assert_eq!(codec.default_image_info().quality.value(), 75);
    }
}
