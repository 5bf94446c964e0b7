//! Parameter types for image operations.
//!
//! These structs describe *what* to do, not *how* to do it. They are the
//! interface between the [`pipeline`](super::pipeline) (which decides which
//! transforms run) and the [`codec`](super::codec) (which does the actual pixel
//! work). This separation allows swapping codecs (e.g. for testing with a mock)
//! without changing pipeline logic.
//!
//! ## Types
//!
//! - [`Quality`] — Lossy encoding quality (1–100, default 75). Clamped on construction.
//! - [`Filter`] — Resampling kernel selector, passed through to the codec.
//! - [`EncodingOptions`] — What the codec needs to encode the final image.
//! - [`AxisPreference`] / [`Bounds`] — Cap planning inputs.
//! - [`FitRequest`] / [`CapRequest`] — Everything one pipeline call needs.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Quality setting for lossy image encoding (1-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "u32", into = "u32")]
pub struct Quality(u32);

impl Quality {
    pub fn new(value: u32) -> Self {
        Self(value.clamp(1, 100))
    }

    pub fn value(self) -> u32 {
        self.0
    }

    /// Resolve a caller-supplied quality: anything `<= 0` means "use the default".
    pub fn or_default(requested: i32, default: Quality) -> Self {
        if requested <= 0 {
            default
        } else {
            Self::new(requested as u32)
        }
    }
}

impl From<u32> for Quality {
    fn from(value: u32) -> Self {
        Self::new(value)
    }
}

impl From<Quality> for u32 {
    fn from(quality: Quality) -> Self {
        quality.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(75)
    }
}

/// Encoding options handed to [`Codec::encode`](super::Codec::encode).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EncodingOptions {
    pub quality: Quality,
}

/// Resampling kernel used during resize.
///
/// Discriminants are the classic GraphicsMagick `FilterTypes` codes, so hosts
/// that already speak those numbers can pass them straight through.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Filter {
    Undefined = 0,
    Point = 1,
    Box = 2,
    Triangle = 3,
    Hermite = 4,
    Hanning = 5,
    Hamming = 6,
    Blackman = 7,
    Gaussian = 8,
    Quadratic = 9,
    Cubic = 10,
    Catrom = 11,
    Mitchell = 12,
    #[default]
    Lanczos = 13,
    Bessel = 14,
    Sinc = 15,
}

impl Filter {
    const ALL: [Filter; 16] = [
        Filter::Undefined,
        Filter::Point,
        Filter::Box,
        Filter::Triangle,
        Filter::Hermite,
        Filter::Hanning,
        Filter::Hamming,
        Filter::Blackman,
        Filter::Gaussian,
        Filter::Quadratic,
        Filter::Cubic,
        Filter::Catrom,
        Filter::Mitchell,
        Filter::Lanczos,
        Filter::Bessel,
        Filter::Sinc,
    ];

    /// Look up a filter by its numeric code. Unknown codes yield `None`.
    pub fn from_code(code: i32) -> Option<Self> {
        usize::try_from(code)
            .ok()
            .and_then(|i| Self::ALL.get(i).copied())
    }

    pub fn code(self) -> i32 {
        self as i32
    }

    pub fn name(self) -> &'static str {
        match self {
            Filter::Undefined => "undefined",
            Filter::Point => "point",
            Filter::Box => "box",
            Filter::Triangle => "triangle",
            Filter::Hermite => "hermite",
            Filter::Hanning => "hanning",
            Filter::Hamming => "hamming",
            Filter::Blackman => "blackman",
            Filter::Gaussian => "gaussian",
            Filter::Quadratic => "quadratic",
            Filter::Cubic => "cubic",
            Filter::Catrom => "catrom",
            Filter::Mitchell => "mitchell",
            Filter::Lanczos => "lanczos",
            Filter::Bessel => "bessel",
            Filter::Sinc => "sinc",
        }
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Filter {
    type Err = String;

    /// Accepts either a name (`"lanczos"`) or a numeric code (`"13"`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Ok(code) = s.parse::<i32>() {
            return Self::from_code(code).ok_or_else(|| format!("unknown filter code {code}"));
        }
        Self::ALL
            .iter()
            .copied()
            .find(|f| f.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown filter '{s}'"))
    }
}

/// Which axis the cap value applies to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AxisPreference {
    /// Cap the longer source axis.
    #[default]
    Auto,
    Width,
    Height,
}

impl FromStr for AxisPreference {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "auto" | "cap" => Ok(Self::Auto),
            "width" => Ok(Self::Width),
            "height" => Ok(Self::Height),
            other => Err(format!("unknown axis '{other}' (expected auto, width or height)")),
        }
    }
}

/// Optional upper bounds on the capped output. `0` means no limit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Bounds {
    pub max_width: u32,
    pub max_height: u32,
}

impl Bounds {
    pub const UNLIMITED: Self = Self {
        max_width: 0,
        max_height: 0,
    };

    pub fn new(max_width: u32, max_height: u32) -> Self {
        Self {
            max_width,
            max_height,
        }
    }
}

/// One `resize_image` call: exact output box plus encoding/resampling knobs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FitRequest {
    pub width: u32,
    pub height: u32,
    /// Requested quality; `<= 0` selects the configured default.
    pub quality: i32,
    pub filter: Filter,
    pub blur: f64,
}

impl FitRequest {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            quality: 0,
            filter: Filter::default(),
            blur: 1.0,
        }
    }
}

/// One `cap_image` call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CapRequest {
    pub cap: u32,
    pub axis: AxisPreference,
    /// Requested quality; `<= 0` selects the configured default.
    pub quality: i32,
    pub filter: Filter,
    pub blur: f64,
    pub bounds: Bounds,
}

impl CapRequest {
    pub fn new(cap: u32, axis: AxisPreference) -> Self {
        Self {
            cap,
            axis,
            quality: 0,
            filter: Filter::default(),
            blur: 1.0,
            bounds: Bounds::UNLIMITED,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quality_clamps_to_valid_range() {
        assert_eq!(Quality::new(0).value(), 1);
        assert_eq!(Quality::new(50).value(), 50);
        assert_eq!(Quality::new(150).value(), 100);
    }

    #[test]
    fn deserialized_quality_is_clamped() {
        let quality: Quality = serde_json::from_str("300").unwrap();
        assert_eq!(quality.value(), 100);
        assert_eq!(serde_json::to_string(&Quality::new(80)).unwrap(), "80");
    }

    #[test]
    fn quality_default_is_75() {
        assert_eq!(Quality::default().value(), 75);
        assert_eq!(EncodingOptions::default().quality.value(), 75);
    }

    #[test]
    fn quality_non_positive_request_uses_default() {
        let default = Quality::new(60);
        assert_eq!(Quality::or_default(0, default), default);
        assert_eq!(Quality::or_default(-5, default), default);
        assert_eq!(Quality::or_default(90, default).value(), 90);
        assert_eq!(Quality::or_default(400, default).value(), 100);
    }

    #[test]
    fn filter_codes_round_trip_through_lookup() {
        assert_eq!(Filter::from_code(13), Some(Filter::Lanczos));
        assert_eq!(Filter::from_code(0), Some(Filter::Undefined));
        assert_eq!(Filter::from_code(16), None);
        assert_eq!(Filter::from_code(-1), None);
        assert_eq!(Filter::Catrom.code(), 11);
    }

    #[test]
    fn filter_parses_names_and_codes() {
        assert_eq!("lanczos".parse::<Filter>(), Ok(Filter::Lanczos));
        assert_eq!("Mitchell".parse::<Filter>(), Ok(Filter::Mitchell));
        assert_eq!("3".parse::<Filter>(), Ok(Filter::Triangle));
        assert!("sharpest".parse::<Filter>().is_err());
    }

    #[test]
    fn axis_parses_including_cap_alias() {
        assert_eq!("cap".parse::<AxisPreference>(), Ok(AxisPreference::Auto));
        assert_eq!("HEIGHT".parse::<AxisPreference>(), Ok(AxisPreference::Height));
        assert!("diagonal".parse::<AxisPreference>().is_err());
    }

    #[test]
    fn requests_default_to_lanczos_neutral_blur() {
        let fit = FitRequest::new(100, 80);
        assert_eq!(fit.filter, Filter::Lanczos);
        assert_eq!(fit.blur, 1.0);
        assert_eq!(fit.quality, 0);

        let cap = CapRequest::new(200, AxisPreference::Auto);
        assert_eq!(cap.bounds, Bounds::UNLIMITED);
    }
}
