//! Conversion requests and their typed options.
//!
//! The API accepts a loose `conversion_metadata` object. Here it is a closed
//! set of optional, typed fields ([`ConversionOptions`]) so that out-of-range
//! values are rejected locally, before a job is created and points are spent.

use crate::error::ConvertorioError;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Inclusive bounds for `resize_width` / `resize_height`.
pub const RESIZE_RANGE: std::ops::RangeInclusive<u32> = 1..=10_000;

/// Inclusive bounds for `quality`.
pub const QUALITY_RANGE: std::ops::RangeInclusive<u8> = 1..=100;

/// A single file conversion to perform.
///
/// # Example
/// ```rust
/// use convertorio::{AspectRatio, ConversionOptions, ConversionRequest, CropStrategy};
///
/// let request = ConversionRequest::new("./photo.jpg", "webp")
///     .output_path("./out/photo.webp")
///     .options(
///         ConversionOptions::default()
///             .quality(90)
///             .aspect_ratio(AspectRatio::Widescreen)
///             .crop_strategy(CropStrategy::CropCenter),
///     );
/// assert_eq!(request.target_format(), "webp");
/// ```
#[derive(Debug, Clone)]
pub struct ConversionRequest {
    input_path: PathBuf,
    target_format: String,
    output_path: Option<PathBuf>,
    options: ConversionOptions,
}

impl ConversionRequest {
    /// Convert `input_path` to `target_format` (e.g. `"jpg"`, `"webp"`).
    ///
    /// The format is trimmed and lower-cased.
    pub fn new(input_path: impl Into<PathBuf>, target_format: impl AsRef<str>) -> Self {
        Self {
            input_path: input_path.into(),
            target_format: target_format.as_ref().trim().to_lowercase(),
            output_path: None,
            options: ConversionOptions::default(),
        }
    }

    /// Write the result here instead of next to the input.
    pub fn output_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_path = Some(path.into());
        self
    }

    pub fn options(mut self, options: ConversionOptions) -> Self {
        self.options = options;
        self
    }

    pub fn input_path(&self) -> &Path {
        &self.input_path
    }

    pub fn target_format(&self) -> &str {
        &self.target_format
    }

    pub fn explicit_output_path(&self) -> Option<&Path> {
        self.output_path.as_deref()
    }

    pub fn conversion_options(&self) -> &ConversionOptions {
        &self.options
    }

    /// Reject requests that can never succeed.
    pub fn validate(&self) -> Result<(), ConvertorioError> {
        if self.input_path.as_os_str().is_empty() {
            return Err(ConvertorioError::Validation("input path is required".into()));
        }
        if self.target_format.is_empty() {
            return Err(ConvertorioError::Validation("target format is required".into()));
        }
        if !self
            .target_format
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(ConvertorioError::Validation(format!(
                "target format '{}' must be a bare extension such as 'jpg'",
                self.target_format
            )));
        }
        self.options.validate()
    }
}

/// Advanced conversion options. Every field is optional; unset fields are
/// not sent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConversionOptions {
    /// Compression quality 1–100 (JPG, WebP, AVIF, HEIC).
    pub quality: Option<u8>,
    pub aspect_ratio: Option<AspectRatio>,
    pub crop_strategy: Option<CropStrategy>,
    /// Target width in pixels, 1–10000.
    pub resize_width: Option<u32>,
    /// Target height in pixels, 1–10000.
    pub resize_height: Option<u32>,
    /// Icon edge length for ICO output.
    pub icon_size: Option<IconSize>,
}

impl ConversionOptions {
    pub fn quality(mut self, q: u8) -> Self {
        self.quality = Some(q);
        self
    }

    pub fn aspect_ratio(mut self, ratio: AspectRatio) -> Self {
        self.aspect_ratio = Some(ratio);
        self
    }

    pub fn crop_strategy(mut self, strategy: CropStrategy) -> Self {
        self.crop_strategy = Some(strategy);
        self
    }

    pub fn resize_width(mut self, px: u32) -> Self {
        self.resize_width = Some(px);
        self
    }

    pub fn resize_height(mut self, px: u32) -> Self {
        self.resize_height = Some(px);
        self
    }

    pub fn icon_size(mut self, size: IconSize) -> Self {
        self.icon_size = Some(size);
        self
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub fn validate(&self) -> Result<(), ConvertorioError> {
        if let Some(q) = self.quality {
            if !QUALITY_RANGE.contains(&q) {
                return Err(ConvertorioError::Validation(format!(
                    "quality must be 1–100, got {q}"
                )));
            }
        }
        for (name, value) in [
            ("resize_width", self.resize_width),
            ("resize_height", self.resize_height),
        ] {
            if let Some(px) = value {
                if !RESIZE_RANGE.contains(&px) {
                    return Err(ConvertorioError::Validation(format!(
                        "{name} must be 1–10000 pixels, got {px}"
                    )));
                }
            }
        }
        Ok(())
    }

    /// Wire representation, or `None` when nothing is set so the field is
    /// omitted from the request body.
    pub(crate) fn to_metadata(&self) -> Option<ConversionMetadata> {
        if self.is_empty() {
            return None;
        }
        Some(ConversionMetadata {
            quality: self.quality,
            aspect_ratio: self.aspect_ratio.map(AspectRatio::as_str),
            crop_strategy: self.crop_strategy.map(CropStrategy::as_str),
            resize_width: self.resize_width,
            resize_height: self.resize_height,
            icon_size: self.icon_size.map(IconSize::pixels),
        })
    }
}

/// `conversion_metadata` as sent to `/api/upload/request-url`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConversionMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quality: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aspect_ratio: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub crop_strategy: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resize_width: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resize_height: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon_size: Option<u32>,
}

// ── Enums ────────────────────────────────────────────────────────────────

/// Target aspect ratio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AspectRatio {
    /// Keep the source proportions.
    Original,
    /// 1:1
    Square,
    /// 4:3
    Standard,
    /// 16:9
    Widescreen,
    /// 9:16
    Portrait,
    /// 21:9
    Ultrawide,
    /// Server-side custom ratio, driven by `resize_width` / `resize_height`.
    Custom,
}

impl AspectRatio {
    pub fn as_str(self) -> &'static str {
        match self {
            AspectRatio::Original => "original",
            AspectRatio::Square => "1:1",
            AspectRatio::Standard => "4:3",
            AspectRatio::Widescreen => "16:9",
            AspectRatio::Portrait => "9:16",
            AspectRatio::Ultrawide => "21:9",
            AspectRatio::Custom => "custom",
        }
    }
}

impl std::str::FromStr for AspectRatio {
    type Err = ConvertorioError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "original" => Ok(AspectRatio::Original),
            "1:1" => Ok(AspectRatio::Square),
            "4:3" => Ok(AspectRatio::Standard),
            "16:9" => Ok(AspectRatio::Widescreen),
            "9:16" => Ok(AspectRatio::Portrait),
            "21:9" => Ok(AspectRatio::Ultrawide),
            "custom" => Ok(AspectRatio::Custom),
            other => Err(ConvertorioError::Validation(format!(
                "unknown aspect ratio '{other}' \
                 (expected original, 1:1, 4:3, 16:9, 9:16, 21:9 or custom)"
            ))),
        }
    }
}

/// How the image is fitted into the target aspect ratio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CropStrategy {
    /// Letterbox: the whole image stays visible.
    Fit,
    CropCenter,
    CropTop,
    CropBottom,
    CropLeft,
    CropRight,
}

impl CropStrategy {
    pub fn as_str(self) -> &'static str {
        match self {
            CropStrategy::Fit => "fit",
            CropStrategy::CropCenter => "crop-center",
            CropStrategy::CropTop => "crop-top",
            CropStrategy::CropBottom => "crop-bottom",
            CropStrategy::CropLeft => "crop-left",
            CropStrategy::CropRight => "crop-right",
        }
    }
}

impl std::str::FromStr for CropStrategy {
    type Err = ConvertorioError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "fit" => Ok(CropStrategy::Fit),
            "crop-center" => Ok(CropStrategy::CropCenter),
            "crop-top" => Ok(CropStrategy::CropTop),
            "crop-bottom" => Ok(CropStrategy::CropBottom),
            "crop-left" => Ok(CropStrategy::CropLeft),
            "crop-right" => Ok(CropStrategy::CropRight),
            other => Err(ConvertorioError::Validation(format!(
                "unknown crop strategy '{other}'"
            ))),
        }
    }
}

/// Icon edge length for ICO output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IconSize {
    Px16,
    Px32,
    Px48,
    Px64,
    Px128,
    Px256,
}

impl IconSize {
    pub fn pixels(self) -> u32 {
        match self {
            IconSize::Px16 => 16,
            IconSize::Px32 => 32,
            IconSize::Px48 => 48,
            IconSize::Px64 => 64,
            IconSize::Px128 => 128,
            IconSize::Px256 => 256,
        }
    }
}

impl TryFrom<u32> for IconSize {
    type Error = ConvertorioError;

    fn try_from(px: u32) -> Result<Self, Self::Error> {
        match px {
            16 => Ok(IconSize::Px16),
            32 => Ok(IconSize::Px32),
            48 => Ok(IconSize::Px48),
            64 => Ok(IconSize::Px64),
            128 => Ok(IconSize::Px128),
            256 => Ok(IconSize::Px256),
            other => Err(ConvertorioError::Validation(format!(
                "icon size must be one of 16, 32, 48, 64, 128, 256; got {other}"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn target_format_is_normalised() {
        let r = ConversionRequest::new("a.png", " JPG ");
        assert_eq!(r.target_format(), "jpg");
    }

    #[test]
    fn empty_target_format_is_rejected() {
        let err = ConversionRequest::new("a.png", "").validate().unwrap_err();
        assert!(err.is_validation());
        assert!(err.to_string().contains("target format"));
    }

    #[test]
    fn empty_input_path_is_rejected() {
        let err = ConversionRequest::new("", "jpg").validate().unwrap_err();
        assert!(err.to_string().contains("input path"));
    }

    #[test]
    fn target_format_with_path_separator_is_rejected() {
        let err = ConversionRequest::new("a.png", "../jpg").validate().unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn quality_out_of_range() {
        assert!(ConversionOptions::default().quality(0).validate().is_err());
        assert!(ConversionOptions::default().quality(101).validate().is_err());
        assert!(ConversionOptions::default().quality(100).validate().is_ok());
    }

    #[test]
    fn resize_out_of_range() {
        let err = ConversionOptions::default()
            .resize_height(10_001)
            .validate()
            .unwrap_err();
        assert!(err.to_string().contains("resize_height"));
        assert!(ConversionOptions::default().resize_width(0).validate().is_err());
    }

    #[test]
    fn empty_options_produce_no_metadata() {
        assert!(ConversionOptions::default().to_metadata().is_none());
    }

    #[test]
    fn metadata_uses_wire_names() {
        let meta = ConversionOptions::default()
            .quality(85)
            .aspect_ratio(AspectRatio::Portrait)
            .crop_strategy(CropStrategy::CropTop)
            .icon_size(IconSize::Px64)
            .to_metadata()
            .unwrap();
        let json = serde_json::to_value(&meta).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "quality": 85,
                "aspect_ratio": "9:16",
                "crop_strategy": "crop-top",
                "icon_size": 64
            })
        );
    }

    #[test]
    fn enums_parse_from_wire_names() {
        assert_eq!("16:9".parse::<AspectRatio>().unwrap(), AspectRatio::Widescreen);
        assert_eq!("crop-left".parse::<CropStrategy>().unwrap(), CropStrategy::CropLeft);
        assert_eq!(IconSize::try_from(128).unwrap(), IconSize::Px128);
        assert!("3:2".parse::<AspectRatio>().is_err());
        assert!(IconSize::try_from(100).is_err());
    }
}
