//! Request parameters for image and mask loading
//!
//! Mirrors the parameter surface the host runtime exposes: load mode, file
//! references, target geometry, resampling filter and fitting policy.

use crate::error::{MaskLoadError, Result};
use crate::resize::{FittingPolicy, TargetSpec};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Default target width
pub const DEFAULT_WIDTH: u32 = 720;
/// Default target height
pub const DEFAULT_HEIGHT: u32 = 1280;
/// Default divisibility constraint
pub const DEFAULT_DIVISIBLE_BY: u32 = 2;
/// Largest accepted width, height or shortest side
pub const MAX_DIMENSION: u32 = 8192;
/// Largest accepted divisibility constraint
pub const MAX_DIVISIBLE_BY: u32 = 64;

/// Where images come from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoadMode {
    /// One uploaded file from the input root
    #[default]
    Single,
    /// A directory or zip archive of files
    Batch,
}

impl std::fmt::Display for LoadMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Single => write!(f, "single"),
            Self::Batch => write!(f, "batch"),
        }
    }
}

impl FromStr for LoadMode {
    type Err = MaskLoadError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "single" => Ok(Self::Single),
            "batch" => Ok(Self::Batch),
            other => Err(MaskLoadError::invalid_config(format!(
                "Unknown mode '{}'. Expected 'single' or 'batch'",
                other
            ))),
        }
    }
}

/// Resampling filter used for both image and mask
///
/// Unrecognized names fall back to [`ResampleFilter::Bicubic`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ResampleFilter {
    Nearest,
    Bilinear,
    /// Box / area averaging
    Area,
    #[default]
    Bicubic,
    Lanczos,
}

impl ResampleFilter {
    /// All filters in host declaration order
    pub const ALL: [Self; 5] = [
        Self::Nearest,
        Self::Bilinear,
        Self::Area,
        Self::Bicubic,
        Self::Lanczos,
    ];

    /// Parse a host filter name, defaulting to bicubic
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_lowercase().as_str() {
            "nearest-exact" | "nearest" => Self::Nearest,
            "bilinear" => Self::Bilinear,
            "area" | "box" => Self::Area,
            "bicubic" => Self::Bicubic,
            "lanczos" => Self::Lanczos,
            other => {
                log::debug!("Unrecognized upscale method '{}', using bicubic", other);
                Self::Bicubic
            },
        }
    }

    /// Host-facing name
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Nearest => "nearest-exact",
            Self::Bilinear => "bilinear",
            Self::Area => "area",
            Self::Bicubic => "bicubic",
            Self::Lanczos => "lanczos",
        }
    }
}

impl From<String> for ResampleFilter {
    fn from(value: String) -> Self {
        Self::from_name(&value)
    }
}

impl From<ResampleFilter> for String {
    fn from(value: ResampleFilter) -> Self {
        value.name().to_string()
    }
}

impl std::fmt::Display for ResampleFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// How source and target aspect ratios are reconciled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeepProportion {
    Stretch,
    #[default]
    Crop,
    Pad,
}

impl FromStr for KeepProportion {
    type Err = MaskLoadError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "stretch" => Ok(Self::Stretch),
            "crop" => Ok(Self::Crop),
            "pad" => Ok(Self::Pad),
            other => Err(MaskLoadError::invalid_config(format!(
                "Unknown keep_proportion '{}'. Expected stretch, crop or pad",
                other
            ))),
        }
    }
}

impl std::fmt::Display for KeepProportion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Stretch => write!(f, "stretch"),
            Self::Crop => write!(f, "crop"),
            Self::Pad => write!(f, "pad"),
        }
    }
}

/// Anchor of the surviving window when cropping
///
/// Unrecognized names fall back to [`CropPosition::Center`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum CropPosition {
    #[default]
    Center,
    Top,
    Bottom,
    Left,
    Right,
}

impl CropPosition {
    /// Parse a host anchor name, defaulting to center
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_lowercase().as_str() {
            "center" => Self::Center,
            "top" => Self::Top,
            "bottom" => Self::Bottom,
            "left" => Self::Left,
            "right" => Self::Right,
            other => {
                log::debug!("Unrecognized crop position '{}', using center", other);
                Self::Center
            },
        }
    }

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Center => "center",
            Self::Top => "top",
            Self::Bottom => "bottom",
            Self::Left => "left",
            Self::Right => "right",
        }
    }
}

impl From<String> for CropPosition {
    fn from(value: String) -> Self {
        Self::from_name(&value)
    }
}

impl From<CropPosition> for String {
    fn from(value: CropPosition) -> Self {
        value.name().to_string()
    }
}

impl std::fmt::Display for CropPosition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// One invocation's worth of host parameters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoadRequest {
    /// Single file or batch location
    pub mode: LoadMode,
    /// File name under the input root (single mode)
    pub image: Option<String>,
    /// Directory, zip archive, or path relative to the input root (batch mode)
    pub batch_path: Option<String>,
    /// Requested output width before divisibility flooring
    pub width: u32,
    /// Requested output height before divisibility flooring
    pub height: u32,
    /// Shortest output side derived per item; 0 disables
    pub resize_short_side: u32,
    pub upscale_method: ResampleFilter,
    pub keep_proportion: KeepProportion,
    pub crop_position: CropPosition,
    pub divisible_by: u32,
    /// Brush mask file reference (single mode only)
    pub mask_data: Option<String>,
}

impl Default for LoadRequest {
    fn default() -> Self {
        Self {
            mode: LoadMode::Single,
            image: None,
            batch_path: None,
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            resize_short_side: 0,
            upscale_method: ResampleFilter::Bicubic,
            keep_proportion: KeepProportion::Crop,
            crop_position: CropPosition::Center,
            divisible_by: DEFAULT_DIVISIBLE_BY,
            mask_data: None,
        }
    }
}

impl LoadRequest {
    /// Create a new request builder
    #[must_use]
    pub fn builder() -> LoadRequestBuilder {
        LoadRequestBuilder::new()
    }

    /// Fitting policy applied uniformly to every item
    #[must_use]
    pub fn fitting_policy(&self) -> FittingPolicy {
        match self.keep_proportion {
            KeepProportion::Stretch => FittingPolicy::Stretch,
            KeepProportion::Crop => FittingPolicy::Crop(self.crop_position),
            KeepProportion::Pad => FittingPolicy::Pad,
        }
    }

    /// Target geometry before per-item resolution
    #[must_use]
    pub fn target_spec(&self) -> TargetSpec {
        TargetSpec {
            width: self.width,
            height: self.height,
            divisible_by: self.divisible_by,
            shortest_side: (self.resize_short_side > 0).then_some(self.resize_short_side),
        }
    }

    /// Brush mask reference, honored only in single mode
    #[must_use]
    pub fn effective_mask_data(&self) -> Option<&str> {
        match self.mode {
            LoadMode::Single => self.mask_data.as_deref().filter(|m| !m.trim().is_empty()),
            LoadMode::Batch => None,
        }
    }
}

/// Builder for `LoadRequest`
pub struct LoadRequestBuilder {
    request: LoadRequest,
}

impl LoadRequestBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self {
            request: LoadRequest::default(),
        }
    }

    #[must_use]
    pub fn mode(mut self, mode: LoadMode) -> Self {
        self.request.mode = mode;
        self
    }

    #[must_use]
    pub fn image<S: Into<String>>(mut self, image: S) -> Self {
        self.request.image = Some(image.into());
        self
    }

    #[must_use]
    pub fn batch_path<S: Into<String>>(mut self, path: S) -> Self {
        self.request.batch_path = Some(path.into());
        self
    }

    #[must_use]
    pub fn width(mut self, width: u32) -> Self {
        self.request.width = width;
        self
    }

    #[must_use]
    pub fn height(mut self, height: u32) -> Self {
        self.request.height = height;
        self
    }

    #[must_use]
    pub fn resize_short_side(mut self, side: u32) -> Self {
        self.request.resize_short_side = side;
        self
    }

    #[must_use]
    pub fn upscale_method(mut self, filter: ResampleFilter) -> Self {
        self.request.upscale_method = filter;
        self
    }

    #[must_use]
    pub fn keep_proportion(mut self, keep: KeepProportion) -> Self {
        self.request.keep_proportion = keep;
        self
    }

    #[must_use]
    pub fn crop_position(mut self, position: CropPosition) -> Self {
        self.request.crop_position = position;
        self
    }

    #[must_use]
    pub fn divisible_by(mut self, divisor: u32) -> Self {
        self.request.divisible_by = divisor;
        self
    }

    #[must_use]
    pub fn mask_data<S: Into<String>>(mut self, mask: S) -> Self {
        self.request.mask_data = Some(mask.into());
        self
    }

    /// Build the request
    ///
    /// # Errors
    ///
    /// Returns `MaskLoadError::InvalidConfig` when a numeric parameter is out of range
    pub fn build(self) -> Result<LoadRequest> {
        crate::utils::ConfigValidator::validate_request(&self.request)?;
        Ok(self.request)
    }
}

impl Default for LoadRequestBuilder {
    fn default() -> Self {
        Self::new()
    }
}
