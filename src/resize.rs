//! Resize policy engine
//!
//! Turns arbitrary source dimensions into an exact `target` sized image/mask
//! pair. Geometry is computed first as a [`ResizePlan`] (pure arithmetic,
//! no pixels), then executed identically on the image and the mask so that
//! every mask pixel stays aligned with its image pixel.
//!
//! # Example
//!
//! ```
//! use imgly_maskload::config::CropPosition;
//! use imgly_maskload::resize::{FittingPolicy, Placement, Size};
//!
//! let plan = FittingPolicy::Crop(CropPosition::Center)
//!     .plan(Size::new(1000, 500), Size::new(400, 300))
//!     .unwrap();
//!
//! // Scaled to cover the target, then a centered 400x300 window survives
//! assert_eq!(plan.resize_to, Size::new(600, 300));
//! assert!(matches!(plan.placement, Placement::Crop { x: 100, y: 0 }));
//! ```

use crate::config::{CropPosition, ResampleFilter, MAX_DIMENSION};
use crate::error::{MaskLoadError, Result};
use crate::types::ImageMaskPair;
use crate::utils::NumericValidator;
use fast_image_resize as fr;
use image::{GrayImage, ImageBuffer, Pixel, RgbImage};
use serde::{Deserialize, Serialize};

/// Width and height in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

impl Size {
    #[must_use]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl std::fmt::Display for Size {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Floor `value` to the nearest multiple of `divisor`
///
/// A divisor of 0 leaves the value untouched.
#[must_use]
pub fn floor_to_multiple(value: u32, divisor: u32) -> u32 {
    if divisor == 0 {
        return value;
    }
    (value / divisor) * divisor
}

/// Requested output geometry before per-item resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetSpec {
    pub width: u32,
    pub height: u32,
    pub divisible_by: u32,
    /// Derive width/height from the item's own aspect ratio
    pub shortest_side: Option<u32>,
}

impl TargetSpec {
    /// Whether each item computes its own target
    #[must_use]
    pub fn is_per_item(&self) -> bool {
        self.shortest_side.is_some()
    }

    /// Resolve the floored target for a source of the given size
    ///
    /// # Errors
    ///
    /// Returns `MaskLoadError::InvalidConfig` when flooring leaves a zero
    /// dimension or a dimension exceeds `MAX_DIMENSION`, and
    /// `MaskLoadError::Processing` for an empty source.
    pub fn resolve_for(&self, source: Size) -> Result<Size> {
        let (width, height) = match self.shortest_side {
            Some(side) => {
                if source.width == 0 || source.height == 0 {
                    return Err(MaskLoadError::processing_stage_error(
                        "target resolution",
                        "source has a zero dimension",
                        Some(&source.to_string()),
                    ));
                }
                let side_wide = u64::from(side);
                let scaled = |long: u32, short: u32| {
                    u32::try_from(u64::from(long) * side_wide / u64::from(short))
                        .unwrap_or(u32::MAX)
                };
                if source.width >= source.height {
                    (scaled(source.width, source.height), side)
                } else {
                    (side, scaled(source.height, source.width))
                }
            },
            None => (self.width, self.height),
        };

        let target = Size::new(
            floor_to_multiple(width, self.divisible_by),
            floor_to_multiple(height, self.divisible_by),
        );
        if target.width == 0 || target.height == 0 {
            return Err(MaskLoadError::invalid_config(format!(
                "Target {}x{} floors to {} with divisible_by {}",
                width, height, target, self.divisible_by
            )));
        }
        if target.width > MAX_DIMENSION || target.height > MAX_DIMENSION {
            return Err(MaskLoadError::invalid_config(format!(
                "Target {} for source {} exceeds the {}px limit",
                target, source, MAX_DIMENSION
            )));
        }
        Ok(target)
    }
}

/// A rectangle inside a resized buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// How the resized buffer becomes the target sized output
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    /// The resized buffer already is the output
    Exact,
    /// Keep the target sized window at this offset
    Crop { x: u32, y: u32 },
    /// Paste onto a zeroed target canvas at this offset
    Pad { x: u32, y: u32 },
}

/// Geometry for one resize, shared by image and mask
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResizePlan {
    pub source: Size,
    /// Intermediate resample size
    pub resize_to: Size,
    pub placement: Placement,
    /// Final output size
    pub target: Size,
}

impl ResizePlan {
    /// Region of the output that holds resampled content
    #[must_use]
    pub fn content_rect(&self) -> Rect {
        match self.placement {
            Placement::Exact | Placement::Crop { .. } => Rect {
                x: 0,
                y: 0,
                width: self.target.width,
                height: self.target.height,
            },
            Placement::Pad { x, y } => Rect {
                x,
                y,
                width: self.resize_to.width,
                height: self.resize_to.height,
            },
        }
    }
}

/// Strategy for reconciling source and target aspect ratios
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FittingPolicy {
    /// Resample to the target, ignoring aspect ratio
    Stretch,
    /// Scale to cover the target and keep the window at the anchor
    Crop(CropPosition),
    /// Scale to fit inside the target and center on a zeroed canvas
    Pad,
}

impl FittingPolicy {
    /// Compute the geometry for fitting `source` into `target`
    ///
    /// # Errors
    ///
    /// Returns `MaskLoadError::Processing` for empty sizes or out-of-range scaling.
    pub fn plan(&self, source: Size, target: Size) -> Result<ResizePlan> {
        if source.width == 0 || source.height == 0 || target.width == 0 || target.height == 0 {
            return Err(MaskLoadError::processing_stage_error(
                "resize planning",
                &format!("cannot fit {} into {}", source, target),
                None,
            ));
        }

        let ratio_w = f64::from(target.width) / f64::from(source.width);
        let ratio_h = f64::from(target.height) / f64::from(source.height);

        let (resize_to, placement) = match *self {
            Self::Stretch => (target, Placement::Exact),
            Self::Crop(anchor) => {
                let ratio = ratio_w.max(ratio_h);
                // Covering scale: never smaller than the target on either axis
                let resized = Size::new(
                    NumericValidator::scaled_dimension(source.width, ratio)?.max(target.width),
                    NumericValidator::scaled_dimension(source.height, ratio)?.max(target.height),
                );
                let (x, y) = anchor.crop_offset(resized, target);
                (resized, Placement::Crop { x, y })
            },
            Self::Pad => {
                let ratio = ratio_w.min(ratio_h);
                let resized = Size::new(
                    NumericValidator::scaled_dimension(source.width, ratio)?.min(target.width),
                    NumericValidator::scaled_dimension(source.height, ratio)?.min(target.height),
                );
                let x = (target.width - resized.width) / 2;
                let y = (target.height - resized.height) / 2;
                (resized, Placement::Pad { x, y })
            },
        };

        Ok(ResizePlan {
            source,
            resize_to,
            placement,
            target,
        })
    }
}

impl CropPosition {
    /// Top-left corner of the `target` window inside `resized`
    #[must_use]
    pub fn crop_offset(self, resized: Size, target: Size) -> (u32, u32) {
        let slack_x = resized.width.saturating_sub(target.width);
        let slack_y = resized.height.saturating_sub(target.height);
        match self {
            Self::Center => (slack_x / 2, slack_y / 2),
            Self::Top => (slack_x / 2, 0),
            Self::Bottom => (slack_x / 2, slack_y),
            Self::Left => (0, slack_y / 2),
            Self::Right => (slack_x, slack_y / 2),
        }
    }
}

impl ResampleFilter {
    fn resize_alg(self) -> fr::ResizeAlg {
        match self {
            Self::Nearest => fr::ResizeAlg::Nearest,
            Self::Bilinear => fr::ResizeAlg::Convolution(fr::FilterType::Bilinear),
            Self::Area => fr::ResizeAlg::Convolution(fr::FilterType::Box),
            Self::Bicubic => fr::ResizeAlg::Convolution(fr::FilterType::CatmullRom),
            Self::Lanczos => fr::ResizeAlg::Convolution(fr::FilterType::Lanczos3),
        }
    }
}

/// Applies a fitting policy to image/mask pairs
#[derive(Debug, Clone, Copy)]
pub struct ResizeEngine {
    filter: ResampleFilter,
    policy: FittingPolicy,
}

impl ResizeEngine {
    #[must_use]
    pub fn new(filter: ResampleFilter, policy: FittingPolicy) -> Self {
        Self { filter, policy }
    }

    #[must_use]
    pub fn filter(&self) -> ResampleFilter {
        self.filter
    }

    #[must_use]
    pub fn policy(&self) -> FittingPolicy {
        self.policy
    }

    /// Resize a pair to exactly `target`
    ///
    /// # Errors
    ///
    /// Returns `MaskLoadError::Processing` when planning or resampling fails.
    pub fn apply(&self, pair: &ImageMaskPair, target: Size) -> Result<ImageMaskPair> {
        let plan = self.policy.plan(pair.size(), target)?;
        log::trace!(
            "Resize plan: {} -> {} -> {} ({:?})",
            plan.source,
            plan.resize_to,
            plan.target,
            plan.placement
        );

        let image = resample(pair.image(), plan.resize_to, self.filter, fr::PixelType::U8x3)?;
        let mask = resample(pair.mask(), plan.resize_to, self.filter, fr::PixelType::U8)?;

        let (image, mask) = match plan.placement {
            Placement::Exact => (image, mask),
            Placement::Crop { x, y } => (
                image::imageops::crop_imm(&image, x, y, target.width, target.height).to_image(),
                image::imageops::crop_imm(&mask, x, y, target.width, target.height).to_image(),
            ),
            Placement::Pad { x, y } => {
                let mut image_canvas = RgbImage::new(target.width, target.height);
                let mut mask_canvas = GrayImage::new(target.width, target.height);
                image::imageops::replace(&mut image_canvas, &image, i64::from(x), i64::from(y));
                image::imageops::replace(&mut mask_canvas, &mask, i64::from(x), i64::from(y));
                (image_canvas, mask_canvas)
            },
        };

        ImageMaskPair::new(image, mask)
    }
}

/// Resample an 8-bit buffer to `size`; a same-size resample is a copy
pub(crate) fn resample<P>(
    buffer: &ImageBuffer<P, Vec<u8>>,
    size: Size,
    filter: ResampleFilter,
    pixel_type: fr::PixelType,
) -> Result<ImageBuffer<P, Vec<u8>>>
where
    P: Pixel<Subpixel = u8>,
{
    let (src_width, src_height) = buffer.dimensions();
    if (src_width, src_height) == (size.width, size.height) {
        return Ok(buffer.clone());
    }

    let src_image =
        fr::images::Image::from_vec_u8(src_width, src_height, buffer.as_raw().clone(), pixel_type)
            .map_err(|e| {
                MaskLoadError::processing(format!("Failed to build source buffer: {}", e))
            })?;
    let mut dst_image = fr::images::Image::new(size.width, size.height, pixel_type);

    let mut resizer = fr::Resizer::new();
    let options = fr::ResizeOptions::new().resize_alg(filter.resize_alg());
    resizer
        .resize(&src_image, &mut dst_image, Some(&options))
        .map_err(|e| {
            MaskLoadError::processing_stage_error(
                "resample",
                &e.to_string(),
                Some(&format!("{}x{} -> {}", src_width, src_height, size)),
            )
        })?;

    ImageBuffer::from_raw(size.width, size.height, dst_image.into_vec())
        .ok_or_else(|| MaskLoadError::processing("Resampled buffer has unexpected length"))
}
