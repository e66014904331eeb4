//! Core data types shared across the loading pipeline

use crate::error::{MaskLoadError, Result};
use crate::resize::Size;
use crate::services::ImageSource;
use image::{GrayImage, RgbImage};
use ndarray::{Array3, Array4};

/// One decoded frame: RGB samples plus the alpha channel when the source had one
#[derive(Debug, Clone)]
pub struct DecodedFrame {
    pub image: RgbImage,
    pub alpha: Option<GrayImage>,
}

impl DecodedFrame {
    /// Create a frame, checking that the alpha channel matches the image
    pub fn new(image: RgbImage, alpha: Option<GrayImage>) -> Result<Self> {
        if let Some(ref a) = alpha {
            if a.dimensions() != image.dimensions() {
                return Err(MaskLoadError::internal(format!(
                    "Alpha channel {}x{} does not match frame {}x{}",
                    a.width(),
                    a.height(),
                    image.width(),
                    image.height()
                )));
            }
        }
        Ok(Self { image, alpha })
    }

    /// Frame without transparency
    #[must_use]
    pub fn opaque(image: RgbImage) -> Self {
        Self { image, alpha: None }
    }

    #[must_use]
    pub fn size(&self) -> Size {
        Size::new(self.image.width(), self.image.height())
    }
}

/// An image and its mask, always of identical dimensions
#[derive(Debug, Clone, PartialEq)]
pub struct ImageMaskPair {
    image: RgbImage,
    mask: GrayImage,
}

impl ImageMaskPair {
    /// Pair an image with its mask
    ///
    /// # Errors
    ///
    /// Returns `MaskLoadError::Internal` when the dimensions differ
    pub fn new(image: RgbImage, mask: GrayImage) -> Result<Self> {
        if image.dimensions() != mask.dimensions() {
            return Err(MaskLoadError::internal(format!(
                "Image {}x{} and mask {}x{} are not paired",
                image.width(),
                image.height(),
                mask.width(),
                mask.height()
            )));
        }
        Ok(Self { image, mask })
    }

    #[must_use]
    pub fn image(&self) -> &RgbImage {
        &self.image
    }

    #[must_use]
    pub fn mask(&self) -> &GrayImage {
        &self.mask
    }

    #[must_use]
    pub fn size(&self) -> Size {
        Size::new(self.image.width(), self.image.height())
    }

    #[must_use]
    pub fn into_parts(self) -> (RgbImage, GrayImage) {
        (self.image, self.mask)
    }
}

/// A (source, frame index) pair produced during source resolution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchItem {
    pub source: ImageSource,
    pub frame_index: usize,
}

impl std::fmt::Display for BatchItem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}#{}", self.source, self.frame_index)
    }
}

/// Stacked outputs of one invocation
#[derive(Debug, Clone)]
pub struct OutputBundle {
    /// Images shaped (N, H, W, 3) with samples in [0, 1]
    pub images: Array4<f32>,
    /// Masks shaped (N, H, W) with intensity in [0, 1], 1.0 = masked
    pub masks: Array3<f32>,
    /// Realized width of the first processed item
    pub width: u32,
    /// Realized height of the first processed item
    pub height: u32,
}

impl OutputBundle {
    /// Number of stacked items
    #[must_use]
    pub fn len(&self) -> usize {
        self.images.shape()[0]
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Convert one stacked image back to 8-bit RGB
    #[must_use]
    pub fn image_at(&self, index: usize) -> Option<RgbImage> {
        if index >= self.len() {
            return None;
        }
        let view = self.images.index_axis(ndarray::Axis(0), index);
        let (height, width) = (view.shape()[0], view.shape()[1]);
        let mut raw = Vec::with_capacity(width * height * 3);
        for y in 0..height {
            for x in 0..width {
                for c in 0..3 {
                    raw.push(to_u8(view[[y, x, c]]));
                }
            }
        }
        RgbImage::from_raw(width as u32, height as u32, raw)
    }

    /// Convert one stacked mask back to 8-bit grayscale
    #[must_use]
    pub fn mask_at(&self, index: usize) -> Option<GrayImage> {
        if index >= self.len() {
            return None;
        }
        let view = self.masks.index_axis(ndarray::Axis(0), index);
        let (height, width) = (view.shape()[0], view.shape()[1]);
        let raw = view.iter().map(|&v| to_u8(v)).collect();
        GrayImage::from_raw(width as u32, height as u32, raw)
    }
}

fn to_u8(value: f32) -> u8 {
    (value.clamp(0.0, 1.0) * 255.0).round() as u8
}
