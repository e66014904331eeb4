//! Mask derivation
//!
//! Produces the single-channel mask for a decoded frame at the frame's native
//! resolution. Priority: external brush mask, then the frame's own alpha
//! channel (inverted, so transparent areas become the masked region), then an
//! all-zero mask.

use crate::config::ResampleFilter;
use crate::error::{MaskLoadError, Result};
use crate::resize::resample;
use crate::services::io::alpha_channel;
use crate::types::DecodedFrame;
use crate::utils::PathValidator;
use fast_image_resize as fr;
use image::GrayImage;
use std::path::Path;

/// Derives masks for decoded frames
pub struct MaskDeriver;

impl MaskDeriver {
    /// Derive the mask for `frame`
    ///
    /// An external mask is resampled bilinearly to the frame size when the
    /// sizes differ and used as-is, without inversion.
    pub fn derive(frame: &DecodedFrame, external: Option<&GrayImage>) -> Result<GrayImage> {
        let size = frame.size();

        if let Some(mask) = external {
            log::trace!("Using external mask {}x{}", mask.width(), mask.height());
            return resample(mask, size, ResampleFilter::Bilinear, fr::PixelType::U8);
        }

        if let Some(ref alpha) = frame.alpha {
            let mut inverted = alpha.clone();
            image::imageops::invert(&mut inverted);
            return Ok(inverted);
        }

        Ok(GrayImage::new(size.width, size.height))
    }

    /// Load a brush mask file: its alpha channel when present, otherwise its luma
    ///
    /// # Errors
    ///
    /// Returns I/O or decode errors; callers normally go through
    /// [`MaskDeriver::try_load_external`] instead.
    pub fn load_external<P: AsRef<Path>>(path: P) -> Result<GrayImage> {
        let path_ref = path.as_ref();
        PathValidator::validate_file_exists(path_ref)?;
        let data = std::fs::read(path_ref)
            .map_err(|e| MaskLoadError::file_io_error("read mask file", path_ref, &e))?;
        let image = image::load_from_memory(&data)?;

        Ok(alpha_channel(&image).unwrap_or_else(|| image.to_luma8()))
    }

    /// Load a brush mask, degrading to `None` on any failure
    pub fn try_load_external<P: AsRef<Path>>(path: P) -> Option<GrayImage> {
        let path_ref = path.as_ref();
        match Self::load_external(path_ref) {
            Ok(mask) => {
                log::debug!(
                    "Loaded external mask {} ({}x{})",
                    path_ref.display(),
                    mask.width(),
                    mask.height()
                );
                Some(mask)
            },
            Err(e) => {
                log::warn!(
                    "Error loading external mask {}: {}. Falling back to alpha/zero mask",
                    path_ref.display(),
                    e
                );
                None
            },
        }
    }

    /// Fraction of fully masked pixels, for diagnostics
    #[must_use]
    pub fn coverage(mask: &GrayImage) -> f32 {
        let total = mask.width() as usize * mask.height() as usize;
        if total == 0 {
            return 0.0;
        }
        let masked = mask.pixels().filter(|p| p[0] == u8::MAX).count();
        masked as f32 / total as f32
    }
}
