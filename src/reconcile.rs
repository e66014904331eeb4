//! Batch consistency reconciliation
//!
//! Every item in a batch must stack into one tensor, so the first processed
//! item acts as the template: without a shortest-side target, later items are
//! resized straight to the first item's realized size. Items that still end up
//! with a different shape (always the case for mixed aspect ratios under a
//! shortest-side target) are resampled bilinearly to the first item's shape
//! before stacking.

use crate::error::{MaskLoadError, Result};
use crate::resize::Size;
use crate::types::{ImageMaskPair, OutputBundle};
use crate::utils::NumericValidator;
use ndarray::{Array2, Array3, ArrayView3, Axis};

/// Accumulates resized items and stacks them into an [`OutputBundle`]
#[derive(Debug, Default)]
pub struct BatchReconciler {
    shortest_side_active: bool,
    reference: Option<Size>,
    images: Vec<Array3<f32>>,
    masks: Vec<Array2<f32>>,
}

impl BatchReconciler {
    /// Create an empty reconciler
    ///
    /// `shortest_side_active` lets every item keep its own aspect-derived target.
    #[must_use]
    pub fn new(shortest_side_active: bool) -> Self {
        Self {
            shortest_side_active,
            ..Self::default()
        }
    }

    /// Realized size of the first accepted item
    #[must_use]
    pub fn reference(&self) -> Option<Size> {
        self.reference
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.images.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    /// Target to use for an item whose own resolved target is `own`
    #[must_use]
    pub fn target_for(&self, own: Size) -> Size {
        match self.reference {
            Some(reference) if !self.shortest_side_active => {
                if reference != own {
                    log::trace!("Overriding target {} with batch reference {}", own, reference);
                }
                reference
            },
            _ => own,
        }
    }

    /// Accept a resized item; the first one fixes the reference size
    ///
    /// # Errors
    ///
    /// Returns `MaskLoadError::Processing` when the tensor conversion fails
    pub fn push(&mut self, pair: ImageMaskPair) -> Result<()> {
        let size = pair.size();
        if self.reference.is_none() {
            log::debug!("Batch reference size set to {}", size);
            self.reference = Some(size);
        }

        let (image, mask) = pair.into_parts();
        let width = NumericValidator::dimension_to_usize(size.width)?;
        let height = NumericValidator::dimension_to_usize(size.height)?;

        let image = Array3::from_shape_vec((height, width, 3), normalize(image.as_raw()))
            .map_err(|e| MaskLoadError::processing(format!("Image tensor shape: {}", e)))?;
        let mask = Array2::from_shape_vec((height, width), normalize(mask.as_raw()))
            .map_err(|e| MaskLoadError::processing(format!("Mask tensor shape: {}", e)))?;

        self.images.push(image);
        self.masks.push(mask);
        Ok(())
    }

    /// Reconcile shapes against the first item and stack everything
    ///
    /// # Errors
    ///
    /// Returns `MaskLoadError::NoValidFrames` when nothing was pushed
    pub fn finish(self) -> Result<OutputBundle> {
        if self.is_empty() {
            return Err(MaskLoadError::NoValidFrames);
        }
        let reference = self.reference.ok_or(MaskLoadError::NoValidFrames)?;
        let ref_height = NumericValidator::dimension_to_usize(reference.height)?;
        let ref_width = NumericValidator::dimension_to_usize(reference.width)?;

        let mut images = Vec::with_capacity(self.images.len());
        let mut masks = Vec::with_capacity(self.masks.len());

        for (index, (image, mask)) in self.images.into_iter().zip(self.masks).enumerate() {
            let (height, width) = (image.shape()[0], image.shape()[1]);
            if (height, width) == (ref_height, ref_width) {
                images.push(image);
                masks.push(mask);
                continue;
            }

            log::warn!(
                "Item {} is {}x{}, resampling to batch reference {}",
                index,
                width,
                height,
                reference
            );
            images.push(bilinear(image.view(), ref_height, ref_width));
            let mask = bilinear(mask.view().insert_axis(Axis(2)), ref_height, ref_width);
            masks.push(mask.index_axis_move(Axis(2), 0));
        }

        let image_views: Vec<_> = images.iter().map(|a| a.view()).collect();
        let mask_views: Vec<_> = masks.iter().map(|m| m.view()).collect();
        let images = ndarray::stack(Axis(0), &image_views)
            .map_err(|e| MaskLoadError::internal(format!("Failed to stack images: {}", e)))?;
        let masks = ndarray::stack(Axis(0), &mask_views)
            .map_err(|e| MaskLoadError::internal(format!("Failed to stack masks: {}", e)))?;

        Ok(OutputBundle {
            images,
            masks,
            width: reference.width,
            height: reference.height,
        })
    }
}

fn normalize(raw: &[u8]) -> Vec<f32> {
    raw.iter().map(|&v| f32::from(v) / 255.0).collect()
}

/// Bilinear resample of an (H, W, C) tensor with half-pixel centers
fn bilinear(src: ArrayView3<'_, f32>, out_height: usize, out_width: usize) -> Array3<f32> {
    let (in_height, in_width, channels) = src.dim();
    let mut out = Array3::<f32>::zeros((out_height, out_width, channels));
    if in_height == 0 || in_width == 0 {
        return out;
    }

    let rows: Vec<_> = (0..out_height)
        .map(|y| sample_axis(y, in_height, out_height))
        .collect();
    let cols: Vec<_> = (0..out_width)
        .map(|x| sample_axis(x, in_width, out_width))
        .collect();

    for (y, &(y0, y1, wy)) in rows.iter().enumerate() {
        for (x, &(x0, x1, wx)) in cols.iter().enumerate() {
            for c in 0..channels {
                let top = src[[y0, x0, c]] * (1.0 - wx) + src[[y0, x1, c]] * wx;
                let bottom = src[[y1, x0, c]] * (1.0 - wx) + src[[y1, x1, c]] * wx;
                out[[y, x, c]] = top * (1.0 - wy) + bottom * wy;
            }
        }
    }
    out
}

/// Neighbouring source indices and interpolation weight for one output index
fn sample_axis(index: usize, in_len: usize, out_len: usize) -> (usize, usize, f32) {
    let scale = in_len as f32 / out_len as f32;
    let center = ((index as f32 + 0.5) * scale - 0.5).max(0.0);
    let lower = (center.floor() as usize).min(in_len - 1);
    let upper = (lower + 1).min(in_len - 1);
    (lower, upper, center - lower as f32)
}
