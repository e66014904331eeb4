//! Numeric validation utilities
//!
//! Safe conversions for the float arithmetic used by resize planning.

use crate::error::{MaskLoadError, Result};

/// Validator for numeric operations and conversions
pub struct NumericValidator;

impl NumericValidator {
    /// Safely convert f64 to u32 with bounds checking
    pub fn validate_f64_to_u32(value: f64) -> Result<u32> {
        if !value.is_finite() {
            return Err(MaskLoadError::processing(format!(
                "Cannot convert non-finite value {} to u32",
                value
            )));
        }

        if value < 0.0 {
            return Err(MaskLoadError::processing(format!(
                "Cannot convert negative value {} to u32",
                value
            )));
        }

        if value > f64::from(u32::MAX) {
            return Err(MaskLoadError::processing(format!(
                "Value {} exceeds u32::MAX ({})",
                value,
                u32::MAX
            )));
        }

        Ok(value as u32)
    }

    /// Round a scaled dimension to the nearest pixel, never below one pixel
    pub fn scaled_dimension(source: u32, ratio: f64) -> Result<u32> {
        let scaled = Self::validate_f64_to_u32((f64::from(source) * ratio).round())?;
        Ok(scaled.max(1))
    }

    /// Convert a u32 dimension to usize for tensor allocation
    pub fn dimension_to_usize(value: u32) -> Result<usize> {
        usize::try_from(value).map_err(|_| {
            MaskLoadError::processing(format!(
                "Dimension {} too large for usize conversion in tensor allocation",
                value
            ))
        })
    }
}
