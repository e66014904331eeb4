//! Request parameter validation

use crate::config::{LoadRequest, MAX_DIMENSION, MAX_DIVISIBLE_BY};
use crate::error::{MaskLoadError, Result};

/// Validator for `LoadRequest` parameters
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate every numeric parameter of a request
    pub fn validate_request(request: &LoadRequest) -> Result<()> {
        Self::validate_dimension("width", request.width)?;
        Self::validate_dimension("height", request.height)?;
        Self::validate_divisible_by(request.divisible_by)?;

        if request.resize_short_side > MAX_DIMENSION {
            return Err(MaskLoadError::config_value_error(
                "resize_short_side",
                request.resize_short_side,
                &format!("0-{}", MAX_DIMENSION),
                None,
            ));
        }
        Ok(())
    }

    /// Validate a requested output dimension
    pub fn validate_dimension(name: &str, value: u32) -> Result<()> {
        if value == 0 || value > MAX_DIMENSION {
            return Err(MaskLoadError::config_value_error(
                name,
                value,
                &format!("1-{}", MAX_DIMENSION),
                None,
            ));
        }
        Ok(())
    }

    /// Validate the divisibility constraint
    pub fn validate_divisible_by(value: u32) -> Result<()> {
        if value == 0 || value > MAX_DIVISIBLE_BY {
            return Err(MaskLoadError::config_value_error(
                "divisible_by",
                value,
                &format!("1-{}", MAX_DIVISIBLE_BY),
                Some(crate::config::DEFAULT_DIVISIBLE_BY),
            ));
        }
        Ok(())
    }
}
