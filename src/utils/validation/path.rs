//! Path validation utilities
//!
//! Provides centralized checks for file paths and recognized extensions.

use crate::error::{MaskLoadError, Result};
use std::path::Path;

/// Validator for file system paths and extensions
pub struct PathValidator;

impl PathValidator {
    /// Validate that a file exists
    pub fn validate_file_exists<P: AsRef<Path>>(path: P) -> Result<()> {
        let path_ref = path.as_ref();
        if !path_ref.exists() {
            return Err(MaskLoadError::source_not_found(format!(
                "File does not exist: {}",
                path_ref.display()
            )));
        }
        Ok(())
    }

    /// Check if a file name has a recognized image extension
    pub fn is_supported_image_format<P: AsRef<Path>>(path: P) -> bool {
        path.as_ref()
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| {
                Self::supported_image_extensions().contains(&ext.to_lowercase().as_str())
            })
    }

    /// Check if a path names a zip archive
    pub fn is_zip_archive<P: AsRef<Path>>(path: P) -> bool {
        path.as_ref()
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("zip"))
    }

    /// Get the list of recognized image extensions
    pub fn supported_image_extensions() -> &'static [&'static str] {
        &["png", "jpg", "jpeg", "webp", "bmp", "gif", "tif", "tiff"]
    }
}
