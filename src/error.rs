//! Error types for image and mask loading operations

use thiserror::Error;

/// Result type alias for loading operations
pub type Result<T> = std::result::Result<T, MaskLoadError>;

/// Error types for loading, resizing and batching images with masks
#[derive(Error, Debug)]
pub enum MaskLoadError {
    /// Input/output errors (file not found, permission denied, etc.)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Image decoding or buffer errors
    #[error("Image processing error: {0}")]
    Image(#[from] image::ImageError),

    /// Zip archive enumeration or extraction errors
    #[error("Archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    /// Invalid configuration or parameters
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A file reference or batch location could not be resolved
    #[error("Source not found: {0}")]
    SourceNotFound(String),

    /// A resolved batch location holds no recognized image files
    #[error("No image files found in {0}")]
    NoImagesFound(String),

    /// Decoding produced no frames at all
    #[error("No valid image frames were produced")]
    NoValidFrames,

    /// Resize or tensor processing errors
    #[error("Processing error: {0}")]
    Processing(String),

    /// Generic error for unexpected conditions
    #[error("Internal error: {0}")]
    Internal(String),
}

impl MaskLoadError {
    /// Create a new invalid configuration error
    pub fn invalid_config<S: Into<String>>(msg: S) -> Self {
        Self::InvalidConfig(msg.into())
    }

    /// Create a new source-not-found error
    pub fn source_not_found<S: Into<String>>(locator: S) -> Self {
        Self::SourceNotFound(locator.into())
    }

    /// Create a new processing error
    pub fn processing<S: Into<String>>(msg: S) -> Self {
        Self::Processing(msg.into())
    }

    /// Create a new internal error
    pub fn internal<S: Into<String>>(msg: S) -> Self {
        Self::Internal(msg.into())
    }

    /// Create file I/O error with operation context
    pub fn file_io_error<P: AsRef<std::path::Path>>(
        operation: &str,
        path: P,
        error: &std::io::Error,
    ) -> Self {
        let path_display = path.as_ref().display();
        Self::Io(std::io::Error::new(
            error.kind(),
            format!("Failed to {} '{}': {}", operation, path_display, error),
        ))
    }

    /// Create configuration error with valid ranges
    pub fn config_value_error<T: std::fmt::Display>(
        parameter: &str,
        value: T,
        valid_range: &str,
        recommended: Option<T>,
    ) -> Self {
        let recommendation = match recommended {
            Some(rec) => format!(" Recommended: {}", rec),
            None => String::new(),
        };

        Self::InvalidConfig(format!(
            "Invalid {}: {} (valid range: {}).{}",
            parameter, value, valid_range, recommendation
        ))
    }

    /// Create processing error with stage context
    pub fn processing_stage_error(stage: &str, details: &str, input_info: Option<&str>) -> Self {
        let input_context = match input_info {
            Some(info) => format!(" (input: {})", info),
            None => String::new(),
        };

        Self::Processing(format!(
            "Processing failed at stage '{}'{}: {}",
            stage, input_context, details
        ))
    }

    /// Whether this error aborts the whole invocation as a configuration problem
    #[must_use]
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidConfig(_)
                | Self::SourceNotFound(_)
                | Self::NoImagesFound(_)
                | Self::NoValidFrames
        )
    }
}
