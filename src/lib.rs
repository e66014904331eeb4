#![allow(clippy::too_many_lines)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::uninlined_format_args)]

//! # IMG.LY Mask Loader
//!
//! Loads one image, a directory of images, or the images inside a zip archive
//! together with a per-image mask, resizes every frame to a common target
//! geometry, and returns the results stacked as float tensors ready for
//! downstream image pipelines.
//!
//! ## Features
//!
//! - **Mask Derivation**: external brush masks, inverted alpha channels, or empty masks
//! - **Fitting Policies**: stretch, crop (five anchors) and pad to the exact target size
//! - **Resampling Filters**: nearest, bilinear, area, bicubic and Lanczos
//! - **Batch Sources**: single files, directories and zip archives, sorted by name
//! - **Animated Formats**: GIF, APNG and WebP frames are loaded individually
//! - **Shortest Side Targets**: per-image targets derived from each image's aspect ratio
//! - **Change Fingerprints**: SHA-256 digests for skipping unchanged work
//! - **CLI Integration**: optional command-line interface (enable with `cli` feature)
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use imgly_maskload::{KeepProportion, LoadMode, LoadRequest, MaskLoadProcessor};
//!
//! # fn example() -> anyhow::Result<()> {
//! let request = LoadRequest::builder()
//!     .mode(LoadMode::Batch)
//!     .batch_path("frames.zip")
//!     .width(512)
//!     .height(512)
//!     .keep_proportion(KeepProportion::Crop)
//!     .build()?;
//!
//! let processor = MaskLoadProcessor::new("input");
//! let bundle = processor.load(&request)?;
//! println!("{} images at {}x{}", bundle.len(), bundle.width, bundle.height);
//! # Ok(())
//! # }
//! ```
//!
//! ### Feature Flags
//!
//! - `cli` (default): Command-line interface and tracing setup
//! - `webp-support` (default): WebP image format support
//! - `tracing-json`: JSON log output for the CLI
//!
//! ### Library-Only Usage
//!
//! ```toml
//! [dependencies]
//! imgly-maskload = { version = "0.1", default-features = false, features = ["webp-support"] }
//! ```

#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod error;
pub mod mask;
pub mod processor;
pub mod reconcile;
pub mod resize;
pub mod services;
#[cfg(feature = "cli")]
pub mod tracing_config;
pub mod types;
pub mod utils;

use std::path::PathBuf;

// Public API exports
pub use config::{CropPosition, KeepProportion, LoadMode, LoadRequest, ResampleFilter};
pub use error::{MaskLoadError, Result};
pub use mask::MaskDeriver;
pub use processor::MaskLoadProcessor;
pub use reconcile::BatchReconciler;
pub use resize::{
    floor_to_multiple, FittingPolicy, Placement, ResizeEngine, ResizePlan, Size, TargetSpec,
};
pub use services::{
    ChangeFingerprint, FrameDecoder, ImageFrameDecoder, ImageSource, PathResolver,
    ResolveStrategy, SourceResolver,
};
pub use types::{BatchItem, DecodedFrame, ImageMaskPair, OutputBundle};
pub use utils::{ConfigValidator, NumericValidator, PathValidator};

#[cfg(feature = "cli")]
pub use tracing_config::{init_cli_tracing, TracingConfig, TracingFormat};

/// Load images and masks for `request` from `input_root`
///
/// Shorthand for [`MaskLoadProcessor::load`] with the default decoder.
///
/// # Examples
///
/// ```rust,no_run
/// use imgly_maskload::{load_images, LoadRequest};
///
/// # fn example() -> anyhow::Result<()> {
/// let request = LoadRequest::builder().image("photo.png").build()?;
/// let bundle = load_images("input", &request)?;
/// let first = bundle.image_at(0).expect("one image");
/// first.save("resized.png")?;
/// # Ok(())
/// # }
/// ```
pub fn load_images<P: Into<PathBuf>>(input_root: P, request: &LoadRequest) -> Result<OutputBundle> {
    MaskLoadProcessor::new(input_root).load(request)
}

/// Change fingerprint of `request` against `input_root`
pub fn fingerprint<P: Into<PathBuf>>(input_root: P, request: &LoadRequest) -> Result<String> {
    MaskLoadProcessor::new(input_root).fingerprint(request)
}
