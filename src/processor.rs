//! Image and mask loading processor
//!
//! This module provides `MaskLoadProcessor`, which runs one invocation end to
//! end: source resolution, decoding, mask derivation, resizing and batch
//! reconciliation. Both the library API and the CLI go through it so they
//! behave identically.

use crate::{
    config::{LoadMode, LoadRequest},
    error::{MaskLoadError, Result},
    mask::MaskDeriver,
    reconcile::BatchReconciler,
    resize::ResizeEngine,
    services::{
        io::decode_with_context, ChangeFingerprint, FrameDecoder, ImageFrameDecoder, PathResolver,
        SourceResolver,
    },
    types::{BatchItem, ImageMaskPair, OutputBundle},
    utils::ConfigValidator,
};
use image::GrayImage;
use instant::Instant;
use log::{debug, info};
use std::path::{Path, PathBuf};
use tracing::{info as trace_info, instrument, span, Level};
use walkdir::WalkDir;

/// Loads images with masks from an input root
pub struct MaskLoadProcessor {
    sources: SourceResolver,
    decoder: Box<dyn FrameDecoder>,
}

impl MaskLoadProcessor {
    /// Create a processor reading from `input_root` with the default decoder
    pub fn new<P: Into<PathBuf>>(input_root: P) -> Self {
        Self::with_decoder(input_root, Box::new(ImageFrameDecoder::new()))
    }

    /// Create a processor with a custom frame decoder
    pub fn with_decoder<P: Into<PathBuf>>(input_root: P, decoder: Box<dyn FrameDecoder>) -> Self {
        Self {
            sources: SourceResolver::new(PathResolver::new(input_root)),
            decoder,
        }
    }

    #[must_use]
    pub fn input_root(&self) -> &Path {
        self.sources.paths().input_root()
    }

    /// Check a request before loading
    ///
    /// # Errors
    ///
    /// Returns `MaskLoadError` when a parameter is out of range, the single
    /// mode image does not resolve, or the batch path is missing or does not
    /// resolve.
    pub fn validate_inputs(&self, request: &LoadRequest) -> Result<()> {
        ConfigValidator::validate_request(request)?;
        self.resolve_location(request).map(|_| ())
    }

    /// Digest identifying the effective inputs of a request
    ///
    /// Single mode hashes the file content, batch mode the resolved location
    /// and its modification time. The mask payload is appended in both cases.
    ///
    /// # Errors
    ///
    /// Returns `MaskLoadError` when the location cannot be resolved or read
    pub fn fingerprint(&self, request: &LoadRequest) -> Result<String> {
        let location = self.resolve_location(request)?;
        let mask = request.mask_data.as_deref();
        match request.mode {
            LoadMode::Single => ChangeFingerprint::for_file_content(&location, mask),
            LoadMode::Batch => ChangeFingerprint::for_location(&location, mask),
        }
    }

    /// Regular files directly inside the input root, sorted by name
    ///
    /// # Errors
    ///
    /// Returns `MaskLoadError::Io` when the input root cannot be listed
    pub fn list_input_files(&self) -> Result<Vec<String>> {
        let root = self.input_root();
        let mut files = Vec::new();
        for entry in WalkDir::new(root).min_depth(1).max_depth(1).sort_by_file_name() {
            let entry = entry.map_err(|e| {
                MaskLoadError::processing(format!("Failed to list {}: {}", root.display(), e))
            })?;
            if entry.file_type().is_file() {
                files.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
        Ok(files)
    }

    /// Load every frame named by `request` as one stacked bundle
    ///
    /// # Errors
    ///
    /// Returns `MaskLoadError` for:
    /// - Invalid parameters or unresolvable sources
    /// - Batch locations without recognized images
    /// - Read or decode failures of any source
    /// - A run that produced no frames
    #[instrument(
        skip(self, request),
        fields(
            mode = %request.mode,
            target = %format!("{}x{}", request.width, request.height),
            short_side = request.resize_short_side
        )
    )]
    pub fn load(&self, request: &LoadRequest) -> Result<OutputBundle> {
        let total_start = Instant::now();
        ConfigValidator::validate_request(request)?;

        let sources = self.sources.resolve(
            request.mode,
            request.image.as_deref(),
            request.batch_path.as_deref(),
        )?;
        let external_mask = request
            .effective_mask_data()
            .and_then(|mask| self.load_external_mask(mask));

        let target_spec = request.target_spec();
        let engine = ResizeEngine::new(request.upscale_method, request.fitting_policy());
        let mut reconciler = BatchReconciler::new(target_spec.is_per_item());

        trace_info!(
            sources = sources.len(),
            policy = ?engine.policy(),
            filter = %engine.filter(),
            "Starting load"
        );

        for source in sources {
            let frames = {
                let _span = span!(Level::DEBUG, "decode", source = %source).entered();
                let data = source.read_bytes()?;
                decode_with_context(self.decoder.as_ref(), &data, &source.name())?
            };

            for (frame_index, frame) in frames.into_iter().enumerate() {
                let item = BatchItem {
                    source: source.clone(),
                    frame_index,
                };
                let _span = span!(Level::DEBUG, "item", item = %item).entered();

                let mask = MaskDeriver::derive(&frame, external_mask.as_ref())?;
                debug!("Mask coverage for {}: {:.3}", item, MaskDeriver::coverage(&mask));
                let pair = ImageMaskPair::new(frame.image, mask)?;
                let target = reconciler.target_for(target_spec.resolve_for(pair.size())?);
                debug!("Resizing {} from {} to {}", item, pair.size(), target);

                reconciler.push(engine.apply(&pair, target)?)?;
                log::trace!("{} item(s) accepted", reconciler.len());
            }
        }

        let bundle = reconciler.finish()?;
        info!(
            "Loaded {} item(s) at {}x{} in {}ms",
            bundle.len(),
            bundle.width,
            bundle.height,
            total_start.elapsed().as_millis()
        );
        Ok(bundle)
    }

    /// Resolve the file (single) or location (batch) a request points at
    fn resolve_location(&self, request: &LoadRequest) -> Result<PathBuf> {
        let paths = self.sources.paths();
        match request.mode {
            LoadMode::Single => {
                let image = request
                    .image
                    .as_deref()
                    .filter(|i| !i.trim().is_empty())
                    .ok_or_else(|| MaskLoadError::invalid_config("No image selected in single mode"))?;
                paths.resolve_existing(image)
            },
            LoadMode::Batch => {
                let batch_path = request
                    .batch_path
                    .as_deref()
                    .filter(|p| !p.trim().is_empty())
                    .ok_or_else(|| {
                        MaskLoadError::invalid_config("Batch path is required in batch mode")
                    })?;
                paths.resolve_existing(batch_path)
            },
        }
    }

    fn load_external_mask(&self, mask: &str) -> Option<GrayImage> {
        match self.sources.paths().resolve(mask) {
            Some(path) => MaskDeriver::try_load_external(path),
            None => {
                log::warn!("External mask '{}' not found, falling back to alpha/zero mask", mask);
                None
            },
        }
    }
}
