//! Mask loader CLI tool
//!
//! Command-line interface that runs one load invocation against an input
//! directory and writes the resulting image/mask pairs as PNG files.

use super::config::CliConfigBuilder;
use crate::{
    config::{DEFAULT_DIVISIBLE_BY, DEFAULT_HEIGHT, DEFAULT_WIDTH},
    processor::MaskLoadProcessor,
    tracing_config::{init_cli_tracing, TracingFormat},
    types::OutputBundle,
};
use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use log::{info, warn};
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Image and mask loader CLI tool
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(name = "imgly-maskload")]
#[allow(clippy::struct_excessive_bools)]
pub struct Cli {
    /// Load one file or a batch location
    #[arg(long, value_enum, default_value_t = CliMode::Single)]
    pub mode: CliMode,

    /// Image file name under the input directory (single mode)
    #[arg(value_name = "IMAGE")]
    pub image: Option<String>,

    /// Directory, zip archive, or path relative to the input directory (batch mode)
    #[arg(short, long, value_name = "PATH")]
    pub batch_path: Option<String>,

    /// Directory that file references are resolved against
    #[arg(short, long, value_name = "DIR", default_value = ".")]
    pub input_dir: PathBuf,

    /// Directory for image_NNNN.png / mask_NNNN.png outputs
    #[arg(short, long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Target width before divisibility flooring
    #[arg(long, default_value_t = DEFAULT_WIDTH)]
    pub width: u32,

    /// Target height before divisibility flooring
    #[arg(long, default_value_t = DEFAULT_HEIGHT)]
    pub height: u32,

    /// Shortest output side derived from each image's aspect ratio (0 = off)
    #[arg(long, default_value_t = 0)]
    pub resize_short_side: u32,

    /// Resampling filter (nearest-exact, bilinear, area, bicubic, lanczos)
    #[arg(long, default_value = "bicubic")]
    pub upscale_method: String,

    /// Fitting policy (stretch, crop, pad)
    #[arg(long, default_value = "crop")]
    pub keep_proportion: String,

    /// Crop anchor (center, top, bottom, left, right)
    #[arg(long, default_value = "center")]
    pub crop_position: String,

    /// Output dimensions are floored to a multiple of this value
    #[arg(long, default_value_t = DEFAULT_DIVISIBLE_BY)]
    pub divisible_by: u32,

    /// Brush mask file under the input directory (single mode only)
    #[arg(long, value_name = "FILE")]
    pub mask_data: Option<String>,

    /// Validate the inputs and exit
    #[arg(long)]
    pub validate_only: bool,

    /// Print the change fingerprint and exit
    #[arg(long)]
    pub fingerprint_only: bool,

    /// List the files of the input directory and exit
    #[arg(long)]
    pub list_inputs: bool,

    /// Log output format
    #[arg(long, value_enum, default_value_t = CliLogFormat::Console)]
    pub log_format: CliLogFormat,

    /// Enable verbose logging (-v: DEBUG, -vv: TRACE)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum, Debug)]
pub enum CliMode {
    Single,
    Batch,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum, Debug)]
pub enum CliLogFormat {
    Console,
    Compact,
    #[cfg(feature = "tracing-json")]
    Json,
}

impl From<CliLogFormat> for TracingFormat {
    fn from(format: CliLogFormat) -> Self {
        match format {
            CliLogFormat::Console => TracingFormat::Console,
            CliLogFormat::Compact => TracingFormat::Compact,
            #[cfg(feature = "tracing-json")]
            CliLogFormat::Json => TracingFormat::Json,
        }
    }
}

/// Machine-readable result printed to stdout
#[derive(Debug, Serialize)]
struct RunSummary {
    count: usize,
    width: u32,
    height: u32,
    fingerprint: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    outputs: Vec<PathBuf>,
}

pub fn main() -> Result<()> {
    let cli = Cli::parse();

    init_cli_tracing(cli.verbose, cli.log_format.into())
        .context("Failed to initialize tracing")?;

    let processor = MaskLoadProcessor::new(&cli.input_dir);

    if cli.list_inputs {
        for file in processor
            .list_input_files()
            .with_context(|| format!("Failed to list {}", cli.input_dir.display()))?
        {
            println!("{}", file);
        }
        return Ok(());
    }

    let request = CliConfigBuilder::from_cli(&cli).context("Invalid CLI arguments")?;

    processor
        .validate_inputs(&request)
        .context("Input validation failed")?;
    if cli.validate_only {
        info!("Inputs are valid");
        return Ok(());
    }

    let fingerprint = processor
        .fingerprint(&request)
        .context("Failed to compute change fingerprint")?;
    if cli.fingerprint_only {
        println!("{}", fingerprint);
        return Ok(());
    }

    let bundle = processor.load(&request).context("Failed to load images")?;

    let outputs = match &cli.output_dir {
        Some(dir) => write_outputs(&bundle, dir)?,
        None => {
            warn!("No --output-dir given, results are not written");
            Vec::new()
        },
    };

    let summary = RunSummary {
        count: bundle.len(),
        width: bundle.width,
        height: bundle.height,
        fingerprint,
        outputs,
    };
    println!(
        "{}",
        serde_json::to_string_pretty(&summary).context("Failed to serialize summary")?
    );
    Ok(())
}

/// Write every stacked pair as `image_NNNN.png` and `mask_NNNN.png`
fn write_outputs(bundle: &OutputBundle, dir: &Path) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create output directory {}", dir.display()))?;

    let mut written = Vec::with_capacity(bundle.len() * 2);
    for index in 0..bundle.len() {
        let image = bundle
            .image_at(index)
            .with_context(|| format!("Missing image {}", index))?;
        let mask = bundle
            .mask_at(index)
            .with_context(|| format!("Missing mask {}", index))?;

        let image_path = dir.join(format!("image_{:04}.png", index));
        let mask_path = dir.join(format!("mask_{:04}.png", index));
        image
            .save(&image_path)
            .with_context(|| format!("Failed to write {}", image_path.display()))?;
        mask.save(&mask_path)
            .with_context(|| format!("Failed to write {}", mask_path.display()))?;

        info!("Wrote {} and {}", image_path.display(), mask_path.display());
        written.push(image_path);
        written.push(mask_path);
    }
    Ok(written)
}
