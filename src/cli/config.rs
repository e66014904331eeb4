//! Conversion of CLI arguments into a `LoadRequest`

use crate::cli::main_impl::{Cli, CliMode};
use crate::config::{CropPosition, KeepProportion, LoadMode, LoadRequest, ResampleFilter};
use anyhow::{Context, Result};

/// Convert CLI arguments to a validated `LoadRequest`
pub(crate) struct CliConfigBuilder;

impl CliConfigBuilder {
    pub(crate) fn from_cli(cli: &Cli) -> Result<LoadRequest> {
        let mode = match cli.mode {
            CliMode::Single => LoadMode::Single,
            CliMode::Batch => LoadMode::Batch,
        };
        let keep_proportion: KeepProportion = cli
            .keep_proportion
            .parse()
            .context("Invalid keep-proportion")?;

        let mut builder = LoadRequest::builder()
            .mode(mode)
            .width(cli.width)
            .height(cli.height)
            .resize_short_side(cli.resize_short_side)
            .upscale_method(ResampleFilter::from_name(&cli.upscale_method))
            .keep_proportion(keep_proportion)
            .crop_position(CropPosition::from_name(&cli.crop_position))
            .divisible_by(cli.divisible_by);

        if let Some(image) = &cli.image {
            builder = builder.image(image.clone());
        }
        if let Some(batch_path) = &cli.batch_path {
            builder = builder.batch_path(batch_path.clone());
        }
        if let Some(mask) = &cli.mask_data {
            if mode == LoadMode::Batch {
                log::warn!("--mask-data is ignored in batch mode");
            }
            builder = builder.mask_data(mask.clone());
        }

        builder.build().context("Invalid load parameters")
    }
}
