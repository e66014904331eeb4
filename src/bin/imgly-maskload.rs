//! IMG.LY Mask Loader CLI Tool
//!
//! Loads images with their masks, resizes them to a common geometry and writes
//! the resulting pairs as PNG files.

#[cfg(feature = "cli")]
use imgly_maskload::cli;

#[cfg(feature = "cli")]
fn main() -> anyhow::Result<()> {
    cli::main()
}

#[cfg(not(feature = "cli"))]
fn main() {
    eprintln!("CLI feature not enabled. Please rebuild with --features cli");
    std::process::exit(1);
}
