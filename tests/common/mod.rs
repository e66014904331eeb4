//! Shared fixtures for integration tests
//!
//! Images are generated in memory and written into temporary directories, so
//! the tests need no checked-in assets.

#![allow(dead_code)]

use image::{DynamicImage, ImageFormat, Rgb, RgbImage, Rgba, RgbaImage};
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};
use zip::write::SimpleFileOptions;

/// Route `log` output through the test harness
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Horizontal gradient so resampled content stays distinguishable
pub fn gradient(width: u32, height: u32) -> RgbImage {
    RgbImage::from_fn(width, height, |x, y| {
        Rgb([
            (x * 255 / width.max(1)) as u8,
            (y * 255 / height.max(1)) as u8,
            128,
        ])
    })
}

pub fn encode(image: &DynamicImage, format: ImageFormat) -> Vec<u8> {
    let mut bytes = Cursor::new(Vec::new());
    image.write_to(&mut bytes, format).expect("Failed to encode fixture");
    bytes.into_inner()
}

/// Write an opaque gradient image; the format follows the extension
pub fn write_image(dir: &Path, name: &str, width: u32, height: u32) -> PathBuf {
    let path = dir.join(name);
    DynamicImage::ImageRgb8(gradient(width, height))
        .save(&path)
        .expect("Failed to write fixture image");
    path
}

/// Write an RGBA PNG whose left half is transparent
pub fn write_half_transparent_png(dir: &Path, name: &str, width: u32, height: u32) -> PathBuf {
    let path = dir.join(name);
    let rgba = RgbaImage::from_fn(width, height, |x, _| {
        Rgba([200, 50, 25, if x < width / 2 { 0 } else { 255 }])
    });
    DynamicImage::ImageRgba8(rgba)
        .save(&path)
        .expect("Failed to write fixture image");
    path
}

/// Write a zip archive holding the given (name, bytes) entries
pub fn write_zip(dir: &Path, name: &str, entries: &[(&str, Vec<u8>)]) -> PathBuf {
    let path = dir.join(name);
    let file = std::fs::File::create(&path).expect("Failed to create archive");
    let mut zip = zip::ZipWriter::new(file);
    let options = SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);
    for (entry, bytes) in entries {
        if entry.ends_with('/') {
            zip.add_directory(*entry, options).expect("Failed to add directory");
        } else {
            zip.start_file(*entry, options).expect("Failed to start entry");
            zip.write_all(bytes).expect("Failed to write entry");
        }
    }
    zip.finish().expect("Failed to finish archive");
    path
}

/// PNG bytes of an opaque gradient
pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    encode(&DynamicImage::ImageRgb8(gradient(width, height)), ImageFormat::Png)
}
