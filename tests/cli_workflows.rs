//! CLI integration tests for batch processing
//!
//! Runs the binary against a temporary input directory and checks the written
//! pairs and the JSON summary.

#![cfg(feature = "cli")]

mod common;

use common::write_image;
use std::fs;
use std::process::Command;
use tempfile::TempDir;

fn cli() -> Command {
    Command::new(env!("CARGO_BIN_EXE_imgly-maskload"))
}

#[test]
fn test_cli_batch_writes_numbered_pairs() {
    let input = TempDir::new().expect("Failed to create temp directory");
    let output = TempDir::new().expect("Failed to create temp directory");
    let batch = input.path().join("batch");
    fs::create_dir(&batch).unwrap();

    for name in ["z_last.png", "a_first.png", "img10.png", "img2.png"] {
        write_image(&batch, name, 30, 20);
    }
    fs::write(batch.join("notes.txt"), b"ignored").unwrap();

    let result = cli()
        .arg("--mode")
        .arg("batch")
        .arg("--batch-path")
        .arg("batch")
        .arg("--input-dir")
        .arg(input.path())
        .arg("--output-dir")
        .arg(output.path())
        .args(["--width", "64", "--height", "32"])
        .output()
        .expect("Failed to execute CLI");
    assert!(
        result.status.success(),
        "CLI failed: {}",
        String::from_utf8_lossy(&result.stderr)
    );

    let summary: serde_json::Value =
        serde_json::from_slice(&result.stdout).expect("Summary is not JSON");
    assert_eq!(summary["count"], 4);
    assert_eq!(summary["width"], 64);
    assert_eq!(summary["height"], 32);
    assert_eq!(summary["fingerprint"].as_str().map(str::len), Some(64));

    for index in 0..4 {
        let image = image::open(output.path().join(format!("image_{:04}.png", index))).unwrap();
        let mask = image::open(output.path().join(format!("mask_{:04}.png", index))).unwrap();
        assert_eq!((image.width(), image.height()), (64, 32));
        assert_eq!((mask.width(), mask.height()), (64, 32));
    }
    assert!(!output.path().join("image_0004.png").exists());
}

#[test]
fn test_cli_validate_and_fingerprint_only() {
    let input = TempDir::new().unwrap();
    write_image(input.path(), "photo.png", 10, 10);

    let valid = cli()
        .arg("photo.png")
        .arg("--input-dir")
        .arg(input.path())
        .arg("--validate-only")
        .output()
        .unwrap();
    assert!(valid.status.success());

    let missing = cli()
        .arg("ghost.png")
        .arg("--input-dir")
        .arg(input.path())
        .arg("--validate-only")
        .output()
        .unwrap();
    assert!(!missing.status.success());

    let fingerprint = cli()
        .arg("photo.png")
        .arg("--input-dir")
        .arg(input.path())
        .arg("--fingerprint-only")
        .output()
        .unwrap();
    assert!(fingerprint.status.success());
    assert_eq!(String::from_utf8_lossy(&fingerprint.stdout).trim().len(), 64);
}

#[test]
fn test_cli_lists_input_files() {
    let input = TempDir::new().unwrap();
    write_image(input.path(), "b.png", 2, 2);
    write_image(input.path(), "a.png", 2, 2);

    let listed = cli()
        .arg("--input-dir")
        .arg(input.path())
        .arg("--list-inputs")
        .output()
        .unwrap();
    assert!(listed.status.success());
    let stdout = String::from_utf8_lossy(&listed.stdout);
    assert_eq!(stdout.lines().collect::<Vec<_>>(), vec!["a.png", "b.png"]);
}
