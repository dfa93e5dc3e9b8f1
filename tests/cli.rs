//! Drive the `stylize` binary end to end without a model.

use std::path::Path;
use std::process::{Command, Output};

use image::{Rgb, RgbImage};

fn stylize(args: &[&Path], model_dir: &Path) -> Output {
    Command::new(env!("CARGO_BIN_EXE_stylize"))
        .args(args)
        .env("STYLIZE_MODEL_PATH", model_dir.join("missing.onnx"))
        .env_remove("RUST_LOG")
        .output()
        .expect("failed to run stylize binary")
}

fn write_jpeg(path: &Path) {
    RgbImage::from_fn(64, 48, |x, y| Rgb([x as u8 * 4, y as u8 * 5, 128]))
        .save(path)
        .unwrap();
}

#[test]
fn test_too_few_arguments_prints_usage() {
    let dir = tempfile::tempdir().unwrap();
    let content = dir.path().join("content.jpg");
    let style = dir.path().join("style.jpg");

    let output = stylize(&[&content, &style], dir.path());

    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("Usage:"));
}

#[test]
fn test_too_many_arguments_prints_usage() {
    let dir = tempfile::tempdir().unwrap();
    let paths: Vec<_> = ["a.jpg", "b.jpg", "c.png", "d.png"]
        .iter()
        .map(|name| dir.path().join(name))
        .collect();
    let args: Vec<&Path> = paths.iter().map(|p| p.as_path()).collect();

    let output = stylize(&args, dir.path());

    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("Usage:"));
    assert!(!paths[2].exists());
    assert!(!paths[3].exists());
}

#[test]
fn test_no_arguments_prints_usage() {
    let dir = tempfile::tempdir().unwrap();

    let output = stylize(&[], dir.path());

    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("Usage:"));
}

#[test]
fn test_corrupted_content_fails_without_output() {
    let dir = tempfile::tempdir().unwrap();
    let content = dir.path().join("content.jpg");
    let style = dir.path().join("style.jpg");
    let out = dir.path().join("out.png");
    std::fs::write(&content, b"definitely not a jpeg").unwrap();
    write_jpeg(&style);

    let output = stylize(&[&content, &style, &out], dir.path());

    assert!(!output.status.success());
    assert!(!out.exists());
}

#[test]
fn test_missing_model_fails_without_output() {
    let dir = tempfile::tempdir().unwrap();
    let content = dir.path().join("content.jpg");
    let style = dir.path().join("style.jpg");
    let out = dir.path().join("out.png");
    write_jpeg(&content);
    write_jpeg(&style);

    let output = stylize(&[&content, &style, &out], dir.path());

    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stdout).contains("fetch-model"));
    assert!(!out.exists());
}

#[test]
fn test_fetch_model_copies_local_conversion() {
    let dir = tempfile::tempdir().unwrap();
    let converted = dir.path().join("style.onnx");
    let models = dir.path().join("models");
    std::fs::write(&converted, b"converted model").unwrap();

    let output = Command::new(env!("CARGO_BIN_EXE_fetch-model"))
        .arg("--url")
        .arg(&converted)
        .env("STYLIZE_MODEL_DIR", &models)
        .env_remove("STYLIZE_MODEL_URL")
        .output()
        .expect("failed to run fetch-model binary");

    assert!(output.status.success());
    let fetched = models.join(stylize::model::MODEL_FILENAME);
    assert_eq!(std::fs::read(fetched).unwrap(), b"converted model");
}
