//! Pipeline behavior with a deterministic stand-in for the style model.

use std::fs;
use std::path::Path;
use std::time::{Duration, Instant};

use image::{GenericImageView, Rgb, RgbImage};
use stylize::image::ImageTensor;
use stylize::{BatchReport, Config, Error, StyleModel, Stylizer};

/// Mixes each content pixel with the mean style colour.
struct MeanColorModel;

impl StyleModel for MeanColorModel {
    fn stylize(&mut self, content: &ImageTensor, style: &ImageTensor) -> stylize::Result<ImageTensor> {
        let pixels = (style.len() / 3) as f32;
        let mut mean = [0.0f32; 3];
        for (i, v) in style.iter().enumerate() {
            mean[i % 3] += v / pixels;
        }

        let mut out = content.clone();
        for (i, v) in out.iter_mut().enumerate() {
            *v = 0.5 * *v + 0.5 * mean[i % 3];
        }
        Ok(out)
    }
}

/// Returns a batch of two, which no caller should ever produce.
struct DoubleBatchModel;

impl StyleModel for DoubleBatchModel {
    fn stylize(&mut self, content: &ImageTensor, _style: &ImageTensor) -> stylize::Result<ImageTensor> {
        let (_, h, w, c) = content.dim();
        Ok(ImageTensor::zeros((2, h, w, c)))
    }
}

fn stylizer() -> Stylizer<MeanColorModel> {
    Stylizer::with_model(Config::default(), MeanColorModel).unwrap()
}

fn write_image(path: &Path, width: u32, height: u32, tint: u8) {
    RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x % 256) as u8, (y % 256) as u8, tint])
    })
    .save(path)
    .unwrap();
}

#[test]
fn test_produces_non_empty_output() {
    let dir = tempfile::tempdir().unwrap();
    let (content, style, out) = (
        dir.path().join("content.jpg"),
        dir.path().join("style.jpg"),
        dir.path().join("out.jpg"),
    );
    write_image(&content, 320, 240, 10);
    write_image(&style, 100, 100, 200);

    stylizer().process(&content, &style, &out).unwrap();

    assert!(fs::metadata(&out).unwrap().len() > 0);
}

#[test]
fn test_output_matches_resized_content_dimensions() {
    let dir = tempfile::tempdir().unwrap();
    let (content, style, out) = (
        dir.path().join("content.png"),
        dir.path().join("style.png"),
        dir.path().join("out.png"),
    );
    write_image(&content, 2048, 1536, 10);
    write_image(&style, 600, 900, 200);

    stylizer().process(&content, &style, &out).unwrap();

    let result = image::open(&out).unwrap();
    assert_eq!(result.dimensions(), (1024, 768));
}

#[test]
fn test_small_content_scaled_up_to_bound() {
    let dir = tempfile::tempdir().unwrap();
    let (content, style, out) = (
        dir.path().join("content.png"),
        dir.path().join("style.png"),
        dir.path().join("out.png"),
    );
    write_image(&content, 300, 500, 10);
    write_image(&style, 50, 50, 200);

    stylizer().process(&content, &style, &out).unwrap();

    // 300 * 1024 / 500 = 614.4
    assert_eq!(image::open(&out).unwrap().dimensions(), (614, 1024));
}

#[test]
fn test_identical_inputs_give_identical_output() {
    let dir = tempfile::tempdir().unwrap();
    let (content, style) = (dir.path().join("content.jpg"), dir.path().join("style.jpg"));
    write_image(&content, 200, 150, 30);
    write_image(&style, 80, 120, 90);

    let first = dir.path().join("first.png");
    let second = dir.path().join("second.png");
    stylizer().process(&content, &style, &first).unwrap();
    stylizer().process(&content, &style, &second).unwrap();

    assert_eq!(fs::read(first).unwrap(), fs::read(second).unwrap());
}

#[test]
fn test_corrupted_input_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let (content, style, out) = (
        dir.path().join("content.jpg"),
        dir.path().join("style.jpg"),
        dir.path().join("out.png"),
    );
    fs::write(&content, b"\xFF\xD8\xFF garbage").unwrap();
    write_image(&style, 50, 50, 200);

    let err = stylizer().process(&content, &style, &out).unwrap_err();

    assert!(matches!(err, Error::ImageLoad { .. }));
    assert!(!out.exists());
}

#[test]
fn test_batched_model_output_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let (content, style, out) = (
        dir.path().join("content.png"),
        dir.path().join("style.png"),
        dir.path().join("out.png"),
    );
    write_image(&content, 40, 30, 10);
    write_image(&style, 40, 30, 200);

    let mut stylizer = Stylizer::with_model(Config::default(), DoubleBatchModel).unwrap();
    let err = stylizer.process(&content, &style, &out).unwrap_err();

    assert!(matches!(err, Error::BatchSize(2)));
    assert!(!out.exists());
}

#[test]
fn test_directory_pass_skips_existing_and_counts_failures() {
    let dir = tempfile::tempdir().unwrap();
    let originals = dir.path().join("originals");
    let output = dir.path().join("images");
    let style = dir.path().join("style.png");
    fs::create_dir(&originals).unwrap();
    write_image(&originals.join("beach.jpg"), 120, 80, 10);
    write_image(&originals.join("forest.png"), 90, 160, 60);
    fs::write(originals.join("notes.txt"), b"not an image").unwrap();
    write_image(&style, 64, 64, 200);

    let mut stylizer = Stylizer::with_model(
        Config {
            content_max_dim: 256,
            ..Config::default()
        },
        MeanColorModel,
    )
    .unwrap();

    let first = stylizer.stylize_dir(&originals, &output, &style).unwrap();
    assert_eq!((first.processed, first.skipped, first.failed), (2, 0, 1));
    assert_eq!(
        image::open(output.join("beach.png")).unwrap().dimensions(),
        (256, 170)
    );
    assert!(output.join("forest.png").is_file());
    assert!(!output.join("notes.png").exists());

    let second = stylizer.stylize_dir(&originals, &output, &style).unwrap();
    assert_eq!((second.processed, second.skipped, second.failed), (0, 2, 1));
}

#[test]
fn test_directory_pass_requires_style() {
    let dir = tempfile::tempdir().unwrap();
    let originals = dir.path().join("originals");
    fs::create_dir(&originals).unwrap();

    let err = stylizer()
        .stylize_dir(&originals, dir.path().join("images"), dir.path().join("nope.png"))
        .unwrap_err();

    assert!(matches!(err, Error::ImageLoad { .. }));
}

#[test]
fn test_watch_stylizes_new_files_and_removes_outputs() {
    let dir = tempfile::tempdir().unwrap();
    let originals = dir.path().join("originals");
    let staging = dir.path().join("staging");
    let output = dir.path().join("images");
    let style = dir.path().join("style.png");
    fs::create_dir(&originals).unwrap();
    fs::create_dir(&staging).unwrap();
    write_image(&originals.join("old.png"), 48, 32, 10);
    write_image(&staging.join("new.png"), 32, 48, 60);
    write_image(&style, 32, 32, 200);

    let changer = {
        let (originals, staging) = (originals.clone(), staging.clone());
        std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(1000));
            // Rename so the watcher never sees a half-written file
            fs::rename(staging.join("new.png"), originals.join("new.png")).unwrap();
            std::thread::sleep(Duration::from_millis(500));
            fs::remove_file(originals.join("old.png")).unwrap();
        })
    };

    let mut stylizer = Stylizer::with_model(
        Config {
            content_max_dim: 64,
            ..Config::default()
        },
        MeanColorModel,
    )
    .unwrap();
    let report = stylizer
        .watch_dir(&originals, &output, &style, Some(Duration::from_secs(4)))
        .unwrap();
    changer.join().unwrap();

    assert!(output.join("new.png").is_file());
    assert!(!output.join("old.png").exists());
    assert_eq!(report.processed, 2);
    assert_eq!(report.removed, 1);
    assert_eq!(report.failed, 0);
}

#[test]
fn test_watch_returns_after_timeout_with_nothing_to_do() {
    let dir = tempfile::tempdir().unwrap();
    let originals = dir.path().join("originals");
    let style = dir.path().join("style.png");
    fs::create_dir(&originals).unwrap();
    write_image(&style, 16, 16, 200);

    let started = Instant::now();
    let report = stylizer()
        .watch_dir(&originals, dir.path().join("images"), &style, Some(Duration::from_millis(300)))
        .unwrap();

    assert!(started.elapsed() < Duration::from_secs(3));
    assert_eq!(report, BatchReport::default());
}
