//! Image saving utilities.

use std::io::Cursor;
use std::path::Path;

use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ImageFormat, RgbImage};
use ndarray::{ArrayView, Axis, Dimension, Ix3};

use crate::error::{Error, Result};

use super::{ImageTensor, RGB_CHANNELS};

/// Save a batched tensor as an image file.
///
/// The tensor is:
/// 1. Stripped of its batch dimension (which must be exactly 1)
/// 2. Denormalized from [0, 1] to [0, 255]
/// 3. Saved to the specified path (format inferred from extension)
///
/// # Arguments
///
/// * `tensor` - NHWC tensor with values in [0, 1]
/// * `path` - Output file path
/// * `quality` - JPEG quality (1-100), ignored for other formats
///
/// # Errors
///
/// Returns an error if the tensor has the wrong shape or the image cannot be saved.
pub fn save_image<P: AsRef<Path>>(tensor: &ImageTensor, path: P, quality: u8) -> Result<()> {
    let path = path.as_ref();

    let img = DynamicImage::ImageRgb8(tensor_to_image(tensor.view())?);

    let save_err = |source| Error::ImageSave {
        path: path.to_path_buf(),
        source,
    };

    let format = ImageFormat::from_path(path).map_err(save_err)?;

    // Nothing is written to `path` until encoding has succeeded
    let mut encoded = Cursor::new(Vec::new());
    let written = match format {
        ImageFormat::Jpeg => {
            let encoder = JpegEncoder::new_with_quality(&mut encoded, quality);
            img.write_with_encoder(encoder)
        }
        _ => img.write_to(&mut encoded, format),
    };
    written.map_err(save_err)?;

    std::fs::write(path, encoded.into_inner())?;

    tracing::debug!("Wrote {}x{} image to {}", img.width(), img.height(), path.display());
    Ok(())
}

/// Convert a normalized NHWC tensor to an RGB image.
///
/// A 4-D tensor must have a batch of exactly one; a 3-D tensor is taken as a
/// single `(height, width, 3)` frame.
///
/// # Errors
///
/// Returns [`Error::BatchSize`] for larger batches and [`Error::ShapeMismatch`]
/// for any other layout.
pub fn tensor_to_image<D: Dimension>(tensor: ArrayView<'_, f32, D>) -> Result<RgbImage> {
    let tensor = tensor.into_dyn();

    let frame = match tensor.ndim() {
        4 => {
            let batch = tensor.shape()[0];
            if batch != 1 {
                return Err(Error::BatchSize(batch));
            }
            tensor.index_axis_move(Axis(0), 0)
        }
        3 => tensor,
        n => {
            return Err(Error::ShapeMismatch {
                expected: "3D or 4D tensor".to_string(),
                actual: format!("{n}D tensor"),
            })
        }
    };

    let frame = frame
        .into_dimensionality::<Ix3>()
        .map_err(|err| Error::ShapeMismatch {
            expected: "(height, width, channels)".to_string(),
            actual: err.to_string(),
        })?;

    let (height, width, channels) = frame.dim();
    if channels != RGB_CHANNELS {
        return Err(Error::ShapeMismatch {
            expected: format!("{RGB_CHANNELS} channels"),
            actual: format!("{channels} channels"),
        });
    }

    // Logical iteration order is row-major regardless of memory layout
    let raw: Vec<u8> = frame.iter().copied().map(denormalize).collect();

    let (width, height) = (to_u32(width)?, to_u32(height)?);
    RgbImage::from_raw(width, height, raw).ok_or_else(|| Error::ShapeMismatch {
        expected: format!("{width}x{height} RGB buffer"),
        actual: "short buffer".to_string(),
    })
}

fn to_u32(dim: usize) -> Result<u32> {
    u32::try_from(dim).map_err(|_| Error::UnsupportedDimensions {
        width: u32::MAX,
        height: u32::MAX,
        reason: format!("dimension {dim} does not fit an image"),
    })
}

/// Denormalize a value from [0, 1] to [0, 255] with clamping.
#[inline]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn denormalize(value: f32) -> u8 {
    // Safe: clamped to [0, 255] range before casting
    (value * 255.0).clamp(0.0, 255.0) as u8
}
