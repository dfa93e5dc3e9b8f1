//! Image loading utilities.

use std::path::Path;

use image::{imageops::FilterType, DynamicImage, ImageError, ImageReader, RgbImage};
use ndarray::Array4;

use crate::error::{Error, Result};

use super::{heic, ImageTensor, RGB_CHANNELS};

/// Load an image from disk and convert it to a batched, normalized tensor.
///
/// The image is:
/// 1. Decoded, through libheif for `.heic`/`.heif` files and the `image` crate otherwise
/// 2. Converted to RGB (alpha dropped, grayscale expanded)
/// 3. Normalized to [0, 1]
/// 4. Resized so its longer side equals `max_dim`, keeping the aspect ratio
/// 5. Returned as an NHWC tensor `(1, height, width, 3)`
///
/// # Errors
///
/// Returns an error if the file is missing, cannot be decoded, has a zero
/// dimension, or `max_dim` is zero.
pub fn load_image<P: AsRef<Path>>(path: P, max_dim: u32) -> Result<ImageTensor> {
    let path = path.as_ref();

    if max_dim == 0 {
        return Err(Error::InvalidParameter {
            name: "max_dim".to_string(),
            reason: "must be greater than 0".to_string(),
        });
    }

    let rgb = decode_rgb(path)?;
    tracing::debug!(
        "Decoded {} at {}x{}",
        path.display(),
        rgb.width(),
        rgb.height()
    );

    rgb_to_tensor(rgb, max_dim)
}

/// Decode a file to 8-bit RGB, picking the decoder from the extension.
fn decode_rgb(path: &Path) -> Result<RgbImage> {
    if heic::is_heic_path(path) {
        return heic::decode_heic(path);
    }

    let load_err = |source: ImageError| Error::ImageLoad {
        path: path.to_path_buf(),
        source,
    };

    let img = ImageReader::open(path)
        .and_then(|reader| reader.with_guessed_format())
        .map_err(|e| load_err(ImageError::IoError(e)))?
        .decode()
        .map_err(load_err)?;

    Ok(img.into_rgb8())
}

/// Convert decoded RGB pixels to a resized, normalized NHWC tensor.
pub(crate) fn rgb_to_tensor(rgb: RgbImage, max_dim: u32) -> Result<ImageTensor> {
    let (width, height) = scaled_dimensions(rgb.width(), rgb.height(), max_dim)?;

    let normalized = DynamicImage::ImageRgb8(rgb).into_rgb32f();
    let resized = image::imageops::resize(&normalized, width, height, FilterType::Triangle);

    Array4::from_shape_vec(
        (1, height as usize, width as usize, RGB_CHANNELS),
        resized.into_raw(),
    )
    .map_err(|err| Error::ShapeMismatch {
        expected: format!("(1, {height}, {width}, {RGB_CHANNELS})"),
        actual: err.to_string(),
    })
}

/// Compute the dimensions that bring the longer side to `max_dim`.
///
/// The shorter side is scaled by the same factor and rounded down.
///
/// # Errors
///
/// Returns an error for a zero-sized input or when the shorter side would
/// collapse to zero.
pub fn scaled_dimensions(width: u32, height: u32, max_dim: u32) -> Result<(u32, u32)> {
    if width == 0 || height == 0 {
        return Err(Error::UnsupportedDimensions {
            width,
            height,
            reason: "image has no pixels".to_string(),
        });
    }

    let long = u64::from(width.max(height));
    let scale = |dim: u32| {
        // Exact integer floor of dim * (max_dim / long); fits in u32 since dim <= long
        u32::try_from(u64::from(dim) * u64::from(max_dim) / long).unwrap_or(u32::MAX)
    };
    let (new_width, new_height) = (scale(width), scale(height));

    if new_width == 0 || new_height == 0 {
        return Err(Error::UnsupportedDimensions {
            width,
            height,
            reason: format!("aspect ratio too extreme to fit within {max_dim} pixels"),
        });
    }

    Ok((new_width, new_height))
}
