//! HEIC/HEIF decoding through libheif.
//!
//! The `image` crate has no HEIC codec, so phone photos in that container are
//! decoded here into the same 8-bit RGB buffer the standard path produces.

use std::path::Path;

use image::RgbImage;

use crate::error::{Error, Result};

use super::RGB_CHANNELS;

/// Whether the path names a HEIC/HEIF file.
pub(crate) fn is_heic_path(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("heic") || ext.eq_ignore_ascii_case("heif"))
}

/// Decode the primary image of a HEIC container to RGB.
#[cfg(feature = "heic")]
pub(crate) fn decode_heic(path: &Path) -> Result<RgbImage> {
    use libheif_rs::{ColorSpace, HeifContext, LibHeif, RgbChroma};

    let heif_err = |source: libheif_rs::HeifError| Error::HeicDecode {
        path: path.to_path_buf(),
        source,
    };

    let path_str = path.to_str().ok_or_else(|| Error::UnsupportedFormat {
        path: path.to_path_buf(),
        reason: "libheif requires a UTF-8 path".to_string(),
    })?;

    let lib_heif = LibHeif::new();
    let ctx = HeifContext::read_from_file(path_str).map_err(heif_err)?;
    let handle = ctx.primary_image_handle().map_err(heif_err)?;
    let decoded = lib_heif
        .decode(&handle, ColorSpace::Rgb(RgbChroma::Rgb), None)
        .map_err(heif_err)?;

    let planes = decoded.planes();
    let plane = planes.interleaved.ok_or_else(|| Error::ShapeMismatch {
        expected: "interleaved RGB plane".to_string(),
        actual: "planar output".to_string(),
    })?;

    pack_interleaved(plane.data, plane.stride, plane.width, plane.height)
}

#[cfg(not(feature = "heic"))]
pub(crate) fn decode_heic(path: &Path) -> Result<RgbImage> {
    Err(Error::UnsupportedFormat {
        path: path.to_path_buf(),
        reason: "HEIC support requires building with the `heic` feature".to_string(),
    })
}

/// Copy a row-padded interleaved RGB plane into a tightly packed image.
#[cfg_attr(not(feature = "heic"), allow(dead_code))]
pub(crate) fn pack_interleaved(
    data: &[u8],
    stride: usize,
    width: u32,
    height: u32,
) -> Result<RgbImage> {
    let row_bytes = width as usize * RGB_CHANNELS;
    let needed = match height as usize {
        0 => 0,
        rows => stride * (rows - 1) + row_bytes,
    };

    if stride < row_bytes || data.len() < needed {
        return Err(Error::ShapeMismatch {
            expected: format!("{height} rows of {row_bytes} bytes with stride {stride}"),
            actual: format!("{} bytes", data.len()),
        });
    }

    let mut packed = Vec::with_capacity(row_bytes * height as usize);
    for row in 0..height as usize {
        let start = row * stride;
        packed.extend_from_slice(&data[start..start + row_bytes]);
    }

    RgbImage::from_raw(width, height, packed).ok_or_else(|| Error::ShapeMismatch {
        expected: format!("{width}x{height} RGB buffer"),
        actual: "short buffer".to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::load::rgb_to_tensor;

    fn gradient(width: u32, height: u32) -> RgbImage {
        RgbImage::from_fn(width, height, |x, y| {
            image::Rgb([(x * 20) as u8, (y * 30) as u8, ((x + y) * 7) as u8])
        })
    }

    /// Lay the image out the way libheif does, with padding after each row.
    fn padded(img: &RgbImage, stride: usize) -> Vec<u8> {
        let row_bytes = img.width() as usize * 3;
        let mut out = vec![0xAA; stride * img.height() as usize];
        for (row, chunk) in img.as_raw().chunks(row_bytes).enumerate() {
            out[row * stride..row * stride + row_bytes].copy_from_slice(chunk);
        }
        out
    }

    #[test]
    fn test_heic_extension_detection() {
        assert!(is_heic_path(Path::new("IMG_0001.HEIC")));
        assert!(is_heic_path(Path::new("photo.heif")));
        assert!(!is_heic_path(Path::new("photo.jpg")));
        assert!(!is_heic_path(Path::new("heic")));
    }

    #[test]
    fn test_pack_strips_row_padding() {
        let reference = gradient(7, 5);
        let data = padded(&reference, 32);

        let packed = pack_interleaved(&data, 32, 7, 5).unwrap();

        assert_eq!(packed, reference);
    }

    #[test]
    fn test_both_decode_paths_yield_same_tensor() {
        let reference = gradient(9, 6);
        let from_heic_plane = pack_interleaved(&padded(&reference, 40), 40, 9, 6).unwrap();

        let standard = rgb_to_tensor(reference, 18).unwrap();
        let heic = rgb_to_tensor(from_heic_plane, 18).unwrap();

        assert_eq!(standard.shape(), heic.shape());
        assert!(standard
            .iter()
            .zip(heic.iter())
            .all(|(a, b)| (a - b).abs() < 1e-6));
    }

    #[test]
    fn test_pack_rejects_short_buffer() {
        let err = pack_interleaved(&[0; 10], 12, 4, 2).unwrap_err();
        assert!(matches!(err, Error::ShapeMismatch { .. }));
    }

    #[cfg(not(feature = "heic"))]
    #[test]
    fn test_heic_without_feature_is_unsupported() {
        let err = decode_heic(Path::new("photo.heic")).unwrap_err();
        assert!(matches!(err, Error::UnsupportedFormat { .. }));
    }
}
