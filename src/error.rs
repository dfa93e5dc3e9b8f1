//! Custom error types for stylize.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for the stylize library.
#[derive(Error, Debug)]
pub enum Error {
    /// Failed to load an image file.
    #[error("failed to load image from {path}: {source}")]
    ImageLoad {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    /// Failed to save an image file.
    #[error("failed to save image to {path}: {source}")]
    ImageSave {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    /// Failed to decode a HEIC/HEIF container.
    #[cfg(feature = "heic")]
    #[error("failed to decode HEIC image {path}: {source}")]
    HeicDecode {
        path: PathBuf,
        #[source]
        source: libheif_rs::HeifError,
    },

    /// The file is in a format this build cannot decode.
    #[error("unsupported image format for {path}: {reason}")]
    UnsupportedFormat { path: PathBuf, reason: String },

    /// Image dimensions are not supported.
    #[error("unsupported image dimensions {width}x{height}: {reason}")]
    UnsupportedDimensions {
        width: u32,
        height: u32,
        reason: String,
    },

    /// The model artifact has not been fetched yet.
    #[error("model not found at {path}; run `fetch-model` first")]
    ModelMissing { path: PathBuf },

    /// Failed to download a model.
    #[error(
        "failed to download model {name} from {url}: {source}; if that host is unavailable, \
         convert the TF Hub model to ONNX (see README) and pass it with --url or STYLIZE_MODEL_URL"
    )]
    ModelDownload {
        name: String,
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// Failed to load an ONNX model.
    #[error("failed to load ONNX model {name}: {source}")]
    ModelLoad {
        name: String,
        #[source]
        source: ort::Error,
    },

    /// Model inference failed.
    #[error("model inference failed: {source}")]
    Inference {
        #[source]
        source: ort::Error,
    },

    /// Failed to create cache directory.
    #[error("failed to create cache directory {path}: {source}")]
    CacheDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to watch a directory for changes.
    #[error("failed to watch {path}: {source}")]
    Watch {
        path: PathBuf,
        #[source]
        source: notify::Error,
    },

    /// Invalid parameter value.
    #[error("invalid parameter {name}: {reason}")]
    InvalidParameter { name: String, reason: String },

    /// A batched tensor held more than one image.
    #[error("expected a batch of exactly one image, got {0}")]
    BatchSize(usize),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Shape mismatch in tensor operations.
    #[error("tensor shape mismatch: expected {expected}, got {actual}")]
    ShapeMismatch { expected: String, actual: String },
}

/// Result type alias for stylize operations.
pub type Result<T> = std::result::Result<T, Error>;
