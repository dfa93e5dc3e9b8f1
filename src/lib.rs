//! # `stylize`
//!
//! Apply a pre-trained arbitrary neural style-transfer model to a content image
//! and a style image.
//!
//! The model itself is an opaque ONNX artifact fetched once with
//! `fetch-model`. This crate handles everything around it: decoding (including
//! HEIC with the `heic` feature), normalizing and resizing to a bounding
//! dimension, running the model, and turning its output back into an image.
//!
//! ## Example
//!
//! ```no_run
//! use stylize::{Config, Stylizer};
//!
//! # fn main() -> stylize::Result<()> {
//! let config = Config::default();
//! let mut stylizer = Stylizer::new(config)?;
//!
//! stylizer.process("photo.jpg", "starry-night.jpg", "stylized.png")?;
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod image;
pub mod logging;
pub mod model;
pub mod pipeline;

pub use error::{Error, Result};
pub use pipeline::{BatchReport, Config, OnnxStyleModel, StyleModel, Stylizer};
