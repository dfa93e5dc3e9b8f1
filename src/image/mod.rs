//! Image decoding, tensor conversion, and saving utilities.

mod heic;
mod load;
mod save;

pub use load::{load_image, scaled_dimensions};
pub use save::{save_image, tensor_to_image};

use ndarray::Array4;

/// Batched image tensor in NHWC format (batch, height, width, channels).
/// Values are normalized to [0, 1], the layout the style-transfer model expects.
pub type ImageTensor = Array4<f32>;

/// Longest side of the content image fed to the model.
pub const CONTENT_MAX_DIM: u32 = 1024;

/// Longest side of the style image fed to the model.
pub const STYLE_MAX_DIM: u32 = 450;

/// Number of channels in RGB images.
pub const RGB_CHANNELS: usize = 3;
