//! Style-transfer pipeline.

mod batch;
mod onnx;
mod stylizer;

pub use batch::{output_path_for, remove_output_for, BatchReport};
pub use onnx::OnnxStyleModel;
pub use stylizer::{Config, Stylizer};

use crate::error::Result;
use crate::image::ImageTensor;

/// A pre-trained arbitrary style-transfer model, treated as a black box.
///
/// Takes a batched content tensor and a batched style tensor (NHWC, values in
/// [0, 1]) and returns the stylized batch in the content tensor's layout.
pub trait StyleModel {
    /// Blend `style` onto `content`.
    ///
    /// # Errors
    ///
    /// Returns an error if the model cannot be evaluated.
    fn stylize(&mut self, content: &ImageTensor, style: &ImageTensor) -> Result<ImageTensor>;
}
