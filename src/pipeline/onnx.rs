//! ONNX Runtime backed style model.

use std::path::Path;

use ndarray::Array4;
use ort::session::Session;
use ort::value::Tensor;

use crate::error::{Error, Result};
use crate::image::ImageTensor;
use crate::model;

use super::StyleModel;

/// Arbitrary style-transfer model running on ONNX Runtime.
///
/// Takes a content and a style image, both NHWC with values in [0, 1], bound
/// to the input names the model declares.
pub struct OnnxStyleModel {
    session: Session,
    content_input: String,
    style_input: String,
}

impl OnnxStyleModel {
    /// Open a previously fetched model artifact.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is missing, is not a loadable model, or
    /// does not take exactly two inputs.
    pub fn open(path: &Path) -> Result<Self> {
        tracing::info!("Loading style model from {}", path.display());
        let session = model::load_session(path)?;

        let names: Vec<&str> = session.inputs.iter().map(|i| i.name.as_str()).collect();
        let (content, style) = assign_inputs(&names)?;
        let (content_input, style_input) = (names[content].to_string(), names[style].to_string());
        tracing::debug!("Binding content to {content_input:?}, style to {style_input:?}");

        Ok(Self {
            session,
            content_input,
            style_input,
        })
    }
}

/// Pick which declared input takes the content image and which the style.
///
/// An input named after the style (`style...`, or `placeholder_1` as exported
/// from the TF Hub signature) takes the style image; otherwise declaration
/// order is content, style.
fn assign_inputs(names: &[&str]) -> Result<(usize, usize)> {
    if names.len() != 2 {
        return Err(Error::ShapeMismatch {
            expected: "2 model inputs (content, style)".to_string(),
            actual: format!("{} inputs {names:?}", names.len()),
        });
    }

    let is_style = |name: &str| {
        let name = name.to_ascii_lowercase();
        name.contains("style") || name.starts_with("placeholder_1")
    };

    match (is_style(names[0]), is_style(names[1])) {
        (true, false) => Ok((1, 0)),
        _ => Ok((0, 1)),
    }
}

impl StyleModel for OnnxStyleModel {
    fn stylize(&mut self, content: &ImageTensor, style: &ImageTensor) -> Result<ImageTensor> {
        let content_value =
            Tensor::from_array(content.clone()).map_err(|source| Error::Inference { source })?;
        let style_value =
            Tensor::from_array(style.clone()).map_err(|source| Error::Inference { source })?;

        let outputs = self
            .session
            .run(ort::inputs![
                self.content_input.as_str() => content_value,
                self.style_input.as_str() => style_value
            ])
            .map_err(|source| Error::Inference { source })?;

        // The stylized image is the first output
        let output = outputs
            .values()
            .next()
            .ok_or_else(|| Error::ShapeMismatch {
                expected: "stylized image output".to_string(),
                actual: "no output".to_string(),
            })?;

        extract_array4(&output)
    }
}

/// Extract a 4D array from an ONNX value.
#[allow(clippy::cast_sign_loss, clippy::cast_possible_truncation)]
fn extract_array4(value: &ort::value::ValueRef<'_>) -> Result<Array4<f32>> {
    let (shape_info, data) = value
        .try_extract_tensor::<f32>()
        .map_err(|source| Error::Inference { source })?;

    // Safe: tensor dimensions are always non-negative and within bounds
    let dims: Vec<usize> = shape_info.iter().map(|&x| x as usize).collect();

    if dims.len() != 4 {
        return Err(Error::ShapeMismatch {
            expected: "4D tensor".to_string(),
            actual: format!("{}D tensor", dims.len()),
        });
    }

    Array4::from_shape_vec((dims[0], dims[1], dims[2], dims[3]), data.to_vec()).map_err(|_| {
        Error::ShapeMismatch {
            expected: format!("{dims:?}"),
            actual: "reshape failed".to_string(),
        }
    })
}
