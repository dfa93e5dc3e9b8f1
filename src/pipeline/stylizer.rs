//! Main style-transfer pipeline.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::error::{Error, Result};
use crate::image::{self, ImageTensor, CONTENT_MAX_DIM, STYLE_MAX_DIM};
use crate::model::{default_model_dir, MODEL_FILENAME};

use super::onnx::OnnxStyleModel;
use super::StyleModel;

/// Configuration for the style-transfer pipeline.
#[derive(Debug, Clone)]
pub struct Config {
    /// Path of the fetched ONNX model.
    pub model_path: PathBuf,

    /// Longest side of the content image fed to the model.
    pub content_max_dim: u32,

    /// Longest side of the style image fed to the model.
    pub style_max_dim: u32,

    /// Output JPEG quality (1-100).
    pub output_quality: u8,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            model_path: default_model_dir().join(MODEL_FILENAME),
            content_max_dim: CONTENT_MAX_DIM,
            // Chosen empirically for the style images in use
            style_max_dim: STYLE_MAX_DIM,
            output_quality: 95,
        }
    }
}

impl Config {
    /// Build the default configuration with environment overrides applied.
    ///
    /// Recognized variables: `STYLIZE_MODEL_PATH`, `STYLIZE_CONTENT_MAX_DIM`,
    /// `STYLIZE_STYLE_MAX_DIM`, `STYLIZE_OUTPUT_QUALITY`.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable is set but cannot be parsed.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Some(path) = std::env::var_os("STYLIZE_MODEL_PATH") {
            config.model_path = PathBuf::from(path);
        }
        if let Some(dim) = env_override("STYLIZE_CONTENT_MAX_DIM")? {
            config.content_max_dim = dim;
        }
        if let Some(dim) = env_override("STYLIZE_STYLE_MAX_DIM")? {
            config.style_max_dim = dim;
        }
        if let Some(quality) = env_override("STYLIZE_OUTPUT_QUALITY")? {
            config.output_quality = quality;
        }

        Ok(config)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any parameter is out of valid range.
    pub fn validate(&self) -> Result<()> {
        if self.content_max_dim == 0 {
            return Err(Error::InvalidParameter {
                name: "content_max_dim".to_string(),
                reason: "must be greater than 0".to_string(),
            });
        }

        if self.style_max_dim == 0 {
            return Err(Error::InvalidParameter {
                name: "style_max_dim".to_string(),
                reason: "must be greater than 0".to_string(),
            });
        }

        if !(1..=100).contains(&self.output_quality) {
            return Err(Error::InvalidParameter {
                name: "output_quality".to_string(),
                reason: "must be between 1 and 100".to_string(),
            });
        }

        Ok(())
    }
}

fn env_override<T: FromStr>(name: &str) -> Result<Option<T>> {
    match std::env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| Error::InvalidParameter {
                name: name.to_string(),
                reason: format!("cannot parse {raw:?}"),
            }),
        Err(_) => Ok(None),
    }
}

/// Style-transfer pipeline: load, stylize, save.
pub struct Stylizer<M = OnnxStyleModel> {
    pub(super) config: Config,
    pub(super) model: M,
}

impl Stylizer<OnnxStyleModel> {
    /// Create a pipeline backed by the ONNX model at `config.model_path`.
    ///
    /// The model must already have been fetched; this never downloads.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the model cannot be loaded.
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;

        tracing::info!("Initializing pipeline with config: {config:?}");
        let model = OnnxStyleModel::open(&config.model_path)?;

        Ok(Self { config, model })
    }
}

impl<M: StyleModel> Stylizer<M> {
    /// Create a pipeline around an already loaded model.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn with_model(config: Config, model: M) -> Result<Self> {
        config.validate()?;
        Ok(Self { config, model })
    }

    /// The active configuration.
    #[must_use]
    pub const fn config(&self) -> &Config {
        &self.config
    }

    /// Load a content image at the configured content size.
    ///
    /// # Errors
    ///
    /// Returns an error if the image cannot be loaded.
    pub fn load_content<P: AsRef<Path>>(&self, path: P) -> Result<ImageTensor> {
        image::load_image(path, self.config.content_max_dim)
    }

    /// Load a style image at the configured style size.
    ///
    /// # Errors
    ///
    /// Returns an error if the image cannot be loaded.
    pub fn load_style<P: AsRef<Path>>(&self, path: P) -> Result<ImageTensor> {
        image::load_image(path, self.config.style_max_dim)
    }

    /// Run the model on already loaded tensors.
    ///
    /// # Errors
    ///
    /// Returns an error if inference fails.
    pub fn stylize_tensors(
        &mut self,
        content: &ImageTensor,
        style: &ImageTensor,
    ) -> Result<ImageTensor> {
        tracing::debug!(
            "Stylizing content {:?} with style {:?}",
            content.shape(),
            style.shape()
        );
        self.model.stylize(content, style)
    }

    /// Write a stylized tensor to disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the tensor is malformed or the file cannot be written.
    pub fn save<P: AsRef<Path>>(&self, stylized: &ImageTensor, path: P) -> Result<()> {
        let path = path.as_ref();
        tracing::info!("Saving output to: {}", path.display());
        image::save_image(stylized, path, self.config.output_quality)
    }

    /// Stylize one content image with one style image.
    ///
    /// # Arguments
    ///
    /// * `content_path` - Image whose structure is kept
    /// * `style_path` - Image whose texture and palette are transferred
    /// * `output_path` - Where to save the result; the extension picks the format
    ///
    /// # Errors
    ///
    /// Returns an error if loading, inference, or saving fails. Nothing is
    /// written unless inference succeeds.
    pub fn process<P, Q, R>(&mut self, content_path: P, style_path: Q, output_path: R) -> Result<()>
    where
        P: AsRef<Path>,
        Q: AsRef<Path>,
        R: AsRef<Path>,
    {
        let content_path = content_path.as_ref();
        tracing::info!("Processing image: {}", content_path.display());

        let content = self.load_content(content_path)?;
        let style = self.load_style(style_path)?;

        let stylized = self.stylize_tensors(&content, &style)?;
        self.save(&stylized, output_path)?;

        tracing::info!("Processing complete");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();

        assert!(config.validate().is_ok());
        assert_eq!(config.content_max_dim, 1024);
        assert_eq!(config.style_max_dim, 450);
        assert!(config.model_path.ends_with(MODEL_FILENAME));
    }

    #[test]
    fn test_validate_rejects_zero_dims() {
        let config = Config {
            style_max_dim: 0,
            ..Config::default()
        };
        assert!(matches!(
            config.validate(),
            Err(Error::InvalidParameter { .. })
        ));
    }

    #[test]
    fn test_validate_rejects_bad_quality() {
        let config = Config {
            output_quality: 0,
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_env_override_parses_and_rejects() {
        std::env::set_var("STYLIZE_TEST_DIM_OK", " 640 ");
        std::env::set_var("STYLIZE_TEST_DIM_BAD", "wide");

        assert_eq!(env_override::<u32>("STYLIZE_TEST_DIM_OK").unwrap(), Some(640));
        assert!(env_override::<u32>("STYLIZE_TEST_DIM_BAD").is_err());
        assert_eq!(env_override::<u32>("STYLIZE_TEST_DIM_UNSET").unwrap(), None);
    }

    #[test]
    fn test_new_without_model_fails() {
        let config = Config {
            model_path: PathBuf::from("/no/such/model.onnx"),
            ..Config::default()
        };
        assert!(matches!(
            Stylizer::new(config),
            Err(Error::ModelMissing { .. })
        ));
    }
}
