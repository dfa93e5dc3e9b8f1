//! Model downloading and loading utilities.

use std::fs;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use indicatif::{ProgressBar, ProgressStyle};
use ort::session::Session;

use crate::error::{Error, Result};

/// File name of the style-transfer model inside the model directory.
pub const MODEL_FILENAME: &str = "arbitrary-image-stylization-v1-256.onnx";

/// Default download location of the ONNX export of Magenta's
/// arbitrary-image-stylization v1-256 model.
///
/// Override with `fetch-model --url` or `STYLIZE_MODEL_URL`, which also accept
/// the path of a model converted locally with tf2onnx.
pub const DEFAULT_MODEL_URL: &str =
    "https://huggingface.co/onnx-community/arbitrary-image-stylization-v1-256/resolve/main/model.onnx";

/// Approximate artifact size in bytes, for progress indication when the
/// server sends no content length.
const MODEL_APPROX_SIZE: u64 = 95_000_000;

/// Environment variable overriding the model directory.
pub const MODEL_DIR_ENV: &str = "STYLIZE_MODEL_DIR";

/// Environment variable overriding the download URL.
pub const MODEL_URL_ENV: &str = "STYLIZE_MODEL_URL";

/// Manages the local model directory and downloads.
pub struct ModelStore {
    model_dir: PathBuf,
}

impl ModelStore {
    /// Open the default model store, creating its directory if needed.
    ///
    /// Uses `STYLIZE_MODEL_DIR` when set, otherwise the platform cache directory:
    /// - Windows: `%LOCALAPPDATA%\stylize\models`
    /// - Linux: `~/.cache/stylize/models`
    /// - macOS: `~/Library/Caches/stylize/models`
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub fn new() -> Result<Self> {
        Self::at(default_model_dir())
    }

    /// Open a model store rooted at `model_dir`, creating it if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub fn at<P: Into<PathBuf>>(model_dir: P) -> Result<Self> {
        let model_dir = model_dir.into();

        fs::create_dir_all(&model_dir).map_err(|source| Error::CacheDir {
            path: model_dir.clone(),
            source,
        })?;

        Ok(Self { model_dir })
    }

    /// Directory holding the model artifact.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.model_dir
    }

    /// Path the model artifact is stored at.
    #[must_use]
    pub fn model_path(&self) -> PathBuf {
        self.model_dir.join(MODEL_FILENAME)
    }

    /// Whether the artifact has already been fetched.
    #[must_use]
    pub fn is_fetched(&self) -> bool {
        self.model_path().is_file()
    }

    /// Fetch the model from `source` into the store.
    ///
    /// `source` is either an HTTP(S) URL or the path of a locally converted
    /// ONNX file, which is copied in. An existing artifact is kept unless
    /// `force` is set.
    ///
    /// # Errors
    ///
    /// Returns an error on any network or disk failure.
    pub fn fetch(&self, source: &str, force: bool) -> Result<PathBuf> {
        let path = self.model_path();

        if self.is_fetched() && !force {
            tracing::info!("Model already present at {}", path.display());
            return Ok(path);
        }

        let local = Path::new(source);
        if local.is_file() {
            tracing::info!("Copying {MODEL_FILENAME} from {}", local.display());
            let temp_path = path.with_extension("tmp");
            fs::copy(local, &temp_path)?;
            fs::rename(&temp_path, &path)?;
        } else {
            download_file(source, &path, MODEL_FILENAME, MODEL_APPROX_SIZE)?;
        }

        Ok(path)
    }
}

/// Model directory from `STYLIZE_MODEL_DIR` or the platform cache.
#[must_use]
pub fn default_model_dir() -> PathBuf {
    if let Some(dir) = std::env::var_os(MODEL_DIR_ENV) {
        return PathBuf::from(dir);
    }

    let base = dirs::cache_dir().unwrap_or_else(|| PathBuf::from("."));
    base.join("stylize").join("models")
}

/// Download URL from `STYLIZE_MODEL_URL` or the built-in default.
#[must_use]
pub fn default_model_url() -> String {
    std::env::var(MODEL_URL_ENV).unwrap_or_else(|_| DEFAULT_MODEL_URL.to_string())
}

/// Load an ONNX model session from a previously fetched artifact.
///
/// Never touches the network.
///
/// # Errors
///
/// Returns [`Error::ModelMissing`] if the file does not exist, or an error if
/// the model cannot be loaded.
pub fn load_session(path: &Path) -> Result<Session> {
    if !path.is_file() {
        return Err(Error::ModelMissing {
            path: path.to_path_buf(),
        });
    }

    let name = path
        .file_name()
        .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned());

    Session::builder()
        .map_err(|source| Error::ModelLoad {
            name: name.clone(),
            source,
        })?
        .commit_from_file(path)
        .map_err(|source| Error::ModelLoad { name, source })
}

/// Download a file from a URL to a path with progress indication.
fn download_file(url: &str, path: &Path, name: &str, approx_size: u64) -> Result<()> {
    tracing::info!("Downloading {name} from {url}");

    let download_err = |source| Error::ModelDownload {
        name: name.to_string(),
        url: url.to_string(),
        source,
    };

    let client = reqwest::blocking::Client::new();
    let mut response = client
        .get(url)
        .send()
        .and_then(reqwest::blocking::Response::error_for_status)
        .map_err(download_err)?;

    let total_size = response.content_length().unwrap_or(approx_size);

    let pb = ProgressBar::new(total_size);
    pb.set_style(
        ProgressStyle::with_template(
            "{spinner:.green} [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({eta})",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("#>-"),
    );

    // Write to a temporary file first, then rename for atomicity
    let temp_path = path.with_extension("tmp");
    let written = copy_with_progress(&mut response, &temp_path, &pb);
    if let Err(err) = written {
        let _ = fs::remove_file(&temp_path);
        return Err(err);
    }

    pb.finish_with_message(format!("Downloaded {name}"));

    fs::rename(&temp_path, path)?;
    tracing::info!("Model saved to {}", path.display());

    Ok(())
}

fn copy_with_progress<R: Read>(reader: &mut R, dest: &Path, pb: &ProgressBar) -> Result<u64> {
    let mut file = std::io::BufWriter::new(fs::File::create(dest)?);
    let mut buffer = [0u8; 8192];
    let mut downloaded = 0u64;

    loop {
        let bytes_read = reader.read(&mut buffer)?;
        if bytes_read == 0 {
            break;
        }
        file.write_all(&buffer[..bytes_read])?;
        downloaded += bytes_read as u64;
        pb.set_position(downloaded);
    }

    file.flush()?;
    Ok(downloaded)
}
