//! Locating, fetching, and opening the style-transfer model.

mod loader;

pub use loader::{
    default_model_dir, default_model_url, load_session, ModelStore, DEFAULT_MODEL_URL,
    MODEL_DIR_ENV, MODEL_FILENAME, MODEL_URL_ENV,
};
