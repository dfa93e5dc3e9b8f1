//! `fetch-model` - Download the pre-trained style-transfer model.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;

use stylize::logging;
use stylize::model::{default_model_url, ModelStore};

/// Download the pre-trained arbitrary style-transfer model and save it locally.
#[derive(Parser, Debug)]
#[command(name = "fetch-model")]
#[command(version, about, long_about = None)]
struct Args {
    /// Directory to store the model in [default: platform cache, or $STYLIZE_MODEL_DIR].
    #[arg(long, value_name = "DIR")]
    model_dir: Option<PathBuf>,

    /// URL or local path of the ONNX model [default: built-in, or $STYLIZE_MODEL_URL].
    #[arg(long, value_name = "URL")]
    url: Option<String>,

    /// Download again even if the model is already present.
    #[arg(short, long)]
    force: bool,

    /// Enable verbose output.
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();

    logging::init(args.verbose);

    if let Err(err) = run(args) {
        tracing::error!("{err:#}");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

fn run(args: Args) -> Result<()> {
    let url = args.url.unwrap_or_else(default_model_url);

    let store = match args.model_dir {
        Some(dir) => ModelStore::at(dir),
        None => ModelStore::new(),
    }
    .context("Failed to prepare model directory")?;
    tracing::info!("Using model directory {}", store.dir().display());

    let path = store
        .fetch(&url, args.force)
        .context("Failed to fetch model")?;

    println!("Model saved to {}", path.display());

    Ok(())
}
