//! `stylize` CLI - Apply a style image to a content image.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::error::ErrorKind;
use clap::{CommandFactory, Parser};

use stylize::{image, logging, Config, Stylizer};

/// Run neural style transfer on a content image using a style image.
#[derive(Parser, Debug)]
#[command(name = "stylize")]
#[command(version, about, long_about = None)]
struct Args {
    /// Image whose structure is kept.
    #[arg(value_name = "content_image_path")]
    content: PathBuf,

    /// Image whose texture and palette are transferred.
    #[arg(value_name = "style_image_path")]
    style: PathBuf,

    /// Where to save the stylized image; the extension picks the format.
    #[arg(value_name = "output_image_path")]
    output: PathBuf,
}

fn main() -> ExitCode {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(err) if matches!(err.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            err.exit()
        }
        Err(_) => {
            eprintln!("{}", Args::command().render_usage());
            return ExitCode::FAILURE;
        }
    };

    logging::init(false);

    if let Err(err) = run(&args) {
        tracing::error!("{err:#}");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

fn run(args: &Args) -> Result<()> {
    let config = Config::from_env().context("Invalid configuration")?;
    config.validate()?;

    // Decode inputs before loading the model so bad images fail fast
    let content = image::load_image(&args.content, config.content_max_dim)
        .context("Failed to load content image")?;
    let style = image::load_image(&args.style, config.style_max_dim)
        .context("Failed to load style image")?;

    let mut stylizer = Stylizer::new(config).context("Failed to initialize pipeline")?;

    let stylized = stylizer
        .stylize_tensors(&content, &style)
        .context("Failed to stylize image")?;
    stylizer
        .save(&stylized, &args.output)
        .context("Failed to save stylized image")?;

    println!(
        "Successfully stylized {} -> {}",
        args.content.display(),
        args.output.display()
    );

    Ok(())
}
