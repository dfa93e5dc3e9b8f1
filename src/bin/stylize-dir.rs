//! `stylize-dir` - Stylize every image in a directory with one style image,
//! optionally watching it for changes.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;

use stylize::{logging, Config, Stylizer};

/// Stylize a directory of originals, writing one PNG per input.
#[derive(Parser, Debug)]
#[command(name = "stylize-dir")]
#[command(version, about, long_about = None)]
struct Args {
    /// Directory containing original images.
    #[arg(long, default_value = "originals", value_name = "DIR")]
    originals_dir: PathBuf,

    /// Directory to save stylized images to.
    #[arg(long, default_value = "images", value_name = "DIR")]
    output_dir: PathBuf,

    /// Style image applied to every original.
    #[arg(long, value_name = "PATH")]
    style: PathBuf,

    /// Keep running and stylize new originals as they appear; removing an
    /// original deletes its output.
    #[arg(short, long)]
    watch: bool,

    /// Enable verbose output.
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();

    logging::init(args.verbose);

    if let Err(err) = run(&args) {
        tracing::error!("{err:#}");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

fn run(args: &Args) -> Result<()> {
    if !args.originals_dir.is_dir() {
        anyhow::bail!(
            "Originals directory does not exist: {}",
            args.originals_dir.display()
        );
    }

    let config = Config::from_env().context("Invalid configuration")?;
    let mut stylizer = Stylizer::new(config).context("Failed to initialize pipeline")?;

    if args.watch {
        let report = stylizer
            .watch_dir(&args.originals_dir, &args.output_dir, &args.style, None)
            .context("Failed to watch directory")?;
        println!(
            "Processed {}, skipped {}, failed {}, removed {}",
            report.processed, report.skipped, report.failed, report.removed
        );
        return Ok(());
    }

    let report = stylizer
        .stylize_dir(&args.originals_dir, &args.output_dir, &args.style)
        .context("Failed to stylize directory")?;

    println!(
        "Processed {}, skipped {}, failed {}",
        report.processed, report.skipped, report.failed
    );

    if report.failed > 0 {
        anyhow::bail!("{} file(s) could not be stylized", report.failed);
    }

    Ok(())
}
