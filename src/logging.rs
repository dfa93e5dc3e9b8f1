//! Logging setup shared by the binaries.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Install the global `tracing` subscriber.
///
/// `RUST_LOG` takes precedence; otherwise only this crate and its binaries
/// log, at `info` (or `debug` when `verbose`). That default also keeps ONNX
/// Runtime's own diagnostics out of the output.
pub fn init(verbose: bool) {
    let log_level = if verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| {
                    format!("stylize={log_level},fetch_model={log_level},stylize_dir={log_level}")
                        .into()
                }),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();
}
