//! Stylize a whole directory of originals with one style image, optionally
//! keeping the output directory in sync as originals come and go.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::time::{Duration, Instant};

use notify::event::RemoveKind;
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};

use crate::error::{Error, Result};
use crate::image::ImageTensor;

use super::{StyleModel, Stylizer};

/// Longest wait for a watch event before the timeout is checked again.
const POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Outcome of a directory pass.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BatchReport {
    /// Files stylized and written.
    pub processed: usize,
    /// Files whose output already existed.
    pub skipped: usize,
    /// Files that could not be stylized.
    pub failed: usize,
    /// Outputs deleted because their original was removed.
    pub removed: usize,
}

/// Output path for an original: same stem, `.png`, inside `output_dir`.
///
/// # Errors
///
/// Returns an error if the path has no file stem.
pub fn output_path_for(original: &Path, output_dir: &Path) -> Result<PathBuf> {
    let stem = original
        .file_stem()
        .ok_or_else(|| Error::InvalidParameter {
            name: "original".to_string(),
            reason: format!("{} has no file name", original.display()),
        })?;

    let mut file_name = stem.to_os_string();
    file_name.push(".png");
    Ok(output_dir.join(file_name))
}

/// Delete the output derived from a removed original.
///
/// Returns whether an output existed.
///
/// # Errors
///
/// Returns an error if the output exists but cannot be deleted.
pub fn remove_output_for(original: &Path, output_dir: &Path) -> Result<bool> {
    let output = output_path_for(original, output_dir)?;

    if !output.exists() {
        tracing::debug!("No output to remove for {}", original.display());
        return Ok(false);
    }

    fs::remove_file(&output)?;
    tracing::info!("Removed {}", output.display());
    Ok(true)
}

impl<M: StyleModel> Stylizer<M> {
    /// Stylize every file in `originals_dir`, writing PNGs to `output_dir`.
    ///
    /// Files that already have an output are skipped. A file that fails to
    /// load or stylize is logged and counted; the pass carries on.
    ///
    /// # Errors
    ///
    /// Returns an error if the style image cannot be loaded or either
    /// directory cannot be accessed.
    pub fn stylize_dir<P, Q, R>(
        &mut self,
        originals_dir: P,
        output_dir: Q,
        style_path: R,
    ) -> Result<BatchReport>
    where
        P: AsRef<Path>,
        Q: AsRef<Path>,
        R: AsRef<Path>,
    {
        let (originals_dir, output_dir) = (originals_dir.as_ref(), output_dir.as_ref());

        fs::create_dir_all(output_dir)?;
        let style = self.load_style(style_path)?;

        let mut report = BatchReport::default();
        self.process_existing(originals_dir, output_dir, &style, &mut report)?;
        Ok(report)
    }

    /// Stylize everything in `originals_dir`, then keep watching it.
    ///
    /// New or modified files are stylized as they appear; removing an
    /// original deletes its output. Runs until `timeout` elapses, or forever
    /// when `timeout` is `None`.
    ///
    /// # Errors
    ///
    /// Returns an error if the style image cannot be loaded, a directory
    /// cannot be accessed, or the watcher cannot be started.
    pub fn watch_dir<P, Q, R>(
        &mut self,
        originals_dir: P,
        output_dir: Q,
        style_path: R,
        timeout: Option<Duration>,
    ) -> Result<BatchReport>
    where
        P: AsRef<Path>,
        Q: AsRef<Path>,
        R: AsRef<Path>,
    {
        let (originals_dir, output_dir) = (originals_dir.as_ref(), output_dir.as_ref());

        fs::create_dir_all(output_dir)?;
        let style = self.load_style(style_path)?;

        let mut report = BatchReport::default();
        self.process_existing(originals_dir, output_dir, &style, &mut report)?;

        let watch_err = |source| Error::Watch {
            path: originals_dir.to_path_buf(),
            source,
        };

        let (tx, rx) = mpsc::channel();
        let mut watcher =
            RecommendedWatcher::new(tx, notify::Config::default()).map_err(watch_err)?;
        watcher
            .watch(originals_dir, RecursiveMode::NonRecursive)
            .map_err(watch_err)?;

        match timeout {
            Some(t) => tracing::info!("Watching {} for {t:?}", originals_dir.display()),
            None => tracing::info!("Watching {} for new files", originals_dir.display()),
        }

        let deadline = timeout.map(|t| Instant::now() + t);
        loop {
            let wait = match deadline {
                Some(deadline) => {
                    let remaining = deadline.saturating_duration_since(Instant::now());
                    if remaining.is_zero() {
                        tracing::info!("Timeout reached, stopping watcher");
                        break;
                    }
                    remaining.min(POLL_INTERVAL)
                }
                None => POLL_INTERVAL,
            };

            match rx.recv_timeout(wait) {
                Ok(Ok(event)) => self.handle_event(event, output_dir, &style, &mut report),
                Ok(Err(err)) => tracing::warn!("Watch error: {err}"),
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => {
                    tracing::warn!("Watcher channel closed");
                    break;
                }
            }
        }

        Ok(report)
    }

    fn process_existing(
        &mut self,
        originals_dir: &Path,
        output_dir: &Path,
        style: &ImageTensor,
        report: &mut BatchReport,
    ) -> Result<()> {
        let mut files = fs::read_dir(originals_dir)?
            .filter_map(|entry| {
                let path = entry.ok()?.path();
                path.is_file().then_some(path)
            })
            .collect::<Vec<PathBuf>>();
        files.sort();

        tracing::info!("Found {} files to process", files.len());

        for original in &files {
            self.process_file(original, output_dir, style, report);
        }

        tracing::info!(
            "Directory pass complete: {} processed, {} skipped, {} failed",
            report.processed,
            report.skipped,
            report.failed
        );

        Ok(())
    }

    fn handle_event(
        &mut self,
        event: Event,
        output_dir: &Path,
        style: &ImageTensor,
        report: &mut BatchReport,
    ) {
        match event.kind {
            EventKind::Create(_) | EventKind::Modify(_) => {
                for path in event.paths.iter().filter(|p| p.is_file()) {
                    tracing::debug!("Change detected: {}", path.display());
                    self.process_file(path, output_dir, style, report);
                }
            }
            EventKind::Remove(RemoveKind::File | RemoveKind::Any) => {
                for path in &event.paths {
                    match remove_output_for(path, output_dir) {
                        Ok(true) => report.removed += 1,
                        Ok(false) => {}
                        Err(err) => tracing::warn!(
                            "Failed to remove output for {}: {err}",
                            path.display()
                        ),
                    }
                }
            }
            _ => {}
        }
    }

    fn process_file(
        &mut self,
        original: &Path,
        output_dir: &Path,
        style: &ImageTensor,
        report: &mut BatchReport,
    ) {
        let output = match output_path_for(original, output_dir) {
            Ok(output) => output,
            Err(err) => {
                tracing::warn!("{err}");
                report.failed += 1;
                return;
            }
        };

        if output.exists() {
            tracing::debug!("Output already exists, skipping: {}", output.display());
            report.skipped += 1;
            return;
        }

        match self.stylize_one(original, style, &output) {
            Ok(()) => {
                tracing::info!("Stylized {} -> {}", original.display(), output.display());
                report.processed += 1;
            }
            Err(err) => {
                tracing::warn!("Failed to stylize {}: {err}", original.display());
                report.failed += 1;
            }
        }
    }

    fn stylize_one(&mut self, original: &Path, style: &ImageTensor, output: &Path) -> Result<()> {
        let content = self.load_content(original)?;
        let stylized = self.stylize_tensors(&content, style)?;
        self.save(&stylized, output)
    }
}
