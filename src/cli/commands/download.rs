//! Download and split commands.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::Orchestrator;
use anyhow::Result;
use std::path::Path;
use tokio_util::sync::CancellationToken;

/// Run the download command.
pub async fn run_download(
    url: &str,
    audio: bool,
    no_split: bool,
    settings: Settings,
    cancel: &CancellationToken,
) -> Result<()> {
    preflight::check(Operation::Download, &settings)?;

    let orchestrator = Orchestrator::new(settings).await?;

    let pb = Output::progress_bar(100, "Downloading");
    let on_progress = |ratio: f64| pb.set_position((ratio * 100.0).round() as u64);

    let result = orchestrator
        .prepare_for_sharing(url, audio, !no_split, Some(&on_progress), cancel)
        .await;
    pb.finish_and_clear();
    let result = result?;

    Output::success(&format!("{} ready to share", result.info.title));
    if no_split && result.artifact.needs_splitting {
        Output::warning("File exceeds the size ceiling; run `clipwise split` to shrink it.");
    }
    for file in result.files() {
        Output::file_item(&file);
    }

    Ok(())
}

/// Run the split command.
pub async fn run_split(
    file: &Path,
    audio: bool,
    settings: Settings,
    cancel: &CancellationToken,
) -> Result<()> {
    preflight::check(Operation::Split, &settings)?;

    if !file.is_file() {
        anyhow::bail!("File not found: {}", file.display());
    }

    let orchestrator = Orchestrator::new(settings).await?;

    let spinner = Output::spinner(&format!("Splitting {}...", file.display()));
    let parts = orchestrator.split_file(file, audio, cancel).await;
    spinner.finish_and_clear();
    let parts = parts?;

    if parts.len() == 1 && parts[0] == file {
        Output::info("File is already under the size ceiling.");
    } else {
        Output::success(&format!("Split into {} parts", parts.len()));
    }
    for part in &parts {
        Output::file_item(part);
    }

    Ok(())
}
