//! Info command implementation.

use crate::cli::preflight::{self, Operation};
use crate::cli::{format_duration, format_size, Output};
use crate::config::Settings;
use crate::orchestrator::Orchestrator;
use anyhow::Result;

/// Run the info command.
pub async fn run_info(url: &str, settings: Settings) -> Result<()> {
    preflight::check(Operation::Transcript, &settings)?;

    let orchestrator = Orchestrator::new(settings).await?;

    let spinner = Output::spinner("Fetching media info...");
    let info = orchestrator.info(url).await;
    spinner.finish_and_clear();
    let info = info?;

    Output::header(&info.title);
    Output::kv("Platform", &info.descriptor.platform.to_string());
    Output::kv("Id", &info.descriptor.media_id);
    Output::kv("URL", &info.descriptor.canonical_url());
    if let Some(duration) = info.duration_seconds {
        Output::kv("Duration", &format_duration(duration));
    }
    if let Some(size) = info.filesize_approx {
        Output::kv("Approx. size", &format_size(size));
    }

    if !info.chapters.is_empty() {
        Output::header("Chapters");
        for (i, chapter) in info.chapters.iter().enumerate() {
            Output::chapter(
                i + 1,
                &chapter.title,
                chapter.start_time_seconds,
                chapter.end_time_seconds,
            );
        }
    }

    Ok(())
}
