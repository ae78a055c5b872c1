//! Transcript command implementation.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::Orchestrator;
use anyhow::Result;

/// Run the transcript command.
pub async fn run_transcript(url: &str, lang: Option<&str>, settings: Settings) -> Result<()> {
    preflight::check(Operation::Transcript, &settings)?;

    let orchestrator = Orchestrator::new(settings).await?;

    let spinner = Output::spinner("Fetching captions...");
    let transcript = orchestrator.transcript(url, lang).await;
    spinner.finish_and_clear();

    println!("{}", transcript?);
    Ok(())
}
