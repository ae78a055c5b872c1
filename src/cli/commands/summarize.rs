//! Summarize and translate commands.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::{language_name, Settings, SummaryLength, SummaryStyle};
use crate::orchestrator::Orchestrator;
use anyhow::{Context, Result};
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;

/// Overrides for the configured summary defaults.
#[derive(Debug, Clone, Default)]
pub struct SummarizeArgs {
    pub provider: Option<String>,
    pub model: Option<String>,
    pub style: Option<SummaryStyle>,
    pub length: Option<SummaryLength>,
    pub language: Option<String>,
    pub temperature: Option<f64>,
}

/// Run the summarize command.
pub async fn run_summarize(
    url: &str,
    args: SummarizeArgs,
    settings: Settings,
    cancel: &CancellationToken,
) -> Result<()> {
    preflight::check(Operation::Summarize, &settings)?;

    let orchestrator = Orchestrator::new(settings).await?;
    let provider_id = args
        .provider
        .clone()
        .unwrap_or_else(|| orchestrator.settings().defaults.provider_id.clone());
    preflight::check_credential(orchestrator.credentials().as_ref(), &provider_id).await?;

    let mut options = orchestrator.default_summary_options();
    if args.provider.is_some() {
        // The configured model belongs to the default provider.
        options.model = None;
    }
    options.model = args.model.or(options.model);
    options.style = args.style.unwrap_or(options.style);
    options.length = args.length.unwrap_or(options.length);
    options.language = args.language.unwrap_or(options.language);
    options.temperature = args.temperature.unwrap_or(options.temperature);

    let spinner = Output::spinner(&format!("Summarizing with {}...", provider_id));
    let result = orchestrator
        .summarize(url, Some(&provider_id), &options, cancel)
        .await;
    spinner.finish_and_clear();
    let result = result?;

    Output::header(&format!(
        "Summary ({}, {})",
        result.provider_id,
        language_name(&options.language)
    ));
    println!("\n{}\n", result.summary);
    Output::kv("Transcript", &format!("{} characters", result.transcript_chars));

    Ok(())
}

/// Run the translate command.
pub async fn run_translate(
    text: Option<String>,
    file: Option<PathBuf>,
    to: &str,
    provider: Option<String>,
    settings: Settings,
) -> Result<()> {
    let text = match (text, file) {
        (Some(text), _) => text,
        (None, Some(path)) => std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?,
        (None, None) => anyhow::bail!("Nothing to translate"),
    };

    let orchestrator = Orchestrator::new(settings).await?;
    let provider_id =
        provider.unwrap_or_else(|| orchestrator.settings().defaults.provider_id.clone());
    preflight::check_credential(orchestrator.credentials().as_ref(), &provider_id).await?;

    let spinner = Output::spinner(&format!("Translating to {}...", language_name(to)));
    let translated = orchestrator
        .translate(&text, Some(&provider_id), to, None)
        .await;
    spinner.finish_and_clear();

    println!("{}", translated?);
    Ok(())
}
