//! Clipwise CLI entry point.

use anyhow::Result;
use clap::Parser;
use clipwise::cli::commands::{self, SummarizeArgs};
use clipwise::cli::{Cli, Commands, Output};
use clipwise::config::Settings;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| format!("clipwise={}", log_level)),
        ))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    // Ctrl-C cancels long-running work cooperatively
    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                Output::warning("Cancelling...");
                cancel.cancel();
            }
        });
    }

    if let Err(err) = run(cli, &cancel).await {
        commands::report_error(&err);
        std::process::exit(1);
    }
}

async fn run(cli: Cli, cancel: &CancellationToken) -> Result<()> {
    // Load configuration
    let settings = match &cli.config {
        Some(path) => Settings::load_from(Some(&Settings::expand_path(path)))?,
        None => Settings::load()?,
    };

    // Ensure data directories exist
    std::fs::create_dir_all(settings.data_dir())?;
    std::fs::create_dir_all(settings.temp_dir())?;

    // Execute command
    match cli.command {
        Commands::Info { url } => {
            commands::run_info(&url, settings).await?;
        }

        Commands::Download {
            url,
            audio,
            no_split,
        } => {
            commands::run_download(&url, audio, no_split, settings, cancel).await?;
        }

        Commands::Split { file, audio } => {
            commands::run_split(&file, audio, settings, cancel).await?;
        }

        Commands::Transcript { url, lang } => {
            commands::run_transcript(&url, lang.as_deref(), settings).await?;
        }

        Commands::Summarize {
            url,
            provider,
            model,
            style,
            length,
            lang,
            temperature,
        } => {
            let args = SummarizeArgs {
                provider,
                model,
                style,
                length,
                language: lang,
                temperature,
            };
            commands::run_summarize(&url, args, settings, cancel).await?;
        }

        Commands::Translate {
            text,
            file,
            to,
            provider,
        } => {
            commands::run_translate(text, file, &to, provider, settings).await?;
        }

        Commands::Providers { action } => {
            commands::run_providers(&action, &settings).await?;
        }

        Commands::Key { action } => {
            commands::run_key(&action, &settings).await?;
        }

        Commands::Doctor => {
            commands::run_doctor(&settings).await?;
        }

        Commands::Config { action } => {
            commands::run_config(&action, &settings, cli.config.as_deref())?;
        }
    }

    Ok(())
}
