//! CLI module for Clipwise.

pub mod commands;
mod output;
pub mod preflight;

pub use output::{format_duration, format_size, format_timestamp, Output};

use crate::config::{SummaryLength, SummaryStyle};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Clipwise - shrink media for sharing and summarize it with any AI provider
///
/// Downloads YouTube and X media, splits it under a size ceiling for messaging
/// apps, and summarizes captions through schema-driven provider definitions.
#[derive(Parser, Debug)]
#[command(name = "clipwise")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show platform, title, duration and chapters of a link
    Info {
        /// YouTube or X link, or a bare YouTube video id
        url: String,
    },

    /// Download media and split it under the size ceiling
    Download {
        /// YouTube or X link, or a bare YouTube video id
        url: String,

        /// Keep only the audio track (MP3)
        #[arg(short, long)]
        audio: bool,

        /// Keep the downloaded file whole even if it is oversized
        #[arg(long)]
        no_split: bool,
    },

    /// Split a local file under the size ceiling
    Split {
        /// Media file to split; it is deleted once all parts are written
        file: PathBuf,

        /// Use the audio profile (MP3 parts)
        #[arg(short, long)]
        audio: bool,
    },

    /// Print the cleaned caption text of a video
    Transcript {
        /// YouTube link or video id
        url: String,

        /// Caption language code
        #[arg(short, long)]
        lang: Option<String>,
    },

    /// Summarize a video from its captions
    Summarize {
        /// YouTube link or video id
        url: String,

        /// Provider id (defaults to the configured provider)
        #[arg(short, long)]
        provider: Option<String>,

        /// Model override for the provider
        #[arg(short, long)]
        model: Option<String>,

        /// Summary style (concise, detailed, bullet_points, key_takeaways)
        #[arg(short, long)]
        style: Option<SummaryStyle>,

        /// Summary length (short, medium, long)
        #[arg(short = 'n', long)]
        length: Option<SummaryLength>,

        /// Output language code
        #[arg(short, long)]
        lang: Option<String>,

        /// Sampling temperature
        #[arg(short, long)]
        temperature: Option<f64>,
    },

    /// Translate text with an AI provider
    Translate {
        /// Text to translate
        #[arg(required_unless_present = "file", conflicts_with = "file")]
        text: Option<String>,

        /// Read the text from a file instead
        #[arg(short, long)]
        file: Option<PathBuf>,

        /// Target language code
        #[arg(long)]
        to: String,

        /// Provider id (defaults to the configured provider)
        #[arg(short, long)]
        provider: Option<String>,
    },

    /// Manage AI providers
    Providers {
        #[command(subcommand)]
        action: ProvidersAction,
    },

    /// Manage provider API keys
    Key {
        #[command(subcommand)]
        action: KeyAction,
    },

    /// Check system requirements and configuration
    Doctor,

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ProvidersAction {
    /// List built-in and custom providers
    List,

    /// Show a provider's full definition
    Show {
        /// Provider id
        id: String,
    },

    /// Add or replace a custom provider from a JSON definition file
    Add {
        /// Path to the provider JSON
        file: PathBuf,
    },

    /// Remove a custom provider
    Remove {
        /// Provider id
        id: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum KeyAction {
    /// Store the API key for a provider
    Set {
        /// Provider id
        provider: String,
        /// API key
        key: String,
    },

    /// Remove the stored API key for a provider
    Remove {
        /// Provider id
        provider: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Show configuration file path
    Path,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_summarize_options() {
        let cli = Cli::parse_from([
            "clipwise",
            "summarize",
            "dQw4w9WgXcQ",
            "--style",
            "bullet-points",
            "--length",
            "short",
            "--provider",
            "gemini",
        ]);

        match cli.command {
            Commands::Summarize {
                style,
                length,
                provider,
                ..
            } => {
                assert_eq!(style, Some(SummaryStyle::BulletPoints));
                assert_eq!(length, Some(SummaryLength::Short));
                assert_eq!(provider.as_deref(), Some("gemini"));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_translate_needs_text_or_file() {
        assert!(Cli::try_parse_from(["clipwise", "translate", "--to", "de"]).is_err());
        assert!(Cli::try_parse_from(["clipwise", "translate", "hallo", "--to", "en"]).is_ok());
    }
}
