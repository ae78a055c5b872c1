//! Configuration settings for Clipwise.

use crate::config::prompts::{SummaryLength, SummaryStyle};
use crate::error::ClipwiseError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Hard ceiling for a shareable media part (16 MiB).
pub const MAX_CHUNK_SIZE_BYTES: u64 = 16 * 1024 * 1024;

/// Planning target for a media part (15 MiB), leaving headroom under the ceiling.
pub const TARGET_CHUNK_SIZE_BYTES: u64 = 15 * 1024 * 1024;

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub defaults: DefaultsSettings,
    pub download: DownloadSettings,
    pub transcode: TranscodeSettings,
    pub split: SplitSettings,
    pub ai: AiSettings,
    pub prompts: PromptSettings,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Directory for storing application data.
    pub data_dir: String,
    /// Directory for temporary files.
    pub temp_dir: String,
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            data_dir: "~/.clipwise".to_string(),
            temp_dir: "/tmp/clipwise".to_string(),
            log_level: "info".to_string(),
        }
    }
}

/// Color theme preference, stored for the UI layer.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    System,
    Light,
    Dark,
}

/// User defaults for summaries and playback.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DefaultsSettings {
    /// Provider used when none is given explicitly.
    pub provider_id: String,
    /// Model override for the default provider.
    pub model: Option<String>,
    /// Output language for summaries and transcripts.
    pub language: String,
    pub summary_style: SummaryStyle,
    pub summary_length: SummaryLength,
    pub temperature: f64,
    pub auto_play: bool,
    pub theme: Theme,
}

impl Default for DefaultsSettings {
    fn default() -> Self {
        Self {
            provider_id: "openai".to_string(),
            model: None,
            language: "en".to_string(),
            summary_style: SummaryStyle::default(),
            summary_length: SummaryLength::default(),
            temperature: 0.3,
            auto_play: false,
            theme: Theme::default(),
        }
    }
}

/// Download engine settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DownloadSettings {
    /// Path or name of the yt-dlp binary.
    pub ytdlp_path: String,
    /// Format selector passed with `-f`.
    pub format: String,
    /// Language requested for auto-generated subtitles.
    pub subtitle_language: String,
}

impl Default for DownloadSettings {
    fn default() -> Self {
        Self {
            ytdlp_path: "yt-dlp".to_string(),
            format: "best[ext=mp4]/best".to_string(),
            subtitle_language: "en".to_string(),
        }
    }
}

/// Transcode engine settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TranscodeSettings {
    /// Path or name of the ffmpeg binary.
    pub ffmpeg_path: String,
}

impl Default for TranscodeSettings {
    fn default() -> Self {
        Self {
            ffmpeg_path: "ffmpeg".to_string(),
        }
    }
}

/// Media splitting settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SplitSettings {
    pub max_chunk_bytes: u64,
    pub target_chunk_bytes: u64,
    /// Attempts per part before giving up.
    pub max_attempts: u32,
    /// Factor applied to a segment's duration after an oversized attempt.
    pub shrink_factor: f64,
    /// Cut on chapter boundaries when every chapter fits the ceiling.
    pub prefer_chapters: bool,
    /// Append the brand suffix to produced file names.
    pub brand_file_names: bool,
}

impl Default for SplitSettings {
    fn default() -> Self {
        Self {
            max_chunk_bytes: MAX_CHUNK_SIZE_BYTES,
            target_chunk_bytes: TARGET_CHUNK_SIZE_BYTES,
            max_attempts: 5,
            shrink_factor: 0.85,
            prefer_chapters: true,
            brand_file_names: false,
        }
    }
}

impl SplitSettings {
    /// Check that splitting terminates and stays under the ceiling.
    pub fn validate(&self) -> crate::error::Result<()> {
        let invalid = |msg: String| Err(ClipwiseError::Config(format!("split: {msg}")));

        if self.target_chunk_bytes == 0 {
            return invalid("target_chunk_bytes must be greater than 0".into());
        }
        if self.target_chunk_bytes > self.max_chunk_bytes {
            return invalid(format!(
                "target_chunk_bytes ({}) exceeds max_chunk_bytes ({})",
                self.target_chunk_bytes, self.max_chunk_bytes
            ));
        }
        if self.max_attempts == 0 {
            return invalid("max_attempts must be at least 1".into());
        }
        if !(self.shrink_factor > 0.0 && self.shrink_factor < 1.0) {
            return invalid(format!(
                "shrink_factor must be between 0 and 1, got {}",
                self.shrink_factor
            ));
        }
        Ok(())
    }
}

/// AI request settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AiSettings {
    pub request_timeout_secs: u64,
    /// Share of the context window held back for tokenizer estimate error.
    pub safety_margin: f64,
}

impl Default for AiSettings {
    fn default() -> Self {
        Self {
            request_timeout_secs: 120,
            safety_margin: 0.15,
        }
    }
}

/// Prompt customization settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct PromptSettings {
    /// Directory for custom prompts (overrides defaults).
    pub custom_dir: Option<String>,
    /// Custom variables available in all prompts as {{variable_name}}.
    pub variables: std::collections::HashMap<String, String>,
}

impl Settings {
    /// Load settings from the default configuration file.
    pub fn load() -> crate::error::Result<Self> {
        Self::load_from(None)
    }

    /// Load settings from a specific path, or default location if None.
    pub fn load_from(path: Option<&PathBuf>) -> crate::error::Result<Self> {
        let config_path = match path {
            Some(p) => p.clone(),
            None => Self::default_config_path(),
        };

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let settings: Settings = toml::from_str(&content)?;
            settings.validate()?;
            Ok(settings)
        } else {
            Ok(Settings::default())
        }
    }

    /// Reject values the media pipeline cannot work with.
    pub fn validate(&self) -> crate::error::Result<()> {
        self.split.validate()
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("clipwise")
            .join("config.toml")
    }

    /// Expand shell variables in paths (e.g., ~).
    pub fn expand_path(path: &str) -> PathBuf {
        PathBuf::from(shellexpand::tilde(path).to_string())
    }

    /// Get the expanded data directory path.
    pub fn data_dir(&self) -> PathBuf {
        Self::expand_path(&self.general.data_dir)
    }

    /// Get the expanded temp directory path.
    pub fn temp_dir(&self) -> PathBuf {
        Self::expand_path(&self.general.temp_dir)
    }

    /// Directory holding one `<id>.json` file per custom provider.
    pub fn providers_dir(&self) -> PathBuf {
        self.data_dir().join("providers")
    }

    /// File backing the credential store.
    pub fn credentials_path(&self) -> PathBuf {
        self.data_dir().join("credentials.json")
    }

    /// Directory downloads and split parts are written to.
    pub fn downloads_dir(&self) -> PathBuf {
        self.data_dir().join("downloads")
    }
}
