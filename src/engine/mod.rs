//! External download and transcode engines.
//!
//! The rest of the crate talks to yt-dlp and ffmpeg only through the
//! [`DownloadEngine`] and [`TranscodeEngine`] traits, so splitting and
//! downloading can be exercised against in-process fakes.

mod ffmpeg;
mod ytdlp;

pub use ffmpeg::{
    extract_audio_command, parse_duration, probe_command, segment_command, tokenize_command, Ffmpeg,
};
pub use ytdlp::YtDlp;

use crate::error::Result;
use async_trait::async_trait;
use regex::Regex;
use std::sync::LazyLock;

static PERCENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d{1,3}(?:\.\d+)?)%").expect("Invalid regex"));

/// Progress callback: raw ratio reported by the engine plus the log line it came from.
pub type ProgressCallback<'a> = &'a (dyn Fn(f64, Option<&str>) + Send + Sync);

/// One download engine invocation: a URL plus ordered `(flag, value)` options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadRequest {
    pub url: String,
    pub options: Vec<(String, Option<String>)>,
}

impl DownloadRequest {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            options: Vec::new(),
        }
    }

    /// Append a bare flag such as `--skip-download`.
    pub fn flag(mut self, flag: &str) -> Self {
        self.options.push((flag.to_string(), None));
        self
    }

    /// Append a flag with a value such as `-o <path>`.
    pub fn option(mut self, flag: &str, value: impl Into<String>) -> Self {
        self.options.push((flag.to_string(), Some(value.into())));
        self
    }

    pub fn has_flag(&self, flag: &str) -> bool {
        self.options.iter().any(|(f, _)| f == flag)
    }

    /// Command-line arguments, options first and the URL last.
    pub fn to_args(&self) -> Vec<String> {
        let mut args = Vec::with_capacity(self.options.len() * 2 + 1);
        for (flag, value) in &self.options {
            args.push(flag.clone());
            if let Some(value) = value {
                args.push(value.clone());
            }
        }
        args.push(self.url.clone());
        args
    }
}

/// Captured output of a finished download engine call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EngineOutput {
    pub stdout: String,
}

/// Result of a transcode engine call. Failure is reported here, not as an error.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TranscodeOutcome {
    pub success: bool,
    pub logs: String,
}

#[async_trait]
pub trait DownloadEngine: Send + Sync {
    /// Whether the engine finished initializing.
    fn is_ready(&self) -> bool;

    /// Run one request. Fails with `EngineNotReady` when called too early.
    async fn execute(&self, request: &DownloadRequest, progress: Option<ProgressCallback<'_>>) -> Result<EngineOutput>;
}

#[async_trait]
pub trait TranscodeEngine: Send + Sync {
    /// Run a single command-line style string, e.g. `-i "in.mp4" -vn "out.mp3"`.
    async fn execute(&self, command: &str) -> Result<TranscodeOutcome>;
}

/// Progress in `[0, 1]`.
///
/// A `NN.N%` token in the log line wins over the raw ratio; ratios above 1
/// are read as percentages.
pub fn normalize_progress(ratio: f64, line: Option<&str>) -> f64 {
    let from_line = line
        .and_then(|l| PERCENT.captures_iter(l).last())
        .and_then(|c| c[1].parse::<f64>().ok())
        .map(|p| p / 100.0);

    let value = match from_line {
        Some(v) => v,
        None if ratio.is_finite() && ratio > 1.0 => ratio / 100.0,
        None if ratio.is_finite() => ratio,
        None => 0.0,
    };

    value.clamp(0.0, 1.0)
}
