//! ffmpeg as a [`TranscodeEngine`].

use super::{TranscodeEngine, TranscodeOutcome};
use crate::error::{ClipwiseError, Result};
use async_trait::async_trait;
use regex::Regex;
use std::path::Path;
use std::process::Stdio;
use std::sync::LazyLock;
use tokio::process::Command;
use tracing::{debug, instrument};

static DURATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"Duration:\s*(\d+):(\d{2}):(\d{2}(?:\.\d+)?)").expect("Invalid regex")
});

/// Runs the ffmpeg binary.
#[derive(Debug, Clone)]
pub struct Ffmpeg {
    binary: String,
}

impl Ffmpeg {
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    /// Whether `ffmpeg -version` runs successfully.
    pub async fn is_available(&self) -> bool {
        Command::new(&self.binary)
            .arg("-version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await
            .map(|s| s.success())
            .unwrap_or(false)
    }
}

impl Default for Ffmpeg {
    fn default() -> Self {
        Self::new("ffmpeg")
    }
}

#[async_trait]
impl TranscodeEngine for Ffmpeg {
    #[instrument(skip(self))]
    async fn execute(&self, command: &str) -> Result<TranscodeOutcome> {
        let args = tokenize_command(command)?;

        let result = Command::new(&self.binary)
            .arg("-hide_banner")
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await;

        let output = match result {
            Ok(o) => o,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(ClipwiseError::ToolNotFound(self.binary.clone()));
            }
            Err(e) => return Err(ClipwiseError::Io(e)),
        };

        // ffmpeg writes its log to stderr.
        let mut logs = String::from_utf8_lossy(&output.stderr).into_owned();
        logs.push_str(&String::from_utf8_lossy(&output.stdout));

        debug!("ffmpeg exited with {}", output.status);
        Ok(TranscodeOutcome {
            success: output.status.success(),
            logs,
        })
    }
}

/// Quote a path for a command string.
fn quote(path: &Path) -> String {
    let raw = path.to_string_lossy();
    format!("\"{}\"", raw.replace('\\', "\\\\").replace('"', "\\\""))
}

/// Probe command; the duration is read from the log, the exit code is ignored.
pub fn probe_command(source: &Path) -> String {
    format!("-i {}", quote(source))
}

/// Stream-copy `[start, start + duration)` of `source` into `dest`.
pub fn segment_command(source: &Path, dest: &Path, start: f64, duration: f64) -> String {
    format!(
        "-y -ss {:.3} -i {} -t {:.3} -c copy -avoid_negative_ts make_zero {}",
        start,
        quote(source),
        duration,
        quote(dest)
    )
}

/// Drop the video stream and encode the audio as 128 kbit/s MP3.
pub fn extract_audio_command(source: &Path, dest: &Path) -> String {
    format!(
        "-i {} -vn -c:a libmp3lame -b:a 128k -y {}",
        quote(source),
        quote(dest)
    )
}

/// Total duration in seconds from a `Duration: HH:MM:SS.cc` log line.
pub fn parse_duration(logs: &str) -> Option<f64> {
    let caps = DURATION.captures(logs)?;
    let hours: f64 = caps[1].parse().ok()?;
    let minutes: f64 = caps[2].parse().ok()?;
    let seconds: f64 = caps[3].parse().ok()?;
    let total = hours * 3600.0 + minutes * 60.0 + seconds;
    (total > 0.0).then_some(total)
}

/// Split a command string into arguments, honoring double quotes and backslash escapes.
pub fn tokenize_command(command: &str) -> Result<Vec<String>> {
    let mut args = Vec::new();
    let mut current = String::new();
    let mut in_token = false;
    let mut in_quotes = false;
    let mut chars = command.chars();

    while let Some(c) = chars.next() {
        match c {
            '"' => {
                in_quotes = !in_quotes;
                in_token = true;
            }
            '\\' if in_quotes => {
                if let Some(next) = chars.next() {
                    current.push(next);
                }
            }
            c if c.is_whitespace() && !in_quotes => {
                if in_token {
                    args.push(std::mem::take(&mut current));
                    in_token = false;
                }
            }
            c => {
                current.push(c);
                in_token = true;
            }
        }
    }

    if in_quotes {
        return Err(ClipwiseError::InvalidInput(format!(
            "unterminated quote in command: {command}"
        )));
    }
    if in_token {
        args.push(current);
    }

    Ok(args)
}
