//! Pre-flight checks before expensive operations.
//!
//! Validates that required tools and credentials are available
//! before starting operations that would otherwise fail midway.

use crate::config::Settings;
use crate::error::{ClipwiseError, Result};
use crate::providers::CredentialStore;
use std::process::Command;

/// Requirements for different operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    /// Downloads need yt-dlp, and ffmpeg for splitting or audio extraction.
    Download,
    /// Splitting a local file needs ffmpeg.
    Split,
    /// Captions need yt-dlp.
    Transcript,
    /// Summaries need yt-dlp and a credential.
    Summarize,
}

impl Operation {
    fn tools<'a>(&self, settings: &'a Settings) -> Vec<&'a str> {
        let ytdlp = settings.download.ytdlp_path.as_str();
        let ffmpeg = settings.transcode.ffmpeg_path.as_str();
        match self {
            Operation::Download => vec![ytdlp, ffmpeg],
            Operation::Split => vec![ffmpeg],
            Operation::Transcript | Operation::Summarize => vec![ytdlp],
        }
    }
}

/// Run the tool checks for the given operation.
///
/// Returns Ok(()) if all checks pass, or an error describing what's missing.
pub fn check(operation: Operation, settings: &Settings) -> Result<()> {
    for tool in operation.tools(settings) {
        check_tool(tool)?;
    }
    Ok(())
}

/// Check that a credential is stored for `provider_id`.
pub async fn check_credential(credentials: &dyn CredentialStore, provider_id: &str) -> Result<()> {
    match credentials.get(provider_id).await {
        Some(key) if !key.trim().is_empty() => Ok(()),
        _ => Err(ClipwiseError::CredentialMissing {
            provider_id: provider_id.to_string(),
        }),
    }
}

/// Check if an external tool is available.
pub fn check_tool(name: &str) -> Result<()> {
    // ffmpeg/ffprobe use -version (single dash), others use --version
    let version_arg = if is_ffmpeg(name) { "-version" } else { "--version" };
    match Command::new(name).arg(version_arg).output() {
        Ok(output) if output.status.success() => Ok(()),
        Ok(_) => Err(ClipwiseError::ToolNotFound(format!(
            "{} is installed but not working correctly",
            name
        ))),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(ClipwiseError::ToolNotFound(name.to_string()))
        }
        Err(e) => Err(ClipwiseError::ToolNotFound(format!("{}: {}", name, e))),
    }
}

fn is_ffmpeg(name: &str) -> bool {
    std::path::Path::new(name)
        .file_stem()
        .and_then(|s| s.to_str())
        .is_some_and(|s| s.starts_with("ffmpeg") || s.starts_with("ffprobe"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::MemoryCredentialStore;

    #[test]
    fn test_transcript_needs_only_ytdlp() {
        let mut settings = Settings::default();
        settings.transcode.ffmpeg_path = "clipwise-no-such-ffmpeg".into();
        settings.download.ytdlp_path = "clipwise-no-such-ytdlp".into();

        assert!(matches!(
            check(Operation::Transcript, &settings),
            Err(ClipwiseError::ToolNotFound(ref tool)) if tool == "clipwise-no-such-ytdlp"
        ));
    }

    #[test]
    fn test_missing_tool_is_reported() {
        let mut settings = Settings::default();
        settings.transcode.ffmpeg_path = "clipwise-no-such-ffmpeg".into();
        assert!(matches!(
            check(Operation::Split, &settings),
            Err(ClipwiseError::ToolNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_check_credential() {
        let store = MemoryCredentialStore::new();
        assert!(matches!(
            check_credential(&store, "openai").await,
            Err(ClipwiseError::CredentialMissing { .. })
        ));

        store.set("openai", "sk-test").await.unwrap();
        assert!(check_credential(&store, "openai").await.is_ok());
    }

    #[test]
    fn test_is_ffmpeg() {
        assert!(is_ffmpeg("ffmpeg"));
        assert!(is_ffmpeg("/usr/local/bin/ffmpeg"));
        assert!(!is_ffmpeg("yt-dlp"));
    }
}
