//! Error types for Clipwise.

use thiserror::Error;

/// Library-level error type for Clipwise operations.
#[derive(Error, Debug)]
pub enum ClipwiseError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("No credential stored for provider '{provider_id}'")]
    CredentialMissing { provider_id: String },

    #[error("Provider '{provider_id}' rejected the credential (HTTP {status})")]
    CredentialRejected { provider_id: String, status: u16 },

    #[error("Provider not found: {0}")]
    ProviderNotFound(String),

    #[error("Provider misconfigured: {0}")]
    ProviderMisconfigured(String),

    #[error("Model '{model}' is not available for provider '{provider_id}'")]
    ModelNotFound { provider_id: String, model: String },

    #[error("Network error{}: {message}", .status.map(|s| format!(" (HTTP {s})")).unwrap_or_default())]
    Network { status: Option<u16>, message: String },

    #[error("Quota exceeded: {0}")]
    QuotaExceeded(String),

    #[error("Could not extract content at path '{path}'")]
    ContentExtraction { path: String },

    #[error("Media unavailable: {0}")]
    MediaUnavailable(String),

    #[error("Download failed: {0}")]
    DownloadFailed(String),

    #[error("Split failed: {0}")]
    SplitFailed(String),

    #[error("Engine not ready: {0}")]
    EngineNotReady(String),

    #[error("An operation for '{0}' is already in progress")]
    InProgress(String),

    #[error("Operation cancelled")]
    Cancelled,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("External tool not found: {0}. Please install it and ensure it's in your PATH.")]
    ToolNotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("{0}")]
    Unknown(String),
}

impl From<reqwest::Error> for ClipwiseError {
    fn from(err: reqwest::Error) -> Self {
        ClipwiseError::Network {
            status: err.status().map(|s| s.as_u16()),
            message: err.to_string(),
        }
    }
}

/// Result type alias for Clipwise operations.
pub type Result<T> = std::result::Result<T, ClipwiseError>;

/// Coarse failure categories shown to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidInput,
    CredentialMissing,
    ProviderMisconfigured,
    ModelNotFound,
    Network,
    QuotaExceeded,
    ContentExtractionFailed,
    MediaUnavailable,
    DownloadFailed,
    SplitFailed,
    EngineNotReady,
    Unknown,
}

/// A failure rendered for the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserMessage {
    pub title: String,
    pub message: String,
    pub hint: Option<String>,
}

impl ClipwiseError {
    /// Map this error onto its user-facing category.
    pub fn kind(&self) -> ErrorKind {
        match self {
            ClipwiseError::InvalidInput(_) | ClipwiseError::InProgress(_) => ErrorKind::InvalidInput,
            ClipwiseError::CredentialMissing { .. } | ClipwiseError::CredentialRejected { .. } => {
                ErrorKind::CredentialMissing
            }
            ClipwiseError::ProviderNotFound(_)
            | ClipwiseError::ProviderMisconfigured(_)
            | ClipwiseError::Config(_) => ErrorKind::ProviderMisconfigured,
            ClipwiseError::ModelNotFound { .. } => ErrorKind::ModelNotFound,
            ClipwiseError::Network { .. } => ErrorKind::Network,
            ClipwiseError::QuotaExceeded(_) => ErrorKind::QuotaExceeded,
            ClipwiseError::ContentExtraction { .. } | ClipwiseError::Json(_) => {
                ErrorKind::ContentExtractionFailed
            }
            ClipwiseError::MediaUnavailable(_) => ErrorKind::MediaUnavailable,
            ClipwiseError::DownloadFailed(_) => ErrorKind::DownloadFailed,
            ClipwiseError::SplitFailed(_) => ErrorKind::SplitFailed,
            ClipwiseError::EngineNotReady(_) | ClipwiseError::ToolNotFound(_) => {
                ErrorKind::EngineNotReady
            }
            ClipwiseError::Cancelled
            | ClipwiseError::Io(_)
            | ClipwiseError::TomlParse(_)
            | ClipwiseError::Unknown(_) => ErrorKind::Unknown,
        }
    }

    /// Title, message and optional hint for display.
    pub fn user_message(&self) -> UserMessage {
        if let ClipwiseError::CredentialRejected { .. } = self {
            return UserMessage {
                title: "API key rejected".to_string(),
                message: self.to_string(),
                hint: Some("Check that the stored key is valid and has access to this model.".to_string()),
            };
        }

        let (title, hint): (&str, Option<&str>) = match self.kind() {
            ErrorKind::InvalidInput => ("Invalid input", Some("Check the link or value and try again.")),
            ErrorKind::CredentialMissing => (
                "API key missing",
                Some("Add an API key for this provider with `clipwise key set <provider> <key>`."),
            ),
            ErrorKind::ProviderMisconfigured => (
                "Provider configuration problem",
                Some("Check the provider id or its JSON definition with `clipwise providers show`."),
            ),
            ErrorKind::ModelNotFound => (
                "Model not available",
                Some("Pick one of the provider's available models."),
            ),
            ErrorKind::Network => (
                "Network error",
                Some("Check your connection and the provider's status, then retry."),
            ),
            ErrorKind::QuotaExceeded => (
                "Quota exceeded",
                Some("Wait a moment or check the billing limits of your provider account."),
            ),
            ErrorKind::ContentExtractionFailed => (
                "Unexpected provider response",
                Some("The provider's response did not match its configured content path."),
            ),
            ErrorKind::MediaUnavailable => (
                "Media unavailable",
                Some("This media has no captions or cannot be accessed."),
            ),
            ErrorKind::DownloadFailed => ("Download failed", Some("Retry, or update yt-dlp.")),
            ErrorKind::SplitFailed => (
                "Could not split media",
                Some("Already written parts were kept; the original file was not deleted."),
            ),
            ErrorKind::EngineNotReady => (
                "Engine not ready",
                Some("Run `clipwise doctor` to check yt-dlp and ffmpeg."),
            ),
            ErrorKind::Unknown => ("Something went wrong", None),
        };

        UserMessage {
            title: title.to_string(),
            message: self.to_string(),
            hint: hint.map(str::to_string),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_network_auth_quota_are_distinguishable() {
        let network = ClipwiseError::Network {
            status: Some(500),
            message: "boom".into(),
        }
        .user_message();
        let auth = ClipwiseError::CredentialMissing {
            provider_id: "openai".into(),
        }
        .user_message();
        let quota = ClipwiseError::QuotaExceeded("slow down".into()).user_message();

        assert_ne!(network.title, auth.title);
        assert_ne!(network.title, quota.title);
        assert_ne!(auth.title, quota.title);
        assert!(network.message.contains("HTTP 500"));
    }

    #[test]
    fn test_content_extraction_names_path() {
        let err = ClipwiseError::ContentExtraction {
            path: "choices[0].message.content".into(),
        };
        assert_eq!(err.kind(), ErrorKind::ContentExtractionFailed);
        assert!(err.to_string().contains("choices[0].message.content"));
    }
}
