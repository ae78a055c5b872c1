//! Pipeline orchestration: the share flow and the summary flow.
//!
//! The share flow downloads media, optionally reduces it to audio, and
//! splits it under the size ceiling. The summary flow pulls captions and
//! runs them through the AI repository.

use crate::ai::{AiClient, AiRepository, HttpTransport, ReqwestTransport, SummaryOptions};
use crate::config::{Prompts, Settings};
use crate::engine::{DownloadEngine, Ffmpeg, TranscodeEngine, YtDlp};
use crate::error::Result;
use crate::media::{MediaArtifact, MediaDescriptor, MediaInfo, MediaRepository, MediaSplitter};
use crate::providers::{CredentialStore, FileCredentialStore, ProviderRepository};
use crate::transcript::TranscriptProcessor;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument, warn};

/// Result of preparing media for sharing.
#[derive(Debug, Clone)]
pub struct ShareResult {
    pub info: MediaInfo,
    pub artifact: MediaArtifact,
}

impl ShareResult {
    pub fn files(&self) -> Vec<PathBuf> {
        self.artifact.files()
    }
}

/// Result of summarizing a URL.
#[derive(Debug, Clone)]
pub struct SummaryResult {
    pub descriptor: MediaDescriptor,
    pub provider_id: String,
    pub transcript_chars: usize,
    pub summary: String,
}

/// Owns the repositories and runs the end-to-end flows.
pub struct Orchestrator {
    settings: Settings,
    providers: Arc<ProviderRepository>,
    credentials: Arc<dyn CredentialStore>,
    media: MediaRepository,
    ai: AiRepository,
}

impl Orchestrator {
    /// Build with the real engines, the file credential store and an HTTP transport.
    ///
    /// A yt-dlp that fails to start is logged and left not ready; calls that
    /// need it then fail with `EngineNotReady`.
    pub async fn new(settings: Settings) -> Result<Self> {
        let providers = Arc::new(ProviderRepository::new(&settings.providers_dir())?);
        let credentials: Arc<dyn CredentialStore> =
            Arc::new(FileCredentialStore::open(&settings.credentials_path())?);
        let transport: Arc<dyn HttpTransport> = Arc::new(ReqwestTransport::with_timeout(
            Duration::from_secs(settings.ai.request_timeout_secs),
        )?);
        let prompts = Prompts::load(
            settings.prompts.custom_dir.as_deref(),
            Some(&settings.prompts.variables),
        )?;

        let ytdlp = YtDlp::new(settings.download.ytdlp_path.clone());
        match ytdlp.initialize().await {
            Ok(version) => info!("yt-dlp {} ready", version),
            Err(e) => warn!("yt-dlp unavailable: {}", e),
        }
        let transcoder = Ffmpeg::new(settings.transcode.ffmpeg_path.clone());

        Ok(Self::with_components(
            settings,
            providers,
            credentials,
            Arc::new(ytdlp),
            Arc::new(transcoder),
            transport,
            prompts,
        ))
    }

    /// Build from explicit components.
    pub fn with_components(
        settings: Settings,
        providers: Arc<ProviderRepository>,
        credentials: Arc<dyn CredentialStore>,
        downloader: Arc<dyn DownloadEngine>,
        transcoder: Arc<dyn TranscodeEngine>,
        transport: Arc<dyn HttpTransport>,
        prompts: Prompts,
    ) -> Self {
        let client = AiClient::new(transport, Arc::clone(&credentials));
        let ai = AiRepository::new(
            client,
            Arc::clone(&providers),
            TranscriptProcessor::with_safety_margin(settings.ai.safety_margin),
            prompts,
        );
        let media = MediaRepository::new(downloader, transcoder, &settings);

        Self {
            settings,
            providers,
            credentials,
            media,
            ai,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn providers(&self) -> &Arc<ProviderRepository> {
        &self.providers
    }

    pub fn credentials(&self) -> &Arc<dyn CredentialStore> {
        &self.credentials
    }

    pub fn media(&self) -> &MediaRepository {
        &self.media
    }

    /// Title, duration and chapters for `url`.
    pub async fn info(&self, url: &str) -> Result<MediaInfo> {
        self.media.fetch_info(url).await
    }

    /// Download `url` and shrink it for sharing.
    ///
    /// With `audio_only` the video is replaced by an MP3 first. With `split`
    /// an oversized result is cut into parts under the ceiling, using the
    /// media's chapters when it has any.
    #[instrument(skip(self, progress, cancel))]
    pub async fn prepare_for_sharing(
        &self,
        url: &str,
        audio_only: bool,
        split: bool,
        progress: Option<&(dyn Fn(f64) + Send + Sync)>,
        cancel: &CancellationToken,
    ) -> Result<ShareResult> {
        let downloaded = self.media.download(url, progress).await?;
        let info = downloaded.info;
        let mut artifact = downloaded.artifact;

        if audio_only {
            artifact = self.media.extract_audio(artifact).await?;
        }

        if split && artifact.needs_splitting {
            let splitter = self.splitter(audio_only);
            artifact = self
                .media
                .split(&splitter, artifact, &info.chapters, cancel)
                .await?;
        }

        info!("{} ready to share as {} file(s)", info.descriptor.key(), artifact.files().len());
        Ok(ShareResult { info, artifact })
    }

    /// Split a local file in place, without chapters.
    #[instrument(skip(self, cancel))]
    pub async fn split_file(
        &self,
        path: &Path,
        audio: bool,
        cancel: &CancellationToken,
    ) -> Result<Vec<PathBuf>> {
        let out_dir = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        self.splitter(audio).split(path, &out_dir, &[], cancel).await
    }

    /// Cleaned caption text for `url`.
    pub async fn transcript(&self, url: &str, language: Option<&str>) -> Result<String> {
        let raw = self.media.extract_transcript(url, language).await?;
        Ok(TranscriptProcessor::new().clean_transcript(&raw))
    }

    /// Fetch captions for `url` and summarize them.
    ///
    /// `provider_id` falls back to the configured default provider.
    #[instrument(skip(self, options, cancel))]
    pub async fn summarize(
        &self,
        url: &str,
        provider_id: Option<&str>,
        options: &SummaryOptions,
        cancel: &CancellationToken,
    ) -> Result<SummaryResult> {
        let descriptor = self.media.identify(url)?;
        let provider_id = provider_id
            .unwrap_or(&self.settings.defaults.provider_id)
            .to_string();
        // Fails fast on an unknown provider before touching the network.
        self.providers.resolve(&provider_id, options.model.as_deref())?;

        let transcript = self.media.extract_transcript(url, None).await?;
        let summary = self
            .ai
            .generate_summary(&transcript, &provider_id, options, cancel)
            .await?;

        Ok(SummaryResult {
            descriptor,
            provider_id,
            transcript_chars: transcript.chars().count(),
            summary,
        })
    }

    /// Translate `text` into `target_language`.
    pub async fn translate(
        &self,
        text: &str,
        provider_id: Option<&str>,
        target_language: &str,
        temperature: Option<f64>,
    ) -> Result<String> {
        let provider_id = provider_id.unwrap_or(&self.settings.defaults.provider_id);
        let temperature = temperature.unwrap_or(self.settings.defaults.temperature);
        self.ai
            .translate(text, provider_id, target_language, temperature)
            .await
    }

    /// Default summary options from the configured defaults.
    pub fn default_summary_options(&self) -> SummaryOptions {
        SummaryOptions::from(&self.settings.defaults)
    }

    fn splitter(&self, audio: bool) -> MediaSplitter {
        if audio {
            self.media.audio_splitter()
        } else {
            self.media.video_splitter()
        }
    }
}
