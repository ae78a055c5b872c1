//! Download, transcript and audio operations over the external engines.

use super::locks::InFlightRegistry;
use super::splitter::MediaSplitter;
use super::{identify, MediaArtifact, MediaDescriptor, MediaInfo, Platform, VideoChapter};
use crate::config::{DownloadSettings, Settings, SplitSettings};
use crate::engine::{
    extract_audio_command, normalize_progress, DownloadEngine, DownloadRequest, TranscodeEngine,
};
use crate::error::{ClipwiseError, Result};
use crate::transcript::vtt_to_text;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

/// yt-dlp extractor arguments needed for X posts.
const X_EXTRACTOR_ARGS: &str = "twitter:api=syndication";

/// Leftover extensions of an unfinished yt-dlp download.
const PARTIAL_EXTENSIONS: &[&str] = &["part", "ytdl", "temp"];

/// A finished download together with the metadata fetched for it.
#[derive(Debug, Clone)]
pub struct DownloadedMedia {
    pub info: MediaInfo,
    pub artifact: MediaArtifact,
}

/// Coordinates the download engine, the transcoder and the splitters.
pub struct MediaRepository {
    downloader: Arc<dyn DownloadEngine>,
    transcoder: Arc<dyn TranscodeEngine>,
    download: DownloadSettings,
    split: SplitSettings,
    downloads_dir: PathBuf,
    temp_dir: PathBuf,
    locks: InFlightRegistry,
}

impl MediaRepository {
    pub fn new(
        downloader: Arc<dyn DownloadEngine>,
        transcoder: Arc<dyn TranscodeEngine>,
        settings: &Settings,
    ) -> Self {
        Self {
            downloader,
            transcoder,
            download: settings.download.clone(),
            split: settings.split.clone(),
            downloads_dir: settings.downloads_dir(),
            temp_dir: settings.temp_dir(),
            locks: InFlightRegistry::new(),
        }
    }

    pub fn identify(&self, url: &str) -> Result<MediaDescriptor> {
        identify(url)
    }

    pub fn locks(&self) -> &InFlightRegistry {
        &self.locks
    }

    pub fn video_splitter(&self) -> MediaSplitter {
        MediaSplitter::video(Arc::clone(&self.transcoder), self.split.clone())
    }

    pub fn audio_splitter(&self) -> MediaSplitter {
        MediaSplitter::audio(Arc::clone(&self.transcoder), self.split.clone())
    }

    /// Title, duration and chapters without downloading.
    #[instrument(skip(self))]
    pub async fn fetch_info(&self, url: &str) -> Result<MediaInfo> {
        let descriptor = identify(url)?;
        self.ensure_ready()?;

        let request = with_platform_args(
            DownloadRequest::new(descriptor.canonical_url())
                .flag("--skip-download")
                .flag("--dump-json")
                .flag("--no-warnings"),
            descriptor.platform,
        );

        let output = self.downloader.execute(&request, None).await?;
        let line = output
            .stdout
            .lines()
            .rev()
            .find(|l| l.trim_start().starts_with('{'))
            .ok_or_else(|| ClipwiseError::DownloadFailed("no metadata returned".into()))?;
        let json: serde_json::Value = serde_json::from_str(line)?;

        let info = MediaInfo::from_json(descriptor, &json);
        info!(
            "{} '{}' ({} chapters)",
            info.descriptor.key(),
            info.title,
            info.chapters.len()
        );
        Ok(info)
    }

    /// Download the media at `url` into the downloads directory.
    ///
    /// `progress` receives values in `[0, 1]`.
    #[instrument(skip(self, progress))]
    pub async fn download(
        &self,
        url: &str,
        progress: Option<&(dyn Fn(f64) + Send + Sync)>,
    ) -> Result<DownloadedMedia> {
        let descriptor = identify(url)?;
        let _guard = self.locks.acquire(&descriptor.media_id)?;

        let info = self.fetch_info(url).await?;

        tokio::fs::create_dir_all(&self.downloads_dir).await?;
        let stem = descriptor.key();
        let template = self.downloads_dir.join(format!("{stem}.%(ext)s"));

        let request = with_platform_args(
            DownloadRequest::new(descriptor.canonical_url())
                .option("-f", self.download.format.clone())
                .flag("--no-warnings")
                .option("-o", template.to_string_lossy()),
            descriptor.platform,
        );

        let forward = |ratio: f64, line: Option<&str>| {
            if let Some(callback) = progress {
                callback(normalize_progress(ratio, line));
            }
        };

        info!("Downloading {}", descriptor.canonical_url());
        self.downloader.execute(&request, Some(&forward)).await?;

        let file = find_download(&self.downloads_dir, &stem).await?;
        let size_bytes = tokio::fs::metadata(&file).await?.len();
        let needs_splitting = size_bytes > self.split.max_chunk_bytes;
        info!(
            "Downloaded {} ({} bytes{})",
            file.display(),
            size_bytes,
            if needs_splitting { ", needs splitting" } else { "" }
        );

        let artifact = MediaArtifact {
            media_id: descriptor.media_id.clone(),
            title: info.title.clone(),
            url: url.to_string(),
            file: Some(file),
            split_files: Vec::new(),
            size_bytes,
            needs_splitting,
        };

        Ok(DownloadedMedia { info, artifact })
    }

    /// Split an artifact's file below the ceiling, using `splitter`'s profile.
    #[instrument(skip(self, splitter, artifact, chapters, cancel), fields(media_id = %artifact.media_id))]
    pub async fn split(
        &self,
        splitter: &MediaSplitter,
        artifact: MediaArtifact,
        chapters: &[VideoChapter],
        cancel: &CancellationToken,
    ) -> Result<MediaArtifact> {
        let _guard = self.locks.acquire(&artifact.media_id)?;

        let out_dir = match &artifact.file {
            Some(file) => file
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_else(|| self.downloads_dir.clone()),
            None => return Ok(artifact),
        };

        splitter
            .split_artifact(artifact, &out_dir, chapters, cancel)
            .await
    }

    /// Auto-generated captions for `url`, as plain text.
    #[instrument(skip(self))]
    pub async fn extract_transcript(&self, url: &str, language: Option<&str>) -> Result<String> {
        let descriptor = identify(url)?;
        if descriptor.platform == Platform::X {
            return Err(ClipwiseError::MediaUnavailable(
                "X posts do not provide captions".into(),
            ));
        }
        self.ensure_ready()?;

        tokio::fs::create_dir_all(&self.temp_dir).await?;
        let workdir = tempfile::Builder::new()
            .prefix("subs-")
            .tempdir_in(&self.temp_dir)?;

        let language = language.unwrap_or(&self.download.subtitle_language).to_string();
        let template = workdir.path().join(format!("{}.%(ext)s", descriptor.media_id));
        let request = DownloadRequest::new(descriptor.canonical_url())
            .flag("--skip-download")
            .flag("--write-auto-sub")
            .option("--sub-lang", language.clone())
            .option("--sub-format", "vtt")
            .option("-o", template.to_string_lossy());

        self.downloader.execute(&request, None).await?;

        let vtt_path = find_with_extension(workdir.path(), "vtt")
            .await?
            .ok_or_else(|| {
                ClipwiseError::MediaUnavailable(format!("no '{language}' captions available"))
            })?;

        let raw = tokio::fs::read_to_string(&vtt_path).await?;
        let text = vtt_to_text(&raw);
        if text.trim().is_empty() {
            return Err(ClipwiseError::MediaUnavailable("captions are empty".into()));
        }

        debug!("Transcript has {} chars", text.len());
        Ok(text)
    }

    /// Replace the artifact's video file with an MP3 of its audio track.
    #[instrument(skip(self, artifact), fields(media_id = %artifact.media_id))]
    pub async fn extract_audio(&self, artifact: MediaArtifact) -> Result<MediaArtifact> {
        let source = artifact.file.clone().ok_or_else(|| {
            ClipwiseError::InvalidInput(format!("{} has no file to extract audio from", artifact.media_id))
        })?;
        let dest = source.with_extension("mp3");
        if dest == source {
            return Ok(artifact);
        }

        let outcome = self
            .transcoder
            .execute(&extract_audio_command(&source, &dest))
            .await?;
        if !outcome.success || !dest.exists() {
            return Err(ClipwiseError::DownloadFailed(format!(
                "audio extraction failed for {}",
                source.display()
            )));
        }

        tokio::fs::remove_file(&source).await?;
        let size_bytes = tokio::fs::metadata(&dest).await?.len();
        info!("Extracted audio to {} ({} bytes)", dest.display(), size_bytes);

        Ok(MediaArtifact {
            file: Some(dest),
            size_bytes,
            needs_splitting: size_bytes > self.split.max_chunk_bytes,
            ..artifact
        })
    }

    /// Delete every file the artifact refers to.
    pub async fn cleanup(&self, artifact: &MediaArtifact) -> Result<()> {
        for file in artifact.file.iter().chain(artifact.split_files.iter()) {
            match tokio::fs::remove_file(file).await {
                Ok(()) => debug!("Removed {}", file.display()),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }
        Ok(())
    }

    fn ensure_ready(&self) -> Result<()> {
        if self.downloader.is_ready() {
            Ok(())
        } else {
            Err(ClipwiseError::EngineNotReady(
                "the download engine is still initializing".into(),
            ))
        }
    }
}

fn with_platform_args(request: DownloadRequest, platform: Platform) -> DownloadRequest {
    match platform {
        Platform::X => request.option("--extractor-args", X_EXTRACTOR_ARGS),
        Platform::YouTube => request,
    }
}

/// The finished download named `<stem>.<ext>`, ignoring partial files.
async fn find_download(dir: &Path, stem: &str) -> Result<PathBuf> {
    let prefix = format!("{stem}.");
    let mut entries = tokio::fs::read_dir(dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        let name = entry.file_name().to_string_lossy().into_owned();
        let Some(extension) = name.strip_prefix(&prefix) else {
            continue;
        };
        if PARTIAL_EXTENSIONS.iter().any(|p| extension.ends_with(p)) {
            warn!("Ignoring partial download {}", name);
            continue;
        }
        return Ok(entry.path());
    }

    Err(ClipwiseError::DownloadFailed(format!(
        "downloaded file for {stem} not found"
    )))
}

async fn find_with_extension(dir: &Path, extension: &str) -> Result<Option<PathBuf>> {
    let mut entries = tokio::fs::read_dir(dir).await?;
    let mut found = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) == Some(extension) {
            found.push(path);
        }
    }
    found.sort();
    Ok(found.into_iter().next())
}
