//! Media identification, download, transcripts and splitting.

mod chapters;
mod locks;
pub mod naming;
mod repository;
mod splitter;

pub use chapters::{
    estimate_chapter_bytes, first_oversized_chapter, normalize_chapters, parse_chapters,
    EstimatedChapter, VideoChapter,
};
pub use locks::{InFlightGuard, InFlightRegistry};
pub use repository::{DownloadedMedia, MediaRepository};
pub use splitter::{MediaKind, MediaSplitter};

use crate::error::{ClipwiseError, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::PathBuf;
use std::sync::LazyLock;
use url::Url;

static YOUTUBE_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_-]{11}$").expect("Invalid regex"));

static STATUS_ID: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d{1,25}$").expect("Invalid regex"));

/// Supported source platforms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    YouTube,
    X,
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Platform::YouTube => write!(f, "youtube"),
            Platform::X => write!(f, "x"),
        }
    }
}

/// Platform plus the platform's id for one piece of media.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MediaDescriptor {
    pub platform: Platform,
    pub media_id: String,
}

impl MediaDescriptor {
    /// Stable URL the download engine is given.
    pub fn canonical_url(&self) -> String {
        match self.platform {
            Platform::YouTube => format!("https://www.youtube.com/watch?v={}", self.media_id),
            Platform::X => format!("https://x.com/i/status/{}", self.media_id),
        }
    }

    /// Key used for file names and locks, e.g. `youtube-dQw4w9WgXcQ`.
    pub fn key(&self) -> String {
        format!("{}-{}", self.platform, self.media_id)
    }
}

/// Identify the platform and media id of `input`.
///
/// Accepts YouTube watch, short-link, shorts, embed and live URLs, bare
/// 11-character video ids, and X/Twitter status URLs.
pub fn identify(input: &str) -> Result<MediaDescriptor> {
    let input = input.trim();
    let invalid = || ClipwiseError::InvalidInput(format!("Unsupported or invalid media URL: {input}"));

    if YOUTUBE_ID.is_match(input) {
        return Ok(MediaDescriptor {
            platform: Platform::YouTube,
            media_id: input.to_string(),
        });
    }

    let with_scheme = if input.contains("://") {
        input.to_string()
    } else {
        format!("https://{input}")
    };
    let url = Url::parse(&with_scheme).map_err(|_| invalid())?;
    let host = url.host_str().ok_or_else(invalid)?.to_lowercase();
    let host = host.strip_prefix("www.").unwrap_or(&host);
    let segments: Vec<&str> = url
        .path_segments()
        .map(|s| s.filter(|p| !p.is_empty()).collect())
        .unwrap_or_default();

    let descriptor = match host {
        "youtube.com" | "m.youtube.com" | "music.youtube.com" | "youtube-nocookie.com" => {
            let id = match segments.as_slice() {
                ["watch", ..] => url
                    .query_pairs()
                    .find(|(k, _)| k == "v")
                    .map(|(_, v)| v.into_owned()),
                ["shorts" | "embed" | "live" | "v", id, ..] => Some(id.to_string()),
                _ => None,
            };
            id.filter(|id| YOUTUBE_ID.is_match(id))
                .map(|media_id| MediaDescriptor {
                    platform: Platform::YouTube,
                    media_id,
                })
        }
        "youtu.be" => segments
            .first()
            .filter(|id| YOUTUBE_ID.is_match(id))
            .map(|id| MediaDescriptor {
                platform: Platform::YouTube,
                media_id: id.to_string(),
            }),
        "x.com" | "twitter.com" | "mobile.twitter.com" | "mobile.x.com" => match segments.as_slice() {
            [_, "status" | "statuses", id, ..] if STATUS_ID.is_match(id) => Some(MediaDescriptor {
                platform: Platform::X,
                media_id: id.to_string(),
            }),
            _ => None,
        },
        _ => None,
    };

    descriptor.ok_or_else(invalid)
}

/// Metadata reported by the download engine before downloading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaInfo {
    pub descriptor: MediaDescriptor,
    pub title: String,
    pub duration_seconds: Option<f64>,
    pub chapters: Vec<VideoChapter>,
    pub filesize_approx: Option<u64>,
}

impl MediaInfo {
    /// Build from a yt-dlp `--dump-json` document.
    pub fn from_json(descriptor: MediaDescriptor, json: &Value) -> Self {
        let title = json["title"]
            .as_str()
            .or_else(|| json["fulltitle"].as_str())
            .unwrap_or("Untitled")
            .to_string();

        let duration_seconds = json["duration"].as_f64().filter(|d| *d > 0.0);

        let filesize_approx = json["filesize"]
            .as_u64()
            .or_else(|| json["filesize_approx"].as_u64());

        let chapters = match duration_seconds {
            Some(duration) => normalize_chapters(&parse_chapters(json), duration),
            None => parse_chapters(json),
        };

        Self {
            descriptor,
            title,
            duration_seconds,
            chapters,
            filesize_approx,
        }
    }
}

/// A downloaded file and, once split, its parts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaArtifact {
    pub media_id: String,
    pub title: String,
    pub url: String,
    /// The unsplit file; `None` once split.
    pub file: Option<PathBuf>,
    /// Parts in playback order.
    pub split_files: Vec<PathBuf>,
    pub size_bytes: u64,
    pub needs_splitting: bool,
}

impl MediaArtifact {
    /// Files to hand to the share layer.
    pub fn files(&self) -> Vec<PathBuf> {
        match &self.file {
            Some(file) => vec![file.clone()],
            None => self.split_files.clone(),
        }
    }
}
