//! Size-bounded splitting of media files.
//!
//! A file above the ceiling is cut into time segments by stream copy. Each
//! segment is planned from the average bitrate and the planning target; an
//! output that still lands above the ceiling is deleted and retried with a
//! shorter duration. When chapters are known and each fits, cuts follow
//! chapter boundaries instead.

use super::chapters::{estimate_chapter_bytes, first_oversized_chapter, VideoChapter};
use super::naming::{append_brand_suffix, part_file_name, strip_brand_suffix};
use super::MediaArtifact;
use crate::config::SplitSettings;
use crate::engine::{parse_duration, probe_command, segment_command, TranscodeEngine};
use crate::error::{ClipwiseError, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

/// Bitrate assumed for video when the duration cannot be probed.
const VIDEO_ASSUMED_BITRATE_BPS: f64 = 2_000_000.0;

/// Bitrate assumed for audio when the duration cannot be probed.
const AUDIO_ASSUMED_BITRATE_BPS: f64 = 128_000.0;

/// Remaining time below which no further segment is cut.
const MIN_SEGMENT_SECONDS: f64 = 0.001;

/// Longest tail of transcoder logs kept in an error.
const LOG_TAIL_CHARS: usize = 300;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Video,
    Audio,
}

impl MediaKind {
    fn assumed_bitrate_bps(&self) -> f64 {
        match self {
            MediaKind::Video => VIDEO_ASSUMED_BITRATE_BPS,
            MediaKind::Audio => AUDIO_ASSUMED_BITRATE_BPS,
        }
    }

    fn default_extension(&self) -> &'static str {
        match self {
            MediaKind::Video => "mp4",
            MediaKind::Audio => "mp3",
        }
    }
}

/// Splits video or audio files below the configured ceiling.
#[derive(Clone)]
pub struct MediaSplitter {
    engine: Arc<dyn TranscodeEngine>,
    settings: SplitSettings,
    kind: MediaKind,
}

/// One planned cut.
struct Segment {
    start: f64,
    duration: f64,
}

impl MediaSplitter {
    pub fn video(engine: Arc<dyn TranscodeEngine>, settings: SplitSettings) -> Self {
        Self {
            engine,
            settings,
            kind: MediaKind::Video,
        }
    }

    pub fn audio(engine: Arc<dyn TranscodeEngine>, settings: SplitSettings) -> Self {
        Self {
            engine,
            settings,
            kind: MediaKind::Audio,
        }
    }

    pub fn kind(&self) -> MediaKind {
        self.kind
    }

    /// Split `source` into parts under the ceiling, written to `out_dir`.
    ///
    /// A source already under the ceiling is returned as is. On success the
    /// source is deleted. On failure or cancellation, parts already accepted
    /// stay on disk and the source is kept.
    #[instrument(skip(self, chapters, cancel), fields(kind = ?self.kind))]
    pub async fn split(
        &self,
        source: &Path,
        out_dir: &Path,
        chapters: &[VideoChapter],
        cancel: &CancellationToken,
    ) -> Result<Vec<PathBuf>> {
        self.settings.validate()?;
        let size = tokio::fs::metadata(source).await?.len();
        if size <= self.settings.max_chunk_bytes {
            debug!("{} is {} bytes, no split needed", source.display(), size);
            return Ok(vec![source.to_path_buf()]);
        }

        let duration = self.total_duration(source, size).await?;
        let bytes_per_second = size as f64 / duration;
        if !bytes_per_second.is_finite() || bytes_per_second <= 0.0 {
            return Err(ClipwiseError::SplitFailed(format!(
                "invalid bitrate for {}",
                source.display()
            )));
        }

        info!(
            "Splitting {} ({} bytes, {:.1}s, {:.0} B/s)",
            source.display(),
            size,
            duration,
            bytes_per_second
        );
        tokio::fs::create_dir_all(out_dir).await?;

        let mut parts = None;
        if self.settings.prefer_chapters && !chapters.is_empty() {
            parts = self
                .split_by_chapters(source, out_dir, chapters, duration, size, cancel)
                .await?;
        }

        let parts = match parts {
            Some(parts) => parts,
            None => {
                self.split_fixed(source, out_dir, duration, bytes_per_second, cancel)
                    .await?
            }
        };

        tokio::fs::remove_file(source).await?;
        info!("Split into {} parts; removed {}", parts.len(), source.display());
        Ok(parts)
    }

    /// Split the artifact's file and record the parts on it.
    pub async fn split_artifact(
        &self,
        mut artifact: MediaArtifact,
        out_dir: &Path,
        chapters: &[VideoChapter],
        cancel: &CancellationToken,
    ) -> Result<MediaArtifact> {
        let file = artifact.file.clone().ok_or_else(|| {
            ClipwiseError::InvalidInput(format!("{} has no file to split", artifact.media_id))
        })?;

        let parts = self.split(&file, out_dir, chapters, cancel).await?;
        if parts.len() == 1 && parts[0] == file {
            artifact.needs_splitting = false;
            return Ok(artifact);
        }

        artifact.file = None;
        artifact.split_files = parts;
        artifact.needs_splitting = false;
        Ok(artifact)
    }

    async fn total_duration(&self, source: &Path, size: u64) -> Result<f64> {
        let outcome = self.engine.execute(&probe_command(source)).await?;
        if let Some(duration) = parse_duration(&outcome.logs) {
            return Ok(duration);
        }

        let estimate = (size as f64 * 8.0) / self.kind.assumed_bitrate_bps();
        warn!(
            "Could not probe duration of {}; assuming {:.1}s",
            source.display(),
            estimate
        );

        if estimate.is_finite() && estimate > 0.0 {
            Ok(estimate)
        } else {
            Err(ClipwiseError::SplitFailed(format!(
                "could not determine duration of {}",
                source.display()
            )))
        }
    }

    /// Cut on chapter boundaries. `None` means chapters cannot satisfy the
    /// ceiling and fixed-size splitting should run instead.
    async fn split_by_chapters(
        &self,
        source: &Path,
        out_dir: &Path,
        chapters: &[VideoChapter],
        duration: f64,
        size: u64,
        cancel: &CancellationToken,
    ) -> Result<Option<Vec<PathBuf>>> {
        let estimated = estimate_chapter_bytes(chapters, duration, size);
        if estimated.is_empty() {
            return Ok(None);
        }
        if let Some(big) = first_oversized_chapter(&estimated, self.settings.max_chunk_bytes) {
            info!(
                "Chapter '{}' alone is ~{} bytes; using fixed-size parts",
                big.chapter.title, big.estimated_bytes
            );
            return Ok(None);
        }

        // Greedy grouping of consecutive chapters under the planning target.
        let mut starts = Vec::new();
        let mut group_bytes = 0u64;
        for chapter in &estimated {
            if starts.is_empty() || group_bytes + chapter.estimated_bytes > self.settings.target_chunk_bytes {
                starts.push(chapter.chapter.start_time_seconds);
                group_bytes = 0;
            }
            group_bytes += chapter.estimated_bytes;
        }
        starts[0] = 0.0;
        // Chapters sharing a start (or starting at 0) would give empty cuts.
        starts.dedup_by(|next, prev| *next - *prev <= MIN_SEGMENT_SECONDS);

        let segments: Vec<Segment> = starts
            .iter()
            .enumerate()
            .map(|(i, &start)| {
                let end = starts.get(i + 1).copied().unwrap_or(duration);
                Segment {
                    start,
                    duration: end - start,
                }
            })
            .filter(|segment| segment.duration > MIN_SEGMENT_SECONDS)
            .collect();
        if segments.is_empty() {
            return Ok(None);
        }

        info!("Splitting on chapters into {} parts", segments.len());
        let total = segments.len();
        let mut parts = Vec::with_capacity(total);

        for (index, segment) in segments.iter().enumerate() {
            check_cancelled(cancel)?;
            let dest = out_dir.join(self.part_name(source, index + 1, total));
            let written = match self.cut(source, &dest, segment.start, segment.duration).await {
                Ok(written) => written,
                Err(ClipwiseError::SplitFailed(reason)) => {
                    warn!("Chapter part {} failed ({}); falling back", index + 1, reason);
                    parts.push(dest);
                    remove_parts(&parts).await;
                    return Ok(None);
                }
                Err(e) => return Err(e),
            };
            parts.push(dest);

            if written > self.settings.max_chunk_bytes {
                warn!(
                    "Chapter part {} is {} bytes, over the ceiling; falling back",
                    index + 1,
                    written
                );
                remove_parts(&parts).await;
                return Ok(None);
            }
        }

        Ok(Some(parts))
    }

    async fn split_fixed(
        &self,
        source: &Path,
        out_dir: &Path,
        duration: f64,
        bytes_per_second: f64,
        cancel: &CancellationToken,
    ) -> Result<Vec<PathBuf>> {
        let target_duration = self.settings.target_chunk_bytes as f64 / bytes_per_second;
        let estimated_parts = ((duration / target_duration).ceil() as usize).max(1);
        debug!(
            "Target {:.2}s per part, about {} parts",
            target_duration, estimated_parts
        );

        let mut parts = Vec::with_capacity(estimated_parts);
        let mut current = 0.0;

        while duration - current > MIN_SEGMENT_SECONDS {
            check_cancelled(cancel)?;

            let part = parts.len() + 1;
            let dest = out_dir.join(self.part_name(source, part, estimated_parts));
            let mut segment = target_duration.min(duration - current);
            let mut attempt = 1;

            loop {
                let written = self.cut(source, &dest, current, segment).await?;
                if written <= self.settings.max_chunk_bytes {
                    break;
                }

                tokio::fs::remove_file(&dest).await?;
                if attempt >= self.settings.max_attempts {
                    return Err(ClipwiseError::SplitFailed(format!(
                        "part {} still over {} bytes after {} attempts",
                        part, self.settings.max_chunk_bytes, attempt
                    )));
                }

                segment *= self.settings.shrink_factor;
                attempt += 1;
                debug!(
                    "Part {} was {} bytes; retrying with {:.2}s (attempt {})",
                    part, written, segment, attempt
                );
            }

            debug!("Accepted part {} at {:.2}s (+{:.2}s)", part, current, segment);
            parts.push(dest);
            current += segment;
        }

        Ok(parts)
    }

    /// Stream-copy one segment and return the output size.
    async fn cut(&self, source: &Path, dest: &Path, start: f64, duration: f64) -> Result<u64> {
        let outcome = self
            .engine
            .execute(&segment_command(source, dest, start, duration))
            .await?;

        if !outcome.success {
            return Err(ClipwiseError::SplitFailed(format!(
                "transcoder failed on {}: {}",
                dest.display(),
                log_tail(&outcome.logs)
            )));
        }

        match tokio::fs::metadata(dest).await {
            Ok(meta) if meta.len() > 0 => Ok(meta.len()),
            _ => Err(ClipwiseError::SplitFailed(format!(
                "transcoder produced no output for {}",
                dest.display()
            ))),
        }
    }

    fn part_name(&self, source: &Path, part: usize, estimated_total: usize) -> String {
        let stem = source
            .file_stem()
            .and_then(|s| s.to_str())
            .map(strip_brand_suffix)
            .unwrap_or_else(|| "media".to_string());
        let extension = source
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or(self.kind.default_extension());

        let name = part_file_name(&stem, part, estimated_total, extension);
        if self.settings.brand_file_names {
            append_brand_suffix(&name)
        } else {
            name
        }
    }
}

/// Best-effort removal of parts from an abandoned chapter split.
async fn remove_parts(parts: &[PathBuf]) {
    for part in parts {
        match tokio::fs::remove_file(part).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!("Failed to remove {}: {}", part.display(), e),
        }
    }
}

fn check_cancelled(cancel: &CancellationToken) -> Result<()> {
    if cancel.is_cancelled() {
        Err(ClipwiseError::Cancelled)
    } else {
        Ok(())
    }
}

fn log_tail(logs: &str) -> String {
    let trimmed = logs.trim();
    let count = trimmed.chars().count();
    if count <= LOG_TAIL_CHARS {
        trimmed.to_string()
    } else {
        trimmed.chars().skip(count - LOG_TAIL_CHARS).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{tokenize_command, TranscodeOutcome};
    use crate::media::naming::parse_part_number;
    use async_trait::async_trait;
    use std::sync::Mutex;

    const CEILING: u64 = 16_000;
    const TARGET: u64 = 15_000;

    /// Writes segment files sized by a fixed bitrate.
    struct FakeTranscoder {
        bytes_per_second: f64,
        probed_duration: Option<f64>,
        /// Size multiplier for the n-th segment call (0-based), default 1.0.
        inflation: Box<dyn Fn(usize) -> f64 + Send + Sync>,
        fail_segments: bool,
        segments: Mutex<Vec<(f64, f64)>>,
    }

    impl FakeTranscoder {
        fn new(bytes_per_second: f64, probed_duration: Option<f64>) -> Self {
            Self {
                bytes_per_second,
                probed_duration,
                inflation: Box::new(|_| 1.0),
                fail_segments: false,
                segments: Mutex::new(Vec::new()),
            }
        }

        fn inflate(mut self, f: impl Fn(usize) -> f64 + Send + Sync + 'static) -> Self {
            self.inflation = Box::new(f);
            self
        }

        fn segments(&self) -> Vec<(f64, f64)> {
            self.segments.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl TranscodeEngine for FakeTranscoder {
        async fn execute(&self, command: &str) -> Result<TranscodeOutcome> {
            let args = tokenize_command(command)?;
            let value_after = |flag: &str| {
                args.iter()
                    .position(|a| a == flag)
                    .and_then(|i| args.get(i + 1))
                    .and_then(|v| v.parse::<f64>().ok())
            };

            let Some(start) = value_after("-ss") else {
                // Probe: ffmpeg exits non-zero without an output file.
                let logs = match self.probed_duration {
                    Some(d) => format!(
                        "  Duration: {:02}:{:02}:{:05.2}, start: 0.000000",
                        (d / 3600.0) as u64,
                        ((d % 3600.0) / 60.0) as u64,
                        d % 60.0
                    ),
                    None => "Duration: N/A".to_string(),
                };
                return Ok(TranscodeOutcome { success: false, logs });
            };

            if self.fail_segments {
                return Ok(TranscodeOutcome {
                    success: false,
                    logs: "Invalid data found when processing input".into(),
                });
            }

            let duration = value_after("-t").unwrap();
            let dest = args.last().unwrap();
            let index = {
                let mut segments = self.segments.lock().unwrap();
                segments.push((start, duration));
                segments.len() - 1
            };

            let bytes = (duration * self.bytes_per_second * (self.inflation)(index)).round() as usize;
            std::fs::write(dest, vec![0u8; bytes]).unwrap();
            Ok(TranscodeOutcome {
                success: true,
                logs: String::new(),
            })
        }
    }

    fn settings() -> SplitSettings {
        SplitSettings {
            max_chunk_bytes: CEILING,
            target_chunk_bytes: TARGET,
            ..SplitSettings::default()
        }
    }

    fn source_file(dir: &Path, bytes: usize) -> PathBuf {
        let path = dir.join("talk.mp4");
        std::fs::write(&path, vec![1u8; bytes]).unwrap();
        path
    }

    fn assert_under_ceiling(parts: &[PathBuf]) {
        for part in parts {
            assert!(std::fs::metadata(part).unwrap().len() <= CEILING, "{}", part.display());
        }
    }

    #[tokio::test]
    async fn test_under_ceiling_is_noop() {
        let dir = tempfile::tempdir().unwrap();
        let source = source_file(dir.path(), 10_000);
        let engine = Arc::new(FakeTranscoder::new(1_000.0, Some(10.0)));
        let splitter = MediaSplitter::video(engine.clone(), settings());

        let parts = splitter
            .split(&source, &dir.path().join("out"), &[], &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(parts, vec![source.clone()]);
        assert!(source.exists());
        assert!(engine.segments().is_empty());
    }

    #[tokio::test]
    async fn test_fixed_split_covers_duration() {
        let dir = tempfile::tempdir().unwrap();
        let source = source_file(dir.path(), 100_000);
        let engine = Arc::new(FakeTranscoder::new(1_000.0, Some(100.0)));
        let splitter = MediaSplitter::video(engine.clone(), settings());
        let out = dir.path().join("out");

        let parts = splitter
            .split(&source, &out, &[], &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(parts.len(), 7);
        assert!(!source.exists());
        assert_under_ceiling(&parts);

        let names: Vec<String> = parts
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        let mut sorted = names.clone();
        sorted.sort();
        assert_eq!(names, sorted);
        assert_eq!(names[0], "talk_part0001.mp4");
        assert_eq!(parse_part_number(&names[6]), Some(7));

        let covered: f64 = engine.segments().iter().map(|(_, d)| d).sum();
        assert!((covered - 100.0).abs() < 0.01);
        for part in &parts[..6] {
            assert_eq!(std::fs::metadata(part).unwrap().len(), TARGET);
        }
    }

    #[tokio::test]
    async fn test_oversized_part_is_retried_shorter() {
        let dir = tempfile::tempdir().unwrap();
        let source = source_file(dir.path(), 100_000);
        let engine = Arc::new(FakeTranscoder::new(1_000.0, Some(100.0)).inflate(|i| if i == 0 { 1.2 } else { 1.0 }));
        let splitter = MediaSplitter::video(engine.clone(), settings());

        let parts = splitter
            .split(&source, &dir.path().join("out"), &[], &CancellationToken::new())
            .await
            .unwrap();

        assert_under_ceiling(&parts);
        let segments = engine.segments();
        assert_eq!(segments[0].0, 0.0);
        assert_eq!(segments[1].0, 0.0);
        assert!((segments[1].1 - 15.0 * 0.85).abs() < 1e-9);
        assert!((segments[2].0 - 15.0 * 0.85).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_attempts() {
        let dir = tempfile::tempdir().unwrap();
        let source = source_file(dir.path(), 100_000);
        let engine = Arc::new(FakeTranscoder::new(1_000.0, Some(100.0)).inflate(|_| 10.0));
        let splitter = MediaSplitter::video(engine.clone(), settings());
        let out = dir.path().join("out");

        let err = splitter
            .split(&source, &out, &[], &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(err, ClipwiseError::SplitFailed(_)));
        assert_eq!(engine.segments().len(), 5);
        assert!(source.exists());
        assert_eq!(std::fs::read_dir(&out).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_engine_failure_aborts_and_keeps_source() {
        let dir = tempfile::tempdir().unwrap();
        let source = source_file(dir.path(), 100_000);
        let mut engine = FakeTranscoder::new(1_000.0, Some(100.0));
        engine.fail_segments = true;
        let splitter = MediaSplitter::audio(Arc::new(engine), settings());

        let err = splitter
            .split(&source, &dir.path().join("out"), &[], &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(err, ClipwiseError::SplitFailed(ref m) if m.contains("Invalid data")));
        assert!(source.exists());
    }

    #[tokio::test]
    async fn test_duration_falls_back_to_assumed_bitrate() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("voice.mp3");
        std::fs::write(&source, vec![1u8; 100_000]).unwrap();

        // 100_000 bytes at 128 kbit/s is 6.25s, i.e. 16_000 B/s.
        let engine = Arc::new(FakeTranscoder::new(16_000.0, None));
        let splitter = MediaSplitter::audio(engine.clone(), settings());

        let parts = splitter
            .split(&source, &dir.path().join("out"), &[], &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(parts.len(), 7);
        assert!(parts[0].to_string_lossy().ends_with("voice_part0001.mp3"));
        assert_under_ceiling(&parts);
    }

    #[tokio::test]
    async fn test_chapter_boundaries_used_when_they_fit() {
        let dir = tempfile::tempdir().unwrap();
        let source = source_file(dir.path(), 100_000);
        let engine = Arc::new(FakeTranscoder::new(1_000.0, Some(100.0)));
        let splitter = MediaSplitter::video(engine.clone(), settings());

        let chapters: Vec<VideoChapter> = (0..10)
            .map(|i| VideoChapter::new(format!("Ch {i}"), i as f64 * 10.0, (i + 1) as f64 * 10.0))
            .collect();

        let parts = splitter
            .split(&source, &dir.path().join("out"), &chapters, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(parts.len(), 10);
        let starts: Vec<f64> = engine.segments().iter().map(|(s, _)| *s).collect();
        assert_eq!(starts, (0..10).map(|i| i as f64 * 10.0).collect::<Vec<_>>());
        assert!(!source.exists());
    }

    #[tokio::test]
    async fn test_oversized_chapter_uses_fixed_split() {
        let dir = tempfile::tempdir().unwrap();
        let source = source_file(dir.path(), 100_000);
        let engine = Arc::new(FakeTranscoder::new(1_000.0, Some(100.0)));
        let splitter = MediaSplitter::video(engine.clone(), settings());

        let chapters = vec![
            VideoChapter::new("Intro", 0.0, 10.0),
            VideoChapter::new("Main", 10.0, 100.0),
        ];

        let parts = splitter
            .split(&source, &dir.path().join("out"), &chapters, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(parts.len(), 7);
        assert_eq!(engine.segments()[1].0, 15.0);
    }

    #[tokio::test]
    async fn test_chapter_overflow_falls_back_and_cleans_up() {
        let dir = tempfile::tempdir().unwrap();
        let source = source_file(dir.path(), 100_000);
        let engine = Arc::new(FakeTranscoder::new(1_000.0, Some(100.0)).inflate(|i| if i == 1 { 2.0 } else { 1.0 }));
        let splitter = MediaSplitter::video(engine.clone(), settings());
        let out = dir.path().join("out");

        let chapters: Vec<VideoChapter> = (0..10)
            .map(|i| VideoChapter::new(format!("Ch {i}"), i as f64 * 10.0, (i + 1) as f64 * 10.0))
            .collect();

        let parts = splitter
            .split(&source, &out, &chapters, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(parts.len(), 7);
        assert_under_ceiling(&parts);
        assert_eq!(std::fs::read_dir(&out).unwrap().count(), 7);
    }

    #[tokio::test]
    async fn test_chapters_sharing_a_start_do_not_produce_empty_parts() {
        let dir = tempfile::tempdir().unwrap();
        let source = source_file(dir.path(), 100_000);
        let engine = Arc::new(FakeTranscoder::new(1_000.0, Some(100.0)));
        let splitter = MediaSplitter::video(engine.clone(), settings());

        let mut chapters = vec![
            VideoChapter::new("A", 0.0, 10.0),
            VideoChapter::new("B", 10.0, 16.0),
            VideoChapter::new("B", 10.0, 20.0),
        ];
        chapters.extend(
            (2..10).map(|i| VideoChapter::new(format!("Ch {i}"), i as f64 * 10.0, (i + 1) as f64 * 10.0)),
        );

        let parts = splitter
            .split(&source, &dir.path().join("out"), &chapters, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(parts.len(), 10);
        assert!(engine.segments().iter().all(|(_, d)| *d > 0.0));
        let starts: Vec<f64> = engine.segments().iter().map(|(s, _)| *s).collect();
        assert_eq!(starts, (0..10).map(|i| i as f64 * 10.0).collect::<Vec<_>>());
        assert_under_ceiling(&parts);
        assert!(!source.exists());
    }

    #[tokio::test]
    async fn test_overlapping_chapters_with_long_tail_split_cleanly() {
        let dir = tempfile::tempdir().unwrap();
        let source = source_file(dir.path(), 100_000);
        let engine = Arc::new(FakeTranscoder::new(1_000.0, Some(100.0)));
        let splitter = MediaSplitter::video(engine.clone(), settings());

        let chapters = vec![
            VideoChapter::new("A", 0.0, 10.0),
            VideoChapter::new("B", 10.0, 16.0),
            VideoChapter::new("B", 10.0, 20.0),
            VideoChapter::new("C", 20.0, 100.0),
        ];

        let parts = splitter
            .split(&source, &dir.path().join("out"), &chapters, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(parts.len(), 7);
        assert!(engine.segments().iter().all(|(_, d)| *d > 0.0));
        assert_under_ceiling(&parts);
    }

    #[tokio::test]
    async fn test_failed_chapter_cut_falls_back_to_fixed_split() {
        let dir = tempfile::tempdir().unwrap();
        let source = source_file(dir.path(), 100_000);
        // Second chapter cut writes an empty file.
        let engine = Arc::new(FakeTranscoder::new(1_000.0, Some(100.0)).inflate(|i| if i == 1 { 0.0 } else { 1.0 }));
        let splitter = MediaSplitter::video(engine.clone(), settings());
        let out = dir.path().join("out");

        let chapters: Vec<VideoChapter> = (0..10)
            .map(|i| VideoChapter::new(format!("Ch {i}"), i as f64 * 10.0, (i + 1) as f64 * 10.0))
            .collect();

        let parts = splitter
            .split(&source, &out, &chapters, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(parts.len(), 7);
        assert_under_ceiling(&parts);
        assert_eq!(std::fs::read_dir(&out).unwrap().count(), 7);
        assert!(!source.exists());
    }

    #[tokio::test]
    async fn test_invalid_settings_are_rejected_before_cutting() {
        let dir = tempfile::tempdir().unwrap();
        let source = source_file(dir.path(), 100_000);
        let engine = Arc::new(FakeTranscoder::new(1_000.0, Some(100.0)));
        let mut settings = settings();
        settings.target_chunk_bytes = 0;
        let splitter = MediaSplitter::video(engine.clone(), settings);

        let err = splitter
            .split(&source, &dir.path().join("out"), &[], &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(err, ClipwiseError::Config(_)));
        assert!(engine.segments().is_empty());
        assert!(source.exists());
    }

    #[tokio::test]
    async fn test_cancel_keeps_source() {
        let dir = tempfile::tempdir().unwrap();
        let source = source_file(dir.path(), 100_000);
        let engine = Arc::new(FakeTranscoder::new(1_000.0, Some(100.0)));
        let splitter = MediaSplitter::video(engine.clone(), settings());
        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = splitter
            .split(&source, &dir.path().join("out"), &[], &cancel)
            .await
            .unwrap_err();

        assert!(matches!(err, ClipwiseError::Cancelled));
        assert!(source.exists());
        assert!(engine.segments().is_empty());
    }

    #[tokio::test]
    async fn test_split_artifact_records_parts() {
        let dir = tempfile::tempdir().unwrap();
        let source = source_file(dir.path(), 100_000);
        let engine = Arc::new(FakeTranscoder::new(1_000.0, Some(100.0)));
        let mut settings = settings();
        settings.brand_file_names = true;
        let splitter = MediaSplitter::video(engine, settings);

        let artifact = MediaArtifact {
            media_id: "abc".into(),
            title: "Talk".into(),
            url: "https://youtu.be/abc".into(),
            file: Some(source),
            split_files: vec![],
            size_bytes: 100_000,
            needs_splitting: true,
        };

        let split = splitter
            .split_artifact(artifact, &dir.path().join("out"), &[], &CancellationToken::new())
            .await
            .unwrap();

        assert!(split.file.is_none());
        assert_eq!(split.split_files.len(), 7);
        assert!(!split.needs_splitting);
        assert!(split.split_files[0]
            .to_string_lossy()
            .ends_with("talk_part0001_clipwise.mp4"));
    }
}
