//! Chapter metadata and per-chapter size estimates.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A titled time range inside a media file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoChapter {
    pub title: String,
    pub start_time_seconds: f64,
    pub end_time_seconds: f64,
}

impl VideoChapter {
    pub fn new(title: impl Into<String>, start: f64, end: f64) -> Self {
        Self {
            title: title.into(),
            start_time_seconds: start,
            end_time_seconds: end,
        }
    }

    pub fn duration(&self) -> f64 {
        self.end_time_seconds - self.start_time_seconds
    }
}

/// A chapter with its size estimated from the average bitrate.
#[derive(Debug, Clone, PartialEq)]
pub struct EstimatedChapter {
    pub chapter: VideoChapter,
    pub estimated_bytes: u64,
}

/// Clamp chapters into `[0, total_duration]`, drop empty or non-finite ones, sort by start.
pub fn normalize_chapters(chapters: &[VideoChapter], total_duration: f64) -> Vec<VideoChapter> {
    let mut normalized: Vec<VideoChapter> = chapters
        .iter()
        .filter(|c| c.start_time_seconds.is_finite() && c.end_time_seconds.is_finite())
        .map(|c| VideoChapter {
            title: c.title.clone(),
            start_time_seconds: c.start_time_seconds.clamp(0.0, total_duration),
            end_time_seconds: c.end_time_seconds.clamp(0.0, total_duration),
        })
        .filter(|c| c.end_time_seconds > c.start_time_seconds)
        .collect();

    normalized.sort_by(|a, b| a.start_time_seconds.total_cmp(&b.start_time_seconds));
    normalized
}

/// Estimate each chapter's size with a linear bitrate model.
///
/// Returns nothing when the duration, size or derived bitrate is unusable.
pub fn estimate_chapter_bytes(
    chapters: &[VideoChapter],
    total_duration_seconds: f64,
    total_bytes: u64,
) -> Vec<EstimatedChapter> {
    if !total_duration_seconds.is_finite() || total_duration_seconds <= 0.0 || total_bytes == 0 {
        return Vec::new();
    }

    let bytes_per_second = total_bytes as f64 / total_duration_seconds;
    if !bytes_per_second.is_finite() || bytes_per_second <= 0.0 {
        return Vec::new();
    }

    normalize_chapters(chapters, total_duration_seconds)
        .into_iter()
        .map(|chapter| {
            let estimated_bytes = ((chapter.duration() * bytes_per_second).round() as u64).max(1);
            EstimatedChapter {
                chapter,
                estimated_bytes,
            }
        })
        .collect()
}

/// First chapter that alone would exceed `max_chunk_bytes`.
pub fn first_oversized_chapter(
    estimated: &[EstimatedChapter],
    max_chunk_bytes: u64,
) -> Option<&EstimatedChapter> {
    estimated.iter().find(|c| c.estimated_bytes > max_chunk_bytes)
}

/// Chapters from a yt-dlp `--dump-json` document. Missing or malformed entries are skipped.
pub fn parse_chapters(info: &Value) -> Vec<VideoChapter> {
    let Some(entries) = info["chapters"].as_array() else {
        return Vec::new();
    };

    entries
        .iter()
        .filter_map(|entry| {
            let start = entry["start_time"].as_f64()?;
            let end = entry["end_time"].as_f64()?;
            let title = entry["title"].as_str().unwrap_or_default().to_string();
            Some(VideoChapter::new(title, start, end))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_linear_estimate() {
        let chapters = vec![VideoChapter::new("Intro", 0.0, 60.0)];
        let estimated = estimate_chapter_bytes(&chapters, 180.0, 180_000);
        assert_eq!(estimated.len(), 1);
        assert_eq!(estimated[0].estimated_bytes, 60_000);
    }

    #[test]
    fn test_invalid_chapters_dropped_and_sorted() {
        let chapters = vec![
            VideoChapter::new("Third", 120.0, 200.0),
            VideoChapter::new("Backwards", 50.0, 40.0),
            VideoChapter::new("First", -10.0, 30.0),
            VideoChapter::new("Outside", 190.0, 250.0),
            VideoChapter::new("Broken", f64::NAN, 10.0),
            VideoChapter::new("Second", 30.0, 120.0),
        ];

        let estimated = estimate_chapter_bytes(&chapters, 180.0, 180_000);
        let titles: Vec<_> = estimated.iter().map(|e| e.chapter.title.as_str()).collect();
        assert_eq!(titles, vec!["First", "Second", "Third"]);

        assert_eq!(estimated[0].chapter.start_time_seconds, 0.0);
        assert_eq!(estimated[2].chapter.end_time_seconds, 180.0);
        assert_eq!(estimated[2].estimated_bytes, 60_000);
    }

    #[test]
    fn test_fails_closed_on_bad_totals() {
        let chapters = vec![VideoChapter::new("A", 0.0, 10.0)];
        assert!(estimate_chapter_bytes(&chapters, 0.0, 1_000).is_empty());
        assert!(estimate_chapter_bytes(&chapters, -5.0, 1_000).is_empty());
        assert!(estimate_chapter_bytes(&chapters, 10.0, 0).is_empty());
        assert!(estimate_chapter_bytes(&chapters, f64::INFINITY, 1_000).is_empty());
    }

    #[test]
    fn test_tiny_chapter_floors_at_one_byte() {
        let chapters = vec![VideoChapter::new("Blink", 0.0, 0.0001)];
        let estimated = estimate_chapter_bytes(&chapters, 100.0, 100);
        assert_eq!(estimated[0].estimated_bytes, 1);
    }

    #[test]
    fn test_first_oversized_chapter() {
        let chapters = vec![
            VideoChapter::new("Small", 0.0, 10.0),
            VideoChapter::new("Big", 10.0, 90.0),
            VideoChapter::new("Bigger", 90.0, 200.0),
        ];
        let estimated = estimate_chapter_bytes(&chapters, 200.0, 2_000);

        let found = first_oversized_chapter(&estimated, 500).unwrap();
        assert_eq!(found.chapter.title, "Big");
        assert!(first_oversized_chapter(&estimated, 5_000).is_none());
    }

    #[test]
    fn test_parse_chapters() {
        let info = json!({
            "title": "Talk",
            "chapters": [
                {"title": "Intro", "start_time": 0.0, "end_time": 12.5},
                {"title": "Broken", "start_time": "x"},
                {"start_time": 12.5, "end_time": 40}
            ]
        });

        let chapters = parse_chapters(&info);
        assert_eq!(chapters.len(), 2);
        assert_eq!(chapters[0], VideoChapter::new("Intro", 0.0, 12.5));
        assert_eq!(chapters[1].title, "");
        assert_eq!(chapters[1].end_time_seconds, 40.0);

        assert!(parse_chapters(&json!({"chapters": null})).is_empty());
    }
}
