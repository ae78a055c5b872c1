//! WebVTT subtitle to plain text.

use regex::Regex;
use std::sync::LazyLock;

static TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]*>").expect("Invalid regex"));

/// Convert a WebVTT document into running text.
///
/// Drops the header, metadata blocks, cue identifiers and timing lines,
/// inline tags, and the consecutive repeats that rolling auto-captions
/// produce.
pub fn vtt_to_text(vtt: &str) -> String {
    let raw: Vec<&str> = vtt.lines().map(str::trim).collect();
    let mut lines: Vec<String> = Vec::new();
    let mut in_note = false;

    for (index, &l) in raw.iter().enumerate() {
        if l.is_empty() {
            in_note = false;
            continue;
        }
        if in_note {
            continue;
        }
        if l.starts_with("WEBVTT") || l.starts_with("Kind:") || l.starts_with("Language:") {
            continue;
        }
        if l.starts_with("NOTE") || l.starts_with("STYLE") || l.starts_with("REGION") {
            in_note = true;
            continue;
        }
        if is_timing(l) {
            continue;
        }
        // A cue identifier sits directly above its timing line.
        if raw.get(index + 1).is_some_and(|next| is_timing(next)) {
            continue;
        }

        let text = decode_entities(&TAG.replace_all(l, ""));
        let text = text.split_whitespace().collect::<Vec<_>>().join(" ");
        if text.is_empty() {
            continue;
        }

        if lines.last() == Some(&text) {
            continue;
        }
        lines.push(text);
    }

    lines.join(" ")
}

fn is_timing(line: &str) -> bool {
    line.contains("-->")
}

fn decode_entities(text: &str) -> String {
    text.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vtt_to_text_drops_timings() {
        let vtt = r#"WEBVTT
Kind: captions
Language: en

1
00:00:00.000 --> 00:00:01.000
Hello   world

2
00:00:01.000 --> 00:00:02.000
Second line
"#;
        let text = vtt_to_text(vtt);
        assert_eq!(text, "Hello world Second line");
    }

    #[test]
    fn test_rolling_captions_are_deduplicated() {
        let vtt = r#"WEBVTT

00:00:00.000 --> 00:00:02.000 align:start position:0%
so<00:00:00.500><c> today</c><c> we</c>

00:00:02.000 --> 00:00:02.010
so today we

00:00:02.010 --> 00:00:04.000
so today we
talk about rust &amp; tokio

NOTE this is a comment
spanning lines

00:00:04.000 --> 00:00:05.000
talk about rust &amp; tokio
"#;
        let text = vtt_to_text(vtt);
        assert_eq!(text, "so today we talk about rust & tokio");
    }

    #[test]
    fn test_numeric_caption_text_is_kept() {
        let vtt = r#"WEBVTT

1
00:00:00.000 --> 00:00:01.000
The year was
2024

intro
00:00:01.000 --> 00:00:02.000
and then
42
"#;
        let text = vtt_to_text(vtt);
        assert_eq!(text, "The year was 2024 and then 42");
    }

    #[test]
    fn test_only_consecutive_repeats_are_dropped() {
        let vtt = r#"WEBVTT

00:00:00.000 --> 00:00:01.000
yes

00:00:01.000 --> 00:00:02.000
no

00:00:02.000 --> 00:00:03.000
yes

00:00:03.000 --> 00:00:04.000
yes
"#;
        assert_eq!(vtt_to_text(vtt), "yes no yes");
    }
}
