//! Transcript cleaning and token-budgeted chunking.
//!
//! Transcripts are cleaned of timestamps and whitespace noise, then carved into
//! chunks that each fit a provider's input budget. Token counts use a fixed
//! `chars / 4` estimate; chunk boundaries are calibrated to that heuristic.

mod vtt;

pub use vtt::vtt_to_text;

use crate::providers::ProviderLimits;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Share of the context window held back by default.
pub const DEFAULT_SAFETY_MARGIN: f64 = 0.15;

/// Characters per estimated token.
const CHARS_PER_TOKEN: usize = 4;

/// A token-budgeted slice of the cleaned transcript.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptChunk {
    pub text: String,
    pub estimated_tokens: usize,
    /// Char offset (inclusive) into the cleaned text.
    pub start_index: usize,
    /// Char offset (exclusive) into the cleaned text.
    pub end_index: usize,
}

impl TranscriptChunk {
    fn new(text: String, start_index: usize, end_index: usize) -> Self {
        let estimated_tokens = estimate_tokens(&text);
        Self {
            text,
            estimated_tokens,
            start_index,
            end_index,
        }
    }
}

/// A cleaned transcript together with its chunks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessedTranscript {
    pub original_text: String,
    pub cleaned_text: String,
    pub chunks: Vec<TranscriptChunk>,
    pub total_tokens: usize,
}

impl ProcessedTranscript {
    /// Whether the transcript needs a map-reduce pass.
    pub fn is_chunked(&self) -> bool {
        self.chunks.len() > 1
    }
}

/// Crude token estimate: one token per four characters.
pub fn estimate_tokens(text: &str) -> usize {
    text.chars().count() / CHARS_PER_TOKEN
}

/// Tokens available for input once output and the safety margin are reserved.
///
/// Never returns less than 1 so that chunking always makes progress.
pub fn calculate_input_budget(limits: &ProviderLimits, safety_margin: f64) -> usize {
    let context = limits.max_context_tokens as i64;
    let output = limits.max_output_tokens as i64;
    let margin = (context as f64 * safety_margin).floor() as i64;
    (context - output - margin).max(1) as usize
}

/// Cleans and chunks transcripts.
pub struct TranscriptProcessor {
    bracketed_timestamp: Regex,
    bare_timestamp: Regex,
    safety_margin: f64,
}

impl TranscriptProcessor {
    pub fn new() -> Self {
        Self::with_safety_margin(DEFAULT_SAFETY_MARGIN)
    }

    pub fn with_safety_margin(safety_margin: f64) -> Self {
        let bracketed_timestamp =
            Regex::new(r"\[\d{1,2}:\d{2}(?::\d{2})?(?:[.,]\d{1,3})?\]").expect("Invalid regex");
        let bare_timestamp =
            Regex::new(r"\b\d{1,2}:\d{2}:\d{2}(?:[.,]\d{1,3})?\b").expect("Invalid regex");

        Self {
            bracketed_timestamp,
            bare_timestamp,
            safety_margin,
        }
    }

    /// Strip timestamps, collapse whitespace runs to single spaces, trim.
    pub fn clean_transcript(&self, text: &str) -> String {
        let without_brackets = self.bracketed_timestamp.replace_all(text, " ");
        let without_bare = self.bare_timestamp.replace_all(&without_brackets, " ");
        without_bare.split_whitespace().collect::<Vec<_>>().join(" ")
    }

    /// Split the cleaned text into chunks of at most roughly `input_budget` tokens.
    ///
    /// Concatenating the chunk texts in order reproduces the cleaned text exactly.
    pub fn chunk_transcript(&self, text: &str, input_budget: usize) -> Vec<TranscriptChunk> {
        let cleaned = self.clean_transcript(text);
        let chars: Vec<char> = cleaned.chars().collect();
        let total = chars.len();

        if estimate_tokens(&cleaned) <= input_budget {
            return vec![TranscriptChunk::new(cleaned, 0, total)];
        }

        let target_chars = input_budget.max(1) * CHARS_PER_TOKEN;
        let mut chunks = Vec::new();
        let mut current = 0;

        while current < total {
            let remaining = total - current;
            if remaining / CHARS_PER_TOKEN <= input_budget {
                chunks.push(slice_chunk(&chars, current, total));
                break;
            }

            let cut = find_cut(&chars, current, target_chars);
            chunks.push(slice_chunk(&chars, current, cut));
            current = cut;
        }

        chunks
    }

    /// Clean and chunk against a provider's limits.
    pub fn process_transcript(&self, raw_text: &str, limits: &ProviderLimits) -> ProcessedTranscript {
        let budget = calculate_input_budget(limits, self.safety_margin);
        let cleaned_text = self.clean_transcript(raw_text);
        let chunks = self.chunk_transcript(&cleaned_text, budget);
        let total_tokens = estimate_tokens(&cleaned_text);

        ProcessedTranscript {
            original_text: raw_text.to_string(),
            cleaned_text,
            chunks,
            total_tokens,
        }
    }
}

impl Default for TranscriptProcessor {
    fn default() -> Self {
        Self::new()
    }
}

fn slice_chunk(chars: &[char], start: usize, end: usize) -> TranscriptChunk {
    TranscriptChunk::new(chars[start..end].iter().collect(), start, end)
}

/// Pick the end offset for a chunk starting at `current`.
///
/// Looks for a sentence end, then a word boundary, inside
/// `[0.8 * target, 1.2 * target]`, scanning backward from the high end.
fn find_cut(chars: &[char], current: usize, target_chars: usize) -> usize {
    let total = chars.len();
    let low = current + (target_chars * 8 / 10).max(1);
    let high = (current + (target_chars * 12).div_ceil(10)).min(total);

    if low <= high {
        // Sentence end: punctuation followed by a space or end of text.
        for i in (low - 1..high).rev() {
            if matches!(chars[i], '.' | '!' | '?') && (i + 1 == total || chars[i + 1] == ' ') {
                // Keep the trailing space with this chunk so the next one starts on a word.
                return (i + 2).min(total);
            }
        }

        for i in (low..high).rev() {
            if chars[i] == ' ' {
                return i + 1;
            }
        }
    }

    (current + target_chars).min(total)
}
