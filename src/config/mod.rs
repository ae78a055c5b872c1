//! Configuration module for Clipwise.
//!
//! Handles loading and managing application settings and prompt templates.

mod prompts;
mod settings;

pub use prompts::{
    language_name, Prompts, SummaryLength, SummaryPrompts, SummaryStyle, TranslationPrompts,
};
pub use settings::{
    AiSettings, DefaultsSettings, DownloadSettings, GeneralSettings, PromptSettings, Settings,
    SplitSettings, Theme, TranscodeSettings, MAX_CHUNK_SIZE_BYTES, TARGET_CHUNK_SIZE_BYTES,
};
