//! Prompt templates for Clipwise.
//!
//! Prompts can be customized by placing TOML files in the custom prompts directory.

use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::LazyLock;

static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{([A-Za-z0-9_]+)\}\}").expect("Invalid regex"));

/// Shape of the summary the model is asked to produce.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SummaryStyle {
    #[default]
    Concise,
    Detailed,
    BulletPoints,
    KeyTakeaways,
}

impl SummaryStyle {
    /// Instruction inserted as `{{style_instruction}}`.
    pub fn instruction(&self) -> &'static str {
        match self {
            SummaryStyle::Concise => "Write a concise summary in flowing prose.",
            SummaryStyle::Detailed => {
                "Write a detailed summary that covers every main topic and its supporting points."
            }
            SummaryStyle::BulletPoints => "Write the summary as a list of bullet points.",
            SummaryStyle::KeyTakeaways => {
                "List the key takeaways as short numbered items, most important first."
            }
        }
    }
}

impl std::str::FromStr for SummaryStyle {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "concise" => Ok(SummaryStyle::Concise),
            "detailed" => Ok(SummaryStyle::Detailed),
            "bullet_points" | "bullets" => Ok(SummaryStyle::BulletPoints),
            "key_takeaways" | "takeaways" => Ok(SummaryStyle::KeyTakeaways),
            _ => Err(format!("Unknown summary style: {}", s)),
        }
    }
}

/// Target length of the final summary.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SummaryLength {
    Short,
    #[default]
    Medium,
    Long,
}

impl SummaryLength {
    /// Instruction inserted as `{{length_instruction}}`.
    pub fn instruction(&self) -> &'static str {
        match self {
            SummaryLength::Short => "Keep it short: at most 3 sentences or 5 items.",
            SummaryLength::Medium => "Aim for roughly 150 to 250 words.",
            SummaryLength::Long => "Be thorough: roughly 400 to 600 words.",
        }
    }
}

impl std::str::FromStr for SummaryLength {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "short" => Ok(SummaryLength::Short),
            "medium" => Ok(SummaryLength::Medium),
            "long" => Ok(SummaryLength::Long),
            _ => Err(format!("Unknown summary length: {}", s)),
        }
    }
}

/// Collection of all prompt templates.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Prompts {
    /// System-role message sent before every templated prompt.
    pub system: String,
    pub summary: SummaryPrompts,
    pub translation: TranslationPrompts,
    /// Custom variables from config, available in all prompts.
    #[serde(skip)]
    pub variables: HashMap<String, String>,
}

impl Default for Prompts {
    fn default() -> Self {
        Self {
            system: "You are a careful assistant that summarizes and translates video transcripts. \
                     Stay faithful to the source: do not invent facts, names or numbers that are not in the text."
                .to_string(),
            summary: SummaryPrompts::default(),
            translation: TranslationPrompts::default(),
            variables: HashMap::new(),
        }
    }
}

/// Prompts for summarization (single shot, per chunk, and merge).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SummaryPrompts {
    pub single: String,
    pub chunk: String,
    pub merge: String,
}

impl Default for SummaryPrompts {
    fn default() -> Self {
        Self {
            single: r#"Summarize the following video transcript.

{{style_instruction}}
{{length_instruction}}
Write the summary in {{language}}.

Transcript:
{{transcript}}"#
                .to_string(),

            chunk: r#"This is part {{part}} of {{total}} of a longer video transcript.
Summarize only what this part says; later parts will be summarized separately.

{{style_instruction}}
Write the summary in {{language}}.

Transcript part:
{{transcript}}"#
                .to_string(),

            merge: r#"Below are summaries of consecutive parts of one video, in order.
Merge them into a single coherent summary of the whole video. Remove repetition and keep the original order of topics.

{{style_instruction}}
{{length_instruction}}
Write the summary in {{language}}.

Part summaries:
{{summaries}}"#
                .to_string(),
        }
    }
}

/// Prompts for translation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TranslationPrompts {
    pub user: String,
}

impl Default for TranslationPrompts {
    fn default() -> Self {
        Self {
            user: r#"Translate the following text into {{language}}.
Preserve meaning, tone and formatting. Reply with the translation only.

Text:
{{text}}"#
                .to_string(),
        }
    }
}

/// Human-readable name for a language code; unknown codes pass through.
pub fn language_name(code: &str) -> String {
    let name = match code.to_lowercase().as_str() {
        "en" => "English",
        "es" => "Spanish",
        "fr" => "French",
        "de" => "German",
        "it" => "Italian",
        "pt" => "Portuguese",
        "ru" => "Russian",
        "ja" => "Japanese",
        "ko" => "Korean",
        "zh" => "Chinese",
        "ar" => "Arabic",
        "hi" => "Hindi",
        "tr" => "Turkish",
        "nl" => "Dutch",
        _ => return code.to_string(),
    };
    name.to_string()
}

impl Prompts {
    /// Load prompts from the default location, with optional custom directory and variables.
    pub fn load(
        custom_dir: Option<&str>,
        custom_variables: Option<&HashMap<String, String>>,
    ) -> crate::error::Result<Self> {
        let mut prompts = Prompts::default();

        if let Some(vars) = custom_variables {
            prompts.variables = vars.clone();
        }

        if let Some(dir) = custom_dir {
            let custom_path = PathBuf::from(shellexpand::tilde(dir).to_string());

            let summary_path = custom_path.join("summary.toml");
            if summary_path.exists() {
                let content = std::fs::read_to_string(&summary_path)?;
                prompts.summary = toml::from_str(&content)?;
            }

            let translation_path = custom_path.join("translation.toml");
            if translation_path.exists() {
                let content = std::fs::read_to_string(&translation_path)?;
                prompts.translation = toml::from_str(&content)?;
            }

            let system_path = custom_path.join("system.txt");
            if system_path.exists() {
                prompts.system = std::fs::read_to_string(&system_path)?.trim().to_string();
            }
        }

        Ok(prompts)
    }

    /// Render a prompt template with the given variables.
    ///
    /// Placeholders are resolved in one pass over the template, so `{{...}}`
    /// inside substituted values is left as written. Unknown placeholders stay.
    pub fn render(template: &str, vars: &HashMap<String, String>) -> String {
        PLACEHOLDER
            .replace_all(template, |caps: &Captures<'_>| match vars.get(&caps[1]) {
                Some(value) => value.clone(),
                None => caps[0].to_string(),
            })
            .into_owned()
    }

    /// Render a prompt template with both provided variables and custom config variables.
    /// Provided variables take precedence over custom config variables.
    pub fn render_with_custom(&self, template: &str, vars: &HashMap<String, String>) -> String {
        let mut merged = self.variables.clone();
        for (key, value) in vars {
            merged.insert(key.clone(), value.clone());
        }
        Self::render(template, &merged)
    }

    /// Prompt for summarizing a transcript that fits in one request.
    pub fn summary_prompt(
        &self,
        transcript: &str,
        style: SummaryStyle,
        length: SummaryLength,
        language: &str,
    ) -> String {
        let mut vars = HashMap::new();
        vars.insert("style_instruction".to_string(), style.instruction().to_string());
        vars.insert("length_instruction".to_string(), length.instruction().to_string());
        vars.insert("language".to_string(), language_name(language));
        vars.insert("transcript".to_string(), transcript.to_string());
        self.render_with_custom(&self.summary.single, &vars)
    }

    /// Prompt for one intermediate chunk. Length is only applied at merge time.
    pub fn chunk_summary_prompt(
        &self,
        chunk: &str,
        part: usize,
        total: usize,
        style: SummaryStyle,
        language: &str,
    ) -> String {
        let mut vars = HashMap::new();
        vars.insert("style_instruction".to_string(), style.instruction().to_string());
        vars.insert("language".to_string(), language_name(language));
        vars.insert("part".to_string(), part.to_string());
        vars.insert("total".to_string(), total.to_string());
        vars.insert("transcript".to_string(), chunk.to_string());
        self.render_with_custom(&self.summary.chunk, &vars)
    }

    /// Prompt merging the joined chunk summaries into one.
    pub fn merge_prompt(
        &self,
        summaries: &str,
        style: SummaryStyle,
        length: SummaryLength,
        language: &str,
    ) -> String {
        let mut vars = HashMap::new();
        vars.insert("style_instruction".to_string(), style.instruction().to_string());
        vars.insert("length_instruction".to_string(), length.instruction().to_string());
        vars.insert("language".to_string(), language_name(language));
        vars.insert("summaries".to_string(), summaries.to_string());
        self.render_with_custom(&self.summary.merge, &vars)
    }

    /// Prompt for translating text into the target language.
    pub fn translation_prompt(&self, text: &str, target_language: &str) -> String {
        let mut vars = HashMap::new();
        vars.insert("language".to_string(), language_name(target_language));
        vars.insert("text".to_string(), text.to_string());
        self.render_with_custom(&self.translation.user, &vars)
    }
}
