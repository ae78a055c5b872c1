//! Summaries and translations over any configured provider.
//!
//! Short transcripts are summarized in one call. Longer ones are summarized
//! chunk by chunk, in order, and the partial summaries are merged by a final
//! call. Any failed call aborts the whole operation.

use super::{AiClient, AiMessage};
use crate::config::{DefaultsSettings, Prompts, SummaryLength, SummaryStyle};
use crate::error::{ClipwiseError, Result};
use crate::providers::{Provider, ProviderRepository};
use crate::transcript::TranscriptProcessor;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument};

/// Separator between chunk summaries in the merge prompt.
const SUMMARY_SEPARATOR: &str = "\n\n";

/// Caller choices for one summary.
#[derive(Debug, Clone, PartialEq)]
pub struct SummaryOptions {
    pub style: SummaryStyle,
    pub length: SummaryLength,
    pub language: String,
    pub temperature: f64,
    /// Overrides the provider's default model.
    pub model: Option<String>,
}

impl Default for SummaryOptions {
    fn default() -> Self {
        Self::from(&DefaultsSettings::default())
    }
}

impl From<&DefaultsSettings> for SummaryOptions {
    fn from(defaults: &DefaultsSettings) -> Self {
        Self {
            style: defaults.summary_style,
            length: defaults.summary_length,
            language: defaults.language.clone(),
            temperature: defaults.temperature,
            model: defaults.model.clone(),
        }
    }
}

/// Runs transcripts through the processor, prompts and client.
pub struct AiRepository {
    client: AiClient,
    providers: Arc<ProviderRepository>,
    processor: TranscriptProcessor,
    prompts: Prompts,
}

impl AiRepository {
    pub fn new(
        client: AiClient,
        providers: Arc<ProviderRepository>,
        processor: TranscriptProcessor,
        prompts: Prompts,
    ) -> Self {
        Self {
            client,
            providers,
            processor,
            prompts,
        }
    }

    /// Summarize `transcript` with `provider_id`.
    #[instrument(skip(self, transcript, options, cancel), fields(chars = transcript.len()))]
    pub async fn generate_summary(
        &self,
        transcript: &str,
        provider_id: &str,
        options: &SummaryOptions,
        cancel: &CancellationToken,
    ) -> Result<String> {
        let provider = self.providers.resolve(provider_id, options.model.as_deref())?;

        let processed = self.processor.process_transcript(transcript, &provider.limits);
        if processed.cleaned_text.is_empty() {
            return Err(ClipwiseError::InvalidInput("transcript is empty".into()));
        }

        if !processed.is_chunked() {
            info!("Summarizing {} tokens in one call", processed.total_tokens);
            check_cancelled(cancel)?;
            let prompt = self.prompts.summary_prompt(
                &processed.cleaned_text,
                options.style,
                options.length,
                &options.language,
            );
            return self.call(&provider, prompt, options.temperature).await;
        }

        let total = processed.chunks.len();
        info!(
            "Summarizing {} tokens in {} chunks with {}",
            processed.total_tokens, total, provider.id
        );

        let mut summaries = Vec::with_capacity(total);
        for (index, chunk) in processed.chunks.iter().enumerate() {
            check_cancelled(cancel)?;
            let prompt = self.prompts.chunk_summary_prompt(
                &chunk.text,
                index + 1,
                total,
                options.style,
                &options.language,
            );
            let summary = self.call(&provider, prompt, options.temperature).await?;
            info!("Chunk {}/{} summarized", index + 1, total);
            summaries.push(summary);
        }

        check_cancelled(cancel)?;
        let merged = summaries.join(SUMMARY_SEPARATOR);
        let prompt = self
            .prompts
            .merge_prompt(&merged, options.style, options.length, &options.language);
        self.call(&provider, prompt, options.temperature).await
    }

    /// Translate `text` in a single call.
    #[instrument(skip(self, text), fields(chars = text.len()))]
    pub async fn translate(
        &self,
        text: &str,
        provider_id: &str,
        target_language: &str,
        temperature: f64,
    ) -> Result<String> {
        if text.trim().is_empty() {
            return Err(ClipwiseError::InvalidInput("nothing to translate".into()));
        }

        let provider = self.providers.resolve(provider_id, None)?;
        let prompt = self.prompts.translation_prompt(text, target_language);
        self.call(&provider, prompt, temperature).await
    }

    async fn call(&self, provider: &Provider, prompt: String, temperature: f64) -> Result<String> {
        let messages = vec![
            AiMessage::system(self.prompts.system.clone()),
            AiMessage::user(prompt),
        ];
        let response = self
            .client
            .make_request(provider, messages, temperature, provider.limits.max_output_tokens)
            .await?;
        Ok(response.content)
    }
}

fn check_cancelled(cancel: &CancellationToken) -> Result<()> {
    if cancel.is_cancelled() {
        Err(ClipwiseError::Cancelled)
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::transport::testing::ScriptedTransport;
    use crate::ai::{HttpResponse, Role};
    use crate::providers::{builtin_providers, CredentialStore, MemoryCredentialStore, ProviderLimits};
    use serde_json::Value;

    fn reply(text: &str) -> HttpResponse {
        HttpResponse {
            status: 200,
            body: serde_json::json!({"choices": [{"message": {"content": text}}]}).to_string(),
        }
    }

    fn long_transcript() -> String {
        (0..60)
            .map(|i| format!("Sentence {i} explains one more detail of the topic at hand."))
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn user_text(body: &Value) -> String {
        body["messages"][1]["content"].as_str().unwrap().to_string()
    }

    struct Fixture {
        repo: AiRepository,
        transport: Arc<ScriptedTransport>,
        _dir: tempfile::TempDir,
    }

    async fn fixture(transport: ScriptedTransport) -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let providers = ProviderRepository::new(dir.path()).unwrap();

        let mut tiny = builtin_providers().remove(0);
        tiny.id = "tiny".to_string();
        tiny.available_models = vec![];
        tiny.limits = ProviderLimits {
            max_context_tokens: 200,
            max_output_tokens: 50,
        };
        providers.save_custom(&tiny).unwrap();

        let store = MemoryCredentialStore::new();
        store.set("tiny", "key").await.unwrap();
        store.set("openai", "key").await.unwrap();

        let transport = Arc::new(transport);
        let client = AiClient::new(transport.clone(), Arc::new(store));
        let repo = AiRepository::new(
            client,
            Arc::new(providers),
            TranscriptProcessor::new(),
            Prompts::default(),
        );

        Fixture {
            repo,
            transport,
            _dir: dir,
        }
    }

    #[tokio::test]
    async fn test_map_reduce_calls_chunks_then_merge() {
        let f = fixture(ScriptedTransport::new(|i, _| reply(&format!("s{}", i + 1)))).await;
        let transcript = long_transcript();

        let limits = f.repo.providers.get("tiny").unwrap().limits;
        let expected_chunks = f.repo.processor.process_transcript(&transcript, &limits).chunks;
        let n = expected_chunks.len();
        assert!(n > 1);

        let summary = f
            .repo
            .generate_summary(&transcript, "tiny", &SummaryOptions::default(), &CancellationToken::new())
            .await
            .unwrap();

        let calls = f.transport.calls();
        assert_eq!(calls.len(), n + 1);
        assert_eq!(summary, format!("s{}", n + 1));

        for (i, call) in calls[..n].iter().enumerate() {
            assert_eq!(call.body["messages"][0]["role"], Role::System.as_str());
            assert_eq!(call.body["max_tokens"], 50);
            let text = user_text(&call.body);
            assert!(text.contains(&format!("part {} of {}", i + 1, n)));
            assert!(text.contains(&expected_chunks[i].text));
        }

        let joined = (1..=n)
            .map(|i| format!("s{i}"))
            .collect::<Vec<_>>()
            .join("\n\n");
        assert!(joined.starts_with("s1\n\ns2"));
        let options = SummaryOptions::default();
        let expected = f
            .repo
            .prompts
            .merge_prompt(&joined, options.style, options.length, &options.language);
        assert_eq!(user_text(&calls[n].body), expected);
    }

    #[tokio::test]
    async fn test_short_transcript_is_one_call() {
        let f = fixture(ScriptedTransport::fixed(200, &reply("short summary").body)).await;

        let summary = f
            .repo
            .generate_summary("[00:01] Hello there.", "openai", &SummaryOptions::default(), &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(summary, "short summary");
        let calls = f.transport.calls();
        assert_eq!(calls.len(), 1);
        assert!(user_text(&calls[0].body).contains("Hello there."));
        assert!(!user_text(&calls[0].body).contains("[00:01]"));
    }

    #[tokio::test]
    async fn test_chunk_failure_aborts() {
        let f = fixture(ScriptedTransport::new(|i, _| {
            if i == 1 {
                HttpResponse {
                    status: 500,
                    body: "boom".into(),
                }
            } else {
                reply("ok")
            }
        }))
        .await;

        let err = f
            .repo
            .generate_summary(&long_transcript(), "tiny", &SummaryOptions::default(), &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(err, ClipwiseError::Network { status: Some(500), .. }));
        assert_eq!(f.transport.calls().len(), 2);
    }

    #[tokio::test]
    async fn test_cancelled_before_first_call() {
        let f = fixture(ScriptedTransport::fixed(200, &reply("x").body)).await;
        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = f
            .repo
            .generate_summary(&long_transcript(), "tiny", &SummaryOptions::default(), &cancel)
            .await
            .unwrap_err();

        assert!(matches!(err, ClipwiseError::Cancelled));
        assert!(f.transport.calls().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_provider_and_blank_input() {
        let f = fixture(ScriptedTransport::fixed(200, &reply("x").body)).await;
        let cancel = CancellationToken::new();

        assert!(matches!(
            f.repo.generate_summary("text", "nope", &SummaryOptions::default(), &cancel).await,
            Err(ClipwiseError::ProviderNotFound(_))
        ));
        assert!(matches!(
            f.repo.generate_summary("  [00:00:01] ", "openai", &SummaryOptions::default(), &cancel).await,
            Err(ClipwiseError::InvalidInput(_))
        ));
        assert!(f.transport.calls().is_empty());
    }

    #[tokio::test]
    async fn test_translate_single_call() {
        let f = fixture(ScriptedTransport::fixed(200, &reply("Bonjour").body)).await;

        let text = f.repo.translate("Hello", "openai", "fr", 0.2).await.unwrap();
        assert_eq!(text, "Bonjour");

        let calls = f.transport.calls();
        assert_eq!(calls.len(), 1);
        assert!(user_text(&calls[0].body).contains("French"));
        assert_eq!(calls[0].body["temperature"], 0.2);
    }
}
