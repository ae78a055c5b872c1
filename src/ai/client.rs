//! Schema-driven request builder and response parser.

use super::json_path::{extract_text, get_path, set_path};
use super::transport::HttpTransport;
use super::{AiMessage, AiRequest, AiResponse, Role};
use crate::error::{ClipwiseError, Result};
use crate::providers::{CredentialStore, MessageShape, Provider};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Longest body excerpt carried in an error.
const BODY_SNIPPET_CHARS: usize = 200;

/// Calls any provider described by a [`Provider`] schema.
#[derive(Clone)]
pub struct AiClient {
    transport: Arc<dyn HttpTransport>,
    credentials: Arc<dyn CredentialStore>,
}

impl AiClient {
    pub fn new(transport: Arc<dyn HttpTransport>, credentials: Arc<dyn CredentialStore>) -> Self {
        Self {
            transport,
            credentials,
        }
    }

    /// Build the provider-specific JSON body for `request`.
    pub fn build_request(provider: &Provider, request: &AiRequest) -> Result<Value> {
        let schema = &provider.request;
        let mut body = json!({});

        if provider.sends_model() {
            set_path(&mut body, "model", Value::String(provider.model.clone()))?;
        }

        let (system, conversation): (Vec<&AiMessage>, Vec<&AiMessage>) = match &schema.system_path {
            Some(_) => request.messages.iter().partition(|m| m.role == Role::System),
            None => (Vec::new(), request.messages.iter().collect()),
        };

        if let Some(path) = &schema.system_path {
            if !system.is_empty() {
                let text = system
                    .iter()
                    .map(|m| m.content.as_str())
                    .collect::<Vec<_>>()
                    .join("\n\n");
                set_path(&mut body, path, Value::String(text))?;
            }
        }

        let messages: Vec<Value> = conversation
            .into_iter()
            .map(|m| shape_message(m, schema.message_shape))
            .collect();
        set_path(&mut body, &schema.messages_path, Value::Array(messages))?;

        if let Some(path) = &schema.temperature_path {
            set_path(&mut body, path, json!(request.temperature))?;
        }
        if let Some(path) = &schema.max_tokens_path {
            set_path(&mut body, path, json!(request.max_tokens))?;
        }

        Ok(body)
    }

    /// Send `messages` to `provider` and return the extracted reply.
    ///
    /// Fails with `CredentialMissing` before any network traffic when no key is stored.
    #[instrument(skip(self, provider, messages), fields(provider_id = %provider.id, model = %provider.model))]
    pub async fn make_request(
        &self,
        provider: &Provider,
        messages: Vec<AiMessage>,
        temperature: f64,
        max_tokens: u32,
    ) -> Result<AiResponse> {
        let credential = self
            .credentials
            .get(&provider.id)
            .await
            .filter(|c| !c.trim().is_empty())
            .ok_or_else(|| ClipwiseError::CredentialMissing {
                provider_id: provider.id.clone(),
            })?;

        let request = AiRequest {
            messages,
            temperature,
            max_tokens,
        };
        let body = Self::build_request(provider, &request)?;

        let mut headers = vec![(
            provider.auth.header.clone(),
            format!("{}{}", provider.auth.prefix, credential),
        )];
        headers.extend(
            provider
                .auth
                .extra_headers
                .iter()
                .map(|(k, v)| (k.clone(), v.clone())),
        );
        headers.push(("Content-Type".to_string(), "application/json".to_string()));

        let url = provider.endpoint();
        debug!("POST {} with {} messages", url, request.messages.len());

        let response = self.transport.post_json(&url, &headers, &body).await?;

        if !response.is_success() {
            warn!("Provider {} returned HTTP {}", provider.id, response.status);
            return Err(classify_failure(provider, response.status, &response.body));
        }

        if response.body.trim().is_empty() {
            return Err(ClipwiseError::Network {
                status: Some(response.status),
                message: "empty response body".to_string(),
            });
        }

        let parsed = Self::parse_response(provider, &response.body)?;
        info!(
            "Provider {} replied with {} chars (tokens: {})",
            provider.id,
            parsed.content.len(),
            parsed
                .tokens_used
                .map(|t| t.to_string())
                .unwrap_or_else(|| "unknown".to_string())
        );
        Ok(parsed)
    }

    /// Extract content at the provider's content path plus best-effort token usage.
    pub fn parse_response(provider: &Provider, body: &str) -> Result<AiResponse> {
        let value: Value = serde_json::from_str(body).map_err(|_| ClipwiseError::ContentExtraction {
            path: provider.response.content_path.clone(),
        })?;

        let content = extract_text(&value, &provider.response.content_path)?;

        Ok(AiResponse {
            content,
            tokens_used: token_usage(&value),
        })
    }
}

fn shape_message(message: &AiMessage, shape: MessageShape) -> Value {
    match shape {
        MessageShape::Plain => json!({
            "role": message.role.as_str(),
            "content": message.content,
        }),
        MessageShape::Parts => {
            let role = match message.role {
                Role::Assistant => "model",
                other => other.as_str(),
            };
            json!({
                "role": role,
                "parts": [{"text": message.content}],
            })
        }
    }
}

fn token_usage(value: &Value) -> Option<u32> {
    let read = |path: &str| get_path(value, path).and_then(Value::as_u64);

    read("usage.total_tokens")
        .or_else(|| read("usage.prompt_tokens"))
        .or_else(|| read("usageMetadata.totalTokenCount"))
        .or_else(|| match (read("usage.input_tokens"), read("usage.output_tokens")) {
            (Some(input), Some(output)) => Some(input + output),
            (Some(input), None) => Some(input),
            _ => None,
        })
        .and_then(|t| u32::try_from(t).ok())
}

fn snippet(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.chars().count() <= BODY_SNIPPET_CHARS {
        trimmed.to_string()
    } else {
        let cut: String = trimmed.chars().take(BODY_SNIPPET_CHARS).collect();
        format!("{cut}...")
    }
}

fn classify_failure(provider: &Provider, status: u16, body: &str) -> ClipwiseError {
    let lower = body.to_lowercase();

    if status == 429
        || lower.contains("insufficient_quota")
        || lower.contains("resource_exhausted")
        || lower.contains("quota")
    {
        return ClipwiseError::QuotaExceeded(snippet(body));
    }

    if status == 401 || status == 403 {
        return ClipwiseError::CredentialRejected {
            provider_id: provider.id.clone(),
            status,
        };
    }

    if status == 404 && (lower.contains(&provider.model.to_lowercase()) || lower.contains("model")) {
        return ClipwiseError::ModelNotFound {
            provider_id: provider.id.clone(),
            model: provider.model.clone(),
        };
    }

    ClipwiseError::Network {
        status: Some(status),
        message: snippet(body),
    }
}
