//! AI provider definitions.
//!
//! A provider is a declarative schema describing one vendor's request and
//! response JSON shape and its auth convention. Built-ins are compiled in;
//! custom providers are loaded from one `<id>.json` file each.

mod builtin;
mod keystore;
mod registry;

pub use builtin::builtin_providers;
pub use keystore::{CredentialStore, FileCredentialStore, MemoryCredentialStore};
pub use registry::ProviderRepository;

use crate::ai::json_path::parse_path;
use crate::error::{ClipwiseError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Request type that carries the model name in the body.
pub const CHAT_REQUEST_TYPE: &str = "chat";

/// Placeholder substituted with the model in `api_base_url`.
pub const MODEL_PLACEHOLDER: &str = "{model}";

/// One AI vendor's API schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Provider {
    /// Unique key across built-in and custom providers.
    pub id: String,
    pub display_name: String,
    /// Endpoint URL; may contain `{model}`.
    pub api_base_url: String,
    pub auth: ProviderAuth,
    /// Default model.
    pub model: String,
    #[serde(default)]
    pub available_models: Vec<String>,
    pub request: RequestSchema,
    pub response: ResponseSchema,
    pub limits: ProviderLimits,
}

/// How the credential is attached to a request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderAuth {
    #[serde(rename = "type", default = "default_auth_type")]
    pub auth_type: String,
    /// Header name carrying the credential.
    pub header: String,
    /// Prepended to the credential, e.g. `"Bearer "`.
    #[serde(default)]
    pub prefix: String,
    /// Static headers sent with every request.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra_headers: BTreeMap<String, String>,
}

fn default_auth_type() -> String {
    "header".to_string()
}

fn default_request_type() -> String {
    CHAT_REQUEST_TYPE.to_string()
}

/// How each message is laid out inside the messages array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageShape {
    /// `{"role": ..., "content": ...}`
    #[default]
    Plain,
    /// `{"role": ..., "parts": [{"text": ...}]}`, with `assistant` sent as `model`.
    Parts,
}

/// Where the request fields live in the JSON body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestSchema {
    #[serde(rename = "type", default = "default_request_type")]
    pub request_type: String,
    pub messages_path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens_path: Option<String>,
    /// When set, system messages are lifted out of the array and written here.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_path: Option<String>,
    #[serde(default)]
    pub message_shape: MessageShape,
}

/// Where the response text lives in the JSON body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseSchema {
    pub content_path: String,
}

/// Token limits of a provider's model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderLimits {
    pub max_context_tokens: u32,
    pub max_output_tokens: u32,
}

impl Provider {
    /// Endpoint with `{model}` substituted.
    pub fn endpoint(&self) -> String {
        self.api_base_url.replace(MODEL_PLACEHOLDER, &self.model)
    }

    /// Whether the model name is sent in the body.
    pub fn sends_model(&self) -> bool {
        self.request.request_type == CHAT_REQUEST_TYPE
    }

    /// Copy of this provider using `model` instead of the default.
    pub fn with_model(&self, model: &str) -> Provider {
        Provider {
            model: model.to_string(),
            ..self.clone()
        }
    }

    /// Check the fields a request cannot be built without.
    pub fn validate(&self) -> Result<()> {
        validate_id(&self.id)?;

        let required = [
            ("display_name", &self.display_name),
            ("api_base_url", &self.api_base_url),
            ("auth.header", &self.auth.header),
            ("model", &self.model),
            ("request.messages_path", &self.request.messages_path),
            ("response.content_path", &self.response.content_path),
        ];
        for (name, value) in required {
            if value.trim().is_empty() {
                return Err(ClipwiseError::InvalidInput(format!(
                    "provider '{}': {} is blank",
                    self.id, name
                )));
            }
        }

        let paths = [
            Some(&self.request.messages_path),
            self.request.temperature_path.as_ref(),
            self.request.max_tokens_path.as_ref(),
            self.request.system_path.as_ref(),
            Some(&self.response.content_path),
        ];
        for path in paths.into_iter().flatten() {
            parse_path(path)?;
        }

        if self.limits.max_output_tokens == 0
            || self.limits.max_output_tokens >= self.limits.max_context_tokens
        {
            return Err(ClipwiseError::ProviderMisconfigured(format!(
                "provider '{}': max_output_tokens must be positive and below max_context_tokens",
                self.id
            )));
        }

        Ok(())
    }
}

/// Check that `id` is usable as a file stem: non-blank, no separators, no leading dot.
pub fn validate_id(id: &str) -> Result<()> {
    if id.trim().is_empty() {
        return Err(ClipwiseError::InvalidInput("provider id is blank".into()));
    }
    if !id
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.')
        || id.starts_with('.')
    {
        return Err(ClipwiseError::InvalidInput(format!(
            "provider id '{}' may only contain letters, digits, '-', '_' and '.'",
            id
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_record_parses_with_defaults() {
        let json = r#"{
            "id": "local-llm",
            "display_name": "Local LLM",
            "api_base_url": "http://localhost:8080/v1/chat/completions",
            "auth": {"header": "Authorization", "prefix": "Bearer "},
            "model": "llama3",
            "request": {"messages_path": "messages", "temperature_path": "temperature", "max_tokens_path": "max_tokens"},
            "response": {"content_path": "choices[0].message.content"},
            "limits": {"max_context_tokens": 8192, "max_output_tokens": 1024},
            "some_future_field": true
        }"#;

        let provider: Provider = serde_json::from_str(json).unwrap();
        assert!(provider.sends_model());
        assert_eq!(provider.request.message_shape, MessageShape::Plain);
        assert!(provider.available_models.is_empty());
        provider.validate().unwrap();
    }

    #[test]
    fn test_endpoint_substitutes_model() {
        let gemini = builtin_providers()
            .into_iter()
            .find(|p| p.id == "gemini")
            .unwrap()
            .with_model("gemini-1.5-pro");
        assert_eq!(
            gemini.endpoint(),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-1.5-pro:generateContent"
        );
    }

    #[test]
    fn test_validate_rejects_path_like_ids() {
        let mut provider = builtin_providers().remove(0);
        provider.id = "../escape".to_string();
        assert!(provider.validate().is_err());
        assert!(validate_id("../credentials").is_err());
        assert!(validate_id("my-llm_2").is_ok());
    }

    #[test]
    fn test_validate_rejects_huge_path_index() {
        let mut provider = builtin_providers().remove(0);
        provider.response.content_path = "choices[4000000000].message.content".to_string();
        assert!(matches!(
            provider.validate(),
            Err(ClipwiseError::ProviderMisconfigured(_))
        ));
    }
}
