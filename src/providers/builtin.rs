//! Compiled-in provider catalog.

use super::{
    MessageShape, Provider, ProviderAuth, ProviderLimits, RequestSchema, ResponseSchema,
    CHAT_REQUEST_TYPE,
};
use std::collections::BTreeMap;

fn models(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

fn chat_request() -> RequestSchema {
    RequestSchema {
        request_type: CHAT_REQUEST_TYPE.to_string(),
        messages_path: "messages".to_string(),
        temperature_path: Some("temperature".to_string()),
        max_tokens_path: Some("max_tokens".to_string()),
        system_path: None,
        message_shape: MessageShape::Plain,
    }
}

fn bearer(header: &str) -> ProviderAuth {
    ProviderAuth {
        auth_type: "bearer".to_string(),
        header: header.to_string(),
        prefix: "Bearer ".to_string(),
        extra_headers: BTreeMap::new(),
    }
}

/// All built-in providers, in display order.
pub fn builtin_providers() -> Vec<Provider> {
    vec![
        Provider {
            id: "openai".to_string(),
            display_name: "OpenAI".to_string(),
            api_base_url: "https://api.openai.com/v1/chat/completions".to_string(),
            auth: bearer("Authorization"),
            model: "gpt-4o-mini".to_string(),
            available_models: models(&["gpt-4o-mini", "gpt-4o", "gpt-4.1", "gpt-4.1-mini"]),
            request: chat_request(),
            response: ResponseSchema {
                content_path: "choices[0].message.content".to_string(),
            },
            limits: ProviderLimits {
                max_context_tokens: 128_000,
                max_output_tokens: 4_096,
            },
        },
        Provider {
            id: "anthropic".to_string(),
            display_name: "Anthropic Claude".to_string(),
            api_base_url: "https://api.anthropic.com/v1/messages".to_string(),
            auth: ProviderAuth {
                auth_type: "api_key".to_string(),
                header: "x-api-key".to_string(),
                prefix: String::new(),
                extra_headers: BTreeMap::from([(
                    "anthropic-version".to_string(),
                    "2023-06-01".to_string(),
                )]),
            },
            model: "claude-3-5-haiku-latest".to_string(),
            available_models: models(&["claude-3-5-haiku-latest", "claude-3-5-sonnet-latest"]),
            request: RequestSchema {
                system_path: Some("system".to_string()),
                ..chat_request()
            },
            response: ResponseSchema {
                content_path: "content[0].text".to_string(),
            },
            limits: ProviderLimits {
                max_context_tokens: 200_000,
                max_output_tokens: 4_096,
            },
        },
        Provider {
            id: "gemini".to_string(),
            display_name: "Google Gemini".to_string(),
            api_base_url:
                "https://generativelanguage.googleapis.com/v1beta/models/{model}:generateContent"
                    .to_string(),
            auth: ProviderAuth {
                auth_type: "api_key".to_string(),
                header: "x-goog-api-key".to_string(),
                prefix: String::new(),
                extra_headers: BTreeMap::new(),
            },
            model: "gemini-1.5-flash".to_string(),
            available_models: models(&["gemini-1.5-flash", "gemini-1.5-pro", "gemini-2.0-flash"]),
            request: RequestSchema {
                request_type: "generate_content".to_string(),
                messages_path: "contents".to_string(),
                temperature_path: Some("generationConfig.temperature".to_string()),
                max_tokens_path: Some("generationConfig.maxOutputTokens".to_string()),
                system_path: Some("systemInstruction.parts[0].text".to_string()),
                message_shape: MessageShape::Parts,
            },
            response: ResponseSchema {
                content_path: "candidates[0].content.parts[0].text".to_string(),
            },
            limits: ProviderLimits {
                max_context_tokens: 1_000_000,
                max_output_tokens: 8_192,
            },
        },
        Provider {
            id: "openrouter".to_string(),
            display_name: "OpenRouter".to_string(),
            api_base_url: "https://openrouter.ai/api/v1/chat/completions".to_string(),
            auth: bearer("Authorization"),
            model: "openai/gpt-4o-mini".to_string(),
            available_models: models(&[
                "openai/gpt-4o-mini",
                "anthropic/claude-3.5-sonnet",
                "google/gemini-flash-1.5",
                "meta-llama/llama-3.1-70b-instruct",
            ]),
            request: chat_request(),
            response: ResponseSchema {
                content_path: "choices[0].message.content".to_string(),
            },
            limits: ProviderLimits {
                max_context_tokens: 128_000,
                max_output_tokens: 4_096,
            },
        },
    ]
}
