//! Provider-agnostic AI calls.
//!
//! [`AiClient`] turns an abstract message list into whatever JSON a
//! [`Provider`](crate::providers::Provider) declares, and reads the reply back
//! through the provider's content path. [`AiRepository`] builds summaries and
//! translations on top of it.

mod client;
pub mod json_path;
mod repository;
mod transport;

pub use client::AiClient;
pub use repository::{AiRepository, SummaryOptions};
pub use transport::{HttpResponse, HttpTransport, ReqwestTransport};

#[cfg(test)]
pub(crate) use transport::testing;

use serde::{Deserialize, Serialize};

/// Message author.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AiMessage {
    pub role: Role,
    pub content: String,
}

impl AiMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// Abstract request, independent of any vendor's body shape.
#[derive(Debug, Clone, PartialEq)]
pub struct AiRequest {
    pub messages: Vec<AiMessage>,
    pub temperature: f64,
    pub max_tokens: u32,
}

/// Text reply plus best-effort token usage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AiResponse {
    pub content: String,
    pub tokens_used: Option<u32>,
}
