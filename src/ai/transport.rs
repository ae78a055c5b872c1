//! HTTP seam for AI calls.

use crate::error::{ClipwiseError, Result};
use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;

/// Raw status and body of an HTTP exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Sends a JSON POST and returns the raw response.
///
/// Non-2xx statuses are returned, not raised; only transport failures error.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn post_json(&self, url: &str, headers: &[(String, String)], body: &Value) -> Result<HttpResponse>;
}

/// [`HttpTransport`] backed by a shared `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn with_timeout(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ClipwiseError::Config(format!("Failed to create HTTP client: {e}")))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn post_json(&self, url: &str, headers: &[(String, String)], body: &Value) -> Result<HttpResponse> {
        let mut request = self.client.post(url).json(body);
        for (name, value) in headers {
            request = request.header(name.as_str(), value.as_str());
        }

        let response = request.send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;

        Ok(HttpResponse { status, body })
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::sync::Mutex;

    /// One recorded POST.
    #[derive(Debug, Clone)]
    pub(crate) struct RecordedCall {
        pub url: String,
        pub headers: Vec<(String, String)>,
        pub body: Value,
    }

    type Responder = Box<dyn Fn(usize, &Value) -> HttpResponse + Send + Sync>;

    /// Transport that records every call and answers from a closure.
    pub(crate) struct ScriptedTransport {
        responder: Responder,
        pub calls: Mutex<Vec<RecordedCall>>,
    }

    impl ScriptedTransport {
        pub fn new(responder: impl Fn(usize, &Value) -> HttpResponse + Send + Sync + 'static) -> Self {
            Self {
                responder: Box::new(responder),
                calls: Mutex::new(Vec::new()),
            }
        }

        /// Always answers with `status` and `body`.
        pub fn fixed(status: u16, body: &str) -> Self {
            let body = body.to_string();
            Self::new(move |_, _| HttpResponse {
                status,
                body: body.clone(),
            })
        }

        pub fn calls(&self) -> Vec<RecordedCall> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl HttpTransport for ScriptedTransport {
        async fn post_json(&self, url: &str, headers: &[(String, String)], body: &Value) -> Result<HttpResponse> {
            let mut calls = self.calls.lock().unwrap();
            let index = calls.len();
            calls.push(RecordedCall {
                url: url.to_string(),
                headers: headers.to_vec(),
                body: body.clone(),
            });
            Ok((self.responder)(index, body))
        }
    }
}
