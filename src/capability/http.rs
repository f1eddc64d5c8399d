//! HTTP-backed extraction capability.
//!
//! Speaks a generate-style endpoint: one POST with the concatenated text
//! prompt plus base64-encoded binary attachments, non-streamed. Connection
//! and authentication failures map to the fatal `Unavailable` variant;
//! timeouts and server errors stay transient so the chunked parser can
//! retry them.

use std::time::Duration;

use base64::Engine as _;
use serde::{Deserialize, Serialize};

use super::{CapabilityError, ExtractionCapability, PromptPart};

pub struct HttpCapability {
    base_url: String,
    client: reqwest::blocking::Client,
    timeout_secs: u64,
}

impl HttpCapability {
    /// Create a client with a per-request timeout. The timeout should match
    /// the pipeline's per-page budget so a hung generation surfaces as a
    /// transient error instead of blocking the job.
    pub fn new(base_url: &str, timeout: Duration) -> Self {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .expect("Failed to create HTTP client");

        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
            timeout_secs: timeout.as_secs(),
        }
    }

    /// Default local endpoint with a 45-second request timeout.
    pub fn default_local() -> Self {
        Self::new("http://localhost:11434", Duration::from_secs(45))
    }
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    images: Vec<String>,
    stream: bool,
}

#[derive(Deserialize)]
struct GenerateResponse {
    response: String,
}

impl ExtractionCapability for HttpCapability {
    fn generate(&self, model: &str, parts: &[PromptPart]) -> Result<String, CapabilityError> {
        let url = format!("{}/api/generate", self.base_url);

        let mut prompt = String::new();
        let mut images = Vec::new();
        for part in parts {
            match part {
                PromptPart::Text(text) => {
                    if !prompt.is_empty() {
                        prompt.push_str("\n\n");
                    }
                    prompt.push_str(text);
                }
                PromptPart::Document { bytes, .. } | PromptPart::Image { bytes, .. } => {
                    images.push(base64::engine::general_purpose::STANDARD.encode(bytes));
                }
            }
        }

        let body = GenerateRequest {
            model,
            prompt,
            images,
            stream: false,
        };

        let response = self.client.post(&url).json(&body).send().map_err(|e| {
            if e.is_connect() {
                CapabilityError::Unavailable(format!("cannot reach {}", self.base_url))
            } else if e.is_timeout() {
                CapabilityError::Transport(format!(
                    "request timed out after {}s",
                    self.timeout_secs
                ))
            } else {
                CapabilityError::Transport(e.to_string())
            }
        })?;

        let status = response.status();
        if status.as_u16() == 401 || status.as_u16() == 403 {
            return Err(CapabilityError::Unavailable(format!(
                "capability rejected credentials (status {})",
                status.as_u16()
            )));
        }
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(CapabilityError::BadStatus {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: GenerateResponse = response
            .json()
            .map_err(|e| CapabilityError::ResponseDecode(e.to_string()))?;

        Ok(parsed.response)
    }
}
