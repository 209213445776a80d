use crate::config::Config;
use crate::error::CompletionError;
use crate::events::ChatRole;
use anyhow::{Context, Result};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::future::Future;
use tracing::{debug, warn};

/// One `{role, content}` pair of the transcript sent to the endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptEntry {
    pub role: ChatRole,
    pub content: String,
}

/// Anything that can turn a transcript into the next assistant reply.
pub trait CompletionBackend: Send + Sync {
    fn complete(
        &self,
        credential: &str,
        transcript: &[TranscriptEntry],
    ) -> impl Future<Output = Result<String, CompletionError>> + Send;
}

#[derive(Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [TranscriptEntry],
}

#[derive(Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<CompletionChoice>,
}

#[derive(Deserialize)]
struct CompletionChoice {
    message: Option<ChoiceMessage>,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct ErrorBody {
    error: Option<ErrorDetail>,
}

#[derive(Deserialize)]
struct ErrorDetail {
    message: Option<String>,
}

/// HTTP client for an OpenRouter-compatible chat completions endpoint
#[derive(Clone)]
pub struct LlmClient {
    client: reqwest::Client,
    endpoint: String,
    model: String,
    referer: String,
    title: String,
}

impl LlmClient {
    pub fn new(config: &Config) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.request_timeout() {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            model: config.model.clone(),
            referer: config.referer.clone(),
            title: config.title.clone(),
        })
    }

    async fn send(
        &self,
        credential: &str,
        transcript: &[TranscriptEntry],
    ) -> Result<String, CompletionError> {
        let payload = CompletionRequest {
            model: &self.model,
            messages: transcript,
        };

        debug!(model = %self.model, messages = transcript.len(), "sending completion request");

        let response = self
            .client
            .post(&self.endpoint)
            .header("Authorization", format!("Bearer {}", credential))
            .header("HTTP-Referer", &self.referer)
            .header("X-Title", &self.title)
            .header("Content-Type", "application/json")
            .json(&payload)
            .send()
            .await?;

        let status = response.status();

        if !status.is_success() {
            // An unreadable error body falls back to the status line
            let body = response.text().await.unwrap_or_default();
            let err = api_error(status, &body);
            warn!(status = status.as_u16(), error = %err, "completion request rejected");
            return Err(err);
        }

        let body = response.text().await?;
        let reply = parse_completion(&body)?;
        debug!(chars = reply.len(), "completion received");
        Ok(reply)
    }
}

impl CompletionBackend for LlmClient {
    fn complete(
        &self,
        credential: &str,
        transcript: &[TranscriptEntry],
    ) -> impl Future<Output = Result<String, CompletionError>> + Send {
        self.send(credential, transcript)
    }
}

/// Extract `choices[0].message.content` from a successful response body
pub fn parse_completion(body: &str) -> Result<String, CompletionError> {
    let response: CompletionResponse = serde_json::from_str(body)
        .map_err(|e| CompletionError::MalformedResponse(e.to_string()))?;

    let choice = response
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| CompletionError::MalformedResponse("no choices returned".to_string()))?;

    choice
        .message
        .and_then(|m| m.content)
        .ok_or_else(|| {
            CompletionError::MalformedResponse("first choice has no message content".to_string())
        })
}

/// Build the error for a non-2xx response.
///
/// Prefers `error.message` from the body; otherwise `HTTP <status>: <reason>`.
pub fn api_error(status: StatusCode, body: &str) -> CompletionError {
    let message = serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.error)
        .and_then(|e| e.message)
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| {
            format!(
                "HTTP {}: {}",
                status.as_u16(),
                status.canonical_reason().unwrap_or("")
            )
        });

    CompletionError::Api {
        status: status.as_u16(),
        message,
    }
}
