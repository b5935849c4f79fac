use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::Value;

use crate::error::{PipelineError, PipelineResult};

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

use crate::log_info;

pub const DEFAULT_MODEL: &str = "gpt-4o";

/// Instruction sent ahead of the recognized text. The relay's prompt handling
/// depends on this exact wording.
pub const PROMPT_PREFIX: &str = "If you see multiple choice test like A,B,C and so on, return just an answer, without any elaboration or additional text. If you see coding question, just output an answer without any elaboration\n";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayReply {
    pub answer: String,
    /// Stealth flag captured when the request was issued.
    pub stealth_mode: bool,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    message: String,
    model: &'a str,
}

/// Client for the remote `/chat` endpoint. One attempt per call.
#[derive(Clone)]
pub struct RelayClient {
    http: reqwest::Client,
    endpoint: String,
}

impl RelayClient {
    pub fn new(base_url: &str) -> Result<Self> {
        let http = reqwest::Client::builder()
            .build()
            .context("failed to build relay HTTP client")?;
        Ok(Self::with_client(http, base_url))
    }

    pub fn with_client(http: reqwest::Client, base_url: &str) -> Self {
        Self {
            http,
            endpoint: format!("{}/chat", base_url.trim_end_matches('/')),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub async fn relay(
        &self,
        text: &str,
        model: &str,
        stealth_mode: bool,
    ) -> PipelineResult<RelayReply> {
        if text.trim().is_empty() {
            return Err(PipelineError::MissingText);
        }

        let model = resolve_model(model);
        let body = ChatRequest {
            message: format!("{PROMPT_PREFIX}{text}"),
            model,
        };

        log_info!("relaying {} chars to {} (model={})", text.len(), self.endpoint, model);

        let response = self
            .http
            .post(&self.endpoint)
            .json(&body)
            .send()
            .await
            .map_err(|err| PipelineError::Transport(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PipelineError::Server {
                status: status.as_u16(),
                body,
            });
        }

        let payload: Value = response
            .json()
            .await
            .map_err(|_| PipelineError::MalformedResponse)?;

        match payload.get("response").and_then(Value::as_str) {
            Some(answer) if !answer.is_empty() => Ok(RelayReply {
                answer: answer.to_string(),
                stealth_mode,
            }),
            _ => Err(PipelineError::MalformedResponse),
        }
    }
}

pub fn resolve_model(model: &str) -> &str {
    let trimmed = model.trim();
    if trimmed.is_empty() {
        DEFAULT_MODEL
    } else {
        trimmed
    }
}
