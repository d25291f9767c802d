//! Ollama HTTP transport
//!
//! Talks to the Ollama REST API:
//! - `POST /api/chat` with role-tagged messages (used by the judge),
//! - `POST /api/generate` for plain completions,
//! - `GET /api/tags` to check that the configured model is installed.
//!
//! Every method makes exactly one request; retries live in
//! [`super::JudgeGateway`].

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;

use super::{ChatRequest, ChatTransport, JudgeOptions};
use crate::config::JudgeConfig;
use crate::error::{AliError, Result};

/// Entry of the `/api/tags` listing
#[derive(Debug, Clone, Deserialize)]
pub struct ModelInfo {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub model: String,
}

#[derive(Debug, Deserialize)]
struct TagsResponse {
    #[serde(default)]
    models: Vec<ModelInfo>,
}

/// HTTP client for one Ollama server and model
pub struct OllamaClient {
    client: Client,
    host: String,
    model: String,
}

impl OllamaClient {
    /// Create a client with a request timeout
    pub fn new(
        host: impl Into<String>,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .pool_idle_timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| AliError::configuration(format!("cannot build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            host: host.into().trim_end_matches('/').to_string(),
            model: model.into(),
        })
    }

    /// Create a client from the judge section of the configuration
    pub fn from_config(config: &JudgeConfig) -> Result<Self> {
        Self::new(
            config.host.clone(),
            config.model.clone(),
            Duration::from_millis(config.timeout_ms),
        )
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Models installed on the server
    pub async fn list_models(&self) -> Result<Vec<ModelInfo>> {
        let url = format!("{}/api/tags", self.host);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| AliError::transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AliError::transport(format!("model listing returned {}", status)));
        }

        let tags: TagsResponse = response
            .json()
            .await
            .map_err(|e| AliError::transport(format!("cannot parse model listing: {}", e)))?;
        Ok(tags.models)
    }

    /// Fail when the server is reachable but lacks the configured model
    ///
    /// An unreachable server is only logged; the gateway copes with that on
    /// every request.
    pub async fn ensure_model_available(&self) -> Result<()> {
        match self.list_models().await {
            Ok(models) => {
                if models
                    .iter()
                    .any(|m| m.model == self.model || m.name == self.model)
                {
                    Ok(())
                } else {
                    let available: Vec<&str> = models.iter().map(|m| m.name.as_str()).collect();
                    Err(AliError::configuration(format!(
                        "model '{}' is not available on {} (available: {:?}); \
                         pick one of them or run `ollama pull {}`",
                        self.model, self.host, available, self.model
                    )))
                }
            }
            Err(e) => {
                tracing::error!(host = %self.host, error = %e, "Judge server is not reachable");
                Ok(())
            }
        }
    }

    /// Single-prompt completion through `/api/generate`
    pub async fn generate(&self, prompt: &str, options: &JudgeOptions) -> Result<String> {
        let url = format!("{}/api/generate", self.host);
        let body = json!({
            "model": self.model,
            "prompt": prompt,
            "stream": false,
            "options": options,
        });

        let payload = self.post(&url, &body).await?;
        payload
            .get("response")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| AliError::transport("generate response has no `response` text"))
    }

    async fn post(&self, url: &str, body: &Value) -> Result<Value> {
        let response = self
            .client
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|e| AliError::transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(AliError::transport(format!(
                "judge returned {}: {}",
                status, error_text
            )));
        }

        response
            .json()
            .await
            .map_err(|e| AliError::transport(format!("cannot parse judge response: {}", e)))
    }
}

#[async_trait]
impl ChatTransport for OllamaClient {
    async fn chat(&self, request: &ChatRequest) -> Result<String> {
        let url = format!("{}/api/chat", self.host);
        let body = json!({
            "model": self.model,
            "messages": request.messages,
            "stream": false,
            "options": request.options,
        });

        let payload = self.post(&url, &body).await?;
        payload
            .pointer("/message/content")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| AliError::transport("chat response has no message content"))
    }
}
