//! Access to the language-model judge
//!
//! The rest of the pipeline only sees the narrow [`Judge`] capability:
//! a system context and a user prompt go in, free text comes out. Whether
//! the text is a usable answer is decided by [`crate::answer`], so a remote
//! model, a scripted stub and a fixture are interchangeable.
//!
//! - [`ChatTransport`] is one round-trip to a model backend,
//! - [`JudgeGateway`] wraps a transport with bounded retries and degrades to
//!   an empty reply once they are exhausted,
//! - [`OllamaClient`] is the HTTP transport for an Ollama server.

pub mod client;
pub mod gateway;
pub mod options;

pub use client::OllamaClient;
pub use gateway::{JudgeGateway, RetryPolicy};
pub use options::JudgeOptions;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Author of a chat message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// A role-tagged chat message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
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

/// Messages and decoding options for one judge round-trip
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatRequest {
    pub messages: Vec<ChatMessage>,
    pub options: JudgeOptions,
}

impl ChatRequest {
    /// The system/user pair every judge question is made of
    pub fn new(system: &str, user: &str, options: JudgeOptions) -> Self {
        Self {
            messages: vec![ChatMessage::system(system), ChatMessage::user(user)],
            options,
        }
    }
}

/// One attempt at getting a completion from a model backend
///
/// Failures should be reported as [`crate::AliError::Transport`]; retrying is
/// the caller's business. Any other error ends the gateway's retry loop at
/// once and is logged at error level before the question degrades to `""`.
/// Fatal setup problems such as an unknown model belong in
/// [`OllamaClient::ensure_model_available`](client::OllamaClient::ensure_model_available),
/// which runs before the pipeline starts.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ChatTransport: Send + Sync {
    async fn chat(&self, request: &ChatRequest) -> Result<String>;
}

/// The decision authority consulted by the filtering and sorting engines
///
/// Implementations never fail: an unreachable judge answers with an empty
/// string, which the answer parser rejects like any other bad answer.
#[async_trait]
pub trait Judge: Send + Sync {
    async fn ask(&self, system: &str, user: &str, options: &JudgeOptions) -> String;
}
