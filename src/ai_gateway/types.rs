use std::time::Duration;

use serde::{Deserialize, Serialize};

pub type BackendId = String;
pub type RequestId = String;

pub const DEFAULT_CREDENTIAL_ENV: &str = "LLAMA_API_KEY";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum BackendDialect {
    #[serde(rename = "llama_api")]
    LlamaApi,
    #[serde(rename = "openai_compatible")]
    OpenAiCompatible,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CredentialRef {
    Env { var: String },
    InlineToken { token: String },
}

impl Default for CredentialRef {
    fn default() -> Self {
        Self::Env {
            var: DEFAULT_CREDENTIAL_ENV.to_string(),
        }
    }
}

#[derive(Clone)]
pub struct ResolvedCredential {
    pub auth_header: String,
}

impl std::fmt::Debug for ResolvedCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolvedCredential")
            .field("auth_header", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendProfile {
    pub id: BackendId,
    pub dialect: BackendDialect,
    pub endpoint: String,
    #[serde(default)]
    pub credential: CredentialRef,
    pub model: String,
    #[serde(default)]
    pub request_timeout_ms: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AIGatewayConfig {
    pub default_backend: BackendId,
    pub backends: Vec<BackendProfile>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

impl ChatRole {
    pub fn as_wire(&self) -> &'static str {
        match self {
            ChatRole::System => "system",
            ChatRole::User => "user",
            ChatRole::Assistant => "assistant",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub request_id: Option<RequestId>,
    pub backend_id: Option<BackendId>,
    pub model: Option<String>,
    pub messages: Vec<ChatMessage>,
}

#[derive(Debug, Clone)]
pub struct CanonicalRequest {
    pub request_id: RequestId,
    pub backend_hint: Option<BackendId>,
    pub model_override: Option<String>,
    pub messages: Vec<ChatMessage>,
}

/// Decoded but otherwise untouched oracle payload.
#[derive(Debug, Clone)]
pub struct RawCompletion {
    pub request_id: RequestId,
    pub backend_id: BackendId,
    pub dialect: BackendDialect,
    pub payload: serde_json::Value,
}

#[derive(Debug, Clone)]
pub struct AdapterContext {
    pub backend_id: BackendId,
    pub model: String,
    pub profile: BackendProfile,
    pub credential: ResolvedCredential,
    pub timeout: Option<Duration>,
    pub request_id: RequestId,
}
