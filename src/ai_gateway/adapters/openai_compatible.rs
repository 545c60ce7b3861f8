use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;

use crate::ai_gateway::{
    adapters::{BackendAdapter, http_common},
    error::{GatewayError, malformed_response},
    types::{AdapterContext, BackendDialect, CanonicalRequest},
};

#[derive(Clone)]
pub struct OpenAiCompatibleAdapter {
    client: Client,
}

impl Default for OpenAiCompatibleAdapter {
    fn default() -> Self {
        Self {
            client: Client::builder()
                .pool_idle_timeout(Duration::from_secs(30))
                .build()
                .expect("reqwest client must build"),
        }
    }
}

#[async_trait]
impl BackendAdapter for OpenAiCompatibleAdapter {
    fn dialect(&self) -> BackendDialect {
        BackendDialect::OpenAiCompatible
    }

    async fn invoke(
        &self,
        ctx: AdapterContext,
        req: &CanonicalRequest,
    ) -> Result<Value, GatewayError> {
        http_common::post_chat_completion(&self.client, &ctx, req).await
    }

    fn parse_response(&self, payload: &Value, backend_id: &str) -> Result<String, GatewayError> {
        parse_openai_payload(payload, backend_id)
    }
}

pub fn parse_openai_payload(payload: &Value, backend_id: &str) -> Result<String, GatewayError> {
    let choice = payload
        .get("choices")
        .and_then(Value::as_array)
        .and_then(|choices| choices.first())
        .ok_or_else(|| {
            malformed_response("openai-compatible response missing choices")
                .with_backend_id(backend_id)
        })?;

    choice
        .get("message")
        .and_then(|message| message.get("content"))
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| {
            malformed_response("openai-compatible response missing message content")
                .with_backend_id(backend_id)
        })
}
