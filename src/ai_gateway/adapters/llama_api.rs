use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;

use crate::ai_gateway::{
    adapters::{BackendAdapter, http_common},
    error::{GatewayError, malformed_response},
    types::{AdapterContext, BackendDialect, CanonicalRequest},
};

/// Adapter for the Llama API, whose replies carry the text under
/// `completion_message.content.text`.
#[derive(Clone)]
pub struct LlamaApiAdapter {
    client: Client,
}

impl Default for LlamaApiAdapter {
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
impl BackendAdapter for LlamaApiAdapter {
    fn dialect(&self) -> BackendDialect {
        BackendDialect::LlamaApi
    }

    async fn invoke(
        &self,
        ctx: AdapterContext,
        req: &CanonicalRequest,
    ) -> Result<Value, GatewayError> {
        http_common::post_chat_completion(&self.client, &ctx, req).await
    }

    fn parse_response(&self, payload: &Value, backend_id: &str) -> Result<String, GatewayError> {
        parse_llama_payload(payload, backend_id)
    }
}

pub fn parse_llama_payload(payload: &Value, backend_id: &str) -> Result<String, GatewayError> {
    payload
        .get("completion_message")
        .and_then(|message| message.get("content"))
        .and_then(|content| content.get("text"))
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| {
            malformed_response("llama api response missing completion_message.content.text")
                .with_backend_id(backend_id)
        })
}
