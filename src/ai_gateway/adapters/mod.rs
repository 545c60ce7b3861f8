use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use serde_json::Value;

use crate::ai_gateway::{
    error::GatewayError,
    types::{AdapterContext, BackendDialect, CanonicalRequest},
};

pub mod http_common;
pub mod llama_api;
pub mod openai_compatible;

#[async_trait]
pub trait BackendAdapter: Send + Sync {
    fn dialect(&self) -> BackendDialect;

    /// Performs exactly one outbound call and returns the decoded body.
    async fn invoke(
        &self,
        ctx: AdapterContext,
        req: &CanonicalRequest,
    ) -> Result<Value, GatewayError>;

    /// Pulls the assistant text out of a payload returned by `invoke`.
    fn parse_response(&self, payload: &Value, backend_id: &str) -> Result<String, GatewayError>;
}

pub fn build_default_adapters() -> HashMap<BackendDialect, Arc<dyn BackendAdapter>> {
    let mut adapters: HashMap<BackendDialect, Arc<dyn BackendAdapter>> = HashMap::new();
    adapters.insert(
        BackendDialect::LlamaApi,
        Arc::new(llama_api::LlamaApiAdapter::default()),
    );
    adapters.insert(
        BackendDialect::OpenAiCompatible,
        Arc::new(openai_compatible::OpenAiCompatibleAdapter::default()),
    );
    adapters
}
