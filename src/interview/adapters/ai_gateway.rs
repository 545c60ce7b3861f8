use std::sync::Arc;

use async_trait::async_trait;

use crate::{
    ai_gateway::{
        error::GatewayError,
        gateway::AIGateway,
        types::{ChatMessage, CompletionRequest},
    },
    interview::ports::CompletionOracle,
};

#[derive(Clone)]
pub struct AIGatewayOracle {
    gateway: Arc<AIGateway>,
    backend_id: Option<String>,
}

impl AIGatewayOracle {
    pub fn new(gateway: Arc<AIGateway>, backend_id: Option<String>) -> Self {
        Self {
            gateway,
            backend_id,
        }
    }
}

#[async_trait]
impl CompletionOracle for AIGatewayOracle {
    async fn complete(
        &self,
        messages: &[ChatMessage],
        model: &str,
    ) -> Result<String, GatewayError> {
        let request = CompletionRequest {
            request_id: None,
            backend_id: self.backend_id.clone(),
            model: Some(model.to_string()),
            messages: messages.to_vec(),
        };
        let raw = self.gateway.chat_completion(request).await?;
        self.gateway.parse_response(&raw)
    }
}
