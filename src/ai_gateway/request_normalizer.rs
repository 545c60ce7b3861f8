use uuid::Uuid;

use crate::ai_gateway::{
    error::{GatewayError, invalid_request},
    types::{CanonicalRequest, ChatRole, CompletionRequest},
};

#[derive(Default, Clone, Copy)]
pub struct RequestNormalizer;

impl RequestNormalizer {
    pub fn normalize(&self, request: CompletionRequest) -> Result<CanonicalRequest, GatewayError> {
        let Some(first) = request.messages.first() else {
            return Err(invalid_request("messages must not be empty"));
        };
        if first.role != ChatRole::System {
            return Err(invalid_request("first message must be the system prompt"));
        }

        for (index, message) in request.messages.iter().enumerate() {
            if message.content.trim().is_empty() {
                return Err(invalid_request(format!(
                    "message {} ({}) has empty content",
                    index,
                    message.role.as_wire()
                )));
            }
        }

        if request
            .model
            .as_deref()
            .is_some_and(|model| model.trim().is_empty())
        {
            return Err(invalid_request("model override must not be blank"));
        }

        let request_id = request
            .request_id
            .unwrap_or_else(|| Uuid::now_v7().to_string());

        Ok(CanonicalRequest {
            request_id,
            backend_hint: request.backend_id,
            model_override: request.model,
            messages: request.messages,
        })
    }
}
