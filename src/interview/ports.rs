use async_trait::async_trait;

use crate::ai_gateway::{error::GatewayError, types::ChatMessage};

/// The external chat-completion service, reduced to the one call the
/// interview needs. Implementations perform exactly one request per call.
#[async_trait]
pub trait CompletionOracle: Send + Sync {
    async fn complete(
        &self,
        messages: &[ChatMessage],
        model: &str,
    ) -> Result<String, GatewayError>;
}
