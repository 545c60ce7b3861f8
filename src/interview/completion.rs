use std::sync::Arc;

use crate::{
    ai_gateway::{
        error::{GatewayError, malformed_response},
        types::ChatMessage,
    },
    interview::{
        form::Form, ports::CompletionOracle, prompts::answered_summary, transcript::Transcript,
    },
};

/// Transcript-aware front of the oracle.
///
/// Every call sends the whole transcript. While any answer is filled in, a
/// summary system message sits at index 1 for the duration of that one call.
#[derive(Clone)]
pub struct CompletionGateway {
    oracle: Arc<dyn CompletionOracle>,
    model: String,
}

impl CompletionGateway {
    pub fn new(oracle: Arc<dyn CompletionOracle>, model: impl Into<String>) -> Self {
        Self {
            oracle,
            model: model.into(),
        }
    }

    /// An empty reply is reported as malformed so it never reaches the
    /// transcript.
    pub async fn chat_completion(
        &self,
        transcript: &mut Transcript,
        answers: &Form,
    ) -> Result<String, GatewayError> {
        let reply = match answered_summary(answers) {
            Some(summary) => {
                let scoped = transcript.scoped_insert(1, ChatMessage::system(summary));
                self.oracle.complete(scoped.messages(), &self.model).await
            }
            None => self.oracle.complete(transcript.messages(), &self.model).await,
        }?;
        let reply = reply.trim();
        if reply.is_empty() {
            return Err(malformed_response("oracle returned an empty reply"));
        }
        Ok(reply.to_string())
    }

    /// One call with `instruction` appended; the instruction never outlives it.
    pub async fn complete_with(
        &self,
        transcript: &mut Transcript,
        answers: &Form,
        instruction: ChatMessage,
    ) -> Result<String, GatewayError> {
        let mut scoped = transcript.scoped_push(instruction);
        self.chat_completion(&mut scoped, answers).await
    }
}
