use crate::{
    ai_gateway::{error::GatewayError, types::ChatMessage},
    interview::{
        completion::CompletionGateway,
        form::{FieldInfo, Form},
        prompts::{INVALID_INPUT_SENTINEL, build_extraction_prompt},
        transcript::Transcript,
        validation::accept_answer,
    },
};

/// Produces a canonical value for `field_name` from `utterance`, or `None`.
///
/// Clearly formatted answers are accepted locally without an oracle call.
/// Otherwise the oracle is asked to pull the value out, and its reply is
/// cleaned and validated exactly like user input.
pub async fn extract_answer(
    gateway: &CompletionGateway,
    transcript: &mut Transcript,
    field_name: &str,
    field: &FieldInfo,
    utterance: &str,
    answers: &Form,
) -> Result<Option<String>, GatewayError> {
    let field_type = field.field_type();
    if let Some(value) = accept_answer(utterance, &field_type, &field.options) {
        tracing::debug!(target: "interview", field = %field_name, "extracted_locally");
        return Ok(Some(value));
    }

    if !field_type.is_recognized() {
        tracing::warn!(
            target: "interview",
            field = %field_name,
            field_type = %field_type,
            "extraction_skipped_unrecognized_type"
        );
        return Ok(None);
    }

    let prompt = build_extraction_prompt(field_name, field, utterance);
    let reply = gateway
        .complete_with(transcript, answers, ChatMessage::user(prompt))
        .await?;

    let candidate = reply.trim_matches(|c: char| matches!(c, '"' | '\'' | '`')).trim();
    if candidate.eq_ignore_ascii_case(INVALID_INPUT_SENTINEL) {
        tracing::debug!(target: "interview", field = %field_name, "oracle_rejected_input");
        return Ok(None);
    }

    let accepted = accept_answer(candidate, &field_type, &field.options);
    tracing::debug!(
        target: "interview",
        field = %field_name,
        oracle_reply = %reply,
        accepted = accepted.is_some(),
        "extracted_with_oracle"
    );
    Ok(accepted)
}
