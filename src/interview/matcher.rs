use crate::{
    ai_gateway::{error::GatewayError, types::ChatMessage},
    interview::{
        completion::CompletionGateway,
        form::{Form, NO_MATCH_SENTINEL},
        prompts::build_match_prompt,
        transcript::Transcript,
    },
};

const MIN_INFORMATIVE_CHARS: usize = 3;

const GREETINGS: &[&str] = &[
    "hi",
    "hey",
    "hello",
    "hiya",
    "howdy",
    "start",
    "begin",
    "let's start",
    "lets start",
    "let's begin",
    "lets begin",
    "let's go",
    "good morning",
    "good afternoon",
    "good evening",
];

/// True for input that cannot answer any field, such as greetings.
pub fn is_non_informative(utterance: &str) -> bool {
    let normalized = utterance
        .trim()
        .trim_end_matches(['!', '.', '?', ','])
        .trim()
        .to_lowercase()
        .replace('\u{2019}', "'");
    normalized.chars().count() < MIN_INFORMATIVE_CHARS || GREETINGS.contains(&normalized.as_str())
}

/// Asks the oracle which unanswered field `utterance` answers.
///
/// The match instruction is scoped to the single call, so the transcript
/// leaves this function exactly as it entered.
pub async fn match_field(
    gateway: &CompletionGateway,
    transcript: &mut Transcript,
    utterance: &str,
    unanswered: &[String],
    answers: &Form,
) -> Result<Option<String>, GatewayError> {
    if unanswered.is_empty() || is_non_informative(utterance) {
        tracing::debug!(target: "interview", utterance = %utterance, "match_short_circuit");
        return Ok(None);
    }

    let prompt = build_match_prompt(unanswered, utterance);
    let reply = gateway
        .complete_with(transcript, answers, ChatMessage::user(prompt))
        .await?;

    let matched = resolve_match(&reply, unanswered);
    tracing::debug!(
        target: "interview",
        reply = %reply,
        matched = ?matched,
        "match_resolved"
    );
    Ok(matched)
}

fn resolve_match(reply: &str, unanswered: &[String]) -> Option<String> {
    let candidate = reply
        .trim()
        .trim_matches(|c: char| matches!(c, '"' | '\'' | '`'))
        .trim();
    if candidate.eq_ignore_ascii_case(NO_MATCH_SENTINEL) {
        return None;
    }
    let lowered = candidate.to_lowercase();
    unanswered
        .iter()
        .find(|field| field.to_lowercase() == lowered)
        .cloned()
}
