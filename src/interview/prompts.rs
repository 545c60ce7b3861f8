use crate::interview::{
    form::{FieldInfo, Form, NO_MATCH_SENTINEL},
    validation::FieldType,
};

pub const INVALID_INPUT_SENTINEL: &str = "Invalid input";

pub fn build_system_prompt(form: &Form) -> String {
    format!(
        concat!(
            "You are a helpful assistant conducting a conversation.\n",
            "Your goal is to ask the user about these topics: {}.\n",
            "Ask naturally, one at a time. ",
            "When the user responds, try to determine which field it answers.\n",
            "If a field is skipped, re-ask or rephrase it later.\n",
            "At the end, summarize which questions were not answered."
        ),
        form.names().join(", ")
    )
}

/// Summary of filled fields, or `None` while nothing has been answered.
pub fn answered_summary(form: &Form) -> Option<String> {
    let lines = form
        .answered()
        .map(|(name, value)| format!("{name}: {value}"))
        .collect::<Vec<_>>();
    if lines.is_empty() {
        return None;
    }
    Some(format!(
        "Here are the answers provided so far:\n{}",
        lines.join("\n")
    ))
}

pub fn build_match_prompt(unanswered: &[String], utterance: &str) -> String {
    format!(
        concat!(
            "Based on the following unanswered fields: {}\n",
            "Which one does this answer refer to?\n\n",
            "User answer: \"{}\"\n",
            "Respond ONLY with the field name, exactly as written, or {} if you are unsure."
        ),
        unanswered.join(", "),
        utterance,
        NO_MATCH_SENTINEL
    )
}

pub fn build_extraction_prompt(field_name: &str, field: &FieldInfo, utterance: &str) -> String {
    format!(
        concat!(
            "The user was asked the question related to the field: '{}'.\n",
            "Field description: {}\n",
            "Expected type: {}.\n",
            "Available options: {}.\n",
            "User response: \"{}\"\n",
            "Extract only the valid and concise value for this field.\n",
            "Respond with ONLY the extracted value. Do not include explanations, greetings, ",
            "follow-up questions, currency symbols, or units.\n",
            "Numbers must be plain digits. Yes/no answers must be exactly yes or no.\n",
            "{}",
            "If the input is unclear or invalid, respond with exactly: {}"
        ),
        field_name,
        description_or_none(field),
        field.field_type(),
        field.options_label(),
        utterance,
        format_hint(&field.field_type()),
        INVALID_INPUT_SENTINEL
    )
}

pub fn build_retry_prompt(field_name: &str, field: &FieldInfo, utterance: &str) -> String {
    format!(
        concat!(
            "The user was asked to provide their '{}'.\n",
            "Expected type: {}.\n",
            "Options (if applicable): {}.\n",
            "Their input was: \"{}\"\n",
            "This input is invalid. ",
            "Please politely explain why and ask the question again naturally."
        ),
        field_name,
        field.type_name,
        field.options_label(),
        utterance
    )
}

pub fn build_follow_up_prompt(field_name: &str, field: &FieldInfo) -> String {
    format!(
        concat!(
            "Continue the interview. Ask the user, in one short and natural question, ",
            "for their '{}'.\n",
            "Field description: {}\n",
            "Expected type: {}.\n",
            "Options (if applicable): {}.\n",
            "Do not repeat questions that were already answered."
        ),
        field_name,
        description_or_none(field),
        field.type_name,
        field.options_label()
    )
}

pub fn opening_prompt(field_name: &str) -> String {
    format!(
        "Let's begin. Could you tell me your {}?",
        field_name.to_lowercase()
    )
}

pub fn forced_field_prompt(field_name: &str) -> String {
    format!(
        concat!(
            "Happy to help you fill out this form! ",
            "To get started, could you tell me your {}?"
        ),
        field_name.to_lowercase()
    )
}

pub fn blank_utterance_prompt(field_name: &str) -> String {
    format!(
        "I didn't catch anything there. Could you tell me your {}?",
        field_name.to_lowercase()
    )
}

pub fn closing_acknowledgment() -> String {
    "Interview ended. Thank you for your responses!".to_string()
}

pub fn completion_message() -> String {
    "All questions are answered and saved. Thank you!".to_string()
}

pub fn apology_message() -> String {
    concat!(
        "Sorry, I had trouble processing that just now. ",
        "Could you please say that again?"
    )
    .to_string()
}

fn format_hint(field_type: &FieldType) -> &'static str {
    match field_type {
        FieldType::Datetime => {
            "Dates and times must be ISO 8601: YYYY-MM-DD, YYYY-MM-DD HH:MM, or HH:MM.\n"
        }
        _ => "",
    }
}

fn description_or_none(field: &FieldInfo) -> &str {
    if field.description.trim().is_empty() {
        "N/A"
    } else {
        field.description.trim()
    }
}
