use std::collections::HashMap;

use serde::Serialize;

use crate::{
    ai_gateway::{
        error::{GatewayError, GatewayErrorKind},
        types::ChatMessage,
    },
    interview::{
        catalog::SessionPaths,
        completion::CompletionGateway,
        error::{InterviewError, invalid_form},
        extractor::extract_answer,
        form::{CompletionPolicy, Form},
        matcher::match_field,
        persistence::write_json_atomic,
        prompts::{
            apology_message, blank_utterance_prompt, build_follow_up_prompt, build_retry_prompt,
            build_system_prompt, closing_acknowledgment, completion_message, forced_field_prompt,
            opening_prompt,
        },
        transcript::Transcript,
    },
};

const EXIT_PHRASES: &[&str] = &[
    "i'm done",
    "done answering",
    "no more questions",
    "bye",
    "that's all",
];

pub const DEFAULT_MAX_RETRIES_PER_FIELD: u32 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InterviewState {
    AwaitingInput,
    Matching,
    Extracting,
    Retrying,
    Advancing,
    Complete,
    Terminated,
}

impl InterviewState {
    pub fn is_terminal(self) -> bool {
        matches!(self, InterviewState::Complete | InterviewState::Terminated)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionOptions {
    pub completion_policy: CompletionPolicy,
    /// Consecutive failed extractions before moving on; 0 never moves on.
    pub max_retries_per_field: u32,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            completion_policy: CompletionPolicy::default(),
            max_retries_per_field: DEFAULT_MAX_RETRIES_PER_FIELD,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedAnswer {
    pub field: String,
    pub value: String,
}

/// What one turn produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnOutcome {
    pub reply: String,
    pub state: InterviewState,
    pub saved: Option<SavedAnswer>,
    /// Set when an oracle failure was turned into an apology.
    pub recovered_error: Option<GatewayErrorKind>,
}

/// One interview over one form.
///
/// Every turn leaves exactly two new messages in the transcript: the user's
/// utterance and one assistant reply. A blank utterance leaves none. Answers
/// and the transcript are written to disk when the session reaches
/// `Complete` or `Terminated`.
pub struct Session {
    form: Form,
    transcript: Transcript,
    gateway: CompletionGateway,
    paths: SessionPaths,
    options: SessionOptions,
    state: InterviewState,
    failed_attempts: HashMap<String, u32>,
}

impl Session {
    pub fn new(
        form: Form,
        gateway: CompletionGateway,
        paths: SessionPaths,
        options: SessionOptions,
    ) -> Self {
        let transcript = Transcript::new(build_system_prompt(&form));
        Self {
            form,
            transcript,
            gateway,
            paths,
            options,
            state: InterviewState::AwaitingInput,
            failed_attempts: HashMap::new(),
        }
    }

    pub fn state(&self) -> InterviewState {
        self.state
    }

    pub fn form(&self) -> &Form {
        &self.form
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn paths(&self) -> &SessionPaths {
        &self.paths
    }

    pub fn is_finished(&self) -> bool {
        self.state.is_terminal()
    }

    /// Opens the conversation by asking for the first field still to fill.
    pub fn start(&mut self) -> String {
        let field = self
            .next_field(None)
            .unwrap_or_else(|| self.form.first_field().to_string());
        let reply = opening_prompt(&field);
        self.transcript.push_assistant(reply.clone());
        tracing::info!(
            target: "interview",
            fields = self.form.len(),
            first_field = %field,
            "session_started"
        );
        reply
    }

    pub async fn handle_turn(&mut self, utterance: &str) -> Result<TurnOutcome, InterviewError> {
        if self.state.is_terminal() {
            return Err(InterviewError::SessionClosed);
        }

        let utterance = utterance.trim();
        if utterance.is_empty() {
            return Ok(self.reprompt());
        }
        self.transcript.push_user(utterance);

        if contains_exit_phrase(utterance) {
            tracing::info!(target: "interview", "exit_phrase_detected");
            return self.finish(InterviewState::Terminated, closing_acknowledgment(), None);
        }

        match self.run_turn(utterance).await {
            Ok(outcome) => Ok(outcome),
            Err(InterviewError::Gateway(err)) if !err.is_fatal() => Ok(self.apologize(err, None)),
            Err(err) => {
                self.transition(InterviewState::AwaitingInput);
                Err(err)
            }
        }
    }

    /// Ends the interview from outside and persists what was collected.
    pub fn end(&mut self) -> Result<TurnOutcome, InterviewError> {
        if self.state.is_terminal() {
            return Err(InterviewError::SessionClosed);
        }
        self.finish(InterviewState::Terminated, closing_acknowledgment(), None)
    }

    async fn run_turn(&mut self, utterance: &str) -> Result<TurnOutcome, InterviewError> {
        let unanswered = self.form.unanswered();
        self.transition(InterviewState::Matching);
        let matched = match_field(
            &self.gateway,
            &mut self.transcript,
            utterance,
            &unanswered,
            &self.form,
        )
        .await?;

        match matched {
            Some(field) => self.answer_field(field, utterance).await,
            None if self.form.all_unanswered() => {
                self.transition(InterviewState::Advancing);
                let reply = forced_field_prompt(self.form.first_field());
                Ok(self.reply(reply, None))
            }
            None => {
                self.transition(InterviewState::Advancing);
                let reply = self
                    .gateway
                    .chat_completion(&mut self.transcript, &self.form)
                    .await?;
                if self.form.is_complete(self.options.completion_policy) {
                    return self.finish(InterviewState::Complete, reply, None);
                }
                Ok(self.reply(reply, None))
            }
        }
    }

    async fn answer_field(
        &mut self,
        field: String,
        utterance: &str,
    ) -> Result<TurnOutcome, InterviewError> {
        self.transition(InterviewState::Extracting);
        let info = self
            .form
            .get(&field)
            .cloned()
            .ok_or_else(|| invalid_form(format!("matched unknown field '{field}'")))?;

        let extracted = extract_answer(
            &self.gateway,
            &mut self.transcript,
            &field,
            &info,
            utterance,
            &self.form,
        )
        .await?;

        let Some(value) = extracted else {
            return self.retry_field(field, utterance).await;
        };

        self.form.set_value(&field, &value)?;
        self.failed_attempts.remove(&field);
        tracing::info!(target: "interview", field = %field, value = %value, "answer_saved");
        let saved = SavedAnswer { field, value };

        if self.form.is_complete(self.options.completion_policy) {
            return self.finish(InterviewState::Complete, completion_message(), Some(saved));
        }

        self.transition(InterviewState::Advancing);
        match self.follow_up(None).await {
            Ok(reply) => Ok(self.reply(reply, Some(saved))),
            Err(InterviewError::Gateway(err)) if !err.is_fatal() => {
                Ok(self.apologize(err, Some(saved)))
            }
            Err(err) => Err(err),
        }
    }

    async fn retry_field(
        &mut self,
        field: String,
        utterance: &str,
    ) -> Result<TurnOutcome, InterviewError> {
        let attempts = self.failed_attempts.entry(field.clone()).or_insert(0);
        *attempts += 1;
        let attempts = *attempts;

        let cap = self.options.max_retries_per_field;
        if cap > 0 && attempts >= cap && self.next_field(Some(&field)).is_some() {
            tracing::warn!(
                target: "interview",
                field = %field,
                attempts = attempts,
                "retry_cap_reached"
            );
            self.transition(InterviewState::Advancing);
            let reply = self.follow_up(Some(&field)).await?;
            return Ok(self.reply(reply, None));
        }

        self.transition(InterviewState::Retrying);
        let info = self
            .form
            .get(&field)
            .ok_or_else(|| invalid_form(format!("matched unknown field '{field}'")))?;
        let prompt = build_retry_prompt(&field, info, utterance);
        tracing::debug!(
            target: "interview",
            field = %field,
            attempts = attempts,
            "retry_requested"
        );
        let reply = self
            .gateway
            .complete_with(&mut self.transcript, &self.form, ChatMessage::user(prompt))
            .await?;
        Ok(self.reply(reply, None))
    }

    /// Asks the oracle to phrase a question for the next open field.
    async fn follow_up(&mut self, exclude: Option<&str>) -> Result<String, InterviewError> {
        let Some(field) = self.next_field(exclude) else {
            return Ok(self
                .gateway
                .chat_completion(&mut self.transcript, &self.form)
                .await?);
        };
        let info = self
            .form
            .get(&field)
            .ok_or_else(|| invalid_form(format!("unknown follow-up field '{field}'")))?;
        let prompt = build_follow_up_prompt(&field, info);
        Ok(self
            .gateway
            .complete_with(&mut self.transcript, &self.form, ChatMessage::user(prompt))
            .await?)
    }

    /// Picks the first unanswered field in declared order.
    ///
    /// Fields the completion policy still needs come first, then fields that
    /// have not hit the retry cap.
    fn next_field(&self, exclude: Option<&str>) -> Option<String> {
        let cap = self.options.max_retries_per_field;
        let mut candidates = self
            .form
            .iter()
            .filter(|(name, info)| !info.is_answered() && Some(*name) != exclude)
            .map(|(name, info)| {
                let needed = match self.options.completion_policy {
                    CompletionPolicy::AllFields => true,
                    CompletionPolicy::RequiredFields => info.required,
                };
                let exhausted =
                    cap > 0 && self.failed_attempts.get(name).copied().unwrap_or(0) >= cap;
                (name, needed, exhausted)
            })
            .collect::<Vec<_>>();
        candidates.sort_by_key(|(_, needed, exhausted)| (!*needed, *exhausted));
        candidates.first().map(|(name, _, _)| name.to_string())
    }

    /// Answers a blank line by asking for the next open field again.
    ///
    /// Nothing is appended to the transcript and the oracle is not called.
    fn reprompt(&mut self) -> TurnOutcome {
        let field = self
            .next_field(None)
            .unwrap_or_else(|| self.form.first_field().to_string());
        tracing::debug!(target: "interview", field = %field, "blank_utterance_ignored");
        self.transition(InterviewState::AwaitingInput);
        TurnOutcome {
            reply: blank_utterance_prompt(&field),
            state: self.state,
            saved: None,
            recovered_error: None,
        }
    }

    fn apologize(&mut self, err: GatewayError, saved: Option<SavedAnswer>) -> TurnOutcome {
        tracing::warn!(
            target: "interview",
            kind = ?err.kind,
            error = %err,
            "oracle_failure_recovered"
        );
        let mut outcome = self.reply(apology_message(), saved);
        outcome.recovered_error = Some(err.kind);
        outcome
    }

    fn reply(&mut self, reply: String, saved: Option<SavedAnswer>) -> TurnOutcome {
        self.transcript.push_assistant(reply.clone());
        self.transition(InterviewState::AwaitingInput);
        TurnOutcome {
            reply,
            state: self.state,
            saved,
            recovered_error: None,
        }
    }

    fn finish(
        &mut self,
        state: InterviewState,
        reply: String,
        saved: Option<SavedAnswer>,
    ) -> Result<TurnOutcome, InterviewError> {
        // The chat log must include the closing reply, but a failed write
        // leaves the transcript as it was.
        let before = self.transcript.len();
        self.transcript.push_assistant(reply.clone());
        let persisted = write_json_atomic(&self.paths.answers, &self.form)
            .and_then(|()| write_json_atomic(&self.paths.chat_log, &self.transcript));
        if let Err(err) = persisted {
            self.transcript.truncate(before);
            return Err(err);
        }
        self.transition(state);
        tracing::info!(
            target: "interview",
            state = ?state,
            answered = self.form.answered().count(),
            fields = self.form.len(),
            answers_path = %self.paths.answers.display(),
            "session_finished"
        );
        Ok(TurnOutcome {
            reply,
            state,
            saved,
            recovered_error: None,
        })
    }

    fn transition(&mut self, next: InterviewState) {
        if self.state != next {
            tracing::debug!(
                target: "interview",
                from = ?self.state,
                to = ?next,
                "state_transition"
            );
        }
        self.state = next;
    }
}

fn contains_exit_phrase(utterance: &str) -> bool {
    let lowered = utterance.to_lowercase().replace('\u{2019}', "'");
    EXIT_PHRASES.iter().any(|phrase| lowered.contains(phrase))
}
