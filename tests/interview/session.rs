use std::{fs, path::PathBuf, sync::Arc};

use formfill::{
    ai_gateway::error::{GatewayError, GatewayErrorKind},
    interview::{
        CompletionPolicy, InterviewError, InterviewState, SavedAnswer, Session, SessionOptions,
    },
};

use crate::support::{StubOracle, form, gateway, temp_paths, transient_error};

fn session(oracle: &Arc<StubOracle>, json: &str, options: SessionOptions) -> (PathBuf, Session) {
    let (dir, paths) = temp_paths();
    (dir, Session::new(form(json), gateway(oracle), paths, options))
}

#[tokio::test]
async fn given_single_text_field_when_user_answers_then_session_completes_and_persists() {
    let oracle = StubOracle::replying(&["Full Name"]);
    let (dir, mut session) = session(
        &oracle,
        r#"{"Full Name": {"Value": "", "Type": "text", "Required": true, "Options": [], "Description": ""}}"#,
        SessionOptions::default(),
    );

    let opening = session.start();
    assert_eq!(opening, "Let's begin. Could you tell me your full name?");
    assert_eq!(session.transcript().len(), 2);

    let outcome = session
        .handle_turn("John Smith")
        .await
        .expect("turn should succeed");

    assert_eq!(outcome.state, InterviewState::Complete);
    assert_eq!(
        outcome.saved,
        Some(SavedAnswer {
            field: "Full Name".to_string(),
            value: "John Smith".to_string(),
        })
    );
    assert_eq!(oracle.call_count(), 1, "text is accepted without an extraction call");
    assert_eq!(session.transcript().len(), 4);

    let answers: serde_json::Value = serde_json::from_str(
        &fs::read_to_string(&session.paths().answers).expect("answers file should exist"),
    )
    .expect("answers should be JSON");
    assert_eq!(answers["Full Name"]["Value"], "John Smith");
    assert_eq!(answers["Full Name"]["Type"], "text");

    let chat_log: serde_json::Value = serde_json::from_str(
        &fs::read_to_string(&session.paths().chat_log).expect("chat log should exist"),
    )
    .expect("chat log should be JSON");
    assert_eq!(chat_log.as_array().map(Vec::len), Some(4));
    assert_eq!(chat_log[2]["role"], "user");
    assert_eq!(chat_log[2]["content"], "John Smith");

    let err = session
        .handle_turn("one more thing")
        .await
        .expect_err("closed session must reject turns");
    assert!(matches!(err, InterviewError::SessionClosed));

    let _ = fs::remove_dir_all(dir);
}

#[tokio::test]
async fn given_vague_int_answer_when_turn_runs_then_retry_keeps_value_empty() {
    let oracle = StubOracle::replying(&[
        "Age",
        "Invalid input",
        "Sorry, I need a whole number. How old are you?",
    ]);
    let (dir, mut session) = session(
        &oracle,
        r#"{"Full Name": {"Type": "text", "Value": "John Smith"}, "Age": {"Type": "int"}}"#,
        SessionOptions::default(),
    );
    session.start();
    let before = session.transcript().len();

    let outcome = session
        .handle_turn("about ten-ish")
        .await
        .expect("turn should succeed");

    assert_eq!(outcome.state, InterviewState::AwaitingInput);
    assert_eq!(outcome.reply, "Sorry, I need a whole number. How old are you?");
    assert_eq!(outcome.saved, None);
    assert!(!session.form().get("Age").expect("field").is_answered());
    assert_eq!(session.transcript().len(), before + 2);

    let retry_call = oracle.last_call();
    let instruction = retry_call.last().expect("retry instruction");
    assert!(instruction.content.contains("'Age'"));
    assert!(instruction.content.contains("\"about ten-ish\""));
    assert_eq!(
        retry_call[1].content,
        "Here are the answers provided so far:\nFull Name: John Smith"
    );
    assert!(!session.paths().answers.exists(), "nothing is persisted mid-interview");

    let _ = fs::remove_dir_all(dir);
}

#[tokio::test]
async fn given_greeting_on_fresh_form_when_turn_runs_then_first_field_is_asked_directly() {
    let oracle = StubOracle::replying(&[]);
    let (dir, mut session) = session(
        &oracle,
        r#"{"Full Name": {"Type": "text"}, "Age": {"Type": "int"}}"#,
        SessionOptions::default(),
    );
    session.start();

    let outcome = session.handle_turn("hi").await.expect("turn should succeed");

    assert_eq!(outcome.state, InterviewState::AwaitingInput);
    assert!(outcome.reply.contains("full name"));
    assert_eq!(oracle.call_count(), 0);
    assert_eq!(session.transcript().len(), 4);

    let _ = fs::remove_dir_all(dir);
}

#[tokio::test]
async fn given_exit_phrase_when_turn_runs_then_session_terminates_before_matching() {
    let oracle = StubOracle::replying(&[]);
    let (dir, mut session) = session(
        &oracle,
        r#"{"Full Name": {"Type": "text"}, "Age": {"Type": "int"}}"#,
        SessionOptions::default(),
    );
    session.start();

    let outcome = session
        .handle_turn("ok that's all for now")
        .await
        .expect("turn should succeed");

    assert_eq!(outcome.state, InterviewState::Terminated);
    assert_eq!(outcome.reply, "Interview ended. Thank you for your responses!");
    assert_eq!(oracle.call_count(), 0);
    assert!(session.paths().answers.exists());
    assert!(session.paths().chat_log.exists());
    assert!(matches!(session.end(), Err(InterviewError::SessionClosed)));

    let _ = fs::remove_dir_all(dir);
}

#[tokio::test]
async fn given_saved_answer_with_fields_left_when_turn_runs_then_follow_up_asks_next_field() {
    let oracle = StubOracle::replying(&["Full Name", "Great! Which city do you live in?"]);
    let (dir, mut session) = session(
        &oracle,
        r#"{"Full Name": {"Type": "text"}, "City": {"Type": "location", "Description": "home city"}}"#,
        SessionOptions::default(),
    );
    session.start();

    let outcome = session
        .handle_turn("John Smith")
        .await
        .expect("turn should succeed");

    assert_eq!(outcome.state, InterviewState::AwaitingInput);
    assert_eq!(outcome.reply, "Great! Which city do you live in?");
    assert_eq!(outcome.saved.map(|saved| saved.field), Some("Full Name".to_string()));
    assert_eq!(oracle.call_count(), 2);

    let follow_up = oracle.last_call();
    assert!(follow_up[1].content.contains("Full Name: John Smith"));
    assert!(
        follow_up
            .last()
            .expect("follow-up instruction")
            .content
            .contains("'City'")
    );
    assert_eq!(session.transcript().len(), 4);

    let _ = fs::remove_dir_all(dir);
}

#[tokio::test]
async fn given_required_fields_policy_when_required_answered_then_session_completes() {
    let oracle = StubOracle::replying(&["Full Name"]);
    let (dir, mut session) = session(
        &oracle,
        r#"{"Full Name": {"Type": "text", "Required": true}, "Nickname": {"Type": "text"}}"#,
        SessionOptions {
            completion_policy: CompletionPolicy::RequiredFields,
            ..SessionOptions::default()
        },
    );
    session.start();

    let outcome = session
        .handle_turn("Ada Lovelace")
        .await
        .expect("turn should succeed");

    assert_eq!(outcome.state, InterviewState::Complete);
    assert_eq!(outcome.reply, "All questions are answered and saved. Thank you!");
    assert!(!session.form().get("Nickname").expect("field").is_answered());

    let _ = fs::remove_dir_all(dir);
}

#[tokio::test]
async fn given_repeated_failures_when_retry_cap_is_hit_then_another_field_is_asked() {
    let oracle = StubOracle::replying(&[
        "Age",
        "Invalid input",
        "How old are you, in years?",
        "Age",
        "Invalid input",
        "Let's move on. Which city do you live in?",
    ]);
    let (dir, mut session) = session(
        &oracle,
        r#"{"Age": {"Type": "int"}, "City": {"Type": "text"}}"#,
        SessionOptions {
            max_retries_per_field: 2,
            ..SessionOptions::default()
        },
    );
    session.start();

    let first = session.handle_turn("lots").await.expect("turn should succeed");
    assert!(oracle.last_call().last().expect("retry").content.contains("'Age'"));
    assert_eq!(first.reply, "How old are you, in years?");

    let second = session.handle_turn("many").await.expect("turn should succeed");
    assert_eq!(second.state, InterviewState::AwaitingInput);
    assert_eq!(second.reply, "Let's move on. Which city do you live in?");
    let follow_up = oracle.last_call();
    let instruction = follow_up.last().expect("follow-up instruction");
    assert!(instruction.content.contains("'City'"));
    assert!(!instruction.content.contains("'Age'"));
    assert_eq!(oracle.call_count(), 6);
    assert_eq!(session.transcript().len(), 6);

    let _ = fs::remove_dir_all(dir);
}

#[tokio::test]
async fn given_no_match_with_answers_when_turn_runs_then_generic_reply_is_used() {
    let oracle = StubOracle::replying(&["None", "Could you tell me your age?"]);
    let (dir, mut session) = session(
        &oracle,
        r#"{"Full Name": {"Type": "text", "Value": "John Smith"}, "Age": {"Type": "int"}}"#,
        SessionOptions::default(),
    );
    session.start();

    let outcome = session
        .handle_turn("what is this form for?")
        .await
        .expect("turn should succeed");

    assert_eq!(outcome.reply, "Could you tell me your age?");
    assert_eq!(outcome.state, InterviewState::AwaitingInput);
    let generic = oracle.last_call();
    assert_eq!(
        generic.last().map(|message| message.content.as_str()),
        Some("what is this form for?")
    );

    let _ = fs::remove_dir_all(dir);
}

#[tokio::test]
async fn given_transient_oracle_failure_when_turn_runs_then_apology_is_recorded() {
    let oracle = StubOracle::scripted(vec![Err(transient_error())]);
    let (dir, mut session) = session(
        &oracle,
        r#"{"Full Name": {"Type": "text"}, "Age": {"Type": "int"}}"#,
        SessionOptions::default(),
    );
    session.start();

    let outcome = session
        .handle_turn("John Smith")
        .await
        .expect("transient failure is recovered");

    assert_eq!(outcome.state, InterviewState::AwaitingInput);
    assert_eq!(outcome.recovered_error, Some(GatewayErrorKind::BackendTransient));
    assert_eq!(outcome.saved, None);
    assert_eq!(session.transcript().len(), 4);
    assert_eq!(
        session.transcript().last().map(|message| message.content.clone()),
        Some(outcome.reply)
    );
    assert!(session.form().all_unanswered());

    let _ = fs::remove_dir_all(dir);
}

#[tokio::test]
async fn given_missing_credential_when_turn_runs_then_error_propagates() {
    let oracle = StubOracle::scripted(vec![Err(GatewayError::new(
        GatewayErrorKind::MissingCredential,
        "missing credential (environment variable LLAMA_API_KEY) for backend llama",
    ))]);
    let (dir, mut session) = session(
        &oracle,
        r#"{"Full Name": {"Type": "text"}, "Age": {"Type": "int"}}"#,
        SessionOptions::default(),
    );
    session.start();

    let err = session
        .handle_turn("John Smith")
        .await
        .expect_err("missing credential is fatal");

    assert!(matches!(
        err,
        InterviewError::Gateway(GatewayError {
            kind: GatewayErrorKind::MissingCredential,
            ..
        })
    ));
    assert_eq!(session.state(), InterviewState::AwaitingInput);

    let outcome = session.end().expect("operator can still end the session");
    assert_eq!(outcome.state, InterviewState::Terminated);
    assert!(session.paths().answers.exists());

    let _ = fs::remove_dir_all(dir);
}

#[tokio::test]
async fn given_blank_follow_up_reply_when_turn_runs_then_apology_keeps_transcript_usable() {
    let oracle = StubOracle::replying(&["Full Name", "", "Age", "40", "Thanks! Anything else?"]);
    let (dir, mut session) = session(
        &oracle,
        r#"{"Full Name": {"Type": "text"}, "Age": {"Type": "int"}, "City": {"Type": "text"}}"#,
        SessionOptions::default(),
    );
    session.start();

    let first = session
        .handle_turn("John Smith")
        .await
        .expect("blank reply is recovered");
    assert_eq!(first.recovered_error, Some(GatewayErrorKind::MalformedResponse));
    assert!(
        session
            .transcript()
            .messages()
            .iter()
            .all(|message| !message.content.trim().is_empty())
    );

    let second = session.handle_turn("I'm 40").await.expect("later turn should succeed");
    assert_eq!(second.reply, "Thanks! Anything else?");
    assert_eq!(
        second.saved,
        Some(SavedAnswer {
            field: "Age".to_string(),
            value: "40".to_string(),
        })
    );
    assert_eq!(oracle.call_count(), 5);

    let _ = fs::remove_dir_all(dir);
}

#[tokio::test]
async fn given_blank_utterance_when_turn_runs_then_transcript_is_untouched() {
    let oracle = StubOracle::replying(&["Full Name", "Which city do you live in?"]);
    let (dir, mut session) = session(
        &oracle,
        r#"{"Full Name": {"Type": "text"}, "City": {"Type": "text"}}"#,
        SessionOptions::default(),
    );
    session.start();
    let before = session.transcript().clone();

    let blank = session.handle_turn("   ").await.expect("blank turn should succeed");

    assert_eq!(blank.state, InterviewState::AwaitingInput);
    assert!(blank.reply.contains("full name"));
    assert_eq!(blank.saved, None);
    assert_eq!(oracle.call_count(), 0);
    assert_eq!(session.transcript(), &before);

    let next = session
        .handle_turn("John Smith")
        .await
        .expect("next turn should succeed");
    assert_eq!(next.reply, "Which city do you live in?");
    assert_eq!(session.transcript().len(), before.len() + 2);

    let _ = fs::remove_dir_all(dir);
}

#[tokio::test]
async fn given_follow_up_failure_after_save_when_turn_runs_then_saved_answer_is_reported() {
    let oracle = StubOracle::scripted(vec![Ok("Full Name".to_string()), Err(transient_error())]);
    let (dir, mut session) = session(
        &oracle,
        r#"{"Full Name": {"Type": "text"}, "Age": {"Type": "int"}}"#,
        SessionOptions::default(),
    );
    session.start();

    let outcome = session
        .handle_turn("John Smith")
        .await
        .expect("transient failure is recovered");

    assert_eq!(outcome.state, InterviewState::AwaitingInput);
    assert_eq!(outcome.recovered_error, Some(GatewayErrorKind::BackendTransient));
    assert_eq!(
        outcome.saved,
        Some(SavedAnswer {
            field: "Full Name".to_string(),
            value: "John Smith".to_string(),
        })
    );
    assert_eq!(
        session.form().get("Full Name").map(|info| info.value.as_str()),
        Some("John Smith")
    );
    assert_eq!(session.transcript().len(), 4);

    let _ = fs::remove_dir_all(dir);
}

#[tokio::test]
async fn given_unwritable_output_when_session_ends_then_closing_reply_is_not_duplicated() {
    let oracle = StubOracle::replying(&[]);
    let (dir, mut session) = session(
        &oracle,
        r#"{"Full Name": {"Type": "text"}, "Age": {"Type": "int"}}"#,
        SessionOptions::default(),
    );
    session.start();
    // A directory where the answers file should go makes the rename fail.
    fs::create_dir_all(&session.paths().answers).expect("blocking dir should be created");
    let before = session.transcript().clone();

    let err = session.end().expect_err("persistence must fail");
    assert!(matches!(err, InterviewError::Persistence { .. }));
    assert_eq!(session.transcript(), &before);
    assert!(!session.is_finished());

    fs::remove_dir_all(&session.paths().answers).expect("blocking dir should be removed");
    let outcome = session.end().expect("second attempt should persist");
    assert_eq!(outcome.state, InterviewState::Terminated);
    assert_eq!(session.transcript().len(), before.len() + 1);
    let closing = session
        .transcript()
        .messages()
        .iter()
        .filter(|message| message.content == outcome.reply)
        .count();
    assert_eq!(closing, 1);

    let _ = fs::remove_dir_all(dir);
}
