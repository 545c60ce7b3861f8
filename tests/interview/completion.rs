use formfill::ai_gateway::{
    error::GatewayErrorKind,
    types::{ChatMessage, ChatRole},
};

use crate::support::{StubOracle, form, gateway, transcript, transient_error};

#[tokio::test]
async fn given_no_answers_when_completing_then_transcript_is_sent_unchanged() {
    let oracle = StubOracle::replying(&["  Hello there!  "]);
    let form = form(r#"{"Full Name": {"Type": "text"}}"#);
    let mut transcript = transcript();
    transcript.push_user("hello");

    let reply = gateway(&oracle)
        .chat_completion(&mut transcript, &form)
        .await
        .expect("completion should succeed");

    assert_eq!(reply, "Hello there!");
    assert_eq!(oracle.last_call(), transcript.messages().to_vec());
}

#[tokio::test]
async fn given_answers_when_completing_then_summary_sits_at_index_one_for_that_call_only() {
    let oracle = StubOracle::replying(&["Which city?"]);
    let form = form(
        r#"{"Full Name": {"Type": "text", "Value": "John Smith"}, "City": {"Type": "text"}}"#,
    );
    let mut transcript = transcript();
    transcript.push_user("John Smith");
    let before = transcript.clone();

    gateway(&oracle)
        .chat_completion(&mut transcript, &form)
        .await
        .expect("completion should succeed");

    let sent = oracle.last_call();
    assert_eq!(sent.len(), before.len() + 1);
    assert_eq!(sent[1].role, ChatRole::System);
    assert_eq!(
        sent[1].content,
        "Here are the answers provided so far:\nFull Name: John Smith"
    );
    assert_eq!(transcript, before);
}

#[tokio::test]
async fn given_oracle_failure_when_completing_then_scoped_messages_are_still_removed() {
    let oracle = StubOracle::scripted(vec![Err(transient_error())]);
    let form = form(
        r#"{"Full Name": {"Type": "text", "Value": "John Smith"}, "Age": {"Type": "int"}}"#,
    );
    let mut transcript = transcript();
    transcript.push_user("I'm 40");
    let before = transcript.clone();

    let err = gateway(&oracle)
        .complete_with(&mut transcript, &form, ChatMessage::user("extract the age"))
        .await
        .expect_err("oracle failure should propagate");

    assert_eq!(err.kind, GatewayErrorKind::BackendTransient);
    let sent = oracle.last_call();
    assert_eq!(sent.len(), before.len() + 2);
    assert_eq!(sent.last().map(|message| message.content.as_str()), Some("extract the age"));
    assert_eq!(transcript, before);
}

#[tokio::test]
async fn given_blank_oracle_reply_when_completing_then_malformed_response_is_returned() {
    let oracle = StubOracle::replying(&["   \n"]);
    let form = form(r#"{"Full Name": {"Type": "text"}}"#);
    let mut transcript = transcript();
    transcript.push_user("hello");
    let before = transcript.clone();

    let err = gateway(&oracle)
        .chat_completion(&mut transcript, &form)
        .await
        .expect_err("blank reply must not be accepted");

    assert_eq!(err.kind, GatewayErrorKind::MalformedResponse);
    assert!(!err.is_fatal());
    assert_eq!(transcript, before);
}
