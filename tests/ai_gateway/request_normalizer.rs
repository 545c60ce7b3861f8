use formfill::ai_gateway::{
    error::GatewayErrorKind,
    request_normalizer::RequestNormalizer,
    types::{ChatMessage, CompletionRequest},
};

fn request(messages: Vec<ChatMessage>) -> CompletionRequest {
    CompletionRequest {
        request_id: None,
        backend_id: None,
        model: None,
        messages,
    }
}

#[test]
fn given_valid_request_when_normalized_then_request_id_is_generated() {
    let canonical = RequestNormalizer
        .normalize(request(vec![
            ChatMessage::system("You are a helpful assistant."),
            ChatMessage::user("hi"),
        ]))
        .expect("request should normalize");

    assert!(!canonical.request_id.is_empty());
    assert_eq!(canonical.messages.len(), 2);
    assert_eq!(canonical.backend_hint, None);
}

#[test]
fn given_request_without_leading_system_prompt_when_normalized_then_it_is_rejected() {
    let err = RequestNormalizer
        .normalize(request(vec![ChatMessage::user("hi")]))
        .expect_err("missing system prompt must fail");
    assert_eq!(err.kind, GatewayErrorKind::InvalidRequest);

    let err = RequestNormalizer
        .normalize(request(Vec::new()))
        .expect_err("empty messages must fail");
    assert_eq!(err.kind, GatewayErrorKind::InvalidRequest);
}

#[test]
fn given_blank_content_or_model_when_normalized_then_it_is_rejected() {
    let err = RequestNormalizer
        .normalize(request(vec![
            ChatMessage::system("system"),
            ChatMessage::user("  "),
        ]))
        .expect_err("blank content must fail");
    assert!(err.message.contains("empty content"));

    let mut blank_model = request(vec![ChatMessage::system("system")]);
    blank_model.model = Some(" ".to_string());
    assert!(RequestNormalizer.normalize(blank_model).is_err());
}
