use formfill::ai_gateway::{
    adapters::{http_common::map_http_error, llama_api::parse_llama_payload},
    error::GatewayErrorKind,
};
use serde_json::json;

#[test]
fn given_llama_payload_when_parsed_then_completion_text_is_returned() {
    let payload = json!({
        "id": "resp-1",
        "completion_message": {
            "role": "assistant",
            "content": { "type": "text", "text": "Full Name" },
            "stop_reason": "stop"
        }
    });

    let text = parse_llama_payload(&payload, "llama").expect("payload should parse");
    assert_eq!(text, "Full Name");
}

#[test]
fn given_payload_without_text_when_parsed_then_malformed_response_is_reported() {
    let payload = json!({ "completion_message": { "content": {} } });

    let err = parse_llama_payload(&payload, "llama").expect_err("missing text must fail");
    assert_eq!(err.kind, GatewayErrorKind::MalformedResponse);
    assert_eq!(err.backend_id.as_deref(), Some("llama"));
    assert!(!err.is_fatal());
}

#[test]
fn given_http_statuses_when_mapped_then_kinds_follow_status_class() {
    assert_eq!(
        map_http_error(401, "llama", "").kind,
        GatewayErrorKind::Authentication
    );
    assert_eq!(
        map_http_error(429, "llama", "slow down").kind,
        GatewayErrorKind::RateLimited
    );
    assert_eq!(
        map_http_error(400, "llama", "").kind,
        GatewayErrorKind::InvalidRequest
    );

    let err = map_http_error(503, "llama", "upstream unavailable");
    assert_eq!(err.kind, GatewayErrorKind::BackendTransient);
    assert_eq!(err.provider_http_status, Some(503));
    assert!(err.message.contains("upstream unavailable"));
}
