use reqwest::{Client, header};
use serde_json::{Value, json};

use crate::ai_gateway::{
    error::{GatewayError, GatewayErrorKind, invalid_request},
    types::{AdapterContext, CanonicalRequest, ChatMessage},
};

pub fn messages_to_wire(messages: &[ChatMessage]) -> Vec<Value> {
    messages
        .iter()
        .map(|message| {
            json!({
                "role": message.role.as_wire(),
                "content": message.content,
            })
        })
        .collect()
}

pub fn chat_completions_url(ctx: &AdapterContext) -> Result<String, GatewayError> {
    let endpoint = ctx.profile.endpoint.trim();
    if endpoint.is_empty() {
        return Err(
            invalid_request("backend endpoint must not be empty").with_backend_id(&ctx.backend_id)
        );
    }
    Ok(format!("{}/chat/completions", endpoint.trim_end_matches('/')))
}

/// POSTs `{model, messages}` and decodes the JSON body. No retries.
pub async fn post_chat_completion(
    client: &Client,
    ctx: &AdapterContext,
    req: &CanonicalRequest,
) -> Result<Value, GatewayError> {
    let url = chat_completions_url(ctx)?;
    let body = json!({
        "model": ctx.model,
        "messages": messages_to_wire(&req.messages),
    });

    let mut req_builder = client
        .post(url)
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::AUTHORIZATION, ctx.credential.auth_header.as_str())
        .header("x-request-id", ctx.request_id.as_str())
        .json(&body);
    if let Some(timeout) = ctx.timeout {
        req_builder = req_builder.timeout(timeout);
    }

    let response = req_builder.send().await.map_err(|err| {
        let kind = if err.is_timeout() {
            GatewayErrorKind::Timeout
        } else {
            GatewayErrorKind::BackendTransient
        };
        GatewayError::new(kind, format!("chat completion request failed: {}", err))
            .with_backend_id(&ctx.backend_id)
    })?;

    if !response.status().is_success() {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        return Err(map_http_error(status, &ctx.backend_id, &body));
    }

    response.json::<Value>().await.map_err(|err| {
        GatewayError::new(
            GatewayErrorKind::MalformedResponse,
            format!("chat completion body decode failed: {}", err),
        )
        .with_backend_id(&ctx.backend_id)
    })
}

pub fn map_http_error(status: u16, backend_id: &str, body: &str) -> GatewayError {
    let normalized_body = body.chars().take(240).collect::<String>();

    let mut err = if status == 401 {
        GatewayError::new(GatewayErrorKind::Authentication, "authentication failed")
    } else if status == 403 {
        GatewayError::new(GatewayErrorKind::Authorization, "authorization failed")
    } else if status == 408 || status == 429 {
        GatewayError::new(
            GatewayErrorKind::RateLimited,
            format!("backend returned status {}", status),
        )
    } else if (400..500).contains(&status) {
        GatewayError::new(
            GatewayErrorKind::InvalidRequest,
            format!("backend returned status {}", status),
        )
    } else {
        GatewayError::new(
            GatewayErrorKind::BackendTransient,
            format!("backend returned status {}", status),
        )
    };

    err = err
        .with_backend_id(backend_id.to_string())
        .with_provider_http_status(status);

    if !normalized_body.is_empty() {
        err.message = format!("{}: {}", err.message, normalized_body);
    }

    err
}
