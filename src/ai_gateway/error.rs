use std::fmt;

use serde::{Deserialize, Serialize};

use crate::ai_gateway::types::BackendId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GatewayErrorKind {
    InvalidRequest,
    MissingCredential,
    Authentication,
    Authorization,
    RateLimited,
    Timeout,
    BackendTransient,
    MalformedResponse,
    Internal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayError {
    pub kind: GatewayErrorKind,
    pub message: String,
    pub backend_id: Option<BackendId>,
    pub provider_http_status: Option<u16>,
}

impl GatewayError {
    pub fn new(kind: GatewayErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            backend_id: None,
            provider_http_status: None,
        }
    }

    pub fn with_backend_id(mut self, backend_id: impl Into<String>) -> Self {
        self.backend_id = Some(backend_id.into());
        self
    }

    pub fn with_provider_http_status(mut self, status: u16) -> Self {
        self.provider_http_status = Some(status);
        self
    }

    /// Errors that no amount of re-asking the user can fix.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self.kind,
            GatewayErrorKind::MissingCredential
                | GatewayErrorKind::Authentication
                | GatewayErrorKind::Authorization
                | GatewayErrorKind::Internal
        )
    }
}

impl fmt::Display for GatewayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.backend_id, self.provider_http_status) {
            (Some(backend_id), Some(status)) => {
                write!(
                    f,
                    "{} (backend={}, http_status={})",
                    self.message, backend_id, status
                )
            }
            (Some(backend_id), None) => write!(f, "{} (backend={})", self.message, backend_id),
            (None, Some(status)) => write!(f, "{} (http_status={})", self.message, status),
            (None, None) => write!(f, "{}", self.message),
        }
    }
}

impl std::error::Error for GatewayError {}

pub fn invalid_request(message: impl Into<String>) -> GatewayError {
    GatewayError::new(GatewayErrorKind::InvalidRequest, message)
}

pub fn missing_credential(message: impl Into<String>) -> GatewayError {
    GatewayError::new(GatewayErrorKind::MissingCredential, message)
}

pub fn malformed_response(message: impl Into<String>) -> GatewayError {
    GatewayError::new(GatewayErrorKind::MalformedResponse, message)
}
