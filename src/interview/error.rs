use std::path::PathBuf;

use thiserror::Error;

use crate::ai_gateway::error::GatewayError;

#[derive(Debug, Error)]
pub enum InterviewError {
    #[error("oracle call failed: {0}")]
    Gateway(#[from] GatewayError),
    #[error("invalid form: {0}")]
    InvalidForm(String),
    #[error("failed to persist {}: {message}", path.display())]
    Persistence { path: PathBuf, message: String },
    #[error("interview session is already closed")]
    SessionClosed,
}

pub fn invalid_form(message: impl Into<String>) -> InterviewError {
    InterviewError::InvalidForm(message.into())
}

pub fn persistence_error(path: impl Into<PathBuf>, message: impl Into<String>) -> InterviewError {
    InterviewError::Persistence {
        path: path.into(),
        message: message.into(),
    }
}
