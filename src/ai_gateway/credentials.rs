use std::env;

use async_trait::async_trait;

use crate::ai_gateway::{
    error::{GatewayError, missing_credential},
    types::{BackendProfile, CredentialRef, ResolvedCredential},
};

#[async_trait]
pub trait CredentialProvider: Send + Sync {
    async fn resolve(
        &self,
        reference: &CredentialRef,
        backend: &BackendProfile,
    ) -> Result<ResolvedCredential, GatewayError>;
}

#[derive(Default)]
pub struct EnvCredentialProvider;

#[async_trait]
impl CredentialProvider for EnvCredentialProvider {
    async fn resolve(
        &self,
        reference: &CredentialRef,
        backend: &BackendProfile,
    ) -> Result<ResolvedCredential, GatewayError> {
        resolve_credential(reference, backend)
    }
}

/// Synchronous resolution, also used for the startup precondition check.
pub fn resolve_credential(
    reference: &CredentialRef,
    backend: &BackendProfile,
) -> Result<ResolvedCredential, GatewayError> {
    let token = match reference {
        CredentialRef::Env { var } => env::var(var).unwrap_or_default(),
        CredentialRef::InlineToken { token } => token.clone(),
    };

    if token.trim().is_empty() {
        let source = match reference {
            CredentialRef::Env { var } => format!("environment variable {var}"),
            CredentialRef::InlineToken { .. } => "inline token".to_string(),
        };
        return Err(missing_credential(format!(
            "missing credential ({}) for backend {}",
            source, backend.id
        ))
        .with_backend_id(backend.id.clone()));
    }

    Ok(ResolvedCredential {
        auth_header: format!("Bearer {}", token.trim()),
    })
}
