use std::{collections::HashMap, sync::Arc, time::Duration, time::Instant};

use tracing::Instrument;

use crate::ai_gateway::{
    adapters::{BackendAdapter, build_default_adapters},
    credentials::{CredentialProvider, resolve_credential},
    error::{GatewayError, GatewayErrorKind},
    request_normalizer::RequestNormalizer,
    router::BackendRouter,
    types::{
        AIGatewayConfig, AdapterContext, BackendDialect, CompletionRequest, RawCompletion,
    },
};

pub struct AIGateway {
    router: BackendRouter,
    credential_provider: Arc<dyn CredentialProvider>,
    adapters: HashMap<BackendDialect, Arc<dyn BackendAdapter>>,
    request_normalizer: RequestNormalizer,
}

impl AIGateway {
    pub fn new(
        config: AIGatewayConfig,
        credential_provider: Arc<dyn CredentialProvider>,
    ) -> Result<Self, GatewayError> {
        let router = BackendRouter::new(&config)?;
        Ok(Self {
            router,
            credential_provider,
            adapters: build_default_adapters(),
            request_normalizer: RequestNormalizer,
        })
    }

    pub fn with_adapters(
        mut self,
        adapters: HashMap<BackendDialect, Arc<dyn BackendAdapter>>,
    ) -> Self {
        self.adapters = adapters;
        self
    }

    pub fn default_model(&self) -> &str {
        &self.router.default_profile().model
    }

    /// Fails fast when the default backend has no usable credential.
    pub fn check_credentials(&self) -> Result<(), GatewayError> {
        let profile = self.router.default_profile();
        resolve_credential(&profile.credential, profile).map(|_| ())
    }

    /// Sends one request and returns the raw decoded payload.
    pub async fn chat_completion(
        &self,
        request: CompletionRequest,
    ) -> Result<RawCompletion, GatewayError> {
        let canonical_request = self.request_normalizer.normalize(request)?;
        let selected = self.router.select(&canonical_request)?;

        // Credential resolution precedes any network activity.
        let credential = self
            .credential_provider
            .resolve(&selected.profile.credential, &selected.profile)
            .await?;

        let adapter = self
            .adapters
            .get(&selected.profile.dialect)
            .cloned()
            .ok_or_else(|| {
                GatewayError::new(
                    GatewayErrorKind::InvalidRequest,
                    format!(
                        "adapter for dialect {:?} is not registered",
                        selected.profile.dialect
                    ),
                )
                .with_backend_id(selected.backend_id.clone())
            })?;

        let request_span = tracing::info_span!(
            target: "ai_gateway",
            "gateway_request",
            request_id = %canonical_request.request_id,
            backend_id = %selected.backend_id,
            model = %selected.resolved_model,
            messages = canonical_request.messages.len()
        );

        let ctx = AdapterContext {
            backend_id: selected.backend_id.clone(),
            model: selected.resolved_model.clone(),
            profile: selected.profile.clone(),
            credential,
            timeout: selected
                .profile
                .request_timeout_ms
                .map(Duration::from_millis),
            request_id: canonical_request.request_id.clone(),
        };

        async move {
            tracing::debug!(
                target: "ai_gateway",
                dialect = ?selected.profile.dialect,
                timeout_ms = ?selected.profile.request_timeout_ms,
                "chat_completion_prepared"
            );
            let started_at = Instant::now();
            let result = adapter.invoke(ctx, &canonical_request).await;
            let elapsed_ms = started_at.elapsed().as_millis() as u64;

            match result {
                Ok(payload) => {
                    tracing::debug!(
                        target: "ai_gateway",
                        elapsed_ms = elapsed_ms,
                        "chat_completion_completed"
                    );
                    Ok(RawCompletion {
                        request_id: canonical_request.request_id,
                        backend_id: selected.backend_id,
                        dialect: selected.profile.dialect,
                        payload,
                    })
                }
                Err(err) => {
                    tracing::warn!(
                        target: "ai_gateway",
                        elapsed_ms = elapsed_ms,
                        kind = ?err.kind,
                        error = %err,
                        "chat_completion_failed"
                    );
                    Err(err)
                }
            }
        }
        .instrument(request_span)
        .await
    }

    /// Extracts the assistant text from a raw payload using its dialect's shape.
    pub fn parse_response(&self, raw: &RawCompletion) -> Result<String, GatewayError> {
        let adapter = self.adapters.get(&raw.dialect).ok_or_else(|| {
            GatewayError::new(
                GatewayErrorKind::Internal,
                format!("adapter for dialect {:?} is not registered", raw.dialect),
            )
            .with_backend_id(raw.backend_id.clone())
        })?;
        let text = adapter.parse_response(&raw.payload, &raw.backend_id);
        if let Err(err) = &text {
            tracing::warn!(
                target: "ai_gateway",
                request_id = %raw.request_id,
                backend_id = %raw.backend_id,
                error = %err,
                "malformed_oracle_response"
            );
        }
        text
    }
}
