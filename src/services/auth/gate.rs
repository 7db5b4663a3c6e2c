//! The gate decision: extract one credential, verify it, admit or reject.
//!
//! `Pending -> {Admitted, Rejected}`. Both failure modes produce the same [`Rejection`] so a
//! client cannot tell a missing token from a bad one.

use std::sync::Arc;

use axum::response::{IntoResponse, Response};
use thiserror::Error;

use crate::config::GateConfig;
use crate::error::AppError;
use crate::services::i18n::{INVALID_CREDENTIALS, Localizer, MessageCatalog};

use super::credential::{Carrier, IncomingRequest};
use super::hooks::{GateHooks, NoopHooks};
use super::verifier::{KeyError, TokenVerifier, VerifiedClaims, VerifyError};

/// Why a request was refused. Internal only: never rendered into the response.
#[derive(Debug, Error)]
pub enum GateError {
    #[error("no credential found in header, body or cookie")]
    CredentialAbsent,
    #[error("credential from {carrier} failed verification: {source}")]
    CredentialInvalid {
        carrier: Carrier,
        #[source]
        source: VerifyError,
    },
}

/// Per-request record of the verified token, attached to request extensions on admit.
///
/// `payload` is the decoded claims; the raw credential is kept under the configured field
/// name so downstream code can forward it without re-extracting.
#[derive(Clone)]
pub struct JwtContext {
    payload: VerifiedClaims,
    field_name: Arc<str>,
    token: String,
    carrier: Carrier,
}

impl std::fmt::Debug for JwtContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Do not print the bearer token
        f.debug_struct("JwtContext")
            .field("payload", &self.payload)
            .field("field_name", &self.field_name)
            .field("carrier", &self.carrier)
            .finish()
    }
}

impl JwtContext {
    pub fn payload(&self) -> &VerifiedClaims {
        &self.payload
    }

    /// Raw credential, looked up by field name (`jwt[field]`).
    pub fn get(&self, field: &str) -> Option<&str> {
        (field == &*self.field_name).then_some(self.token.as_str())
    }

    pub fn carrier(&self) -> Carrier {
        self.carrier
    }
}

/// 401 response for every refused request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rejection {
    msg: String,
}

impl Rejection {
    pub fn msg(&self) -> &str {
        &self.msg
    }
}

impl IntoResponse for Rejection {
    fn into_response(self) -> Response {
        AppError::unauthorized(self.msg).into_response()
    }
}

#[derive(Debug)]
pub enum Outcome {
    Admit(JwtContext),
    Reject(Rejection),
}

impl Outcome {
    pub fn is_admit(&self) -> bool {
        matches!(self, Outcome::Admit(_))
    }
}

/// Request authentication gate.
///
/// Holds only read-only state, so one instance is shared by every request.
pub struct TokenGate {
    field_name: Arc<str>,
    verifier: TokenVerifier,
    localizer: Arc<dyn Localizer>,
    hooks: Arc<dyn GateHooks>,
}

impl std::fmt::Debug for TokenGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenGate")
            .field("field_name", &self.field_name)
            .field("verifier", &self.verifier)
            .finish()
    }
}

impl TokenGate {
    /// Gate with the default (key-echoing) message catalog and no hooks.
    pub fn new(config: &GateConfig) -> Result<Self, KeyError> {
        Ok(Self {
            field_name: Arc::from(config.token_field_name.as_str()),
            verifier: TokenVerifier::new(config)?,
            localizer: Arc::new(MessageCatalog::default()),
            hooks: Arc::new(NoopHooks),
        })
    }

    pub fn with_localizer(mut self, localizer: Arc<dyn Localizer>) -> Self {
        self.localizer = localizer;
        self
    }

    pub fn with_hooks(mut self, hooks: Arc<dyn GateHooks>) -> Self {
        self.hooks = hooks;
        self
    }

    pub fn field_name(&self) -> &str {
        &self.field_name
    }

    /// Decide on a request without running hooks.
    pub fn decide(&self, request: &IncomingRequest<'_>) -> Result<JwtContext, GateError> {
        let credential = request
            .credential(&self.field_name)
            .ok_or(GateError::CredentialAbsent)?;

        let payload = self
            .verifier
            .verify(&credential.token)
            .map_err(|source| GateError::CredentialInvalid {
                carrier: credential.carrier,
                source,
            })?;

        Ok(JwtContext {
            payload,
            field_name: Arc::clone(&self.field_name),
            token: credential.token,
            carrier: credential.carrier,
        })
    }

    pub async fn authenticate(&self, request: &IncomingRequest<'_>) -> Outcome {
        match self.decide(request) {
            Ok(ctx) => {
                self.hooks.on_admit(&ctx).await;
                Outcome::Admit(ctx)
            }
            Err(reason) => {
                self.hooks.on_reject(&reason).await;
                Outcome::Reject(self.rejection())
            }
        }
    }

    // Same body for every failure mode.
    fn rejection(&self) -> Rejection {
        Rejection {
            msg: self.localizer.translate(INVALID_CREDENTIALS),
        }
    }
}
