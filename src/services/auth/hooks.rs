//! Extension points around the gate decision.
//!
//! - `on_admit`: audit trail of token use.
//! - `on_reject`: place to slow down or account failed attempts.
//!
//! Both run before the outcome is returned. Neither can change the outcome.

use std::time::Duration;

use async_trait::async_trait;

use super::gate::{GateError, JwtContext};

#[async_trait]
pub trait GateHooks: Send + Sync {
    async fn on_admit(&self, _ctx: &JwtContext) {}

    async fn on_reject(&self, _reason: &GateError) {}
}

/// No-op hooks.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopHooks;

#[async_trait]
impl GateHooks for NoopHooks {}

/// Logs every decision through `tracing` and optionally waits a fixed delay before a
/// rejection is returned.
///
/// The rejection reason is logged here and nowhere else.
#[derive(Debug, Clone, Default)]
pub struct TracingHooks {
    reject_delay: Duration,
}

impl TracingHooks {
    pub fn new(reject_delay: Duration) -> Self {
        Self { reject_delay }
    }
}

#[async_trait]
impl GateHooks for TracingHooks {
    async fn on_admit(&self, ctx: &JwtContext) {
        let expires_at = ctx
            .payload()
            .expires_at()
            .and_then(|exp| chrono::DateTime::from_timestamp(exp, 0));

        tracing::info!(
            sub = ctx.payload().subject().unwrap_or("-"),
            carrier = %ctx.carrier(),
            expires_at = ?expires_at,
            "token admitted"
        );
    }

    async fn on_reject(&self, reason: &GateError) {
        match reason {
            GateError::CredentialAbsent => tracing::debug!("no credential on request"),
            GateError::CredentialInvalid { carrier, source } => tracing::warn!(
                carrier = %carrier,
                error = %source,
                "credential verification failed"
            ),
        }

        if !self.reject_delay.is_zero() {
            tokio::time::sleep(self.reject_delay).await;
        }
    }
}
