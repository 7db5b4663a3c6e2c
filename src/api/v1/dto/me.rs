use serde::Serialize;
use serde_json::Value;

use crate::services::auth::{Carrier, JwtContext, VerifiedClaims};

#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub sub: Option<String>,
    pub carrier: Carrier,
    pub claims: VerifiedClaims,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub echo: Option<Value>,
}

impl MeResponse {
    pub fn from_ctx(ctx: &JwtContext, echo: Option<Value>) -> Self {
        Self {
            sub: ctx.payload().subject().map(str::to_string),
            carrier: ctx.carrier(),
            claims: ctx.payload().clone(),
            echo,
        }
    }
}
