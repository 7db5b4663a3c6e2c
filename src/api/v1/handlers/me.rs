/*
 * Responsibility
 * - /me: gate が付けた JwtContext をそのまま返す (token を再検証しない)
 * - POST は受け取った JSON body も返す (gate が body を読んだ後でも handler が読めることの確認用)
 */
use axum::Json;
use serde_json::Value;

use crate::api::v1::{dto::me::MeResponse, extractors::JwtCtx};

pub async fn get_me(JwtCtx(ctx): JwtCtx) -> Json<MeResponse> {
    Json(MeResponse::from_ctx(&ctx, None))
}

pub async fn echo_me(JwtCtx(ctx): JwtCtx, body: Option<Json<Value>>) -> Json<MeResponse> {
    Json(MeResponse::from_ctx(&ctx, body.map(|Json(v)| v)))
}
