use axum::extract::FromRequestParts;
use axum::http::{StatusCode, request::Parts};

use crate::services::auth::JwtContext;

/// Handler で JwtContext を受け取るための extractor
/// gate middleware が JwtContext を request.extensions() に insert 済みである前提
/// 見つからない場合は 401 を返す（gate が掛かっていない route で使われた）
pub struct JwtCtx(pub JwtContext);

impl<S> FromRequestParts<S> for JwtCtx
where
    S: Send + Sync,
{
    type Rejection = StatusCode;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<JwtContext>()
            .cloned()
            .map(JwtCtx)
            .ok_or(StatusCode::UNAUTHORIZED)
    }
}
