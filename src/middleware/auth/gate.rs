//! token 検証 → JwtContext を extensions に入れる
//!
//! - token は header → JSON body → cookie の順で探す (最初に見つかったものだけ使う)
//! - body は header に token が無く、かつ `Content-Type: application/json` の時だけ読む
//! - 読んだ body は handler 側でもう一度読めるように request に戻す
//! - 失敗理由 (無い / 壊れている / 期限切れ / 署名不一致) は response には出さない

use axum::{
    Router,
    body::{Body, Bytes},
    extract::State,
    http::{HeaderMap, Request, header},
    middleware::{self, Next},
    response::{IntoResponse, Response},
};
use http_body_util::LengthLimitError;
use serde_json::{Map, Value};
use std::error::Error as StdError;

use crate::error::AppError;
use crate::services::auth::credential::header_token;
use crate::services::auth::{IncomingRequest, Outcome};
use crate::state::AppState;

/// 保護したい Router に gate を掛ける。
///
/// 例：
/// ```ignore
/// let protected = api::v1::protected_routes();
/// let protected = middleware::auth::gate::apply(protected, state.clone());
/// ```
pub fn apply(router: Router<AppState>, state: AppState) -> Router<AppState> {
    // axum 0.8 の from_fn は State extractor を受け取れないため、`from_fn_with_state` で明示的に state を渡す
    router.route_layer(middleware::from_fn_with_state(state, gate_middleware))
}

async fn gate_middleware(
    State(state): State<AppState>,
    req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let (parts, body) = req.into_parts();
    let gate = state.gate.as_ref();

    let (body, parsed) = if needs_body(&parts.headers, gate.field_name()) {
        let bytes = axum::body::to_bytes(body, state.body_limit_bytes)
            .await
            .map_err(body_read_error)?;
        let parsed = parse_object(&bytes);
        (Body::from(bytes), parsed)
    } else {
        (body, None)
    };

    let outcome = {
        let incoming = IncomingRequest::new(&parts.headers, parsed.as_ref());
        gate.authenticate(&incoming).await
    };

    match outcome {
        Outcome::Admit(ctx) => {
            let mut req = Request::from_parts(parts, body);

            // middleware → extractor への受け渡し
            req.extensions_mut().insert(ctx);

            Ok(next.run(req).await)
        }
        Outcome::Reject(rejection) => Ok(rejection.into_response()),
    }
}

// Only a breached limit is a 413. Aborts and stream errors are the client's malformed request.
fn body_read_error(err: axum::Error) -> AppError {
    let root: &(dyn StdError + 'static) = &err;
    let over_limit = std::iter::successors(Some(root), |&e| e.source())
        .any(|e| e.is::<LengthLimitError>());

    if over_limit {
        tracing::warn!(error = %err, "request body exceeds limit");
        AppError::PayloadTooLarge
    } else {
        tracing::warn!(error = %err, "failed to buffer request body");
        AppError::BadRequest
    }
}

// The body is only a carrier when the header is not.
fn needs_body(headers: &HeaderMap, field: &str) -> bool {
    header_token(headers, field).is_none() && is_json(headers)
}

fn is_json(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .map(|mime| {
            let mime = mime.trim().to_ascii_lowercase();
            mime == "application/json" || (mime.starts_with("application/") && mime.ends_with("+json"))
        })
        .unwrap_or(false)
}

// Anything that is not a JSON object counts as "no parsed body".
fn parse_object(bytes: &Bytes) -> Option<Map<String, Value>> {
    match serde_json::from_slice::<Value>(bytes) {
        Ok(Value::Object(map)) => Some(map),
        _ => None,
    }
}
