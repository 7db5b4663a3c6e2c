/*
 * Responsibility
 * - アプリ共通の AppError 定義
 * - IntoResponse 実装 (HTTP status / JSON error body)
 * - body は `{"status": <code>, "msg": <message>}` に統一する
 */
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub status: u16,
    pub msg: String,
}

#[derive(Debug, Error)]
pub enum AppError {
    /// `msg` is already localized. The reason a credential was refused is never carried here.
    #[error("unauthorized")]
    Unauthorized { msg: String },
    #[error("payload too large")]
    PayloadTooLarge,
    #[error("invalid request body")]
    BadRequest,
}

impl AppError {
    pub fn unauthorized(msg: impl Into<String>) -> Self {
        Self::Unauthorized { msg: msg.into() }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
            AppError::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::BadRequest => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let msg = match self {
            AppError::Unauthorized { msg } => msg,
            other => other.to_string(),
        };

        let body = ErrorBody {
            status: status.as_u16(),
            msg,
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unauthorized_renders_status_and_msg_only() {
        let response = AppError::unauthorized("invalidCredentials").into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&body[..], br#"{"status":401,"msg":"invalidCredentials"}"#);
    }

    #[tokio::test]
    async fn payload_too_large_uses_display_text() {
        let response = AppError::PayloadTooLarge.into_response();
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&body[..], br#"{"status":413,"msg":"payload too large"}"#);
    }

    #[tokio::test]
    async fn bad_request_uses_display_text() {
        let response = AppError::BadRequest.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&body[..], br#"{"status":400,"msg":"invalid request body"}"#);
    }
}
