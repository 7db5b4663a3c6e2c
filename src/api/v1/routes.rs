/*
 * Responsibility
 * - v1 の URL 構造を定義
 * - gate を通さない public と、gate を通す protected を分ける
 *   (gate 自体は app.rs で protected 側にだけ掛ける)
 */
use axum::{Router, routing::get};

use crate::api::v1::handlers::{
    health::health,
    me::{echo_me, get_me},
};
use crate::state::AppState;

pub fn public_routes() -> Router<AppState> {
    Router::new().route("/health", get(health))
}

pub fn protected_routes() -> Router<AppState> {
    Router::new().route("/me", get(get_me).post(echo_me))
}
