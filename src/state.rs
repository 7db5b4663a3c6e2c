/*
 * Responsibility
 * - Router に紐づける共有コンテキスト (AppState)
 *   - gate: TokenGate (読み取り専用、全リクエストで共有)
 *   - body_limit_bytes: gate が body を読む時の上限 (http layer と同じ値)
 * - Clone 前提で持つ (内部は Arc/Clone cheap)
 */
use std::sync::Arc;

use crate::services::auth::TokenGate;

#[derive(Clone, Debug)]
pub struct AppState {
    pub gate: Arc<TokenGate>,
    pub body_limit_bytes: usize,
}

impl AppState {
    pub fn new(gate: Arc<TokenGate>, body_limit_bytes: usize) -> Self {
        Self {
            gate,
            body_limit_bytes,
        }
    }
}
