/*
 * Responsibility
 * - tracing / panic hook の初期化
 * - Config読み込み → 依存生成 (TokenGate) → Router 組み立て
 * - Middleware の適用 (gate / CORS / HTTP)
 * - axum::serve() で起動
 */
use std::{panic, process, sync::Arc};

use anyhow::{Context, Result};
use axum::Router;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::api;
use crate::config::Config;
use crate::middleware;
use crate::middleware::http::HttpLimits;
use crate::services::auth::{TokenGate, TracingHooks};
use crate::services::i18n::MessageCatalog;
use crate::state::AppState;

fn init_tracing() {
    // Prefer RUST_LOG if set; otherwise use a sensible default.
    // Ex:
    // RUST_LOG=info,token_gate=debug,tower_http=debug cargo run
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,tower_http=info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn init_panic_hook(abort_on_panic: bool) {
    let default_hook = panic::take_hook();

    panic::set_hook(Box::new(move |info| {
        tracing::error!(?info, "panic");

        // development: 即落とす / production: default hook (stderr) のみ
        if abort_on_panic {
            process::abort();
        } else {
            default_hook(info);
        }
    }))
}

pub async fn run() -> Result<()> {
    init_tracing();
    let config = Config::from_env().context("failed to load configuration")?;

    init_panic_hook(!config.app_env.is_production());

    tracing::info!(
        gate = ?config.gate,
        "starting token gate in {:?} mode on {}",
        config.app_env,
        config.addr
    );

    let state = build_state(&config)?;
    let app = build_router(state);
    let app = middleware::cors::apply(app, &config);
    let app = middleware::http::apply(
        app,
        HttpLimits {
            body_limit_bytes: config.body_limit_bytes,
            request_timeout: config.request_timeout,
        },
    );

    let listener = tokio::net::TcpListener::bind(config.addr)
        .await
        .with_context(|| format!("failed to bind {}", config.addr))?;
    axum::serve(listener, app).await?;
    Ok(())
}

pub fn build_state(config: &Config) -> Result<AppState> {
    let catalog = match &config.locale_file {
        Some(path) => MessageCatalog::from_file(path)
            .with_context(|| format!("failed to load locale file {}", path.display()))?,
        None => MessageCatalog::default(),
    };
    if catalog.is_empty() {
        tracing::debug!("no localized messages, rejections use message keys");
    } else {
        tracing::debug!(messages = catalog.len(), "message catalog loaded");
    }

    let gate = TokenGate::new(&config.gate)
        .context("invalid JWT_SECRET for the configured JWT_ALGORITHMS")?
        .with_localizer(Arc::new(catalog))
        .with_hooks(Arc::new(TracingHooks::new(config.gate.reject_delay)));

    Ok(AppState::new(Arc::new(gate), config.body_limit_bytes))
}

/// Routes plus the gate. Transport layers (CORS, request-id, limits) are applied by `run`.
pub fn build_router(state: AppState) -> Router {
    let protected = middleware::auth::gate::apply(api::v1::protected_routes(), state.clone());

    Router::new()
        .nest("/api/v1", api::v1::public_routes().merge(protected))
        .with_state(state)
}
