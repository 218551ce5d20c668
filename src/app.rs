/*
 * Responsibility
 * - Config読み込み → 依存生成 (TokenVerifier / FilmRepo) → Router 組み立て
 * - Middleware の適用 (security headers / CORS / request-id / trace / limit / timeout)
 * - axum::serve() で起動
 */
use std::{panic, process, sync::Arc};

use anyhow::{Context, Result};
use axum::{Router, routing::get};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::api;
use crate::api::handlers::health::health;
use crate::config::Config;
use crate::middleware;
use crate::repos::InMemoryFilmRepo;
use crate::services::auth::{build_token_verifier, jwks::KeySetError};
use crate::state::AppState;

fn init_tracing() {
    // Prefer RUST_LOG if set; otherwise use a sensible default.
    // Ex:
    // RUST_LOG=info,film_api=debug,tower_http=debug cargo run
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

        // development: crash the whole process so it gets noticed.
        // production: default hook, the server keeps running.
        if abort_on_panic {
            process::abort();
        } else {
            default_hook(info);
        }
    }))
}

pub async fn run() -> Result<()> {
    init_tracing();
    let config = Config::from_env().context("loading configuration")?;

    init_panic_hook(!config.app_env.is_production());

    tracing::info!(
        issuer = %config.auth_issuer,
        jwks_url = %config.jwks_url,
        "starting API in {:?} mode on {}",
        config.app_env,
        config.addr
    );

    let state = build_state(&config).context("building application state")?;

    // Warm the key cache; tokens can still be verified later if this fails.
    match state.verifier.key_cache().refresh().await {
        Ok(count) => tracing::info!(keys = count, "signing keys loaded"),
        Err(err) => tracing::warn!(error = %err, "initial signing key fetch failed"),
    }

    let app = build_router(state, &config);
    let listener = tokio::net::TcpListener::bind(config.addr)
        .await
        .with_context(|| format!("binding {}", config.addr))?;
    axum::serve(listener, app).await.context("serving HTTP")?;

    Ok(())
}

pub fn build_state(config: &Config) -> Result<AppState, KeySetError> {
    let verifier = build_token_verifier(config)?;
    let films = Arc::new(InMemoryFilmRepo::new());

    Ok(AppState::new(verifier, films))
}

pub fn build_router(state: AppState, config: &Config) -> Router {
    let router = Router::new()
        .route("/healthz", get(health))
        .merge(api::routes(state.clone(), &config.admin_role))
        .with_state(state);

    let router = middleware::security_headers::apply(router, config);
    let router = middleware::cors::apply(router, config);
    middleware::http::apply(router, config)
}
