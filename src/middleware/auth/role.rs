//! role (Cognito group / `role` claim) による認可
//!
//! access middleware の内側に置く前提。AuthCtx が無ければ 401、
//! role が足りなければ 403。

use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    extract::State,
    http::Request,
    middleware::{self, Next},
    response::Response,
};

use crate::api::extractors::AuthCtx;
use crate::error::AppError;
use crate::state::AppState;

#[derive(Clone, Debug)]
pub struct RequiredRole(Arc<str>);

impl RequiredRole {
    pub fn new(role: &str) -> Self {
        Self(Arc::from(role))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// `router` の全ルートに `role` を要求する。
pub fn apply(router: Router<AppState>, role: RequiredRole) -> Router<AppState> {
    router.route_layer(middleware::from_fn_with_state(role, role_middleware))
}

async fn role_middleware(
    State(required): State<RequiredRole>,
    req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    authorize(req.extensions().get::<AuthCtx>(), &required)?;
    Ok(next.run(req).await)
}

fn authorize(ctx: Option<&AuthCtx>, required: &RequiredRole) -> Result<(), AppError> {
    let ctx = ctx.ok_or(AppError::MissingAuthContext)?;

    if !ctx.has_role(required.as_str()) {
        tracing::info!(
            sub = %ctx.subject(),
            role = required.as_str(),
            "role check failed"
        );
        return Err(AppError::Forbidden);
    }

    Ok(())
}
