//! access token (Cognito JWT) 検証 → AuthCtx を extensions に入れる
//!
//! - `Authorization: Bearer <jwt>` が無い / 形式不正 → 401 MISSING_TOKEN
//! - 署名 / iss / exp / token_use / client_id の検証失敗 → 401 INVALID_TOKEN
//! - 成功時は handler が `AuthCtxExtractor` で受け取れるよう AuthCtx を格納する

use axum::{
    Router,
    body::Body,
    extract::State,
    http::{HeaderMap, Request, header},
    middleware::{self, Next},
    response::Response,
};

use crate::api::extractors::AuthCtx;
use crate::error::AppError;
use crate::state::AppState;

/// film routes に認証を掛ける。
///
/// `route_layer` なので、マッチしないパスは認証前に 404 になる。
pub fn apply(router: Router<AppState>, state: AppState) -> Router<AppState> {
    router.route_layer(middleware::from_fn_with_state(state, access_middleware))
}

async fn access_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let token = bearer_token(req.headers()).ok_or(AppError::MissingToken)?;

    let claims = match state.verifier.verify(token).await {
        Ok(claims) => claims,
        Err(err) => {
            tracing::warn!(error = %err, "access token verification failed");
            return Err(AppError::InvalidToken);
        }
    };

    tracing::debug!(
        sub = %claims.subject,
        client_id = claims.client_id.as_deref().unwrap_or("-"),
        token_id = claims.token_id.as_deref().unwrap_or("-"),
        scopes = ?claims.scopes,
        expires_at = %claims.expires_at,
        "access token accepted"
    );

    // middleware → extractor への受け渡し
    req.extensions_mut().insert(AuthCtx::new(claims));

    Ok(next.run(req).await)
}

/// `Authorization` ヘッダから Bearer token を取り出す。scheme は大文字小文字を区別しない。
fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.trim().split_once(' ')?;

    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }

    let token = token.trim();
    (!token.is_empty()).then_some(token)
}
