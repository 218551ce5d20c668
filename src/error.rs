/*
 * Responsibility
 * - アプリ共通の AppError 定義
 * - IntoResponse 実装 (HTTP status / JSON error body)
 * - 認証/認可/バリデーション/repo エラーを統一的に変換
 */
use axum::{
    Json,
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::repos::error::RepoError;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub details: Vec<FieldError>,
}

/// One failed schema check on a request body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("missing access token")]
    MissingToken,
    #[error("invalid or expired token")]
    InvalidToken,
    #[error("missing authentication context")]
    MissingAuthContext,
    #[error("forbidden: insufficient privileges")]
    Forbidden,
    #[error("request validation failed")]
    Validation { details: Vec<FieldError> },
    #[error("request body too large")]
    PayloadTooLarge,
    #[error("request timed out")]
    RequestTimeout,
    #[error("internal server error")]
    Internal,
}

impl AppError {
    pub fn validation(details: Vec<FieldError>) -> Self {
        Self::Validation { details }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::MissingToken | AppError::InvalidToken | AppError::MissingAuthContext => {
                StatusCode::UNAUTHORIZED
            }
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::Validation { .. } => StatusCode::BAD_REQUEST,
            AppError::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::RequestTimeout => StatusCode::REQUEST_TIMEOUT,
            AppError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            AppError::MissingToken => "MISSING_TOKEN",
            AppError::InvalidToken => "INVALID_TOKEN",
            AppError::MissingAuthContext => "MISSING_AUTH_CONTEXT",
            AppError::Forbidden => "FORBIDDEN",
            AppError::Validation { .. } => "VALIDATION_ERROR",
            AppError::PayloadTooLarge => "PAYLOAD_TOO_LARGE",
            AppError::RequestTimeout => "REQUEST_TIMEOUT",
            AppError::Internal => "INTERNAL_SERVER_ERROR",
        }
    }

    // RFC 6750 challenge for 401 responses
    fn www_authenticate(&self) -> Option<HeaderValue> {
        match self {
            AppError::MissingToken | AppError::MissingAuthContext => {
                Some(HeaderValue::from_static("Bearer"))
            }
            AppError::InvalidToken => Some(HeaderValue::from_static(
                r#"Bearer error="invalid_token""#,
            )),
            _ => None,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let code = self.code();
        let challenge = self.www_authenticate();
        let message = self.to_string();

        let details = match self {
            AppError::Validation { details } => details,
            _ => Vec::new(),
        };

        let body = ErrorResponse {
            error: ErrorBody {
                code,
                message,
                details,
            },
        };

        let mut response = (status, Json(body)).into_response();
        if let Some(value) = challenge {
            response
                .headers_mut()
                .insert(header::WWW_AUTHENTICATE, value);
        }
        response
    }
}

impl From<RepoError> for AppError {
    fn from(e: RepoError) -> Self {
        tracing::error!(error = %e, "film repository failure");
        match e {
            RepoError::Backend(_) => AppError::Internal,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn body_json(err: AppError) -> (StatusCode, Option<String>, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let challenge = response
            .headers()
            .get(header::WWW_AUTHENTICATE)
            .map(|v| v.to_str().unwrap().to_string());
        let bytes = to_bytes(response.into_body(), 1024 * 8).await.unwrap();
        (status, challenge, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn missing_token_is_401_with_bearer_challenge() {
        let (status, challenge, body) = body_json(AppError::MissingToken).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(challenge.as_deref(), Some("Bearer"));
        assert_eq!(body["error"]["code"], "MISSING_TOKEN");
        assert!(body["error"].get("details").is_none());
    }

    #[tokio::test]
    async fn invalid_token_challenge_names_the_error() {
        let (status, challenge, body) = body_json(AppError::InvalidToken).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(challenge.as_deref(), Some(r#"Bearer error="invalid_token""#));
        assert_eq!(body["error"]["code"], "INVALID_TOKEN");
    }

    #[tokio::test]
    async fn forbidden_has_no_challenge() {
        let (status, challenge, body) = body_json(AppError::Forbidden).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert!(challenge.is_none());
        assert_eq!(body["error"]["code"], "FORBIDDEN");
    }

    #[tokio::test]
    async fn repo_failures_become_opaque_500s() {
        let err = AppError::from(RepoError::Backend("film store lock poisoned".into()));
        let (status, challenge, body) = body_json(err).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(challenge.is_none());
        assert_eq!(body["error"]["code"], "INTERNAL_SERVER_ERROR");
        assert!(!body.to_string().contains("poisoned"));
    }

    #[tokio::test]
    async fn validation_error_carries_field_details() {
        let err = AppError::validation(vec![FieldError::new("title", "title is required")]);
        let (status, _, body) = body_json(err).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
        assert_eq!(body["error"]["details"][0]["field"], "title");
        assert_eq!(body["error"]["details"][0]["message"], "title is required");
    }
}
