//! JSON body extraction with the app's error body.
//!
//! Handlers take `Result<Json<T>, JsonRejection>` and pass it through
//! [`extract_json`] so that malformed bodies become 400 `VALIDATION_ERROR`
//! instead of axum's plain-text rejections.

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;

use crate::error::{AppError, FieldError};

pub fn extract_json<T>(result: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    result.map(|Json(value)| value).map_err(|rejection| {
        tracing::debug!(error = %rejection.body_text(), "json body rejected");

        match rejection {
            JsonRejection::MissingJsonContentType(_) => AppError::validation(vec![
                FieldError::new("content-type", "expected `application/json`"),
            ]),
            JsonRejection::JsonSyntaxError(_) => {
                AppError::validation(vec![FieldError::new("body", "body is not valid JSON")])
            }
            JsonRejection::BytesRejection(err) if err.status() == StatusCode::PAYLOAD_TOO_LARGE => {
                AppError::PayloadTooLarge
            }
            other => AppError::validation(vec![FieldError::new("body", other.body_text())]),
        }
    })
}
