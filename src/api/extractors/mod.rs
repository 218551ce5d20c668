/*
 * Responsibility
 * - handler が受け取る値を request から取り出す (AuthCtx / JSON body)
 */
pub mod auth_ctx;
pub mod json;

pub use auth_ctx::{AuthCtx, AuthCtxExtractor};
pub use json::extract_json;
