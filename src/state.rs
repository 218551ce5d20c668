/*
 * Responsibility
 * - Router に紐づける共有コンテキスト (AppState)
 *   - verifier: access token 検証 (JWKS キャッシュ込み)
 *   - films: film の保存先 (trait object, テストでは差し替え可能)
 * - Clone 前提で持つ (内部は Arc)
 */
use std::sync::Arc;

use crate::repos::FilmRepo;
use crate::services::auth::TokenVerifier;

#[derive(Clone)]
pub struct AppState {
    pub verifier: Arc<TokenVerifier>,
    pub films: Arc<dyn FilmRepo>,
}

impl AppState {
    pub fn new(verifier: Arc<TokenVerifier>, films: Arc<dyn FilmRepo>) -> Self {
        Self { verifier, films }
    }
}
