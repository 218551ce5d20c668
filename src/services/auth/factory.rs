/// Factory: build `TokenVerifier` from application `Config`.
use std::sync::Arc;
use std::time::Duration;

use crate::config::Config;
use crate::services::auth::jwks::{JwksFetcher, KeySetError};
use crate::services::auth::key_cache::KeyCache;
use crate::services::auth::verifier::TokenVerifier;

pub fn build_token_verifier(config: &Config) -> Result<Arc<TokenVerifier>, KeySetError> {
    let fetcher = JwksFetcher::new(
        config.jwks_url.clone(),
        Duration::from_secs(config.jwks_fetch_timeout_seconds),
    )?;

    let keys = KeyCache::new(
        Arc::new(fetcher),
        Duration::from_secs(config.jwks_cache_ttl_seconds),
        Duration::from_secs(config.jwks_min_refresh_seconds),
    );

    Ok(Arc::new(TokenVerifier::new(
        config.auth_issuer.clone(),
        config.auth_client_id.clone(),
        config.access_token_leeway_seconds,
        Arc::new(keys),
    )))
}
