//! Cached signing keys, refreshed from a `KeySource`.
//!
//! Policy:
//! - A key set younger than `ttl` is served from memory.
//! - A stale set, or a `kid` missing from the current set (key rotation),
//!   triggers a refresh. Refreshes are serialized and spaced at least
//!   `min_refresh_interval` apart, so a flood of unknown `kid`s costs at most
//!   one fetch per interval.
//! - If a refresh fails, a stale key is still served when it has the `kid`.
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use jsonwebtoken::DecodingKey;
use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::services::auth::jwks::{KeySetError, KeySource};

#[derive(Default)]
struct CachedKeys {
    keys: HashMap<String, DecodingKey>,
    fetched_at: Option<Instant>,
    last_attempt: Option<Instant>,
}

pub struct KeyCache {
    source: Arc<dyn KeySource>,
    ttl: Duration,
    min_refresh_interval: Duration,
    state: RwLock<CachedKeys>,
    refresh_lock: Mutex<()>,
}

impl std::fmt::Debug for KeyCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Do not print key material
        f.debug_struct("KeyCache")
            .field("source", &self.source.describe())
            .field("ttl", &self.ttl)
            .field("min_refresh_interval", &self.min_refresh_interval)
            .finish()
    }
}

impl KeyCache {
    pub fn new(source: Arc<dyn KeySource>, ttl: Duration, min_refresh_interval: Duration) -> Self {
        Self {
            source,
            ttl,
            min_refresh_interval,
            state: RwLock::new(CachedKeys::default()),
            refresh_lock: Mutex::new(()),
        }
    }

    /// Decoding key for `kid`.
    ///
    /// - `Ok(Some(_))`: key found (fresh, or stale after a failed refresh)
    /// - `Ok(None)`: the provider does not publish this `kid`
    /// - `Err(_)`: no key could be obtained because the source failed
    pub async fn get(&self, kid: &str) -> Result<Option<DecodingKey>, KeySetError> {
        if let Some(key) = self.lookup(kid, false) {
            return Ok(Some(key));
        }

        let _guard = self.refresh_lock.lock().await;

        // Another request may have refreshed while we waited for the lock.
        if let Some(key) = self.lookup(kid, false) {
            return Ok(Some(key));
        }

        if !self.refresh_due() {
            return Ok(self.lookup(kid, true));
        }

        match self.refresh_locked().await {
            Ok(_) => Ok(self.lookup(kid, false)),
            Err(err) => match self.lookup(kid, true) {
                Some(key) => {
                    tracing::warn!(kid, error = %err, "key refresh failed; using stale signing key");
                    Ok(Some(key))
                }
                None => Err(err),
            },
        }
    }

    /// Fetch the key set now, regardless of freshness. Returns the number of keys loaded.
    pub async fn refresh(&self) -> Result<usize, KeySetError> {
        let _guard = self.refresh_lock.lock().await;
        self.refresh_locked().await
    }

    pub fn len(&self) -> usize {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // Caller must hold `refresh_lock`.
    async fn refresh_locked(&self) -> Result<usize, KeySetError> {
        self.state
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .last_attempt = Some(Instant::now());

        let fetched = match self.source.fetch_keys().await {
            Ok(keys) => keys,
            Err(err) => {
                tracing::error!(source = self.source.describe(), error = %err, "signing key refresh failed");
                return Err(err);
            }
        };

        let count = fetched.len();
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        state.keys = fetched.into_iter().collect();
        state.fetched_at = Some(Instant::now());

        tracing::info!(source = self.source.describe(), keys = count, "signing keys refreshed");
        Ok(count)
    }

    fn lookup(&self, kid: &str, allow_stale: bool) -> Option<DecodingKey> {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        let fetched_at = state.fetched_at?;

        if !allow_stale && fetched_at.elapsed() >= self.ttl {
            return None;
        }

        state.keys.get(kid).cloned()
    }

    fn refresh_due(&self) -> bool {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);

        match state.last_attempt {
            None => true,
            Some(at) => at.elapsed() >= self.min_refresh_interval,
        }
    }
}
