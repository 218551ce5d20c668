//! Signing-key source for access-token verification.
//!
//! The identity provider publishes its public keys as a JWKS document
//! (`{issuer}/.well-known/jwks.json` for Cognito user pools). `KeySource` is
//! the seam used by `KeyCache`; `JwksFetcher` is the HTTP implementation.
use std::time::Duration;

use async_trait::async_trait;
use jsonwebtoken::DecodingKey;
use jsonwebtoken::jwk::{AlgorithmParameters, Jwk, PublicKeyUse};
use reqwest::Client;
use serde::Deserialize;
use thiserror::Error;

/// Key-set errors (transport/decoding).
///
/// Kept separate from `InvalidToken` so the cache can decide whether a stale
/// key set is still usable.
#[derive(Debug, Error)]
pub enum KeySetError {
    #[error("failed to fetch JWKS: {0}")]
    Fetch(String),
    #[error("failed to decode JWKS: {0}")]
    Decode(String),
    #[error("JWKS contains no usable signing keys")]
    Empty,
}

#[async_trait]
pub trait KeySource: Send + Sync {
    // Where keys come from (for logging).
    fn describe(&self) -> &str;

    // Fetch the full current key set as `(kid, key)` pairs.
    async fn fetch_keys(&self) -> Result<Vec<(String, DecodingKey)>, KeySetError>;
}

#[derive(Clone, Debug)]
pub struct JwksFetcher {
    client: Client,
    url: String,
}

impl JwksFetcher {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, KeySetError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| KeySetError::Fetch(e.to_string()))?;

        Ok(Self::with_client(client, url))
    }

    pub fn with_client(client: Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }
}

#[async_trait]
impl KeySource for JwksFetcher {
    fn describe(&self) -> &str {
        &self.url
    }

    async fn fetch_keys(&self) -> Result<Vec<(String, DecodingKey)>, KeySetError> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| KeySetError::Fetch(e.to_string()))?;

        if !response.status().is_success() {
            return Err(KeySetError::Fetch(format!(
                "HTTP {} from {}",
                response.status(),
                self.url
            )));
        }

        let document: JwksDocument = response
            .json()
            .await
            .map_err(|e| KeySetError::Decode(e.to_string()))?;

        decode_keys(document)
    }
}

/// Raw JWKS document. Entries stay untyped so one unsupported key does not
/// poison the whole set.
#[derive(Debug, Deserialize)]
pub struct JwksDocument {
    pub keys: Vec<serde_json::Value>,
}

/// Turn a JWKS document into decoding keys.
///
/// Skipped (with a warning): entries that are not valid JWKs, have no `kid`,
/// are marked for encryption, or are symmetric (`oct`) keys.
pub fn decode_keys(document: JwksDocument) -> Result<Vec<(String, DecodingKey)>, KeySetError> {
    let mut keys = Vec::with_capacity(document.keys.len());

    for raw in document.keys {
        let jwk: Jwk = match serde_json::from_value(raw) {
            Ok(jwk) => jwk,
            Err(err) => {
                tracing::warn!(error = %err, "skipping unparseable JWK");
                continue;
            }
        };

        let Some(kid) = jwk.common.key_id.clone() else {
            tracing::warn!("skipping JWK without kid");
            continue;
        };

        if matches!(jwk.common.public_key_use, Some(PublicKeyUse::Encryption)) {
            tracing::debug!(kid = %kid, "skipping encryption JWK");
            continue;
        }

        if matches!(jwk.algorithm, AlgorithmParameters::OctetKey(_)) {
            tracing::warn!(kid = %kid, "skipping symmetric JWK");
            continue;
        }

        match DecodingKey::from_jwk(&jwk) {
            Ok(key) => keys.push((kid, key)),
            Err(err) => tracing::warn!(kid = %kid, error = %err, "skipping unusable JWK"),
        }
    }

    if keys.is_empty() {
        return Err(KeySetError::Empty);
    }

    Ok(keys)
}
