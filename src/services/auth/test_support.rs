//! Verifier wiring for unit tests; token minting lives in `jwt-test-support`.
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use jsonwebtoken::DecodingKey;
use serde_json::Value;

pub use jwt_test_support::TestSigner;

use crate::services::auth::jwks::{JwksDocument, KeySetError, KeySource, decode_keys};
use crate::services::auth::key_cache::KeyCache;
use crate::services::auth::verifier::TokenVerifier;

pub const ISSUER: &str = "https://cognito-idp.eu-west-2.amazonaws.com/eu-west-2_test";
pub const CLIENT_ID: &str = "test-client";

pub fn access_claims(sub: &str) -> Value {
    jwt_test_support::access_claims(ISSUER, CLIENT_ID, sub)
}

pub struct StaticKeySource {
    jwks: Value,
}

#[async_trait]
impl KeySource for StaticKeySource {
    fn describe(&self) -> &str {
        "static"
    }

    async fn fetch_keys(&self) -> Result<Vec<(String, DecodingKey)>, KeySetError> {
        let document: JwksDocument = serde_json::from_value(self.jwks.clone())
            .map_err(|e| KeySetError::Decode(e.to_string()))?;
        decode_keys(document)
    }
}

pub fn verifier_for(signers: &[&TestSigner]) -> TokenVerifier {
    let cache = KeyCache::new(
        Arc::new(StaticKeySource {
            jwks: TestSigner::jwks(signers),
        }),
        Duration::from_secs(3600),
        Duration::from_secs(30),
    );

    TokenVerifier::new(ISSUER, CLIENT_ID, 0, Arc::new(cache))
}
