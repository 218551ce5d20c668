//! Token minting for tests.
//!
//! A deterministic Ed25519 key signs Cognito-shaped access tokens; its public
//! half is published as an OKP JWK so it can be served from a JWKS document.

use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use ed25519_dalek::SigningKey;
use ed25519_dalek::pkcs8::EncodePrivateKey;
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use serde_json::{Value, json};

/// Ed25519 signer derived from `[seed; 32]`. Same seed, same key.
pub struct TestSigner {
    kid: String,
    encoding: EncodingKey,
    x: String,
}

impl TestSigner {
    pub fn new(seed: u8, kid: &str) -> Self {
        let signing = SigningKey::from_bytes(&[seed; 32]);
        let der = signing.to_pkcs8_der().expect("pkcs8 der");

        Self {
            kid: kid.to_string(),
            encoding: EncodingKey::from_ed_der(der.as_bytes()),
            x: URL_SAFE_NO_PAD.encode(signing.verifying_key().to_bytes()),
        }
    }

    pub fn jwk(&self) -> Value {
        json!({
            "kty": "OKP",
            "crv": "Ed25519",
            "use": "sig",
            "alg": "EdDSA",
            "kid": self.kid,
            "x": self.x,
        })
    }

    /// JWKS document publishing every signer's public key.
    pub fn jwks(signers: &[&TestSigner]) -> Value {
        json!({ "keys": signers.iter().map(|s| s.jwk()).collect::<Vec<_>>() })
    }

    pub fn sign(&self, claims: &Value) -> String {
        self.sign_with_kid(Some(&self.kid), claims)
    }

    pub fn sign_with_kid(&self, kid: Option<&str>, claims: &Value) -> String {
        let mut header = Header::new(Algorithm::EdDSA);
        header.kid = kid.map(str::to_string);
        jsonwebtoken::encode(&header, claims, &self.encoding).expect("sign token")
    }
}

/// Access token payload for `sub`, as Cognito issues it, valid for ten minutes.
pub fn access_claims(issuer: &str, client_id: &str, sub: &str) -> Value {
    let now = chrono::Utc::now().timestamp();
    json!({
        "iss": issuer,
        "sub": sub,
        "client_id": client_id,
        "token_use": "access",
        "scope": "openid profile",
        "iat": now,
        "exp": now + 600,
    })
}
