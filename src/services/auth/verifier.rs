use jsonwebtoken::{Algorithm, Validation};
use std::{error::Error as StdError, fmt, sync::Arc};

use crate::services::auth::claims::{AccessTokenClaims, Claims};
use crate::services::auth::jwks::KeySetError;
use crate::services::auth::key_cache::KeyCache;

// Asymmetric algorithms identity providers sign access tokens with.
// HMAC and `none` are never accepted.
const ALLOWED_ALGORITHMS: [Algorithm; 6] = [
    Algorithm::RS256,
    Algorithm::RS384,
    Algorithm::RS512,
    Algorithm::ES256,
    Algorithm::ES384,
    Algorithm::EdDSA,
];

const ACCESS_TOKEN_USE: &str = "access";

// Errors returned by access-token verification + strict claim validation.
#[derive(Debug)]
pub enum InvalidToken {
    Malformed(jsonwebtoken::errors::Error),
    UnsupportedAlgorithm(Algorithm),
    MissingKeyId,
    UnknownKeyId(String),
    KeySet(KeySetError),
    Jwt(jsonwebtoken::errors::Error),
    WrongTokenUse(Option<String>),
    ClientMismatch,
    EmptyClaim(&'static str),
    InvalidClaim(&'static str),
}

impl fmt::Display for InvalidToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Malformed(e) => write!(f, "malformed token: {}", e),
            Self::UnsupportedAlgorithm(alg) => write!(f, "unsupported algorithm: {:?}", alg),
            Self::MissingKeyId => write!(f, "missing 'kid' header"),
            Self::UnknownKeyId(kid) => write!(f, "unknown signing key '{}'", kid),
            Self::KeySet(e) => write!(f, "signing keys unavailable: {}", e),
            Self::Jwt(e) => write!(f, "jwt verification failed: {}", e),
            Self::WrongTokenUse(Some(used)) => {
                write!(f, "expected an access token, got token_use '{}'", used)
            }
            Self::WrongTokenUse(None) => write!(f, "missing 'token_use' claim"),
            Self::ClientMismatch => write!(f, "token was not issued for this client"),
            Self::EmptyClaim(name) => write!(f, "empty '{}' claim", name),
            Self::InvalidClaim(name) => write!(f, "invalid '{}' claim", name),
        }
    }
}

impl StdError for InvalidToken {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            Self::Malformed(e) | Self::Jwt(e) => Some(e),
            Self::KeySet(e) => Some(e),
            _ => None,
        }
    }
}

/// Access-token verifier for a hosted identity provider (JWKS-published keys).
///
/// Checks, in order: header shape and `alg`, signing key by `kid`, signature,
/// `exp` and `nbf` (with leeway, zero by default), `iss`, `token_use == "access"`, client id, non-empty `sub`.
#[derive(Clone)]
pub struct TokenVerifier {
    issuer: String,
    client_id: String,
    leeway_seconds: u64,
    keys: Arc<KeyCache>,
}

impl fmt::Debug for TokenVerifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenVerifier")
            .field("issuer", &self.issuer)
            .field("client_id", &self.client_id)
            .field("leeway_seconds", &self.leeway_seconds)
            .field("keys", &self.keys)
            .finish()
    }
}

impl TokenVerifier {
    pub fn new(
        issuer: impl Into<String>,
        client_id: impl Into<String>,
        leeway_seconds: u64,
        keys: Arc<KeyCache>,
    ) -> Self {
        Self {
            issuer: issuer.into(),
            client_id: client_id.into(),
            leeway_seconds,
            keys,
        }
    }

    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    pub fn key_cache(&self) -> &KeyCache {
        &self.keys
    }

    /// Verify a bearer token and convert its payload into `Claims`.
    ///
    /// This is the entry-point for the access middleware. Any failure yields
    /// `InvalidToken`; partial claims are never returned.
    pub async fn verify(&self, token: &str) -> Result<Claims, InvalidToken> {
        let header = jsonwebtoken::decode_header(token).map_err(InvalidToken::Malformed)?;

        if !ALLOWED_ALGORITHMS.contains(&header.alg) {
            return Err(InvalidToken::UnsupportedAlgorithm(header.alg));
        }

        let kid = header.kid.ok_or(InvalidToken::MissingKeyId)?;
        let key = self
            .keys
            .get(&kid)
            .await
            .map_err(InvalidToken::KeySet)?
            .ok_or_else(|| InvalidToken::UnknownKeyId(kid.clone()))?;

        let data = jsonwebtoken::decode::<AccessTokenClaims>(
            token,
            &key,
            &self.validation(header.alg),
        )
        .map_err(InvalidToken::Jwt)?;
        let claims = data.claims;

        if claims.token_use.as_deref() != Some(ACCESS_TOKEN_USE) {
            return Err(InvalidToken::WrongTokenUse(claims.token_use));
        }

        if !self.client_matches(&claims) {
            return Err(InvalidToken::ClientMismatch);
        }

        let claims = Claims::try_from(claims)?;
        tracing::debug!(kid = %kid, subject = %claims.subject, "verified access token");
        Ok(claims)
    }

    fn validation(&self, alg: Algorithm) -> Validation {
        let mut validation = Validation::new(alg);
        validation.set_issuer(&[&self.issuer]);
        validation.set_required_spec_claims(&["exp", "iss", "sub"]);
        // Client id is checked against `client_id` or `aud` in `client_matches`.
        validation.validate_aud = false;
        validation.validate_nbf = true;
        validation.leeway = self.leeway_seconds;
        validation
    }

    fn client_matches(&self, claims: &AccessTokenClaims) -> bool {
        if claims.client_id.as_deref() == Some(self.client_id.as_str()) {
            return true;
        }

        claims
            .aud
            .as_ref()
            .is_some_and(|aud| aud.contains(&self.client_id))
    }
}
