use chrono::{DateTime, TimeZone, Utc};
use serde::Deserialize;

use crate::services::auth::verifier::InvalidToken;

/// Access token (JWT) payload as issued by the identity provider.
///
/// NOTE:
/// - Cognito access tokens carry the app client in `client_id` and have no `aud`;
///   other providers put the client id in `aud` (string or array).
/// - `iss` / `exp` are checked by `jsonwebtoken::Validation`, the rest by `TokenVerifier`.
#[derive(Debug, Clone, Deserialize)]
pub struct AccessTokenClaims {
    pub iss: String,
    pub sub: String,
    pub exp: i64,

    #[serde(default)]
    pub aud: Option<Audience>,
    #[serde(default)]
    pub client_id: Option<String>,
    #[serde(default)]
    pub token_use: Option<String>,

    #[serde(default, rename = "cognito:groups")]
    pub groups: Option<Vec<String>>,
    #[serde(default)]
    pub role: Option<String>,

    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub scope: Option<String>,
    #[serde(default)]
    pub jti: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Audience {
    Single(String),
    Many(Vec<String>),
}

impl Audience {
    pub fn contains(&self, value: &str) -> bool {
        match self {
            Audience::Single(aud) => aud == value,
            Audience::Many(auds) => auds.iter().any(|aud| aud == value),
        }
    }
}

/// Verified claims handed to the rest of the application.
///
/// Lives only for one request (stored in request extensions by the access middleware).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Claims {
    pub subject: String,
    pub groups: Vec<String>,
    pub role: Option<String>,

    pub username: Option<String>,
    pub client_id: Option<String>,
    pub scopes: Vec<String>,
    pub token_id: Option<String>,
    pub expires_at: DateTime<Utc>,
}

impl Claims {
    /// Group membership OR the single `role` claim grants `role`.
    pub fn has_role(&self, role: &str) -> bool {
        self.groups.iter().any(|group| group == role) || self.role.as_deref() == Some(role)
    }
}

impl TryFrom<AccessTokenClaims> for Claims {
    type Error = InvalidToken;

    fn try_from(value: AccessTokenClaims) -> Result<Self, Self::Error> {
        if value.sub.trim().is_empty() {
            return Err(InvalidToken::EmptyClaim("sub"));
        }

        let expires_at = Utc
            .timestamp_opt(value.exp, 0)
            .single()
            .ok_or(InvalidToken::InvalidClaim("exp"))?;

        let scopes = value
            .scope
            .as_deref()
            .unwrap_or_default()
            .split_whitespace()
            .map(str::to_string)
            .collect();

        Ok(Self {
            subject: value.sub,
            groups: value.groups.unwrap_or_default(),
            role: value.role,
            username: value.username,
            client_id: value.client_id,
            scopes,
            token_id: value.jti,
            expires_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn claims(groups: &[&str], role: Option<&str>) -> Claims {
        Claims {
            subject: "alice".into(),
            groups: groups.iter().map(|g| g.to_string()).collect(),
            role: role.map(str::to_string),
            username: None,
            client_id: None,
            scopes: Vec::new(),
            token_id: None,
            expires_at: Utc::now(),
        }
    }

    #[test]
    fn role_matches_via_group_or_role_claim() {
        assert!(claims(&["admin"], None).has_role("admin"));
        assert!(claims(&[], Some("admin")).has_role("admin"));
        assert!(claims(&["editors"], Some("admin")).has_role("admin"));
        assert!(!claims(&["editors"], Some("viewer")).has_role("admin"));
        assert!(!claims(&[], None).has_role("admin"));
    }

    #[test]
    fn cognito_payload_maps_to_claims() {
        let raw: AccessTokenClaims = serde_json::from_value(json!({
            "iss": "https://cognito-idp.eu-west-2.amazonaws.com/pool",
            "sub": "8f2c-alice",
            "exp": 1_900_000_000,
            "client_id": "client-1",
            "token_use": "access",
            "cognito:groups": ["admin", "staff"],
            "scope": "openid email",
            "username": "alice",
            "jti": "t-1"
        }))
        .unwrap();

        let claims = Claims::try_from(raw).unwrap();
        assert_eq!(claims.subject, "8f2c-alice");
        assert_eq!(claims.groups, vec!["admin", "staff"]);
        assert_eq!(claims.scopes, vec!["openid", "email"]);
        assert_eq!(claims.client_id.as_deref(), Some("client-1"));
        assert_eq!(claims.expires_at.timestamp(), 1_900_000_000);
    }

    #[test]
    fn audience_accepts_string_or_array() {
        let single: Audience = serde_json::from_value(json!("client-1")).unwrap();
        let many: Audience = serde_json::from_value(json!(["other", "client-1"])).unwrap();

        assert!(single.contains("client-1"));
        assert!(many.contains("client-1"));
        assert!(!many.contains("client-2"));
    }

    #[test]
    fn blank_subject_is_rejected() {
        let raw: AccessTokenClaims = serde_json::from_value(json!({
            "iss": "https://idp.example.com",
            "sub": "  ",
            "exp": 1_900_000_000
        }))
        .unwrap();

        assert!(matches!(
            Claims::try_from(raw),
            Err(InvalidToken::EmptyClaim("sub"))
        ));
    }
}
