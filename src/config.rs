/*
 * Responsibility
 * - 環境変数や設定の読み込み (PORT, CORS 許可、Auth 設定など)
 * - 設定値のバリデーション (不足なら起動失敗)
 */
use std::fmt;
use std::net::SocketAddr;
use std::str::FromStr;

use url::Url;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnv {
    Development,
    Production,
}

impl AppEnv {
    fn parse(raw: Option<&str>) -> Self {
        match raw.unwrap_or("development").to_ascii_lowercase().as_str() {
            "production" | "prod" => Self::Production,
            _ => Self::Development,
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum ConfigError {
    Missing(&'static str),
    Invalid(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Missing(key) => write!(f, "missing configuration: {}", key),
            ConfigError::Invalid(key) => write!(f, "invalid configuration: {}", key),
        }
    }
}

impl std::error::Error for ConfigError {}

#[derive(Clone, Debug)]
pub struct Config {
    pub addr: SocketAddr,

    pub app_env: AppEnv,
    pub cors_allowed_origins: Vec<String>,
    pub request_timeout_seconds: u64,
    pub request_body_limit_bytes: usize,

    pub auth_issuer: String,
    pub auth_client_id: String,
    pub jwks_url: String,
    pub jwks_cache_ttl_seconds: u64,
    pub jwks_min_refresh_seconds: u64,
    pub jwks_fetch_timeout_seconds: u64,
    pub access_token_leeway_seconds: u64,

    // Role (group or `role` claim) allowed to delete films
    pub admin_role: String,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the config from an arbitrary key lookup (env vars in production, a map in tests).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let port: u16 = match non_empty("PORT") {
            Some(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid("PORT"))?,
            None => 3000,
        };

        let addr: SocketAddr = SocketAddr::from_str(&format!("0.0.0.0:{}", port))
            .map_err(|_| ConfigError::Invalid("PORT"))?;

        let app_env = AppEnv::parse(lookup("APP_ENV").as_deref());

        let cors_allowed_origins = lookup("CORS_ALLOWED_ORIGINS")
            .unwrap_or_default()
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>();

        let auth_issuer = match non_empty("AUTH_ISSUER") {
            Some(issuer) => issuer.trim().trim_end_matches('/').to_string(),
            None => {
                let pool_id = non_empty("COGNITO_USER_POOL_ID")
                    .ok_or(ConfigError::Missing("AUTH_ISSUER"))?;
                cognito_issuer(pool_id.trim(), non_empty("COGNITO_REGION").as_deref())?
            }
        };
        Url::parse(&auth_issuer).map_err(|_| ConfigError::Invalid("AUTH_ISSUER"))?;

        let auth_client_id = non_empty("AUTH_CLIENT_ID")
            .or_else(|| non_empty("COGNITO_CLIENT_ID"))
            .map(|v| v.trim().to_string())
            .ok_or(ConfigError::Missing("AUTH_CLIENT_ID"))?;

        let jwks_url = non_empty("AUTH_JWKS_URL")
            .map(|v| v.trim().to_string())
            .unwrap_or_else(|| format!("{}/.well-known/jwks.json", auth_issuer));
        Url::parse(&jwks_url).map_err(|_| ConfigError::Invalid("AUTH_JWKS_URL"))?;

        let seconds = |key: &'static str, default: u64| -> Result<u64, ConfigError> {
            match non_empty(key) {
                Some(raw) => raw.trim().parse::<u64>().map_err(|_| ConfigError::Invalid(key)),
                None => Ok(default),
            }
        };

        let jwks_cache_ttl_seconds = seconds("JWKS_CACHE_TTL_SECONDS", 3600)?;
        let jwks_min_refresh_seconds = seconds("JWKS_MIN_REFRESH_SECONDS", 30)?;
        let jwks_fetch_timeout_seconds = seconds("JWKS_FETCH_TIMEOUT_SECONDS", 5)?;
        let access_token_leeway_seconds = seconds("ACCESS_TOKEN_LEEWAY_SECONDS", 0)?;
        let request_timeout_seconds = seconds("REQUEST_TIMEOUT_SECONDS", 30)?;

        let request_body_limit_bytes = match non_empty("REQUEST_BODY_LIMIT_BYTES") {
            Some(raw) => raw
                .trim()
                .parse::<usize>()
                .map_err(|_| ConfigError::Invalid("REQUEST_BODY_LIMIT_BYTES"))?,
            None => 1024 * 1024,
        };

        let admin_role = non_empty("AUTH_ADMIN_ROLE")
            .map(|v| v.trim().to_string())
            .unwrap_or_else(|| "admin".to_string());

        Ok(Self {
            addr,
            app_env,
            cors_allowed_origins,
            request_timeout_seconds,
            request_body_limit_bytes,
            auth_issuer,
            auth_client_id,
            jwks_url,
            jwks_cache_ttl_seconds,
            jwks_min_refresh_seconds,
            jwks_fetch_timeout_seconds,
            access_token_leeway_seconds,
            admin_role,
        })
    }
}

/// Issuer URL of a Cognito user pool. Pool ids are prefixed with their region
/// (`eu-west-2_AbCdEf`), which is used unless a region is given explicitly.
fn cognito_issuer(pool_id: &str, region: Option<&str>) -> Result<String, ConfigError> {
    let region = match region {
        Some(region) => region.trim(),
        None => pool_id
            .split_once('_')
            .map(|(region, _)| region)
            .filter(|region| !region.is_empty())
            .ok_or(ConfigError::Invalid("COGNITO_USER_POOL_ID"))?,
    };

    Ok(format!(
        "https://cognito-idp.{}.amazonaws.com/{}",
        region, pool_id
    ))
}
