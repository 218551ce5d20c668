//! Security-related response headers for a JSON API.
//!
//! Responsibility:
//! - Clickjacking protection
//! - MIME sniffing protection
//! - Referrer leakage control
//! - Cross-origin isolation for API responses
//! - HSTS (production only; development runs over plain HTTP)

use axum::Router;
use axum::http::header::{HeaderName, HeaderValue};
use tower_http::set_header::SetResponseHeaderLayer;

use crate::config::Config;

const COMMON_HEADERS: &[(&str, &str)] = &[
    ("x-frame-options", "DENY"),
    (
        "content-security-policy",
        "default-src 'none'; frame-ancestors 'none'",
    ),
    ("x-content-type-options", "nosniff"),
    ("referrer-policy", "no-referrer"),
    ("cross-origin-opener-policy", "same-origin"),
    ("cross-origin-resource-policy", "same-site"),
    ("x-dns-prefetch-control", "off"),
    ("x-permitted-cross-domain-policies", "none"),
    (
        "permissions-policy",
        "camera=(), microphone=(), geolocation=()",
    ),
];

const HSTS: (&str, &str) = ("strict-transport-security", "max-age=15552000; includeSubDomains");

/// Apply common security headers to all responses.
///
/// Headers already set by a handler are left untouched.
pub fn apply(router: Router, config: &Config) -> Router {
    let mut headers: Vec<(&str, &str)> = COMMON_HEADERS.to_vec();
    if config.app_env.is_production() {
        headers.push(HSTS);
    }

    headers.into_iter().fold(router, |router, (name, value)| {
        router.layer(SetResponseHeaderLayer::if_not_present(
            HeaderName::from_static(name),
            HeaderValue::from_static(value),
        ))
    })
}
