//! Shared harness: the full router, backed by a JWKS served from httpmock
//! and tokens minted by `jwt-test-support`.
#![allow(dead_code)]

use std::sync::Arc;

use axum::Router;
use axum::body::{Body, Bytes, to_bytes};
use axum::http::{HeaderMap, Request, StatusCode, header};
use film_api::app::build_router;
use film_api::config::Config;
use film_api::repos::InMemoryFilmRepo;
use film_api::services::auth::build_token_verifier;
use film_api::state::AppState;
use httpmock::prelude::*;
use serde_json::{Value, json};
use tower::ServiceExt;

pub use jwt_test_support::TestSigner;

pub const CLIENT_ID: &str = "films-web";
pub const KID: &str = "key-1";

pub struct TestApp {
    pub router: Router,
    pub films: Arc<InMemoryFilmRepo>,
    pub signer: TestSigner,
    pub issuer: String,
    pub server: MockServer,
}

impl TestApp {
    pub async fn spawn() -> Self {
        Self::spawn_with(&[]).await
    }

    /// Start the app with extra config entries layered over the defaults.
    pub async fn spawn_with(extra: &[(&str, &str)]) -> Self {
        let signer = TestSigner::new(7, KID);
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/pool/.well-known/jwks.json");
                then.status(200).json_body(TestSigner::jwks(&[&signer]));
            })
            .await;

        let issuer = server.url("/pool");
        let mut vars: Vec<(String, String)> = vec![
            ("AUTH_ISSUER".to_string(), issuer.clone()),
            ("AUTH_CLIENT_ID".to_string(), CLIENT_ID.to_string()),
        ];
        vars.extend(extra.iter().map(|(k, v)| (k.to_string(), v.to_string())));

        let config = Config::from_lookup(|key| {
            vars.iter()
                .rev()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.clone())
        })
        .expect("config");

        let films = Arc::new(InMemoryFilmRepo::new());
        let verifier = build_token_verifier(&config).expect("verifier");
        let state = AppState::new(verifier, films.clone());

        Self {
            router: build_router(state, &config),
            films,
            signer,
            issuer,
            server,
        }
    }

    /// Cognito-shaped access token claims for `sub`, valid for ten minutes.
    pub fn claims(&self, sub: &str) -> Value {
        jwt_test_support::access_claims(&self.issuer, CLIENT_ID, sub)
    }

    pub fn token(&self, sub: &str) -> String {
        self.signer.sign(&self.claims(sub))
    }

    pub fn token_in_groups(&self, sub: &str, groups: &[&str]) -> String {
        let mut claims = self.claims(sub);
        claims["cognito:groups"] = json!(groups);
        self.signer.sign(&claims)
    }

    pub async fn send(&self, req: Request<Body>) -> TestResponse {
        let response = self.router.clone().oneshot(req).await.expect("infallible");
        let status = response.status();
        let headers = response.headers().clone();
        let body = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("read body");

        TestResponse {
            status,
            headers,
            body,
        }
    }

    pub async fn list(&self, token: &str) -> Vec<Value> {
        let res = self.send(get("/films", Some(token))).await;
        assert_eq!(res.status, StatusCode::OK);
        res.json().as_array().cloned().expect("array body")
    }
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl TestResponse {
    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body).expect("json body")
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn error_code(&self) -> String {
        self.json()["error"]["code"]
            .as_str()
            .expect("error code")
            .to_string()
    }
}

fn with_auth(builder: axum::http::request::Builder, token: Option<&str>) -> axum::http::request::Builder {
    match token {
        Some(token) => builder.header(header::AUTHORIZATION, format!("Bearer {token}")),
        None => builder,
    }
}

pub fn get(uri: &str, token: Option<&str>) -> Request<Body> {
    with_auth(Request::builder().method("GET").uri(uri), token)
        .body(Body::empty())
        .unwrap()
}

pub fn post_json(uri: &str, token: Option<&str>, body: &str) -> Request<Body> {
    with_auth(Request::builder().method("POST").uri(uri), token)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn delete(uri: &str, token: Option<&str>) -> Request<Body> {
    with_auth(Request::builder().method("DELETE").uri(uri), token)
        .body(Body::empty())
        .unwrap()
}
