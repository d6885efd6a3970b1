//! Upstream forwarding: the one place the secret token exists.
//!
//! `GET /api/<path>?<query>` forwards path and query verbatim to the
//! upstream API with the `token` parameter always overwritten server-side.
//! Whatever token a client supplies is dropped, never forwarded. Successful
//! responses are relayed with short shared-cache headers; upstream errors
//! are relayed with their real status and a structured payload instead of a
//! blanket 500.

use std::sync::Arc;

use axum::body::Body;
use axum::extract::{Path, RawQuery, State};
use axum::http::{header, HeaderValue, Method, StatusCode};
use axum::response::{IntoResponse, Json, Response};
use axum::routing::get;
use axum::Router;
use serde::Deserialize;
use tower_http::cors::{Any, CorsLayer};

use crate::settings::Settings;

/// Shared handler state: settings plus one pooled upstream client.
pub struct ProxyState {
    pub settings: Settings,
    pub client: reqwest::Client,
}

impl ProxyState {
    pub fn new(settings: Settings) -> Self {
        let client = reqwest::Client::builder()
            .timeout(settings.upstream_timeout)
            .user_agent("quotedeck-proxy/0.1.0")
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self { settings, client }
    }
}

pub fn router(state: Arc<ProxyState>) -> Router {
    // The CORS layer owns preflight; success responses additionally carry an
    // unconditional allow-origin header for clients that skip preflight.
    Router::new()
        .route("/healthz", get(healthz))
        .route("/api/*path", get(forward))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods([Method::GET, Method::OPTIONS]),
        )
        .with_state(state)
}

async fn healthz() -> &'static str {
    "ok"
}

async fn forward(
    State(state): State<Arc<ProxyState>>,
    Path(path): Path<String>,
    RawQuery(query): RawQuery,
) -> Response {
    let url = build_upstream_url(&state.settings, &PathSpec::Single(path), query.as_deref());

    let upstream = match state.client.get(&url).send().await {
        Ok(upstream) => upstream,
        Err(err) => return transport_failure(&err),
    };

    let status = upstream.status().as_u16();
    let body = match upstream.text().await {
        Ok(body) => body,
        Err(err) => return transport_failure(&err),
    };

    if (200..300).contains(&status) {
        success_relay(&state.settings, status, body)
    } else {
        error_relay(status, body)
    }
}

/// Incoming path parameter, tolerated as either a single string or an
/// ordered list of segments depending on the calling convention.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum PathSpec {
    Single(String),
    Segments(Vec<String>),
}

impl PathSpec {
    pub fn join(&self) -> String {
        match self {
            Self::Single(path) => path.trim_start_matches('/').to_owned(),
            Self::Segments(segments) => segments.join("/"),
        }
    }
}

/// Builds the upstream URL: base + path, client query preserved verbatim
/// except for any `token` pair, which is replaced with the trusted key.
pub fn build_upstream_url(settings: &Settings, path: &PathSpec, query: Option<&str>) -> String {
    let base = settings.upstream_base.trim_end_matches('/');
    let mut params: Vec<String> = query
        .unwrap_or("")
        .split('&')
        .filter(|pair| !pair.is_empty() && !is_token_pair(pair))
        .map(str::to_owned)
        .collect();
    params.push(format!(
        "token={}",
        urlencoding::encode(settings.api_key())
    ));

    format!("{}/{}?{}", base, path.join(), params.join("&"))
}

fn is_token_pair(pair: &str) -> bool {
    pair.split('=').next() == Some("token")
}

fn success_relay(settings: &Settings, status: u16, body: String) -> Response {
    let mut response = Response::new(Body::from(body));
    *response.status_mut() = StatusCode::from_u16(status).unwrap_or(StatusCode::OK);

    let headers = response.headers_mut();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/json"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_ORIGIN,
        HeaderValue::from_static("*"),
    );
    if let Ok(value) = HeaderValue::from_str(&settings.cache_control_value()) {
        headers.insert(header::CACHE_CONTROL, value);
    }

    response
}

fn error_relay(status: u16, body: String) -> Response {
    if status == StatusCode::TOO_MANY_REQUESTS.as_u16() {
        tracing::debug!(status, "upstream rate limit relayed");
    } else {
        tracing::warn!(status, "upstream error relayed");
    }

    let code = StatusCode::from_u16(status).unwrap_or(StatusCode::BAD_GATEWAY);
    (
        code,
        Json(serde_json::json!({ "status": status, "error": body })),
    )
        .into_response()
}

fn transport_failure(err: &dyn std::fmt::Display) -> Response {
    tracing::error!(%err, "failed to reach upstream");
    (
        StatusCode::BAD_GATEWAY,
        Json(serde_json::json!({ "error": "upstream request failed" })),
    )
        .into_response()
}
