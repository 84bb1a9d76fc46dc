//! Transport-level HTTP layers.
//!
//! Applied around every route, outermost first:
//! 1. `SetRequestId` assigns a UUID v4 `x-request-id` when the caller sent none
//! 2. `Trace` opens an `http_request` span tagged with that id
//! 3. `CORS` from the configured origins
//! 4. `Timeout` answers 408 once `request_timeout` elapses
//! 5. `PropagateRequestId` echoes the id on the response

use axum::body::Body;
use axum::http::header::{HeaderName, CONTENT_DISPOSITION};
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::Span;

use super::config::NetworkConfig;

const REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

/// Wraps `router` in the transport layers. `Router::layer` wraps outward, so
/// layers are added innermost first.
#[must_use]
pub fn apply_http_layers(router: Router, config: &NetworkConfig) -> Router {
    router
        .layer(PropagateRequestIdLayer::new(REQUEST_ID))
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            config.request_timeout,
        ))
        .layer(build_cors_layer(&config.cors_origins))
        .layer(TraceLayer::new_for_http().make_span_with(request_span))
        .layer(SetRequestIdLayer::new(REQUEST_ID, MakeRequestUuid))
}

fn request_span(req: &Request<Body>) -> Span {
    let request_id = req
        .headers()
        .get(&REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    tracing::info_span!(
        "http_request",
        method = %req.method(),
        uri = %req.uri().path(),
        request_id = %request_id,
    )
}

/// A wildcard `"*"` allows any origin; otherwise each entry is parsed into
/// an explicit allowlist and unparseable entries are skipped.
fn build_cors_layer(origins: &[String]) -> CorsLayer {
    let allow_origin = if origins.iter().any(|o| o == "*") {
        AllowOrigin::any()
    } else {
        let parsed: Vec<_> = origins.iter().filter_map(|o| o.parse().ok()).collect();
        AllowOrigin::list(parsed)
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any)
        .expose_headers([CONTENT_DISPOSITION, REQUEST_ID])
}
