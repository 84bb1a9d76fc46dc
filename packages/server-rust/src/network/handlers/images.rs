//! `POST /images/{operation}`: the image operation endpoint.
//!
//! The body is the raw image, parameters come from the query string and the
//! credential from `Authorization: Bearer <token>`. Each call builds the
//! handling chain for its endpoint and invokes it once.

use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use bytes::Bytes;
use imgpipe_core::{ErrorKind, ImageError, ImageResponse};
use serde_json::json;
use tower::ServiceExt;

use super::AppState;
use crate::service::{bearer_token, build_image_chain, classify, endpoint_for, query_to_params};

/// Runs one image operation. An empty body is rejected before the chain
/// is built.
///
/// # Errors
///
/// Returns an [`ApiError`] carrying the classification or chain failure.
pub async fn image_handler(
    State(state): State<AppState>,
    Path(operation): Path<String>,
    Query(query): Query<HashMap<String, String>>,
    headers: axum::http::HeaderMap,
    body: Bytes,
) -> Result<Response, ApiError> {
    if body.is_empty() {
        return Err(ImageError::Validation("No image file provided".into()).into());
    }
    let params = query_to_params(&query);
    let (kind, request) = classify(
        &state.dispatcher,
        &operation,
        &params,
        body,
        bearer_token(&headers),
    )?;

    let chain = build_image_chain(
        Arc::clone(&state.dispatcher),
        Arc::clone(&state.verifier),
        Arc::clone(&state.sink),
        endpoint_for(kind),
        &state.server,
    );
    let response = chain.oneshot(request).await?;
    Ok(image_response(response))
}

fn image_response(response: ImageResponse) -> Response {
    let disposition = format!("attachment; filename=\"{}\"", response.filename);
    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, response.format.content_type().to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        response.bytes,
    )
        .into_response()
}

// ---------------------------------------------------------------------------
// ApiError
// ---------------------------------------------------------------------------

/// Maps an [`ImageError`] to an HTTP response by taxonomy kind.
#[derive(Debug)]
pub struct ApiError(pub ImageError);

impl From<ImageError> for ApiError {
    fn from(err: ImageError) -> Self {
        Self(err)
    }
}

impl ApiError {
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self.0.kind() {
            ErrorKind::Authentication => StatusCode::UNAUTHORIZED,
            ErrorKind::Validation => StatusCode::BAD_REQUEST,
            ErrorKind::UnsupportedOperation => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            ErrorKind::Processing => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = json!({
            "error": self.0.to_string(),
            "code": self.0.kind().as_str(),
            "timestamp": chrono::Utc::now().to_rfc3339(),
        });
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn taxonomy_maps_to_status_codes() {
        let cases = [
            (ImageError::Authentication("x".into()), StatusCode::UNAUTHORIZED),
            (ImageError::Validation("x".into()), StatusCode::BAD_REQUEST),
            (
                ImageError::UnsupportedOperation("x".into()),
                StatusCode::UNSUPPORTED_MEDIA_TYPE,
            ),
            (ImageError::Processing("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
            (
                ImageError::Timeout { timeout_ms: 5 },
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(ApiError(err).status(), status);
        }
    }

    #[tokio::test]
    async fn error_body_carries_code_and_message() {
        let response = ApiError(ImageError::Validation("angle is required".into())).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"], "angle is required");
        assert_eq!(json["code"], "VALIDATION_ERROR");
        assert!(json["timestamp"].is_string());
    }
}
