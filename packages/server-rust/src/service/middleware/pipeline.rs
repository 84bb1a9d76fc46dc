//! Chain composition: combines the stages into a single service stack.

use std::sync::Arc;
use std::time::Duration;

use imgpipe_core::{ImageError, ImageRequest, ImageResponse, OperationDispatcher};
use tower::{Service, ServiceBuilder};

use super::auth::AuthLayer;
use super::logging::LoggingLayer;
use super::timeout::TimeoutLayer;
use crate::service::config::ServerConfig;
use crate::service::handler::ImageHandler;
use crate::service::operation::ImageFuture;
use crate::traits::{CredentialVerifier, LogSink};

/// Builds the handling chain for one endpoint by wrapping [`ImageHandler`]
/// with the stage layers.
///
/// Layer order (outermost to innermost):
/// 1. `LoggingLayer` -- one entry per call, including auth failures
/// 2. `AuthLayer` -- rejects missing or invalid credentials
/// 3. `TimeoutLayer` -- bounds the transform by `operation_timeout_ms`
#[must_use]
pub fn build_image_chain(
    dispatcher: Arc<OperationDispatcher>,
    verifier: Arc<dyn CredentialVerifier>,
    sink: Arc<dyn LogSink>,
    endpoint: impl Into<Arc<str>>,
    config: &ServerConfig,
) -> impl Service<ImageRequest, Response = ImageResponse, Error = ImageError, Future = ImageFuture>
       + Clone
       + Send {
    ServiceBuilder::new()
        .layer(LoggingLayer::new(sink, endpoint))
        .layer(AuthLayer::new(verifier))
        .layer(TimeoutLayer::new(Duration::from_millis(
            config.operation_timeout_ms,
        )))
        .service(ImageHandler::new(dispatcher))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use async_trait::async_trait;
    use imgpipe_core::{
        FitMode, Identity, LogOutcome, OperationParams, OutputFormat, PipelineParams,
        PipelineStep, ResizeParams, ANONYMOUS,
    };
    use serde_json::json;
    use tower::ServiceExt;

    use super::*;
    use crate::sink::MemorySink;

    struct StaticVerifier;

    #[async_trait]
    impl CredentialVerifier for StaticVerifier {
        async fn verify(&self, token: &str) -> Result<Identity, ImageError> {
            match token {
                "good" => Ok(Identity {
                    subject_id: "u-1".into(),
                    email: "ada@example.com".into(),
                }),
                _ => Err(ImageError::Authentication("Invalid or expired token".into())),
            }
        }
    }

    fn png(width: u32, height: u32) -> Vec<u8> {
        let img = image::RgbImage::from_fn(width, height, |x, y| {
            image::Rgb([(x % 256) as u8, (y % 256) as u8, 40])
        });
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, image::ImageFormat::Png).unwrap();
        out.into_inner()
    }

    fn chain(
        sink: Arc<MemorySink>,
        endpoint: &str,
    ) -> impl Service<ImageRequest, Response = ImageResponse, Error = ImageError, Future = ImageFuture>
           + Clone
           + Send {
        build_image_chain(
            Arc::new(OperationDispatcher::default()),
            Arc::new(StaticVerifier),
            sink,
            endpoint.to_string(),
            &ServerConfig::default(),
        )
    }

    fn resize_req(width: u32) -> ImageRequest {
        ImageRequest::new(
            png(64, 32),
            OperationParams::Resize(ResizeParams {
                width: Some(width),
                height: None,
                fit: FitMode::Inside,
            }),
        )
    }

    #[tokio::test]
    async fn authenticated_call_transforms_and_logs_user() {
        let sink = Arc::new(MemorySink::new());
        let resp = chain(sink.clone(), "/images/resize")
            .oneshot(resize_req(32).with_token("good"))
            .await
            .unwrap();

        let out = image::load_from_memory(&resp.bytes).unwrap();
        assert_eq!((out.width(), out.height()), (32, 16));

        let entries = sink.entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].user, "ada@example.com");
        assert_eq!(entries[0].result, LogOutcome::Success);
        assert_eq!(entries[0].params["width"], json!(32));
    }

    #[tokio::test]
    async fn missing_token_is_logged_as_anonymous_failure() {
        let sink = Arc::new(MemorySink::new());
        let err = chain(sink.clone(), "/images/resize")
            .oneshot(resize_req(32))
            .await
            .unwrap_err();

        assert_eq!(
            err,
            ImageError::Authentication("Authentication token required".into())
        );
        let entries = sink.entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].user, ANONYMOUS);
        assert_eq!(entries[0].message.as_deref(), Some("Authentication token required"));
    }

    #[tokio::test]
    async fn pipeline_failure_logs_authenticated_user() {
        let sink = Arc::new(MemorySink::new());
        let req = ImageRequest::new(
            png(16, 16),
            OperationParams::Pipeline(PipelineParams {
                operations: vec![
                    PipelineStep::new("resize", json!({"width": 8})),
                    PipelineStep::new("rotate", json!({"angle": 45})),
                ],
            }),
        )
        .with_token("good");

        let err = chain(sink.clone(), "/images/pipeline")
            .oneshot(req)
            .await
            .unwrap_err();
        assert_eq!(
            err,
            ImageError::Validation("Angle must be 90, 180, or 270 degrees".into())
        );
        let entries = sink.entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].user, "ada@example.com");
        assert_eq!(entries[0].result, LogOutcome::Error);
    }

    #[tokio::test]
    async fn format_chain_reports_requested_format() {
        let sink = Arc::new(MemorySink::new());
        let req = ImageRequest::new(
            png(8, 8),
            OperationParams::Format(imgpipe_core::FormatParams {
                format: OutputFormat::Png,
            }),
        )
        .with_token("good");

        let resp = chain(sink, "/images/format").oneshot(req).await.unwrap();
        assert_eq!(resp.format, OutputFormat::Png);
        assert!(resp.filename.ends_with(".png"));
    }
}
