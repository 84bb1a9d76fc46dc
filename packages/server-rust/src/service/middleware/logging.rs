//! Logging stage.
//!
//! Emits exactly one [`LogEntry`] per call, on success and on failure,
//! and returns the inner outcome unchanged. Also records the call in an
//! `image_operation` span and in the `imgpipe_operations_total` counter and
//! `imgpipe_operation_duration_ms` histogram.

use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Instant;

use imgpipe_core::{
    sanitize_params, ImageError, ImageRequest, ImageResponse, LogEntry, ANONYMOUS,
};
use tower::{Layer, Service};
use tracing::{info_span, warn, Instrument};

use crate::service::operation::ImageFuture;
use crate::traits::LogSink;

// ---------------------------------------------------------------------------
// LoggingLayer
// ---------------------------------------------------------------------------

#[derive(Clone)]
pub struct LoggingLayer {
    sink: Arc<dyn LogSink>,
    endpoint: Arc<str>,
}

impl LoggingLayer {
    #[must_use]
    pub fn new(sink: Arc<dyn LogSink>, endpoint: impl Into<Arc<str>>) -> Self {
        Self {
            sink,
            endpoint: endpoint.into(),
        }
    }
}

impl<S> Layer<S> for LoggingLayer {
    type Service = LoggingService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        LoggingService {
            inner,
            sink: Arc::clone(&self.sink),
            endpoint: Arc::clone(&self.endpoint),
        }
    }
}

// ---------------------------------------------------------------------------
// LoggingService
// ---------------------------------------------------------------------------

#[derive(Clone)]
pub struct LoggingService<S> {
    inner: S,
    sink: Arc<dyn LogSink>,
    endpoint: Arc<str>,
}

impl<S> Service<ImageRequest> for LoggingService<S>
where
    S: Service<ImageRequest, Response = ImageResponse, Error = ImageError> + Send,
    S::Future: Send + 'static,
{
    type Response = ImageResponse;
    type Error = ImageError;
    type Future = ImageFuture;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: ImageRequest) -> Self::Future {
        let start = Instant::now();
        let params = sanitize_params(&req.params.to_json());
        let identity = req.identity.clone();
        let sink = Arc::clone(&self.sink);
        let endpoint = Arc::clone(&self.endpoint);

        let span = info_span!(
            "image_operation",
            endpoint = %endpoint,
            user = tracing::field::Empty,
            duration_ms = tracing::field::Empty,
            outcome = tracing::field::Empty,
        );

        let fut = self.inner.call(req);

        Box::pin(
            async move {
                let result = fut.await;

                #[allow(clippy::cast_possible_truncation)]
                let duration = start.elapsed().as_millis() as u64;
                let user = identity
                    .get()
                    .map_or_else(|| ANONYMOUS.to_string(), |id| id.email.clone());

                let entry = match &result {
                    Ok(_) => LogEntry::success(user.as_str(), &*endpoint, params, duration),
                    Err(err) => LogEntry::failure(
                        user.as_str(),
                        &*endpoint,
                        params,
                        duration,
                        err.to_string(),
                    ),
                };
                let outcome = if result.is_ok() { "success" } else { "error" };

                let span = tracing::Span::current();
                span.record("user", user.as_str());
                span.record("duration_ms", duration);
                span.record("outcome", outcome);

                metrics::counter!(
                    "imgpipe_operations_total",
                    "endpoint" => endpoint.to_string(),
                    "outcome" => outcome
                )
                .increment(1);
                #[allow(clippy::cast_precision_loss)]
                let duration_f64 = duration as f64;
                metrics::histogram!(
                    "imgpipe_operation_duration_ms",
                    "endpoint" => endpoint.to_string()
                )
                .record(duration_f64);

                if let Err(err) = sink.persist(&entry).await {
                    warn!(error = %err, "failed to persist log entry");
                }

                result
            }
            .instrument(span),
        )
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
