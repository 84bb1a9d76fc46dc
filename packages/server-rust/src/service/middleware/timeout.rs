//! Timeout stage.
//!
//! Fails calls that exceed the configured bound with `ImageError::Timeout`.
//! The blocking transform itself is not cancelled; its result is discarded.

use std::task::{Context, Poll};
use std::time::Duration;

use imgpipe_core::{ImageError, ImageRequest, ImageResponse};
use tower::{Layer, Service};

use crate::service::operation::ImageFuture;

// ---------------------------------------------------------------------------
// TimeoutLayer
// ---------------------------------------------------------------------------

/// Tower layer that bounds each call by a fixed duration.
#[derive(Debug, Clone, Copy)]
pub struct TimeoutLayer {
    timeout: Duration,
}

impl TimeoutLayer {
    #[must_use]
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl<S> Layer<S> for TimeoutLayer {
    type Service = TimeoutService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        TimeoutService {
            inner,
            timeout: self.timeout,
        }
    }
}

// ---------------------------------------------------------------------------
// TimeoutService
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct TimeoutService<S> {
    inner: S,
    timeout: Duration,
}

impl<S> Service<ImageRequest> for TimeoutService<S>
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
        let duration = self.timeout;
        let fut = self.inner.call(req);
        Box::pin(async move {
            match tokio::time::timeout(duration, fut).await {
                Ok(result) => result,
                Err(_elapsed) => {
                    #[allow(clippy::cast_possible_truncation)]
                    let timeout_ms = duration.as_millis() as u64;
                    Err(ImageError::Timeout { timeout_ms })
                }
            }
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
