//! Auth stage: verifies the bearer credential before delegating.
//!
//! A request without a token is rejected without touching the inner
//! service. On success the verified identity is attached to the request's
//! shared slot, so outer stages can see who made the call.

use std::sync::Arc;
use std::task::{Context, Poll};

use imgpipe_core::{ImageError, ImageRequest, ImageResponse};
use tower::{Layer, Service};
use tracing::debug;

use crate::service::operation::ImageFuture;
use crate::traits::CredentialVerifier;

// ---------------------------------------------------------------------------
// AuthLayer
// ---------------------------------------------------------------------------

#[derive(Clone)]
pub struct AuthLayer {
    verifier: Arc<dyn CredentialVerifier>,
}

impl AuthLayer {
    #[must_use]
    pub fn new(verifier: Arc<dyn CredentialVerifier>) -> Self {
        Self { verifier }
    }
}

impl<S> Layer<S> for AuthLayer {
    type Service = AuthService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        AuthService {
            inner,
            verifier: Arc::clone(&self.verifier),
        }
    }
}

// ---------------------------------------------------------------------------
// AuthService
// ---------------------------------------------------------------------------

#[derive(Clone)]
pub struct AuthService<S> {
    inner: S,
    verifier: Arc<dyn CredentialVerifier>,
}

impl<S> Service<ImageRequest> for AuthService<S>
where
    S: Service<ImageRequest, Response = ImageResponse, Error = ImageError>
        + Clone
        + Send
        + 'static,
    S::Future: Send + 'static,
{
    type Response = ImageResponse;
    type Error = ImageError;
    type Future = ImageFuture;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: ImageRequest) -> Self::Future {
        let Some(token) = req.token.clone() else {
            return Box::pin(async {
                Err(ImageError::Authentication(
                    "Authentication token required".into(),
                ))
            });
        };

        // The ready inner service moves into the future; a fresh clone stays behind.
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);
        let verifier = Arc::clone(&self.verifier);

        Box::pin(async move {
            let identity = verifier.verify(&token).await?;
            debug!(user = %identity.email, "credential verified");
            req.identity.attach(identity);
            inner.call(req).await
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
