//! Shared types for the image handling chain.

use std::future::Future;
use std::pin::Pin;

use imgpipe_core::{ImageError, ImageResponse, OperationKind};

/// Boxed future returned by every stage of the chain.
pub type ImageFuture = Pin<Box<dyn Future<Output = Result<ImageResponse, ImageError>> + Send>>;

/// Endpoint label used in log entries and metrics for `kind`.
#[must_use]
pub fn endpoint_for(kind: OperationKind) -> String {
    format!("/images/{kind}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_labels_follow_route_shape() {
        assert_eq!(endpoint_for(OperationKind::Resize), "/images/resize");
        assert_eq!(endpoint_for(OperationKind::Pipeline), "/images/pipeline");
    }
}
