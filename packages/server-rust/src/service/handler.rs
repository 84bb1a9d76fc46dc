//! Base handler: runs exactly one transform for a request.

use std::sync::Arc;
use std::task::{Context, Poll};

use bytes::Bytes;
use imgpipe_core::{ImageError, ImageRequest, ImageResponse, OperationDispatcher, OutputFormat};
use tower::Service;

use super::operation::ImageFuture;

/// Innermost service of the chain. Performs no authentication or logging.
#[derive(Debug, Clone)]
pub struct ImageHandler {
    dispatcher: Arc<OperationDispatcher>,
}

impl ImageHandler {
    #[must_use]
    pub fn new(dispatcher: Arc<OperationDispatcher>) -> Self {
        Self { dispatcher }
    }
}

impl Service<ImageRequest> for ImageHandler {
    type Response = ImageResponse;
    type Error = ImageError;
    type Future = ImageFuture;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: ImageRequest) -> Self::Future {
        let dispatcher = Arc::clone(&self.dispatcher);
        Box::pin(async move {
            let format = req.params.output_format();
            let ImageRequest { bytes, params, .. } = req;

            let output = tokio::task::spawn_blocking(move || dispatcher.apply(&bytes, &params))
                .await
                .map_err(|e| ImageError::Processing(format!("transform task failed: {e}")))??;

            Ok(ImageResponse {
                bytes: Bytes::from(output),
                format,
                filename: generate_filename(format),
            })
        })
    }
}

/// `processed-<unix millis>-<uuid>.<format>`, unique per call.
#[must_use]
pub fn generate_filename(format: OutputFormat) -> String {
    format!(
        "processed-{}-{}.{}",
        chrono::Utc::now().timestamp_millis(),
        uuid::Uuid::new_v4().simple(),
        format.as_str()
    )
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::io::Cursor;

    use imgpipe_core::{
        FilterKind, FilterParams, FormatParams, OperationParams, ResizeParams, RotateParams,
        Rotation,
    };
    use tower::ServiceExt;

    use super::*;

    fn png(width: u32, height: u32) -> Vec<u8> {
        let img = image::RgbImage::from_fn(width, height, |x, y| {
            image::Rgb([(x * 7) as u8, (y * 11) as u8, 128])
        });
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, image::ImageFormat::Png).unwrap();
        out.into_inner()
    }

    fn handler() -> ImageHandler {
        ImageHandler::new(Arc::new(OperationDispatcher::default()))
    }

    #[tokio::test]
    async fn runs_transform_and_names_output() {
        let req = ImageRequest::new(
            png(20, 10),
            OperationParams::Rotate(RotateParams {
                angle: Rotation::Deg90,
            }),
        );

        let resp = handler().oneshot(req).await.unwrap();
        let out = image::load_from_memory(&resp.bytes).unwrap();
        assert_eq!((out.width(), out.height()), (10, 20));
        assert_eq!(resp.format, OutputFormat::Jpeg);
        assert!(resp.filename.starts_with("processed-"));
        assert!(resp.filename.ends_with(".jpeg"));
    }

    #[tokio::test]
    async fn format_operation_sets_response_format() {
        let req = ImageRequest::new(
            png(8, 8),
            OperationParams::Format(FormatParams {
                format: OutputFormat::Webp,
            }),
        );

        let resp = handler().oneshot(req).await.unwrap();
        assert_eq!(resp.format, OutputFormat::Webp);
        assert!(resp.filename.ends_with(".webp"));
        assert_eq!(
            image::guess_format(&resp.bytes).unwrap(),
            image::ImageFormat::WebP
        );
    }

    #[tokio::test]
    async fn transform_failure_surfaces_unchanged() {
        let req = ImageRequest::new(
            b"not an image".to_vec(),
            OperationParams::Filter(FilterParams {
                filter: FilterKind::Blur,
            }),
        );
        let err = handler().oneshot(req).await.unwrap_err();
        assert!(matches!(err, ImageError::Processing(_)));
    }

    #[tokio::test]
    async fn resize_validation_error_passes_through() {
        let req = ImageRequest::new(
            png(8, 8),
            OperationParams::Resize(ResizeParams {
                width: None,
                height: None,
                fit: imgpipe_core::FitMode::Cover,
            }),
        );
        let err = handler().oneshot(req).await.unwrap_err();
        assert_eq!(
            err,
            ImageError::Validation("At least width or height must be provided".into())
        );
    }

    #[test]
    fn filenames_are_unique() {
        let names: HashSet<_> = (0..100)
            .map(|_| generate_filename(OutputFormat::Png))
            .collect();
        assert_eq!(names.len(), 100);
    }
}
