//! Operation dispatch and pipeline composition.
//!
//! [`OperationDispatcher`] maps an operation to its transform by exhaustive
//! match over [`OperationParams`]. Every step is a bytes-in, bytes-out
//! function: decode, transform, re-encode. Pipeline structure (step names,
//! nesting depth, step count) is checked before any pixel work, then each
//! step is parsed and folded left-to-right over the current bytes.

pub mod codec;
pub mod geometry;
mod ops;
mod pipeline;

pub use pipeline::{plan_pipeline, PlannedStep};

use tracing::debug;

use crate::error::ImageError;
use crate::types::{OperationKind, OperationParams, PipelineParams};

/// Limits and encoder settings for the dispatcher.
#[derive(Debug, Clone)]
pub struct DispatcherConfig {
    /// Maximum pipeline nesting depth; the top-level pipeline is depth 1.
    pub max_pipeline_depth: usize,
    /// Maximum number of steps across all nesting levels of one pipeline.
    pub max_pipeline_steps: usize,
    /// JPEG encoder quality (1-100).
    pub jpeg_quality: u8,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            max_pipeline_depth: 4,
            max_pipeline_steps: 32,
            jpeg_quality: 90,
        }
    }
}

/// Resolves operation names and executes transforms against image bytes.
#[derive(Debug, Clone, Default)]
pub struct OperationDispatcher {
    config: DispatcherConfig,
}

impl OperationDispatcher {
    #[must_use]
    pub fn new(config: DispatcherConfig) -> Self {
        Self { config }
    }

    #[must_use]
    pub fn config(&self) -> &DispatcherConfig {
        &self.config
    }

    /// Resolves an operation name.
    ///
    /// # Errors
    ///
    /// Returns `ImageError::UnsupportedOperation` for unknown names.
    pub fn resolve(&self, name: &str) -> Result<OperationKind, ImageError> {
        name.parse()
    }

    /// Applies the operation described by `params` to `bytes`.
    ///
    /// # Errors
    ///
    /// Surfaces the failing transform's error unchanged. A failing pipeline
    /// step aborts the whole pipeline and no partial output is returned.
    pub fn apply(&self, bytes: &[u8], params: &OperationParams) -> Result<Vec<u8>, ImageError> {
        match params {
            OperationParams::Pipeline(pipeline) => self.apply_pipeline(bytes, pipeline),
            single => self.apply_step(bytes, single),
        }
    }

    /// Plans then runs a pipeline.
    ///
    /// # Errors
    ///
    /// Returns `ImageError::Validation` for empty or over-limit pipelines,
    /// otherwise the first failing step's error.
    pub fn apply_pipeline(
        &self,
        bytes: &[u8],
        pipeline: &PipelineParams,
    ) -> Result<Vec<u8>, ImageError> {
        let plan = plan_pipeline(pipeline, &self.config)?;

        let mut current: Option<Vec<u8>> = None;
        for (index, step) in plan.iter().enumerate() {
            debug!(step = index, operation = %step.kind, "applying pipeline step");
            let params = step.parse()?;
            let input = current.as_deref().unwrap_or(bytes);
            current = Some(self.apply_step(input, &params)?);
        }
        current.ok_or_else(|| ImageError::Validation("Operations array is required".into()))
    }

    fn apply_step(&self, bytes: &[u8], params: &OperationParams) -> Result<Vec<u8>, ImageError> {
        let decoded = codec::decode(bytes)?;
        let quality = self.config.jpeg_quality;
        let source = &decoded.image;

        let (image, format) = match params {
            OperationParams::Resize(p) => (ops::resize(source, p)?, decoded.reencode_format()),
            OperationParams::Crop(p) => (ops::crop(source, p)?, decoded.reencode_format()),
            OperationParams::Rotate(p) => (ops::rotate(source, p), decoded.reencode_format()),
            OperationParams::Filter(p) => (ops::filter(source, p), decoded.reencode_format()),
            OperationParams::Format(p) => return codec::encode(source, p.format, quality),
            OperationParams::Pipeline(p) => return self.apply_pipeline(bytes, p),
        };
        codec::encode(&image, format, quality)
    }
}
