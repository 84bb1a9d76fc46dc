//! `imgpipe` Core: operation types, the operation dispatcher, pipeline
//! planning, and structured log entries.

pub mod context;
pub mod error;
pub mod log;
pub mod transform;
pub mod types;

pub use context::{Identity, IdentitySlot, ImageRequest, ImageResponse};
pub use error::{ErrorKind, ImageError};
pub use log::{sanitize_params, LogEntry, LogLevel, LogOutcome, ANONYMOUS};
pub use transform::{DispatcherConfig, OperationDispatcher};
pub use types::{
    CropParams, FilterKind, FilterParams, FitMode, FormatParams, OperationKind, OperationParams,
    OutputFormat, PipelineParams, PipelineStep, ResizeParams, RotateParams, Rotation,
};
