//! Tower middleware layers for the image handling chain.
//!
//! - [`logging`]: One log entry per call, plus span fields and metrics
//! - [`auth`]: Bearer credential verification
//! - [`timeout`]: Per-call timeout enforcement
//! - [`pipeline`]: Composes all layers around the base handler

pub mod auth;
pub mod logging;
pub mod pipeline;
pub mod timeout;

pub use auth::{AuthLayer, AuthService};
pub use logging::{LoggingLayer, LoggingService};
pub use pipeline::build_image_chain;
pub use timeout::{TimeoutLayer, TimeoutService};
