//! HTTP handler definitions for the `imgpipe` server.
//!
//! This module defines `AppState` (the shared state carried through axum
//! extractors) and re-exports all handler functions for convenient access
//! when building the router.

pub mod health;
pub mod images;

pub use health::health_handler;
pub use images::{image_handler, ApiError};

use std::sync::Arc;
use std::time::Instant;

use imgpipe_core::OperationDispatcher;

use crate::service::ServerConfig;
use crate::traits::{CredentialVerifier, LogSink};

/// Shared application state passed to all axum handlers via `State` extraction.
///
/// Holds `Arc` references to shared resources so cloning is cheap.
#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Arc<OperationDispatcher>,
    pub verifier: Arc<dyn CredentialVerifier>,
    /// Destination for per-call log entries.
    pub sink: Arc<dyn LogSink>,
    /// Timeout and pipeline limits applied to every chain.
    pub server: Arc<ServerConfig>,
    /// Server process start time, used for uptime calculation.
    pub start_time: Instant,
}
