use std::path::PathBuf;

use imgpipe_core::DispatcherConfig;

/// Server-level configuration for the handling chain.
///
/// Controls the operation timeout, dispatcher limits, token signing and
/// where log entries go.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Upper bound on a single handled call in milliseconds.
    pub operation_timeout_ms: u64,
    /// Pipeline limits and encoder settings.
    pub dispatcher: DispatcherConfig,
    /// HS256 shared secret for issuing and verifying tokens.
    pub jwt_secret: String,
    /// Lifetime of issued tokens in seconds.
    pub jwt_ttl_secs: u64,
    /// JSON-lines log file. `None` disables the file sink.
    pub log_file: Option<PathBuf>,
    /// Mirror every log entry as a `tracing` event.
    pub trace_sink: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            operation_timeout_ms: 30_000,
            dispatcher: DispatcherConfig::default(),
            jwt_secret: String::new(),
            jwt_ttl_secs: 86_400,
            log_file: Some(PathBuf::from("logs/app.log")),
            trace_sink: true,
        }
    }
}
