use async_trait::async_trait;
use imgpipe_core::{Identity, ImageError, LogEntry};

use crate::sink::SinkError;

/// Verifies bearer credentials on behalf of the auth stage.
/// Implementations: JWT (`JwtVerifier`), static fixtures (tests).
#[async_trait]
pub trait CredentialVerifier: Send + Sync {
    /// Verify `token` and return the identity it carries.
    ///
    /// Fails with `ImageError::Authentication` for malformed, wrongly-signed
    /// or expired tokens.
    async fn verify(&self, token: &str) -> Result<Identity, ImageError>;
}

/// Destination for log entries written by the logging stage.
/// Implementations: JSON-lines file, `tracing` events, memory, fan-out.
#[async_trait]
pub trait LogSink: Send + Sync {
    /// Persist a single entry.
    async fn persist(&self, entry: &LogEntry) -> Result<(), SinkError>;
}
