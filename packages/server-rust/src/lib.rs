//! `imgpipe` Server: authenticated, logged image operations over HTTP.

pub mod auth;
pub mod network;
pub mod service;
pub mod sink;
pub mod traits;

pub use auth::JwtVerifier;
pub use service::{build_image_chain, ServerConfig};
pub use sink::{build_sink, FanoutSink, FileSink, MemorySink, SinkError, TracingSink};
pub use traits::{CredentialVerifier, LogSink};
