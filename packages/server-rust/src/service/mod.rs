//! Image handling chain.
//!
//! 1. **Classification** (`classify`): raw inputs -> `ImageRequest`
//! 2. **Middleware** (`middleware`): logging, auth and timeout stages
//! 3. **Base handler** (`handler`): runs one transform on the blocking pool

pub mod classify;
pub mod config;
pub mod handler;
pub mod middleware;
pub mod operation;

pub use classify::{bearer_token, classify, query_to_params};
pub use config::ServerConfig;
pub use handler::{generate_filename, ImageHandler};
pub use middleware::build_image_chain;
pub use operation::{endpoint_for, ImageFuture};
