use std::sync::{Arc, OnceLock};

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::types::{OperationParams, OutputFormat};

/// Identity produced by credential verification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// Subject identifier (user id).
    pub subject_id: String,
    pub email: String,
}

/// Write-once identity cell shared by every stage handling the same request.
///
/// Cloning shares the cell, so a stage that keeps a clone before delegating
/// observes an identity attached further down the chain.
#[derive(Debug, Clone, Default)]
pub struct IdentitySlot(Arc<OnceLock<Identity>>);

impl IdentitySlot {
    /// Attaches `identity`. Returns `false` if one was already attached.
    pub fn attach(&self, identity: Identity) -> bool {
        self.0.set(identity).is_ok()
    }

    #[must_use]
    pub fn get(&self) -> Option<&Identity> {
        self.0.get()
    }
}

/// Per-call request flowing through the handling chain.
#[derive(Debug, Clone)]
pub struct ImageRequest {
    /// Uploaded image bytes.
    pub bytes: Bytes,
    /// Bearer credential, if the caller supplied one.
    pub token: Option<String>,
    /// Populated by the auth stage after successful verification.
    pub identity: IdentitySlot,
    pub params: OperationParams,
}

impl ImageRequest {
    #[must_use]
    pub fn new(bytes: impl Into<Bytes>, params: OperationParams) -> Self {
        Self {
            bytes: bytes.into(),
            token: None,
            identity: IdentitySlot::default(),
            params,
        }
    }

    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    #[must_use]
    pub fn identity(&self) -> Option<&Identity> {
        self.identity.get()
    }
}

/// Successful outcome of a handling chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageResponse {
    pub bytes: Bytes,
    pub format: OutputFormat,
    pub filename: String,
}
