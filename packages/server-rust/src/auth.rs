//! HS256 JWT credential verifier.

use async_trait::async_trait;
use chrono::Utc;
use imgpipe_core::{Identity, ImageError};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::traits::CredentialVerifier;

const INVALID_TOKEN: &str = "Invalid or expired token";

/// Token claims. Field names match the wire form (`userId`, `email`, `iat`,
/// `exp`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Claims {
    pub user_id: String,
    pub email: String,
    pub iat: u64,
    pub exp: u64,
}

/// Issues and verifies tokens signed with a shared secret.
pub struct JwtVerifier {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl_secs: u64,
}

impl JwtVerifier {
    #[must_use]
    pub fn new(secret: &[u8], ttl_secs: u64) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation,
            ttl_secs,
        }
    }

    /// Signs a token for `identity` valid from now for the configured lifetime.
    ///
    /// # Errors
    ///
    /// Returns `ImageError::Processing` if signing fails.
    pub fn issue(&self, identity: &Identity) -> Result<String, ImageError> {
        self.issue_at(identity, now_secs())
    }

    /// Signs a token as if issued at `iat` (seconds since the epoch).
    ///
    /// # Errors
    ///
    /// Returns `ImageError::Processing` if signing fails.
    pub fn issue_at(&self, identity: &Identity, iat: u64) -> Result<String, ImageError> {
        let claims = Claims {
            user_id: identity.subject_id.clone(),
            email: identity.email.clone(),
            iat,
            exp: iat.saturating_add(self.ttl_secs),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| ImageError::Processing(format!("failed to sign token: {e}")))
    }
}

#[async_trait]
impl CredentialVerifier for JwtVerifier {
    async fn verify(&self, token: &str) -> Result<Identity, ImageError> {
        let data = decode::<Claims>(token, &self.decoding, &self.validation).map_err(|e| {
            debug!(error = %e, "token rejected");
            ImageError::Authentication(INVALID_TOKEN.into())
        })?;
        Ok(Identity {
            subject_id: data.claims.user_id,
            email: data.claims.email,
        })
    }
}

fn now_secs() -> u64 {
    u64::try_from(Utc::now().timestamp()).unwrap_or_default()
}
