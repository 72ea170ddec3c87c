//! Session verification for the intake API
//!
//! Session issuance lives elsewhere; this layer only resolves a bearer
//! token to a user id. The shipped verifier checks HMAC-SHA256-signed
//! tokens of the form `<user_id>.<hex signature>` against the server
//! secret.

use async_trait::async_trait;
use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Session resolution interface
#[async_trait]
pub trait Sessions: Send + Sync {
    /// Resolve a bearer token to the owning user id, or `None` when the
    /// token is missing, malformed, or forged
    async fn resolve(&self, token: &str) -> Option<String>;
}

/// HMAC-signed session tokens
pub struct HmacSessions {
    secret: Vec<u8>,
}

impl HmacSessions {
    pub fn new(secret: impl Into<Vec<u8>>) -> Self {
        Self {
            secret: secret.into(),
        }
    }

    /// Sign a token for a user (local tooling and tests)
    pub fn token_for(&self, user_id: &str) -> String {
        let mut mac =
            HmacSha256::new_from_slice(&self.secret).expect("HMAC accepts any key length");
        mac.update(user_id.as_bytes());
        let signature = hex::encode(mac.finalize().into_bytes());
        format!("{}.{}", user_id, signature)
    }
}

#[async_trait]
impl Sessions for HmacSessions {
    async fn resolve(&self, token: &str) -> Option<String> {
        let (user_id, signature) = token.rsplit_once('.')?;
        if user_id.is_empty() {
            return None;
        }

        let signature = hex::decode(signature).ok()?;

        let mut mac = HmacSha256::new_from_slice(&self.secret).ok()?;
        mac.update(user_id.as_bytes());
        mac.verify_slice(&signature).ok()?;

        Some(user_id.to_string())
    }
}
