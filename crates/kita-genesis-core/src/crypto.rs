//! Consensus keys.
//!
//! Validators sign blocks with Ed25519. The consensus address is the first
//! 20 bytes of the SHA-256 digest of the public key.

use ed25519_dalek::VerifyingKey;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

use crate::address::ConsAddress;
use crate::error::CoreError;

/// A 32-byte Ed25519 consensus public key.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConsensusPubKey(pub [u8; 32]);

impl ConsensusPubKey {
    /// Create from raw bytes, checking that they are a valid curve point.
    pub fn from_bytes(bytes: [u8; 32]) -> Result<Self, CoreError> {
        VerifyingKey::from_bytes(&bytes).map_err(|_| CoreError::InvalidPublicKey)?;
        Ok(Self(bytes))
    }

    /// Get the raw bytes.
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Convert to hex string.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// The key type name used in consensus parameters.
    pub const fn key_type(&self) -> &'static str {
        "ed25519"
    }

    /// Derive the consensus node address.
    pub fn address(&self) -> ConsAddress {
        let digest = Sha256::digest(self.0);
        ConsAddress::from_bytes(digest[..20].to_vec())
    }
}

impl fmt::Debug for ConsensusPubKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ConsensusPubKey({})", &self.to_hex()[..16])
    }
}

impl From<VerifyingKey> for ConsensusPubKey {
    fn from(key: VerifyingKey) -> Self {
        Self(key.to_bytes())
    }
}
