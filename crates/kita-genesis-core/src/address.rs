//! Ledger addresses and the bech32 address codec.
//!
//! Addresses are raw byte strings. Their textual form depends on a
//! human-readable prefix, so encoding always goes through an explicit
//! [`AddressCodec`] built from the chain configuration instead of a
//! process-wide registry.

use bech32::{FromBase32, ToBase32, Variant};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{CoreError, Result};

/// Longest address accepted by the verifier.
pub const MAX_ADDR_LEN: usize = 255;

/// Check raw address bytes against the chain's address rules.
///
/// Addresses must be non-empty, at most [`MAX_ADDR_LEN`] bytes, and either
/// 20 bytes (key-derived) or 32 bytes (module-derived) long.
pub fn verify_address_bytes(bytes: &[u8]) -> std::result::Result<(), String> {
    if bytes.is_empty() {
        return Err("addresses cannot be empty".into());
    }
    if bytes.len() > MAX_ADDR_LEN {
        return Err(format!(
            "address max length is {}, got {}",
            MAX_ADDR_LEN,
            bytes.len()
        ));
    }
    if bytes.len() != 20 && bytes.len() != 32 {
        return Err(format!(
            "address length must be 20 or 32 bytes, got {}",
            bytes.len()
        ));
    }
    Ok(())
}

/// Encodes and decodes addresses for one bech32 human-readable prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressCodec {
    prefix: String,
}

impl AddressCodec {
    /// Create a codec for the given prefix.
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    /// The human-readable prefix.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Encode raw address bytes.
    pub fn encode(&self, bytes: &[u8]) -> Result<String> {
        verify_address_bytes(bytes)
            .map_err(|reason| CoreError::invalid_address(hex::encode(bytes), reason))?;
        bech32::encode(&self.prefix, bytes.to_base32(), Variant::Bech32)
            .map_err(|e| CoreError::invalid_address(hex::encode(bytes), e))
    }

    /// Decode a bech32 string into raw address bytes.
    pub fn decode(&self, text: &str) -> Result<Vec<u8>> {
        if text.trim().is_empty() {
            return Err(CoreError::invalid_address(
                text,
                "empty address string is not allowed",
            ));
        }

        let (hrp, data, variant) =
            bech32::decode(text).map_err(|e| CoreError::invalid_address(text, e))?;
        if hrp != self.prefix {
            return Err(CoreError::invalid_address(
                text,
                format!("invalid bech32 prefix: expected {}, got {}", self.prefix, hrp),
            ));
        }
        if variant != Variant::Bech32 {
            return Err(CoreError::invalid_address(text, "bech32m is not supported"));
        }

        let bytes = Vec::<u8>::from_base32(&data).map_err(|e| CoreError::invalid_address(text, e))?;
        verify_address_bytes(&bytes).map_err(|reason| CoreError::invalid_address(text, reason))?;
        Ok(bytes)
    }
}

macro_rules! address_type {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub struct $name(Vec<u8>);

        impl $name {
            /// Create from raw bytes without verification.
            pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
                Self(bytes.into())
            }

            /// Get the raw bytes.
            pub fn as_bytes(&self) -> &[u8] {
                &self.0
            }

            /// Convert to hex string.
            pub fn to_hex(&self) -> String {
                hex::encode(&self.0)
            }

            /// Parse and verify a bech32 string with the given codec.
            pub fn from_bech32(text: &str, codec: &AddressCodec) -> Result<Self> {
                codec.decode(text).map(Self)
            }

            /// Encode with the given codec.
            pub fn to_bech32(&self, codec: &AddressCodec) -> Result<String> {
                codec.encode(&self.0)
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                let hex = self.to_hex();
                write!(f, "{}({})", stringify!($name), &hex[..hex.len().min(16)])
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.to_hex())
            }
        }

        impl AsRef<[u8]> for $name {
            fn as_ref(&self) -> &[u8] {
                &self.0
            }
        }

        impl From<Vec<u8>> for $name {
            fn from(bytes: Vec<u8>) -> Self {
                Self(bytes)
            }
        }
    };
}

address_type!(
    /// An account address (delegators, operators' accounts).
    AccAddress
);

address_type!(
    /// A validator operator address.
    ///
    /// Its byte order is the validator-set ordering key.
    ValAddress
);

address_type!(
    /// A consensus node address, derived from the consensus public key.
    ConsAddress
);

impl ValAddress {
    /// The account that owns this operator address.
    pub fn to_account(&self) -> AccAddress {
        AccAddress::from_bytes(self.0.clone())
    }
}
