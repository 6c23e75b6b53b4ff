//! Error types for the kita genesis core.

use thiserror::Error;

/// Core errors raised while parsing or computing ledger values.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    #[error("invalid address {address:?}: {reason}")]
    InvalidAddress { address: String, reason: String },

    #[error("invalid consensus public key")]
    InvalidPublicKey,

    #[error("arithmetic overflow")]
    ArithmeticOverflow,

    #[error("arithmetic underflow")]
    Underflow,

    #[error("division by zero")]
    DivisionByZero,

    #[error("invalid decimal {0:?}")]
    InvalidDecimal(String),
}

impl CoreError {
    pub(crate) fn invalid_address(address: impl Into<String>, reason: impl ToString) -> Self {
        CoreError::InvalidAddress {
            address: address.into(),
            reason: reason.to_string(),
        }
    }
}

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
