//! Integer coin amounts.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::dec::Dec;
use crate::error::Result;

/// An integer amount of one denomination.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Coin {
    pub denom: String,
    #[serde(with = "int_string")]
    pub amount: u128,
}

impl Coin {
    pub fn new(denom: impl Into<String>, amount: u128) -> Self {
        Self {
            denom: denom.into(),
            amount,
        }
    }

    /// A zero amount of `denom`.
    pub fn zero(denom: impl Into<String>) -> Self {
        Self::new(denom, 0)
    }

    pub fn is_zero(&self) -> bool {
        self.amount == 0
    }

    /// The amount as a decimal.
    pub fn to_dec(&self) -> Result<Dec> {
        Dec::from_int(self.amount)
    }
}

impl fmt::Display for Coin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.amount, self.denom)
    }
}

/// Split a decimal amount into whole coins and the leftover fraction.
pub fn truncate_decimal(denom: &str, amount: Dec) -> Result<(Coin, Dec)> {
    Ok((Coin::new(denom, amount.truncate_int()?), amount.fraction()))
}

/// Serde adapter writing integer amounts as decimal strings.
///
/// JSON numbers lose precision past 2^53 in most readers, so amounts travel
/// as strings the same way [`Dec`] does.
pub mod int_string {
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &u128, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(value)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u128, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(de::Error::custom)
    }
}
