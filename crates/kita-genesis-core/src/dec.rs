//! Fixed-point decimal with 18 fractional digits.
//!
//! All reward accounting runs on [`Dec`]. The raw value is a 256-bit integer,
//! so any `u128` token amount converts without loss. Every operation truncates
//! toward zero, and products are widened to 512 bits so only a final result
//! that does not fit reports [`CoreError::ArithmeticOverflow`].

use primitive_types::{U256, U512};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::error::{CoreError, Result};

/// Number of fractional digits.
pub const PRECISION: usize = 18;

const ONE_RAW: u64 = 1_000_000_000_000_000_000;

/// A non-negative decimal stored as `raw / 10^18`.
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Dec(U256);

impl Dec {
    /// Zero.
    pub const ZERO: Self = Self(U256([0, 0, 0, 0]));

    /// One.
    pub const ONE: Self = Self(U256([ONE_RAW, 0, 0, 0]));

    /// Largest representable value.
    pub const MAX: Self = Self(U256::MAX);

    /// Create from a raw scaled value.
    pub const fn from_raw(raw: u128) -> Self {
        Self(U256([raw as u64, (raw >> 64) as u64, 0, 0]))
    }

    /// The raw scaled value.
    pub const fn raw(&self) -> U256 {
        self.0
    }

    /// Create from an integer amount.
    ///
    /// Every `u128` fits; the `Result` keeps the signature uniform with the
    /// other constructors.
    pub fn from_int(value: u128) -> Result<Self> {
        U256::from(value)
            .checked_mul(one())
            .map(Self)
            .ok_or(CoreError::ArithmeticOverflow)
    }

    /// `numerator / denominator`, truncated.
    pub fn from_ratio(numerator: u128, denominator: u128) -> Result<Self> {
        mul_div(U256::from(numerator), one(), U256::from(denominator)).map(Self)
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub fn checked_add(self, other: Self) -> Result<Self> {
        self.0
            .checked_add(other.0)
            .map(Self)
            .ok_or(CoreError::ArithmeticOverflow)
    }

    pub fn checked_sub(self, other: Self) -> Result<Self> {
        self.0.checked_sub(other.0).map(Self).ok_or(CoreError::Underflow)
    }

    /// `self * other`, truncated.
    pub fn checked_mul(self, other: Self) -> Result<Self> {
        mul_div(self.0, other.0, one()).map(Self)
    }

    /// `self * value` for an integer `value`.
    pub fn checked_mul_int(self, value: u128) -> Result<Self> {
        self.0
            .checked_mul(U256::from(value))
            .map(Self)
            .ok_or(CoreError::ArithmeticOverflow)
    }

    /// `self / other`, truncated.
    pub fn checked_quo(self, other: Self) -> Result<Self> {
        mul_div(self.0, one(), other.0).map(Self)
    }

    /// `self / value` for an integer `value`, truncated.
    pub fn checked_quo_int(self, value: u128) -> Result<Self> {
        if value == 0 {
            return Err(CoreError::DivisionByZero);
        }
        Ok(Self(self.0 / U256::from(value)))
    }

    /// `self * value / divisor` without intermediate truncation.
    pub fn mul_int_quo(self, value: u128, divisor: Self) -> Result<Self> {
        let scaled = U256::from(value)
            .checked_mul(one())
            .ok_or(CoreError::ArithmeticOverflow)?;
        mul_div(self.0, scaled, divisor.0).map(Self)
    }

    /// The integer part, if it fits in `u128`.
    pub fn truncate_int(&self) -> Result<u128> {
        let whole = self.0 / one();
        if whole > U256::from(u128::MAX) {
            return Err(CoreError::ArithmeticOverflow);
        }
        Ok(whole.low_u128())
    }

    /// The integer part as a decimal.
    pub fn truncate_dec(&self) -> Self {
        Self(self.0 - self.0 % one())
    }

    /// The fractional part.
    pub fn fraction(&self) -> Self {
        Self(self.0 % one())
    }
}

fn one() -> U256 {
    U256::from(ONE_RAW)
}

fn mul_div(a: U256, b: U256, divisor: U256) -> Result<U256> {
    if divisor.is_zero() {
        return Err(CoreError::DivisionByZero);
    }
    let quotient = a.full_mul(b) / U512::from(divisor);
    U256::try_from(quotient).map_err(|_| CoreError::ArithmeticOverflow)
}

impl fmt::Display for Dec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let whole = self.0 / one();
        let frac = (self.0 % one()).low_u64();
        write!(f, "{}.{:018}", whole, frac)
    }
}

impl fmt::Debug for Dec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Dec({})", self)
    }
}

impl FromStr for Dec {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || CoreError::InvalidDecimal(s.to_string());

        let (int_part, frac_part) = match s.split_once('.') {
            Some((int_part, frac_part)) => (int_part, frac_part),
            None => (s, ""),
        };
        if int_part.is_empty() || frac_part.len() > PRECISION {
            return Err(invalid());
        }
        if !int_part.bytes().all(|b| b.is_ascii_digit())
            || !frac_part.bytes().all(|b| b.is_ascii_digit())
        {
            return Err(invalid());
        }

        let int_value = U256::from_dec_str(int_part).map_err(|_| invalid())?;
        let frac_value: u64 = if frac_part.is_empty() {
            0
        } else {
            let padded = format!("{:0<width$}", frac_part, width = PRECISION);
            padded.parse().map_err(|_| invalid())?
        };

        let whole = int_value
            .checked_mul(one())
            .ok_or(CoreError::ArithmeticOverflow)?;
        Self(whole).checked_add(Self(U256::from(frac_value)))
    }
}

impl Serialize for Dec {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Dec {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}
