//! Token amounts.
//!
//! Amounts are carried in base units as a u128, the same width fungible-token
//! ledgers commonly use. JSON encodes them as base-10 strings so large values
//! survive clients that parse numbers as doubles.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};
use crate::utils::constants::{DEFAULT_DECIMALS, MAX_DECIMALS};

/// Strongly-typed token amount in base units
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct TokenAmount(u128);

impl TokenAmount {
    /// Zero amount
    pub const ZERO: Self = Self(0);

    /// Largest representable amount
    pub const MAX: Self = Self(u128::MAX);

    /// Create from base units
    pub const fn from_units(units: u128) -> Self {
        Self(units)
    }

    /// Create from whole tokens at the default 18 decimals
    pub fn from_whole(whole: u128) -> Self {
        Self(whole.saturating_mul(unit(DEFAULT_DECIMALS)))
    }

    /// Create from whole tokens at the given decimals, failing on overflow
    pub fn checked_from_whole(whole: u128, decimals: u8) -> Result<Self> {
        if decimals > MAX_DECIMALS {
            return Err(Error::InvalidParameter {
                name: "decimals".into(),
                reason: format!("{} exceeds maximum {}", decimals, MAX_DECIMALS),
            });
        }
        whole
            .checked_mul(unit(decimals))
            .map(Self)
            .ok_or(Error::Overflow {
                operation: "whole token conversion".into(),
            })
    }

    /// Get raw base units
    pub const fn units(&self) -> u128 {
        self.0
    }

    /// Check if zero
    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Render with a decimal point at the given precision, trimming trailing zeros
    pub fn to_decimal_string(&self, decimals: u8) -> String {
        if decimals == 0 || decimals > MAX_DECIMALS {
            return self.0.to_string();
        }
        let unit = unit(decimals);
        let whole = self.0 / unit;
        let frac = self.0 % unit;
        if frac == 0 {
            return whole.to_string();
        }
        let frac = format!("{:0width$}", frac, width = decimals as usize);
        format!("{}.{}", whole, frac.trim_end_matches('0'))
    }

    /// Saturating addition
    pub fn saturating_add(self, other: Self) -> Self {
        Self(self.0.saturating_add(other.0))
    }

    /// Saturating subtraction
    pub fn saturating_sub(self, other: Self) -> Self {
        Self(self.0.saturating_sub(other.0))
    }

    /// Checked addition
    pub fn checked_add(self, other: Self) -> Option<Self> {
        self.0.checked_add(other.0).map(Self)
    }

    /// Checked subtraction
    pub fn checked_sub(self, other: Self) -> Option<Self> {
        self.0.checked_sub(other.0).map(Self)
    }
}

/// 10^decimals; callers keep decimals within [`MAX_DECIMALS`]
fn unit(decimals: u8) -> u128 {
    10u128.pow(decimals as u32)
}

impl fmt::Display for TokenAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u128> for TokenAmount {
    fn from(units: u128) -> Self {
        Self(units)
    }
}

impl From<u64> for TokenAmount {
    fn from(units: u64) -> Self {
        Self(units as u128)
    }
}

impl From<TokenAmount> for u128 {
    fn from(amount: TokenAmount) -> Self {
        amount.0
    }
}

impl FromStr for TokenAmount {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        s.trim()
            .parse::<u128>()
            .map(Self)
            .map_err(|e| Error::InvalidParameter {
                name: "amount".into(),
                reason: e.to_string(),
            })
    }
}

impl Serialize for TokenAmount {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.0.to_string())
    }
}

impl<'de> Deserialize<'de> for TokenAmount {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
