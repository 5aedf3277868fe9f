//! Exact token amounts.
//!
//! Amounts are held as raw integers in the token's smallest unit. Human
//! decimal strings are only an input and display format.

use std::fmt;

use alloy::primitives::utils::format_units;
use alloy::primitives::U256;
use thiserror::Error;

use crate::config::MAX_DECIMALS;

/// Errors converting between human and raw token amounts.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AmountError {
    #[error("amount is empty")]
    Empty,

    #[error("'{0}' is not a plain non-negative decimal number")]
    Malformed(String),

    #[error("'{value}' has more than {decimals} fractional digits")]
    TooPrecise { value: String, decimals: u8 },

    #[error("'{0}' does not fit in 256 bits")]
    Overflow(String),

    #[error("{0} decimals exceeds the maximum of 77")]
    UnsupportedDecimals(u8),
}

/// A non-negative token amount in raw units, with the token's decimal exponent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TokenAmount {
    raw: U256,
    decimals: u8,
}

fn scale(decimals: u8) -> U256 {
    U256::from(10u64).pow(U256::from(decimals))
}

fn check_decimals(decimals: u8) -> Result<(), AmountError> {
    if decimals > MAX_DECIMALS {
        return Err(AmountError::UnsupportedDecimals(decimals));
    }
    Ok(())
}

impl TokenAmount {
    /// Wrap an amount already expressed in raw units.
    pub fn from_raw(raw: U256, decimals: u8) -> Result<Self, AmountError> {
        check_decimals(decimals)?;
        Ok(Self { raw, decimals })
    }

    /// Whole human units, e.g. `500` USDC becomes `500_000_000` raw.
    pub fn from_whole(units: u64, decimals: u8) -> Result<Self, AmountError> {
        check_decimals(decimals)?;
        let raw = U256::from(units)
            .checked_mul(scale(decimals))
            .ok_or_else(|| AmountError::Overflow(units.to_string()))?;
        Ok(Self { raw, decimals })
    }

    /// Parse a human decimal string such as `"12.5"` exactly.
    ///
    /// Rejects signs, exponents, separators and more fractional digits than
    /// the token has, rather than rounding.
    pub fn from_human(value: &str, decimals: u8) -> Result<Self, AmountError> {
        check_decimals(decimals)?;
        let value = value.trim();
        if value.is_empty() {
            return Err(AmountError::Empty);
        }

        let (whole, fraction) = match value.split_once('.') {
            Some((w, f)) => (w, f),
            None => (value, ""),
        };
        let all_digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
        if whole.is_empty()
            || !all_digits(whole)
            || !all_digits(fraction)
            || (value.contains('.') && fraction.is_empty())
        {
            return Err(AmountError::Malformed(value.to_string()));
        }
        if fraction.len() > decimals as usize {
            return Err(AmountError::TooPrecise {
                value: value.to_string(),
                decimals,
            });
        }

        let overflow = || AmountError::Overflow(value.to_string());
        let whole_raw = U256::from_str_radix(whole, 10)
            .map_err(|_| overflow())?
            .checked_mul(scale(decimals))
            .ok_or_else(overflow)?;
        let fraction_raw = if fraction.is_empty() {
            U256::ZERO
        } else {
            let padding = decimals - fraction.len() as u8;
            U256::from_str_radix(fraction, 10)
                .map_err(|_| overflow())?
                .checked_mul(scale(padding))
                .ok_or_else(overflow)?
        };
        let raw = whole_raw.checked_add(fraction_raw).ok_or_else(overflow)?;

        Ok(Self { raw, decimals })
    }

    /// Raw integer value; the source of truth for arithmetic.
    pub fn raw(&self) -> U256 {
        self.raw
    }

    /// Decimal exponent of the token.
    pub fn decimals(&self) -> u8 {
        self.decimals
    }

    pub fn is_zero(&self) -> bool {
        self.raw.is_zero()
    }

    /// Exact decimal rendering without trailing fractional zeros.
    pub fn to_human(&self) -> String {
        match format_units(self.raw, self.decimals) {
            Ok(formatted) if formatted.contains('.') => formatted
                .trim_end_matches('0')
                .trim_end_matches('.')
                .to_string(),
            Ok(formatted) => formatted,
            // Unreachable for validated decimals; fall back to raw units.
            Err(_) => self.raw.to_string(),
        }
    }
}

impl fmt::Display for TokenAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_human())
    }
}
