//! Common types for the wallet flows
//!
//! Amounts are carried as minimal-denom integer units in a `u128`. Every
//! conversion between display units (what the user types) and minimal units
//! goes through arbitrary-precision decimals; native floats are never used
//! for monetary values.

use bigdecimal::{BigDecimal, RoundingMode, Zero};
use num_bigint::BigInt;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::FlowError;

// ============================================================================
// Currency
// ============================================================================

/// Display descriptor for a token
///
/// `denom` is the minimal denom string (e.g. "afet"); `decimals` is how many
/// decimal places separate it from the display unit (e.g. 18 for FET).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Currency {
    pub denom: String,
    pub decimals: u32,
}

impl Currency {
    pub fn new(denom: impl Into<String>, decimals: u32) -> Self {
        Currency {
            denom: denom.into(),
            decimals,
        }
    }

    /// The scaling factor between display and minimal units (10^decimals)
    pub fn scale_factor(&self) -> BigInt {
        BigInt::from(10u32).pow(self.decimals)
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.denom)
    }
}

// ============================================================================
// Amount
// ============================================================================

/// A token quantity in minimal-denom integer units
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Amount {
    pub currency: Currency,
    pub minimal: u128,
}

impl Amount {
    /// Create from minimal-denom units
    pub fn new(currency: Currency, minimal: u128) -> Self {
        Amount { currency, minimal }
    }

    /// Zero of the given currency
    pub fn zero(currency: Currency) -> Self {
        Amount {
            currency,
            minimal: 0,
        }
    }

    pub fn is_zero(&self) -> bool {
        self.minimal == 0
    }

    /// Parse a user-entered display amount (e.g. "1.5") into minimal units.
    ///
    /// The scaled value is truncated toward zero, never rounded up: when the
    /// result feeds an ERC20 approve, rounding up would over-approve.
    ///
    /// Fails with `PrecisionOverflow` for negative or non-numeric input, or
    /// when the scaled integer exceeds `u128`.
    pub fn from_display(input: &str, currency: Currency) -> Result<Self, FlowError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Ok(Amount::zero(currency));
        }

        let value = BigDecimal::from_str(trimmed).map_err(|_| FlowError::PrecisionOverflow {
            input: input.to_string(),
        })?;

        if value < BigDecimal::zero() {
            return Err(FlowError::PrecisionOverflow {
                input: input.to_string(),
            });
        }

        let scaled = value * BigDecimal::from(currency.scale_factor());
        let (int, _exp) = scaled.with_scale_round(0, RoundingMode::Down).into_bigint_and_exponent();

        let minimal = u128::try_from(int).map_err(|_| FlowError::PrecisionOverflow {
            input: input.to_string(),
        })?;

        Ok(Amount { currency, minimal })
    }

    /// Exact display value (`minimal / 10^decimals`)
    pub fn display(&self) -> BigDecimal {
        BigDecimal::new(BigInt::from(self.minimal), self.currency.decimals as i64)
    }

    /// Same-currency subtraction, saturating at zero
    pub fn saturating_sub(&self, other: &Amount) -> Amount {
        debug_assert_eq!(self.currency.denom, other.currency.denom);
        Amount {
            currency: self.currency.clone(),
            minimal: self.minimal.saturating_sub(other.minimal),
        }
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}",
            self.display().normalized(),
            self.currency.denom
        )
    }
}

// ============================================================================
// Vesting accounts
// ============================================================================

/// How a vesting grant unlocks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VestingKind {
    /// Unlocks linearly between start_time and end_time
    Continuous,
    /// Fully locked until end_time, then fully unlocked
    Delayed,
}

/// A vesting grant as reported by the chain
///
/// Immutable once queried; a fresh query replaces the whole value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VestingAccount {
    pub kind: VestingKind,
    pub original_vesting: Amount,
    /// Unix seconds
    pub start_time: i64,
    /// Unix seconds
    pub end_time: i64,
}
