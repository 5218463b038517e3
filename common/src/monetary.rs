//! Monetary types for the Teller ledger.
//!
//! All amounts are integers in the smallest currency unit. There is no
//! fractional or floating-point arithmetic anywhere in the ledger.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::LedgerError;

/// A validated, strictly positive monetary amount in minor units.
///
/// Construction is the only place amounts are validated; an `Amount` in hand
/// is always safe to move. Balances are plain `i64` values whose
/// non-negativity is enforced by the ledger engine before any write commits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct Amount(i64);

impl Amount {
    /// Create an amount, rejecting zero and negative values.
    pub fn new(minor_units: i64) -> Result<Self, LedgerError> {
        if minor_units <= 0 {
            return Err(LedgerError::InvalidAmount {
                amount: minor_units,
            });
        }
        Ok(Self(minor_units))
    }

    /// Get the raw minor-unit value.
    pub fn minor_units(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<i64> for Amount {
    type Error = LedgerError;

    fn try_from(minor_units: i64) -> Result<Self, Self::Error> {
        Self::new(minor_units)
    }
}

impl From<Amount> for i64 {
    fn from(amount: Amount) -> i64 {
        amount.0
    }
}
