//! Error types for Teller ledger operations.

use crate::AccountId;
use thiserror::Error;

/// Main error type for ledger operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    /// Amount was zero or negative. Rejected before any store access.
    #[error("invalid amount: {amount}")]
    InvalidAmount { amount: i64 },

    /// Source balance was short at commit time. Never retried.
    #[error("insufficient funds: required {required}, available {available}")]
    InsufficientFunds { required: i64, available: i64 },

    /// No account with this identity exists in the balance store.
    #[error("account not found: {0}")]
    AccountNotFound(AccountId),

    /// Concurrent writers kept winning the conditional-write race until the
    /// retry budget ran out.
    #[error("conflict persisted after {attempts} attempts on account {account}")]
    TransientConflict { account: AccountId, attempts: u32 },

    /// The caller is not a participant in the requested transaction. A
    /// missing transaction reports the same error so existence never leaks.
    #[error("operation denied")]
    AccessDenied,

    /// A balance would exceed the representable range. Commits nothing.
    #[error("balance overflow on account {account}")]
    BalanceOverflow { account: AccountId },

    /// Balances committed but the journal append (or a transfer
    /// compensation) failed. Requires manual reconciliation.
    #[error("ledger inconsistent: {detail}")]
    Inconsistent { detail: String },
}

impl LedgerError {
    /// Check if this error is retryable.
    pub fn is_retryable(&self) -> bool {
        matches!(self, LedgerError::TransientConflict { .. })
    }

    /// Get a stable error code for the caller layer.
    pub fn error_code(&self) -> &'static str {
        match self {
            LedgerError::InvalidAmount { .. } => "INVALID_AMOUNT",
            LedgerError::InsufficientFunds { .. } => "INSUFFICIENT_FUNDS",
            LedgerError::AccountNotFound(_) => "ACCOUNT_NOT_FOUND",
            LedgerError::TransientConflict { .. } => "TRANSIENT_CONFLICT",
            LedgerError::AccessDenied => "ACCESS_DENIED",
            LedgerError::BalanceOverflow { .. } => "BALANCE_OVERFLOW",
            LedgerError::Inconsistent { .. } => "INCONSISTENT",
        }
    }
}

/// Result type alias for ledger operations.
pub type Result<T> = std::result::Result<T, LedgerError>;
