//! The immutable transaction record.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::{AccountId, Amount, Timestamp, TransactionId};

/// Kind of money movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    /// Money entered the ledger. Source equals destination.
    Deposit,
    /// Money left the ledger. Source equals destination.
    Withdraw,
    /// Money moved between two accounts.
    Transfer,
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransactionKind::Deposit => write!(f, "deposit"),
            TransactionKind::Withdraw => write!(f, "withdraw"),
            TransactionKind::Transfer => write!(f, "transfer"),
        }
    }
}

/// A completed money movement.
///
/// Once appended to the log a transaction is never mutated or removed.
/// Deposits and withdrawals share the transfer schema with `from == to`;
/// the endpoints carry meaning only when they differ.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// Log-assigned identifier; commit order equals identifier order.
    pub id: TransactionId,
    /// Kind of movement.
    pub kind: TransactionKind,
    /// Source account.
    pub from: AccountId,
    /// Destination account.
    pub to: AccountId,
    /// Amount moved, in minor units.
    pub amount: Amount,
    /// When the movement committed.
    pub at: Timestamp,
}

impl Transaction {
    /// Check whether an account is the source or destination.
    pub fn participates(&self, account: AccountId) -> bool {
        self.from == account || self.to == account
    }

    /// Check whether this is a self-operation (`from == to`).
    pub fn is_self_directed(&self) -> bool {
        self.from == self.to
    }
}
