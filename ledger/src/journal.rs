//! Append-only transaction journal.

use parking_lot::RwLock;
use thiserror::Error;

use teller_common::{AccountId, Amount, Transaction, TransactionId, TransactionKind};

/// Failure to durably append a record.
///
/// The in-memory journal never raises this; durable implementations report
/// their storage errors through it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("journal append failed: {reason}")]
pub struct AppendError {
    /// What went wrong, as reported by the backing storage.
    pub reason: String,
}

impl AppendError {
    /// Create an append error.
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

/// Storage contract for the transaction journal.
///
/// Identifiers form a single global strictly increasing sequence assigned at
/// append time, regardless of which account issued the operation. A record,
/// once appended, is never mutated or removed.
pub trait TransactionLog: Send + Sync {
    /// Assign the next identifier, stamp the timestamp, and append.
    ///
    /// The append must be durable before the operation that produced it is
    /// reported as successful to the caller.
    fn append(
        &self,
        kind: TransactionKind,
        from: AccountId,
        to: AccountId,
        amount: Amount,
    ) -> Result<Transaction, AppendError>;

    /// All records in which the account participates as source or
    /// destination, in ascending identifier order.
    fn entries_for(&self, account: AccountId) -> Vec<Transaction>;

    /// Point lookup by identifier.
    fn entry(&self, id: TransactionId) -> Option<Transaction>;
}

/// In-memory journal.
///
/// The write lock makes identifier assignment atomic with the append, so
/// identifier order equals append order.
#[derive(Debug, Default)]
pub struct MemoryTransactionLog {
    entries: RwLock<Vec<Transaction>>,
}

impl MemoryTransactionLog {
    /// Create an empty journal.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records appended so far.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Check whether the journal is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl TransactionLog for MemoryTransactionLog {
    fn append(
        &self,
        kind: TransactionKind,
        from: AccountId,
        to: AccountId,
        amount: Amount,
    ) -> Result<Transaction, AppendError> {
        let mut entries = self.entries.write();
        let transaction = Transaction {
            id: TransactionId::new(entries.len() as i64 + 1),
            kind,
            from,
            to,
            amount,
            at: teller_common::time::now(),
        };
        entries.push(transaction.clone());
        Ok(transaction)
    }

    fn entries_for(&self, account: AccountId) -> Vec<Transaction> {
        self.entries
            .read()
            .iter()
            .filter(|transaction| transaction.participates(account))
            .cloned()
            .collect()
    }

    fn entry(&self, id: TransactionId) -> Option<Transaction> {
        let entries = self.entries.read();
        entries
            .binary_search_by_key(&id, |transaction| transaction.id)
            .ok()
            .map(|index| entries[index].clone())
    }
}
