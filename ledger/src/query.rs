//! Externally rendered transaction views.

use serde::{Deserialize, Serialize};

use teller_common::{AccountId, Amount, Timestamp, Transaction, TransactionId, TransactionKind};

/// A transaction as rendered to callers.
///
/// Self-operations (deposits and withdrawals, where source equals
/// destination) suppress both endpoints; they only carry meaning for a true
/// transfer. The kind discriminant disambiguates regardless.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionView {
    /// Log-assigned identifier.
    pub id: TransactionId,
    /// Kind of movement.
    pub kind: TransactionKind,
    /// Source account, present only when it differs from the destination.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<AccountId>,
    /// Destination account, present only when it differs from the source.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<AccountId>,
    /// Amount moved, in minor units.
    pub amount: Amount,
    /// When the movement committed.
    pub at: Timestamp,
}

impl From<&Transaction> for TransactionView {
    fn from(transaction: &Transaction) -> Self {
        let (from, to) = if transaction.is_self_directed() {
            (None, None)
        } else {
            (Some(transaction.from), Some(transaction.to))
        };

        Self {
            id: transaction.id,
            kind: transaction.kind,
            from,
            to,
            amount: transaction.amount,
            at: transaction.at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use teller_common::time::now;

    fn record(kind: TransactionKind, from: i64, to: i64) -> Transaction {
        Transaction {
            id: TransactionId::new(1),
            kind,
            from: AccountId::new(from),
            to: AccountId::new(to),
            amount: Amount::new(50).unwrap(),
            at: now(),
        }
    }

    #[test]
    fn test_self_operation_suppresses_endpoints() {
        let view = TransactionView::from(&record(TransactionKind::Deposit, 1, 1));
        assert_eq!(view.from, None);
        assert_eq!(view.to, None);

        let json = serde_json::to_value(&view).unwrap();
        assert!(json.get("from").is_none());
        assert!(json.get("to").is_none());
        assert_eq!(json["kind"], "deposit");
        assert_eq!(json["amount"], 50);
    }

    #[test]
    fn test_transfer_keeps_endpoints() {
        let view = TransactionView::from(&record(TransactionKind::Transfer, 1, 2));
        assert_eq!(view.from, Some(AccountId::new(1)));
        assert_eq!(view.to, Some(AccountId::new(2)));

        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["from"], 1);
        assert_eq!(json["to"], 2);
    }

    #[test]
    fn test_view_roundtrips_without_endpoints() {
        let view = TransactionView::from(&record(TransactionKind::Withdraw, 3, 3));
        let json = serde_json::to_string(&view).unwrap();
        let back: TransactionView = serde_json::from_str(&json).unwrap();
        assert_eq!(back, view);
    }
}
