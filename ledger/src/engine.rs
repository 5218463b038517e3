//! Core ledger engine implementation.

use tracing::{error, info, instrument, warn};

use teller_common::{
    AccountId, Amount, LedgerError, Result, Transaction, TransactionId, TransactionKind,
};

use crate::config::EngineConfig;
use crate::journal::TransactionLog;
use crate::locks::AccountLocks;
use crate::query::TransactionView;
use crate::store::{BalanceStore, CasOutcome};

/// The ledger engine owns the write path to balances and the append path to
/// the journal. Every mutation goes through a read-compute-commit cycle on
/// the store's conditional write; a plain read followed by an unconditional
/// write never happens.
pub struct LedgerEngine<S, L> {
    balances: S,
    journal: L,
    transfer_locks: AccountLocks,
    config: EngineConfig,
}

impl<S: BalanceStore, L: TransactionLog> LedgerEngine<S, L> {
    /// Create an engine with the default configuration.
    pub fn new(balances: S, journal: L) -> Self {
        Self::with_config(balances, journal, EngineConfig::default())
    }

    /// Create an engine with an explicit configuration.
    pub fn with_config(balances: S, journal: L, config: EngineConfig) -> Self {
        Self {
            balances,
            journal,
            transfer_locks: AccountLocks::new(),
            config,
        }
    }

    /// The balance store behind this engine.
    pub fn balances(&self) -> &S {
        &self.balances
    }

    /// The transaction journal behind this engine.
    pub fn journal(&self) -> &L {
        &self.journal
    }

    /// Read the current balance of an account.
    pub fn balance(&self, account: AccountId) -> Result<i64> {
        self.balances
            .balance(account)
            .ok_or(LedgerError::AccountNotFound(account))
    }

    /// Add money to an account.
    #[instrument(skip(self))]
    pub fn deposit(&self, account: AccountId, amount: Amount) -> Result<Transaction> {
        let units = amount.minor_units();
        let (_, new_balance) = self.commit_with_retry(account, |old| {
            old.checked_add(units)
                .ok_or(LedgerError::BalanceOverflow { account })
        })?;

        let transaction = self.record(TransactionKind::Deposit, account, account, amount)?;
        info!(
            account = %account,
            amount = %amount,
            balance = new_balance,
            transaction = %transaction.id,
            "Deposit committed"
        );
        Ok(transaction)
    }

    /// Remove money from an account.
    ///
    /// The sufficient-funds check runs against the same balance the
    /// conditional write compares, so a balance that was sufficient at read
    /// time but insufficient by commit time is re-validated on the retry.
    #[instrument(skip(self))]
    pub fn withdraw(&self, account: AccountId, amount: Amount) -> Result<Transaction> {
        let units = amount.minor_units();
        let (_, new_balance) = self.commit_with_retry(account, |old| {
            if old < units {
                return Err(LedgerError::InsufficientFunds {
                    required: units,
                    available: old,
                });
            }
            Ok(old - units)
        })?;

        let transaction = self.record(TransactionKind::Withdraw, account, account, amount)?;
        info!(
            account = %account,
            amount = %amount,
            balance = new_balance,
            transaction = %transaction.id,
            "Withdrawal committed"
        );
        Ok(transaction)
    }

    /// Move money between two accounts.
    ///
    /// Both per-account locks are acquired in ascending identity order,
    /// independent of transfer direction, so opposing transfers over the same
    /// pair cannot circular-wait. Either both balance mutations and the
    /// single journal append happen, or none do.
    #[instrument(skip(self))]
    pub fn transfer(&self, from: AccountId, to: AccountId, amount: Amount) -> Result<Transaction> {
        if from == to {
            return self.self_transfer(from, amount);
        }

        // Both endpoints must exist before any mutation; accounts are never
        // deleted, so the check stays valid for the rest of the operation.
        self.balance(from)?;
        self.balance(to)?;

        let _guard = self.transfer_locks.acquire_pair(from, to);
        let units = amount.minor_units();

        self.commit_with_retry(from, |old| {
            if old < units {
                return Err(LedgerError::InsufficientFunds {
                    required: units,
                    available: old,
                });
            }
            Ok(old - units)
        })?;

        if let Err(credit_err) = self.commit_with_retry(to, |old| {
            old.checked_add(units)
                .ok_or(LedgerError::BalanceOverflow { account: to })
        }) {
            warn!(
                from = %from,
                to = %to,
                amount = %amount,
                error = %credit_err,
                "Credit leg failed, compensating debit"
            );
            self.commit_with_retry(from, |old| {
                old.checked_add(units)
                    .ok_or(LedgerError::BalanceOverflow { account: from })
            })
            .map_err(|comp_err| {
                error!(
                    from = %from,
                    to = %to,
                    amount = %amount,
                    credit_error = %credit_err,
                    compensation_error = %comp_err,
                    "Transfer compensation failed; manual reconciliation required"
                );
                LedgerError::Inconsistent {
                    detail: format!(
                        "transfer {from}->{to} amount {amount}: debit committed, \
                         credit failed ({credit_err}), compensation failed ({comp_err})"
                    ),
                }
            })?;
            return Err(credit_err);
        }

        let transaction = self.record(TransactionKind::Transfer, from, to, amount)?;
        info!(
            from = %from,
            to = %to,
            amount = %amount,
            transaction = %transaction.id,
            "Transfer committed"
        );
        Ok(transaction)
    }

    /// All transactions the account participates in, ascending by
    /// identifier. The result is a snapshot of the log state at call time.
    pub fn list_transactions(&self, account: AccountId) -> Vec<TransactionView> {
        self.journal
            .entries_for(account)
            .iter()
            .map(TransactionView::from)
            .collect()
    }

    /// Fetch one transaction, only for a participant.
    ///
    /// A missing identifier reports the same denial as a non-participant
    /// query, so the existence of other accounts' transactions never leaks.
    pub fn get_transaction(
        &self,
        account: AccountId,
        id: TransactionId,
    ) -> Result<TransactionView> {
        match self.journal.entry(id) {
            Some(transaction) if transaction.participates(account) => {
                Ok(TransactionView::from(&transaction))
            }
            _ => Err(LedgerError::AccessDenied),
        }
    }

    /// A transfer to the same account moves no money; it still requires the
    /// account to exist and hold the funds, and still journals one record.
    fn self_transfer(&self, account: AccountId, amount: Amount) -> Result<Transaction> {
        let available = self.balance(account)?;
        let units = amount.minor_units();
        if available < units {
            return Err(LedgerError::InsufficientFunds {
                required: units,
                available,
            });
        }

        let transaction = self.record(TransactionKind::Transfer, account, account, amount)?;
        info!(
            account = %account,
            amount = %amount,
            transaction = %transaction.id,
            "Self-transfer journaled"
        );
        Ok(transaction)
    }

    /// Run the read-compute-commit cycle until it commits, the computation
    /// rejects, or the retry budget runs out. Returns `(old, new)` balances
    /// of the committed write.
    fn commit_with_retry(
        &self,
        account: AccountId,
        compute: impl Fn(i64) -> Result<i64>,
    ) -> Result<(i64, i64)> {
        let mut attempts = 0;
        loop {
            attempts += 1;
            let old = self
                .balances
                .balance(account)
                .ok_or(LedgerError::AccountNotFound(account))?;
            let new = compute(old)?;

            match self.balances.compare_and_set(account, old, new) {
                CasOutcome::Committed => return Ok((old, new)),
                CasOutcome::NotFound => return Err(LedgerError::AccountNotFound(account)),
                CasOutcome::Conflict { .. } => {
                    if attempts >= self.config.max_commit_attempts {
                        warn!(account = %account, attempts, "Commit retry budget exhausted");
                        return Err(LedgerError::TransientConflict { account, attempts });
                    }
                }
            }
        }
    }

    /// Append to the journal after balances are committed. A failure here is
    /// a correctness gap, not a user input problem.
    fn record(
        &self,
        kind: TransactionKind,
        from: AccountId,
        to: AccountId,
        amount: Amount,
    ) -> Result<Transaction> {
        self.journal.append(kind, from, to, amount).map_err(|err| {
            error!(
                kind = %kind,
                from = %from,
                to = %to,
                amount = %amount,
                error = %err,
                "Journal append failed after balance commit; manual reconciliation required"
            );
            LedgerError::Inconsistent {
                detail: format!(
                    "{kind} {from}->{to} amount {amount} committed to balances \
                     but not journaled: {err}"
                ),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::journal::{AppendError, MemoryTransactionLog};
    use crate::store::MemoryBalanceStore;

    fn amount(value: i64) -> Amount {
        Amount::new(value).unwrap()
    }

    fn engine_with_accounts(
        accounts: &[(i64, i64)],
    ) -> LedgerEngine<MemoryBalanceStore, MemoryTransactionLog> {
        let store = MemoryBalanceStore::new();
        for (id, balance) in accounts {
            store.open_account(AccountId::new(*id), *balance);
        }
        LedgerEngine::new(store, MemoryTransactionLog::new())
    }

    #[test]
    fn test_deposit_updates_balance_and_journal() {
        let engine = engine_with_accounts(&[(1, 100)]);
        let account = AccountId::new(1);

        let transaction = engine.deposit(account, amount(50)).unwrap();

        assert_eq!(engine.balance(account).unwrap(), 150);
        assert_eq!(transaction.kind, TransactionKind::Deposit);
        assert_eq!(transaction.from, account);
        assert_eq!(transaction.to, account);
        assert_eq!(engine.journal().len(), 1);
    }

    #[test]
    fn test_withdraw_insufficient_funds_leaves_balance_unchanged() {
        let engine = engine_with_accounts(&[(1, 150)]);
        let account = AccountId::new(1);

        let err = engine.withdraw(account, amount(200)).unwrap_err();

        assert_eq!(
            err,
            LedgerError::InsufficientFunds {
                required: 200,
                available: 150,
            }
        );
        assert_eq!(engine.balance(account).unwrap(), 150);
        assert!(engine.journal().is_empty());
    }

    #[test]
    fn test_deposit_withdraw_transfer_flow() {
        let engine = engine_with_accounts(&[(1, 100), (2, 0)]);
        let a = AccountId::new(1);
        let b = AccountId::new(2);

        engine.deposit(a, amount(50)).unwrap();
        assert_eq!(engine.balance(a).unwrap(), 150);

        assert!(engine.withdraw(a, amount(200)).is_err());
        assert_eq!(engine.balance(a).unwrap(), 150);

        let transfer = engine.transfer(a, b, amount(100)).unwrap();
        assert_eq!(engine.balance(a).unwrap(), 50);
        assert_eq!(engine.balance(b).unwrap(), 100);
        assert_eq!(transfer.kind, TransactionKind::Transfer);
        assert_eq!(transfer.from, a);
        assert_eq!(transfer.to, b);
        assert_eq!(engine.journal().len(), 2);
    }

    #[test]
    fn test_invalid_amounts_never_reach_the_store() {
        let engine = engine_with_accounts(&[(1, 100)]);

        // Amounts are validated at construction, before any engine call.
        assert_eq!(
            Amount::new(0).unwrap_err(),
            LedgerError::InvalidAmount { amount: 0 }
        );
        assert_eq!(
            Amount::new(-5).unwrap_err(),
            LedgerError::InvalidAmount { amount: -5 }
        );

        assert_eq!(engine.balance(AccountId::new(1)).unwrap(), 100);
        assert!(engine.journal().is_empty());
    }

    #[test]
    fn test_transfer_to_unknown_account_mutates_nothing() {
        let engine = engine_with_accounts(&[(1, 100)]);
        let a = AccountId::new(1);
        let ghost = AccountId::new(9);

        let err = engine.transfer(a, ghost, amount(10)).unwrap_err();

        assert_eq!(err, LedgerError::AccountNotFound(ghost));
        assert_eq!(engine.balance(a).unwrap(), 100);
        assert!(engine.journal().is_empty());
    }

    #[test]
    fn test_self_transfer_conserves_and_journals_once() {
        let engine = engine_with_accounts(&[(1, 100)]);
        let account = AccountId::new(1);

        let transaction = engine.transfer(account, account, amount(40)).unwrap();

        assert_eq!(engine.balance(account).unwrap(), 100);
        assert_eq!(transaction.kind, TransactionKind::Transfer);
        assert!(transaction.is_self_directed());
        assert_eq!(engine.journal().len(), 1);

        // Still subject to the sufficient-funds rule.
        let err = engine.transfer(account, account, amount(500)).unwrap_err();
        assert_eq!(
            err,
            LedgerError::InsufficientFunds {
                required: 500,
                available: 100,
            }
        );
        assert_eq!(engine.journal().len(), 1);
    }

    #[test]
    fn test_deposit_overflow_commits_nothing() {
        let engine = engine_with_accounts(&[(1, i64::MAX - 10)]);
        let account = AccountId::new(1);

        let err = engine.deposit(account, amount(100)).unwrap_err();

        assert_eq!(err, LedgerError::BalanceOverflow { account });
        assert_eq!(engine.balance(account).unwrap(), i64::MAX - 10);
        assert!(engine.journal().is_empty());
    }

    #[test]
    fn test_get_transaction_denies_non_participants() {
        let engine = engine_with_accounts(&[(1, 100), (2, 0), (3, 0)]);
        let a = AccountId::new(1);
        let b = AccountId::new(2);
        let outsider = AccountId::new(3);

        let transaction = engine.transfer(a, b, amount(10)).unwrap();

        assert!(engine.get_transaction(a, transaction.id).is_ok());
        assert!(engine.get_transaction(b, transaction.id).is_ok());

        let denied = engine.get_transaction(outsider, transaction.id).unwrap_err();
        assert_eq!(denied, LedgerError::AccessDenied);

        // A missing id is indistinguishable from a denial.
        let missing = engine
            .get_transaction(a, TransactionId::new(999))
            .unwrap_err();
        assert_eq!(missing, denied);
    }

    #[test]
    fn test_list_transactions_orders_and_suppresses_self_endpoints() {
        let engine = engine_with_accounts(&[(1, 100), (2, 0)]);
        let a = AccountId::new(1);
        let b = AccountId::new(2);

        engine.deposit(a, amount(50)).unwrap();
        engine.transfer(a, b, amount(30)).unwrap();
        engine.withdraw(a, amount(5)).unwrap();

        let history = engine.list_transactions(a);
        assert_eq!(history.len(), 3);
        let ids: Vec<i64> = history.iter().map(|view| view.id.as_i64()).collect();
        assert_eq!(ids, vec![1, 2, 3]);

        // Self-operations hide their endpoints; the transfer keeps them.
        assert_eq!(history[0].from, None);
        assert_eq!(history[0].to, None);
        assert_eq!(history[1].from, Some(a));
        assert_eq!(history[1].to, Some(b));
        assert_eq!(history[2].from, None);

        // The counterparty sees the shared transfer only.
        let other_side = engine.list_transactions(b);
        assert_eq!(other_side.len(), 1);
        assert_eq!(other_side[0].id.as_i64(), 2);
    }

    /// Store double whose conditional write never succeeds.
    struct ContendedStore {
        inner: MemoryBalanceStore,
    }

    impl BalanceStore for ContendedStore {
        fn balance(&self, account: AccountId) -> Option<i64> {
            self.inner.balance(account)
        }

        fn compare_and_set(&self, account: AccountId, _expected: i64, _new: i64) -> CasOutcome {
            CasOutcome::Conflict {
                actual: self.inner.balance(account).unwrap_or(0),
            }
        }
    }

    #[test]
    fn test_retry_budget_exhaustion_surfaces_transient_conflict() {
        let inner = MemoryBalanceStore::new();
        let account = AccountId::new(1);
        inner.open_account(account, 100);

        let engine = LedgerEngine::with_config(
            ContendedStore { inner },
            MemoryTransactionLog::new(),
            EngineConfig {
                max_commit_attempts: 3,
            },
        );

        let err = engine.deposit(account, amount(10)).unwrap_err();
        assert_eq!(err, LedgerError::TransientConflict { account, attempts: 3 });
        assert!(err.is_retryable());
        assert!(engine.journal().is_empty());
    }

    /// Journal double that refuses every append.
    struct RefusingLog;

    impl TransactionLog for RefusingLog {
        fn append(
            &self,
            _kind: TransactionKind,
            _from: AccountId,
            _to: AccountId,
            _amount: Amount,
        ) -> std::result::Result<Transaction, AppendError> {
            Err(AppendError::new("disk full"))
        }

        fn entries_for(&self, _account: AccountId) -> Vec<Transaction> {
            Vec::new()
        }

        fn entry(&self, _id: TransactionId) -> Option<Transaction> {
            None
        }
    }

    #[test]
    fn test_append_failure_after_commit_is_inconsistent() {
        let store = MemoryBalanceStore::new();
        let account = AccountId::new(1);
        store.open_account(account, 100);

        let engine = LedgerEngine::new(store, RefusingLog);
        let err = engine.deposit(account, amount(50)).unwrap_err();

        assert_eq!(err.error_code(), "INCONSISTENT");
        // The balance mutation stands; the gap is surfaced, not rolled back.
        assert_eq!(engine.balance(account).unwrap(), 150);
    }
}
