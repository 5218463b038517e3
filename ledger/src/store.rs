//! Account balance storage with atomic conditional writes.

use dashmap::DashMap;

use teller_common::AccountId;

/// Result of a conditional balance write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CasOutcome {
    /// The stored balance matched the expected value and was replaced.
    Committed,
    /// A concurrent writer got there first; `actual` is the balance observed
    /// at write time.
    Conflict { actual: i64 },
    /// No account with this identity exists.
    NotFound,
}

/// Storage contract for account balances.
///
/// A successful `compare_and_set` is linearizable with respect to all other
/// reads and writes on the same account: it behaves as a single atomically
/// applied conditional write, never as a read followed by a write in two
/// steps. On success the new balance is immediately visible to readers.
pub trait BalanceStore: Send + Sync {
    /// Read the current balance, or `None` for an unknown account.
    fn balance(&self, account: AccountId) -> Option<i64>;

    /// Replace the balance only if it still equals `expected`.
    fn compare_and_set(&self, account: AccountId, expected: i64, new: i64) -> CasOutcome;
}

/// In-memory balance store.
///
/// Balances live in a sharded map; holding the shard entry during the
/// conditional write is what makes compare-and-set a single atomic step.
#[derive(Debug, Default)]
pub struct MemoryBalanceStore {
    balances: DashMap<AccountId, i64>,
}

impl MemoryBalanceStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an account with an initial balance.
    ///
    /// Returns `false` if the account already exists. Account creation
    /// belongs to the registration layer; the engine itself never creates or
    /// deletes accounts.
    pub fn open_account(&self, account: AccountId, initial: i64) -> bool {
        match self.balances.entry(account) {
            dashmap::mapref::entry::Entry::Occupied(_) => false,
            dashmap::mapref::entry::Entry::Vacant(slot) => {
                slot.insert(initial);
                true
            }
        }
    }

    /// All registered account identities, in no particular order.
    pub fn accounts(&self) -> Vec<AccountId> {
        self.balances.iter().map(|entry| *entry.key()).collect()
    }

    /// Sum of all balances, widened so conservation audits cannot overflow.
    pub fn total(&self) -> i128 {
        self.balances.iter().map(|entry| *entry.value() as i128).sum()
    }
}

impl BalanceStore for MemoryBalanceStore {
    fn balance(&self, account: AccountId) -> Option<i64> {
        self.balances.get(&account).map(|entry| *entry.value())
    }

    fn compare_and_set(&self, account: AccountId, expected: i64, new: i64) -> CasOutcome {
        match self.balances.get_mut(&account) {
            None => CasOutcome::NotFound,
            Some(mut entry) => {
                if *entry != expected {
                    return CasOutcome::Conflict { actual: *entry };
                }
                *entry = new;
                CasOutcome::Committed
            }
        }
    }
}
