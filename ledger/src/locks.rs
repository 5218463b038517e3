//! Per-account lock table for two-account operations.

use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::lock_api::ArcMutexGuard;
use parking_lot::{Mutex, RawMutex};

use teller_common::AccountId;

type OwnedGuard = ArcMutexGuard<RawMutex, ()>;

/// Holds one or both account locks for the duration of a transfer commit.
///
/// Dropping the guard releases the locks in reverse acquisition order.
pub struct PairGuard {
    _first: OwnedGuard,
    _second: Option<OwnedGuard>,
}

/// Registry of per-account mutexes.
///
/// Single-account operations never lock; they rely on the balance store's
/// conditional write. Transfers lock both touched accounts so that opposing
/// transfers over the same pair serialize instead of livelocking each other's
/// commit cycles.
#[derive(Debug, Default)]
pub struct AccountLocks {
    locks: DashMap<AccountId, Arc<Mutex<()>>>,
}

impl AccountLocks {
    /// Create an empty lock table.
    pub fn new() -> Self {
        Self::default()
    }

    fn handle(&self, account: AccountId) -> Arc<Mutex<()>> {
        self.locks
            .entry(account)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Acquire the locks for a pair of accounts.
    ///
    /// Locks are always taken in ascending identity order, independent of the
    /// direction the caller passed them in, so two transfers moving money in
    /// opposite directions between the same pair cannot circular-wait. An
    /// equal pair takes a single lock.
    pub fn acquire_pair(&self, a: AccountId, b: AccountId) -> PairGuard {
        if a == b {
            return PairGuard {
                _first: self.handle(a).lock_arc(),
                _second: None,
            };
        }

        let (low, high) = if a < b { (a, b) } else { (b, a) };
        let first = self.handle(low).lock_arc();
        let second = self.handle(high).lock_arc();
        PairGuard {
            _first: first,
            _second: Some(second),
        }
    }
}
