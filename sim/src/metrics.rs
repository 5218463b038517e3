//! Workload metrics.

use std::collections::HashMap;

use teller_common::{LedgerError, TransactionKind};

/// Tallies for one worker, merged into a run-wide report.
#[derive(Debug, Clone, Default)]
pub struct WorkloadMetrics {
    /// Total operations attempted.
    pub operations: u64,
    /// Operations that committed.
    pub successes: u64,
    /// Operations that failed.
    pub failures: u64,
    /// Minor units minted by successful deposits.
    pub deposited: i64,
    /// Minor units burned by successful withdrawals.
    pub withdrawn: i64,
    /// Failure counts by error code.
    failure_counts: HashMap<&'static str, u64>,
}

impl WorkloadMetrics {
    /// Create empty metrics.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a committed operation.
    pub fn record_success(&mut self, kind: TransactionKind, amount: i64) {
        self.operations += 1;
        self.successes += 1;
        match kind {
            TransactionKind::Deposit => self.deposited += amount,
            TransactionKind::Withdraw => self.withdrawn += amount,
            TransactionKind::Transfer => {}
        }
    }

    /// Record a failed operation.
    pub fn record_failure(&mut self, error: &LedgerError) {
        self.operations += 1;
        self.failures += 1;
        *self.failure_counts.entry(error.error_code()).or_insert(0) += 1;
    }

    /// Fold another worker's tallies into this one.
    pub fn merge(&mut self, other: WorkloadMetrics) {
        self.operations += other.operations;
        self.successes += other.successes;
        self.failures += other.failures;
        self.deposited += other.deposited;
        self.withdrawn += other.withdrawn;
        for (code, count) in other.failure_counts {
            *self.failure_counts.entry(code).or_insert(0) += count;
        }
    }

    /// Failure counts by error code, sorted for stable reporting.
    pub fn failure_counts(&self) -> Vec<(&'static str, u64)> {
        let mut counts: Vec<_> = self
            .failure_counts
            .iter()
            .map(|(code, count)| (*code, *count))
            .collect();
        counts.sort();
        counts
    }
}
