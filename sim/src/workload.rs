//! Random operation workload.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use teller_common::{AccountId, Amount};
use teller_ledger::{LedgerEngine, MemoryBalanceStore, MemoryTransactionLog};

use crate::metrics::WorkloadMetrics;

/// Engine type the simulator drives.
pub type SimEngine = LedgerEngine<MemoryBalanceStore, MemoryTransactionLog>;

/// Per-worker workload parameters.
#[derive(Debug, Clone)]
pub struct WorkloadConfig {
    /// Number of registered accounts (identities `1..=accounts`).
    pub accounts: i64,
    /// Operations per worker.
    pub operations: u64,
    /// Upper bound on a single operation's amount, in minor units.
    pub max_amount: i64,
}

/// Run one worker's operation mix against the engine.
///
/// Roughly 30% deposits, 30% withdrawals, 40% transfers (self-transfers
/// included), with amounts and accounts drawn from a seeded generator so a
/// run is reproducible.
pub fn run_worker(engine: &SimEngine, config: &WorkloadConfig, seed: u64) -> WorkloadMetrics {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut metrics = WorkloadMetrics::new();

    for _ in 0..config.operations {
        let account = AccountId::new(rng.gen_range(1..=config.accounts));
        let units = rng.gen_range(1..=config.max_amount);
        let amount = Amount::new(units).expect("amount range starts at 1");

        let result = match rng.gen_range(0..10) {
            0..=2 => engine.deposit(account, amount),
            3..=5 => engine.withdraw(account, amount),
            _ => {
                let to = AccountId::new(rng.gen_range(1..=config.accounts));
                engine.transfer(account, to, amount)
            }
        };

        match result {
            Ok(transaction) => metrics.record_success(transaction.kind, units),
            Err(error) => metrics.record_failure(&error),
        }
    }

    metrics
}
