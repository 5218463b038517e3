//! Teller Workload Driver
//!
//! Hammers an in-memory ledger engine with concurrent deposits, withdrawals,
//! and transfers, then audits that money was conserved and every success was
//! journaled.

use std::sync::Arc;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use teller_common::AccountId;
use teller_ledger::{EngineConfig, LedgerEngine, MemoryBalanceStore, MemoryTransactionLog};

mod metrics;
mod workload;

use metrics::WorkloadMetrics;
use workload::{run_worker, WorkloadConfig};

/// Teller workload driver CLI
#[derive(Parser, Debug)]
#[command(name = "teller-sim")]
#[command(about = "Teller concurrent workload driver and conservation audit")]
struct Args {
    /// Number of accounts to register
    #[arg(short, long, default_value = "8")]
    accounts: i64,

    /// Number of concurrent workers
    #[arg(short, long, default_value = "4")]
    workers: usize,

    /// Operations per worker
    #[arg(short, long, default_value = "1000")]
    operations: u64,

    /// Opening balance per account, in minor units
    #[arg(long, default_value = "10000")]
    opening_balance: i64,

    /// Largest single operation amount, in minor units
    #[arg(long, default_value = "100")]
    max_amount: i64,

    /// Random seed for reproducibility
    #[arg(long)]
    seed: Option<u64>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();
    if args.accounts < 1 || args.workers < 1 || args.max_amount < 1 {
        anyhow::bail!("accounts, workers, and max-amount must all be at least 1");
    }

    info!("Starting Teller workload driver");
    info!(
        accounts = args.accounts,
        workers = args.workers,
        operations = args.operations,
        "Workload shape"
    );

    let engine_config = EngineConfig::from_env();
    if let Err(e) = engine_config.validate() {
        error!(error = %e, "Invalid configuration");
        anyhow::bail!("configuration error: {e}");
    }

    let store = MemoryBalanceStore::new();
    for id in 1..=args.accounts {
        store.open_account(AccountId::new(id), args.opening_balance);
    }
    let initial_total = store.total();
    let engine = Arc::new(LedgerEngine::with_config(
        store,
        MemoryTransactionLog::new(),
        engine_config,
    ));

    let seed = args.seed.unwrap_or_else(rand::random);
    info!(seed, "Workload seed");

    let config = WorkloadConfig {
        accounts: args.accounts,
        operations: args.operations,
        max_amount: args.max_amount,
    };

    let started = std::time::Instant::now();
    let mut tasks = Vec::with_capacity(args.workers);
    for worker in 0..args.workers {
        let engine = Arc::clone(&engine);
        let config = config.clone();
        let worker_seed = seed.wrapping_add(worker as u64);
        tasks.push(tokio::task::spawn_blocking(move || {
            run_worker(&engine, &config, worker_seed)
        }));
    }

    let mut metrics = WorkloadMetrics::new();
    for task in tasks {
        metrics.merge(task.await?);
    }
    let elapsed = started.elapsed();

    info!("Workload complete");
    info!(
        operations = metrics.operations,
        successes = metrics.successes,
        failures = metrics.failures,
        elapsed_ms = elapsed.as_millis() as u64,
        "Totals"
    );
    for (code, count) in metrics.failure_counts() {
        info!(code, count, "Failures by code");
    }

    // Conservation audit: deposits mint, withdrawals burn, transfers move.
    let expected_total = initial_total + metrics.deposited as i128 - metrics.withdrawn as i128;
    let final_total = engine.balances().total();
    if final_total != expected_total {
        error!(
            expected = %expected_total,
            found = %final_total,
            "Money was created or destroyed"
        );
        anyhow::bail!("conservation audit failed: expected {expected_total}, found {final_total}");
    }

    for id in 1..=args.accounts {
        let balance = engine.balance(AccountId::new(id))?;
        if balance < 0 {
            anyhow::bail!("account {id} went negative: {balance}");
        }
    }

    let journaled = engine.journal().len() as u64;
    if journaled != metrics.successes {
        anyhow::bail!(
            "journal audit failed: {} successes reported, {} records journaled",
            metrics.successes,
            journaled
        );
    }

    info!(
        total = %final_total,
        journaled,
        "Audit passed: money conserved, every success journaled"
    );
    Ok(())
}
