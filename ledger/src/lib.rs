//! Teller Ledger Engine
//!
//! Balance store, append-only transaction journal, and the engine that moves
//! money between accounts under a compare-and-set commit discipline.

pub mod store;
pub mod journal;
pub mod locks;
pub mod config;
pub mod engine;
pub mod query;

pub use store::{BalanceStore, CasOutcome, MemoryBalanceStore};
pub use journal::{AppendError, MemoryTransactionLog, TransactionLog};
pub use locks::AccountLocks;
pub use config::EngineConfig;
pub use engine::LedgerEngine;
pub use query::TransactionView;
