//! Time utilities for the Teller ledger.

use chrono::{DateTime, Utc};

/// A timestamp with timezone (always UTC for Teller).
pub type Timestamp = DateTime<Utc>;

/// Get the current timestamp.
pub fn now() -> Timestamp {
    Utc::now()
}
