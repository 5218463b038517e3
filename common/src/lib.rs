//! Teller Common Types
//!
//! This crate contains shared types used across the Teller ledger,
//! including identifiers, monetary types, and the transaction record.

pub mod identifiers;
pub mod monetary;
pub mod transaction;
pub mod error;
pub mod time;

pub use identifiers::*;
pub use monetary::*;
pub use transaction::*;
pub use error::*;
pub use time::*;
