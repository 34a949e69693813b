//! Durable state
//!
//! Only the seen-item ledger is persisted; every other piece of state
//! (throttle budget, cooldowns) lives for the process lifetime.

pub mod ledger;

pub use ledger::{LedgerError, SeenLedger};
