//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Relay submission:
//!     → gas.rs (outer flat-delay retry → inner gas-doubling attempts)
//!     → classify.rs (one verdict per failure, per layer)
//!     → timeouts.rs (deadline on every ledger call)
//! ```
//!
//! # Design Decisions
//! - Timeouts are non-negotiable; every external call has a deadline
//! - Both retry layers share one classifier
//! - Retried submissions are safe only because recovery preconditions are
//!   re-checked by the wallet contract (stale nonce or existing client reverts)

pub mod classify;
pub mod gas;
pub mod timeouts;

pub use classify::{classify, RetryLayer, RetryVerdict};
pub use gas::{EscalationPolicy, GasEscalationExecutor};
