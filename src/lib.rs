//! Guardian relay: key recovery for multisig wallets.

pub mod blockchain;
pub mod config;
pub mod observability;
pub mod recovery;
pub mod resilience;
pub mod store;

pub use config::schema::GuardianConfig;
pub use recovery::{RecoveryOrchestrator, Reconciler};
