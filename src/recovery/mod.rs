//! Guardian-driven client recovery.
//!
//! # Data Flow
//! ```text
//! (user record id, new client)
//!     → orchestrator.rs (preconditions, signing, escalation, write-back)
//!     → confirmation.rs (Submission event → transaction id)
//!
//! Out of band:
//!     reconcile.rs (repair records lagging the ledger)
//!     batch.rs (bulk wallet-binding migration, off-chain only)
//! ```

pub mod batch;
pub mod confirmation;
pub mod orchestrator;
pub mod reconcile;
pub mod types;

pub use batch::{migrate_wallet_bindings, WalletBinding};
pub use confirmation::extract_transaction_id;
pub use orchestrator::{GuardianIdentity, RecoveryOrchestrator};
pub use reconcile::{ReconcileStatus, Reconciler};
pub use types::{
    ErrorKind, RecoveryError, RecoveryRequest, RecoveryResponse, RecoveryResult, TransactionOutcome,
};
