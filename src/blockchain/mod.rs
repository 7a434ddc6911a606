//! Ledger integration subsystem.
//!
//! # Data Flow
//! ```text
//! Environment variable (guardian key), RPC URL
//!     → signer.rs (key loading, hash signing)
//!     → client.rs (RPC connection with timeouts, wallet reads, relay submission)
//!     → contract.rs (multisig ABI, decoded wallet events)
//! ```
//!
//! # Security Constraints
//! - Private keys ONLY from environment variables
//! - Never log private keys or sensitive data
//! - All RPC calls have configurable timeouts

pub mod client;
pub mod contract;
pub mod signer;
pub mod types;

pub use client::{AlloyChainClient, ChainClient};
pub use contract::WalletEvent;
pub use signer::{GuardianSigner, SignerError, TransactionSigner};
pub use types::{ChainConfig, ChainError, ChainId, ChainResult, RelayCall, RelayReceipt, WalletSnapshot};
