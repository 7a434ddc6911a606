//! Chain-specific types and error definitions.

use alloy::primitives::{Address, Bytes, Log, TxHash, U256};
use thiserror::Error;

// Re-export ChainConfig from config module to avoid duplication
pub use crate::config::schema::ChainConfig;

/// Chain ID type for strong typing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChainId(pub u64);

impl From<u64> for ChainId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl From<ChainId> for u64 {
    fn from(id: ChainId) -> Self {
        id.0
    }
}

/// Errors that can occur during ledger operations.
#[derive(Debug, Clone, Error)]
pub enum ChainError {
    /// RPC connection or request failed.
    #[error("RPC error: {0}")]
    Rpc(String),

    /// RPC request timed out.
    #[error("RPC timeout after {0} seconds")]
    Timeout(u64),

    /// Call or transaction was reverted on-chain.
    #[error("Transaction reverted: {0}")]
    Reverted(String),

    /// Gas limit could not be predicted or was too low for execution.
    #[error("Insufficient gas: {0}")]
    InsufficientGas(String),

    /// Sender nonce was rejected by the node.
    #[error("Nonce error: {0}")]
    Nonce(String),

    /// Chain configuration mismatch.
    #[error("Chain ID mismatch: expected {expected}, got {actual}")]
    ChainMismatch { expected: u64, actual: u64 },

    /// Return data or log data did not match the contract ABI.
    #[error("ABI error: {0}")]
    Abi(String),

    /// The guardian could not sign the prepared submission hash.
    #[error("Signing error: {0}")]
    Signing(String),

    /// The guardian account cannot pay for the transaction.
    #[error("Insufficient funds: {0}")]
    InsufficientFunds(String),

    /// Client not initialized or misconfigured.
    #[error("Ledger not available: {0}")]
    NotAvailable(String),

    /// Every escalation attempt failed.
    #[error("Retries exhausted after {attempts} attempts: {last}")]
    RetriesExhausted { attempts: u32, last: Box<ChainError> },
}

/// Result type for ledger operations.
pub type ChainResult<T> = Result<T, ChainError>;

/// Membership state of a wallet, read fresh for a single recovery.
///
/// Never cached: every field is authoritative only at the instant it was read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalletSnapshot {
    /// Wallet contract address.
    pub wallet: Address,
    /// Address proposed as the new client.
    pub candidate: Address,
    /// Current owner set (guardian and client).
    pub owners: Vec<Address>,
    /// Whether the candidate address is already a registered client.
    pub candidate_is_client: bool,
    /// Whether the guardian is an authorized guardian on this wallet.
    pub guardian_authorized: bool,
}

impl WalletSnapshot {
    /// True if the candidate already belongs to the owner/client set.
    pub fn candidate_is_member(&self) -> bool {
        self.candidate_is_client || self.owners.contains(&self.candidate)
    }
}

/// A fully signed relay submission against a wallet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayCall {
    /// Wallet contract receiving the relay (also the inner call's destination).
    pub wallet: Address,
    /// Native value forwarded with the inner call.
    pub value: U256,
    /// Encoded inner call.
    pub data: Bytes,
    /// Guardian signature over the prepared submission hash.
    pub signature: Bytes,
    /// Address whose nonce the signature consumed.
    pub submitter: Address,
}

/// Mined receipt of a relay submission, reduced to what recovery consumes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayReceipt {
    pub tx_hash: TxHash,
    pub block_number: Option<u64>,
    pub gas_used: u64,
    pub logs: Vec<Log>,
}
