//! Recovery request, outcome and error types.

use alloy::primitives::{Address, TxHash};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::blockchain::types::ChainError;
use crate::resilience::classify::{classify, RetryLayer, RetryVerdict};
use crate::store::StoreError;

/// A single recovery, created at call entry and dropped at call exit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecoveryRequest {
    /// Correlation id carried by every log line of this recovery.
    pub request_id: Uuid,
    pub user_record_id: String,
    pub user_id: String,
    pub current_client: Address,
    pub new_client: Address,
    pub wallet: Address,
}

/// Result of a completed recovery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionOutcome {
    /// Wallet-assigned transaction id, in decimal.
    pub transaction_id: Option<String>,
    pub confirmed: bool,
    pub tx_hash: Option<TxHash>,
    /// False when the ledger changed but the off-chain write failed.
    pub record_synced: bool,
}

/// Closed error taxonomy reported to the surrounding service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    NotFound,
    InvariantViolation,
    TransientChain,
    RetriesExhausted,
    /// Ledger state is indeterminate.
    Unconfirmed,
    Internal,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::NotFound => "not_found",
            ErrorKind::InvariantViolation => "invariant_violation",
            ErrorKind::TransientChain => "transient_chain",
            ErrorKind::RetriesExhausted => "retries_exhausted",
            ErrorKind::Unconfirmed => "unconfirmed",
            ErrorKind::Internal => "internal",
        }
    }
}

/// Errors returned by a recovery.
#[derive(Debug, Error)]
pub enum RecoveryError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    /// The proposed client is already a wallet member.
    #[error("Address {address} is already a member of wallet {wallet}")]
    DuplicateOwner { address: Address, wallet: Address },

    #[error("Guardian {guardian} is not authorized on wallet {wallet}")]
    NotAuthorized { guardian: Address, wallet: Address },

    #[error("Ledger error: {0}")]
    Chain(#[from] ChainError),

    /// Mined without a Submission event; the ledger effect is unknown.
    #[error("Transaction {tx_hash} mined without a Submission event")]
    Unconfirmed { tx_hash: TxHash },

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

pub type RecoveryResult<T> = Result<T, RecoveryError>;

impl RecoveryError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            RecoveryError::NotFound(_) => ErrorKind::NotFound,
            RecoveryError::InvariantViolation(_)
            | RecoveryError::DuplicateOwner { .. }
            | RecoveryError::NotAuthorized { .. } => ErrorKind::InvariantViolation,
            RecoveryError::Chain(ChainError::RetriesExhausted { .. }) => ErrorKind::RetriesExhausted,
            RecoveryError::Chain(e) => match classify(e, RetryLayer::Transient) {
                RetryVerdict::Retryable => ErrorKind::TransientChain,
                RetryVerdict::Fatal => ErrorKind::Internal,
            },
            RecoveryError::Unconfirmed { .. } => ErrorKind::Unconfirmed,
            RecoveryError::Store(_) => ErrorKind::Internal,
        }
    }

    /// True when the caller should answer "not a new value".
    pub fn is_duplicate_owner(&self) -> bool {
        matches!(self, RecoveryError::DuplicateOwner { .. })
    }
}

/// Response handed back to the surrounding service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecoveryResponse {
    pub transaction_id: Option<String>,
    pub error_kind: Option<ErrorKind>,
    #[serde(default)]
    pub not_new_value: bool,
    pub message: Option<String>,
}

impl RecoveryResponse {
    /// True when the recovery produced a transaction id.
    pub fn is_success(&self) -> bool {
        self.error_kind.is_none() && self.transaction_id.is_some()
    }
}

impl From<&RecoveryResult<TransactionOutcome>> for RecoveryResponse {
    fn from(result: &RecoveryResult<TransactionOutcome>) -> Self {
        match result {
            Ok(outcome) => Self {
                transaction_id: outcome.transaction_id.clone(),
                error_kind: None,
                not_new_value: false,
                message: None,
            },
            Err(e) if e.is_duplicate_owner() => Self {
                transaction_id: None,
                error_kind: Some(e.kind()),
                not_new_value: true,
                message: Some("NOT NEW VALUE".to_string()),
            },
            Err(e) => Self {
                transaction_id: None,
                error_kind: Some(e.kind()),
                not_new_value: false,
                message: Some(e.to_string()),
            },
        }
    }
}
