//! Shared retry classification.
//!
//! Both escalation layers ask the same question of a failure: may the
//! attempt be repeated? The answer depends on which layer is asking.
//!
//! | error                        | gas escalation | transient retry |
//! |------------------------------|----------------|-----------------|
//! | `Reverted`, `InsufficientGas`| Retryable      | Retryable       |
//! | `Rpc`, `Timeout`, `Nonce`    | Fatal          | Retryable       |
//! | `RetriesExhausted`           | Fatal          | Retryable       |
//! | `ChainMismatch`, `Abi`, `Signing`, `InsufficientFunds`, `NotAvailable` | Fatal | Fatal |

use crate::blockchain::types::ChainError;

/// Outcome of classifying a single failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryVerdict {
    Retryable,
    Fatal,
}

/// The retry loop asking for a verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryLayer {
    /// Inner loop: doubles the gas limit between attempts.
    GasEscalation,
    /// Outer loop: restarts the whole submission after a flat delay.
    Transient,
}

/// Classify `err` for the given retry layer.
pub fn classify(err: &ChainError, layer: RetryLayer) -> RetryVerdict {
    match (err, layer) {
        (ChainError::Reverted(_) | ChainError::InsufficientGas(_), _) => RetryVerdict::Retryable,
        (
            ChainError::Rpc(_)
            | ChainError::Timeout(_)
            | ChainError::Nonce(_)
            | ChainError::RetriesExhausted { .. },
            RetryLayer::Transient,
        ) => RetryVerdict::Retryable,
        _ => RetryVerdict::Fatal,
    }
}
