//! Timeout enforcement.
//!
//! Every ledger call gets a deadline; a hung RPC surfaces as
//! `ChainError::Timeout` instead of blocking the caller indefinitely.

use std::future::Future;
use std::time::Duration;

use crate::blockchain::types::{ChainError, ChainResult};

/// Run `fut` under `deadline`, mapping expiry to `ChainError::Timeout`.
pub async fn with_deadline<T, F>(deadline: Duration, fut: F) -> ChainResult<T>
where
    F: Future<Output = ChainResult<T>>,
{
    match tokio::time::timeout(deadline, fut).await {
        Ok(result) => result,
        Err(_) => Err(ChainError::Timeout(deadline.as_secs())),
    }
}
