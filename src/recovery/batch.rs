//! Bulk wallet-binding migration.
//!
//! Rewrites many user records' wallet bindings in one pass. Off-chain only:
//! nothing here touches the ledger, so the worker width bounds load on the
//! store and nothing else.

use alloy::primitives::Address;
use futures_util::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};

use crate::store::{UserRecord, UserStore};

/// One entry of a migration batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletBinding {
    pub user_id: String,
    pub multi_sig_address: Address,
    #[serde(default)]
    pub client_address: Option<Address>,
}

/// Apply `bindings` with at most `concurrency` writes in flight.
///
/// Results are returned in input order. A failed or invalid entry yields
/// `None` and does not stop the batch.
pub async fn migrate_wallet_bindings(
    store: &dyn UserStore,
    bindings: Vec<WalletBinding>,
    concurrency: usize,
) -> Vec<Option<UserRecord>> {
    let total = bindings.len();

    let results: Vec<Option<UserRecord>> = stream::iter(bindings)
        .map(|binding| async move {
            if binding.user_id.trim().is_empty() {
                tracing::warn!(multi_sig = %binding.multi_sig_address, "Skipping binding without user id");
                return None;
            }
            match store
                .update_wallet_binding(&binding.user_id, binding.multi_sig_address, binding.client_address)
                .await
            {
                Ok(record) => Some(record),
                Err(e) => {
                    tracing::warn!(user_id = %binding.user_id, error = %e, "Wallet binding update failed");
                    None
                }
            }
        })
        .buffered(concurrency.max(1))
        .collect()
        .await;

    let updated = results.iter().filter(|r| r.is_some()).count();
    tracing::info!(total, updated, failed = total - updated, "Wallet binding migration finished");
    results
}
