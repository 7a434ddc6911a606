//! Off-chain record reconciliation.
//!
//! The ledger is authoritative. A record whose `clientAddress` lags the
//! wallet's on-chain client (for example after a write-back failure) is
//! rewritten to match it.

use std::sync::Arc;

use alloy::primitives::Address;
use serde::Serialize;

use crate::blockchain::client::ChainClient;
use crate::recovery::types::{RecoveryError, RecoveryResult};
use crate::store::UserStore;

/// Result of reconciling one record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum ReconcileStatus {
    InSync,
    Repaired { from: Option<Address>, to: Address },
    /// The ledger does not name a single client to adopt.
    Unresolvable { reason: String },
}

/// Compares user records against on-chain wallet membership.
#[derive(Clone)]
pub struct Reconciler {
    chain: Arc<dyn ChainClient>,
    store: Arc<dyn UserStore>,
}

impl Reconciler {
    pub fn new(chain: Arc<dyn ChainClient>, store: Arc<dyn UserStore>) -> Self {
        Self { chain, store }
    }

    /// Registered clients among the wallet's owners.
    pub async fn on_chain_clients(&self, wallet: Address) -> RecoveryResult<Vec<Address>> {
        let owners = self.chain.owners(wallet).await?;
        let mut clients = Vec::new();
        for owner in owners {
            if self.chain.is_client(wallet, owner).await? {
                clients.push(owner);
            }
        }
        Ok(clients)
    }

    pub async fn reconcile(&self, user_record_id: &str) -> RecoveryResult<ReconcileStatus> {
        let record = self
            .store
            .find_by_id(user_record_id)
            .await?
            .ok_or_else(|| RecoveryError::NotFound(format!("user record {}", user_record_id)))?;
        let wallet = record
            .multi_sig_address
            .ok_or_else(|| RecoveryError::InvariantViolation("missing wallet binding".to_string()))?;

        let clients = self.on_chain_clients(wallet).await?;
        let stored = record.client_address;

        let status = match clients.as_slice() {
            [] => ReconcileStatus::Unresolvable {
                reason: format!("wallet {} has no registered client", wallet),
            },
            [client] if stored == Some(*client) => ReconcileStatus::InSync,
            [client] => {
                self.store
                    .update_client_address(&record.user_id, *client)
                    .await?;
                ReconcileStatus::Repaired {
                    from: stored,
                    to: *client,
                }
            }
            many if stored.is_some_and(|s| many.contains(&s)) => ReconcileStatus::InSync,
            many => ReconcileStatus::Unresolvable {
                reason: format!("wallet {} has {} clients", wallet, many.len()),
            },
        };

        match &status {
            ReconcileStatus::Repaired { from, to } => tracing::warn!(
                user_id = %record.user_id,
                %wallet,
                from = ?from,
                to = %to,
                "User record lagged the ledger; repaired"
            ),
            ReconcileStatus::Unresolvable { reason } => {
                tracing::error!(user_id = %record.user_id, %wallet, %reason, "Cannot reconcile user record")
            }
            ReconcileStatus::InSync => tracing::debug!(user_id = %record.user_id, %wallet, "User record in sync"),
        }
        Ok(status)
    }
}
