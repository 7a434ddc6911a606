//! End-to-end client recovery.
//!
//! # Flow
//! ```text
//! load record → wallet snapshot → duplicate check → guardian check
//!     → replaceClient call data
//!     → [guardian lock] nonce → prepare hash → sign → estimate → gas escalation
//!     → Submission event → clientAddress write-back
//! ```
//!
//! Every invariant check completes before the first nonce read. The ledger
//! is authoritative: the off-chain record is written only after a
//! transaction id is confirmed, and a failed write is logged, never retried.

use std::sync::Arc;

use alloy::primitives::{Address, Bytes, U256};
use tokio::sync::Mutex;
use tracing::Instrument;
use uuid::Uuid;

use crate::blockchain::client::ChainClient;
use crate::blockchain::signer::TransactionSigner;
use crate::blockchain::types::{ChainError, ChainResult, RelayCall, RelayReceipt};
use crate::observability::metrics;
use crate::recovery::confirmation::extract_transaction_id;
use crate::recovery::types::{RecoveryError, RecoveryRequest, RecoveryResult, TransactionOutcome};
use crate::resilience::gas::GasEscalationExecutor;
use crate::store::UserStore;

/// The process-wide guardian credential.
///
/// Constructed once at startup and injected. The lock serializes the
/// nonce-read → sign → submit window for this guardian, since every relay
/// submission consumes the guardian's wallet nonce.
pub struct GuardianIdentity {
    signer: Arc<dyn TransactionSigner>,
    submission_lock: Mutex<()>,
}

impl GuardianIdentity {
    pub fn new(signer: Arc<dyn TransactionSigner>) -> Self {
        Self {
            signer,
            submission_lock: Mutex::new(()),
        }
    }

    pub fn address(&self) -> Address {
        self.signer.address()
    }
}

impl std::fmt::Debug for GuardianIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GuardianIdentity")
            .field("address", &self.address())
            .finish()
    }
}

/// Composes ledger access, signing and escalation into a recovery.
#[derive(Clone)]
pub struct RecoveryOrchestrator {
    chain: Arc<dyn ChainClient>,
    guardian: Arc<GuardianIdentity>,
    store: Arc<dyn UserStore>,
    executor: GasEscalationExecutor,
}

impl RecoveryOrchestrator {
    pub fn new(
        chain: Arc<dyn ChainClient>,
        guardian: Arc<GuardianIdentity>,
        store: Arc<dyn UserStore>,
        executor: GasEscalationExecutor,
    ) -> Self {
        Self {
            chain,
            guardian,
            store,
            executor,
        }
    }

    /// Replace the client of the record's wallet with `new_client`.
    pub async fn execute_recovery(
        &self,
        user_record_id: &str,
        new_client: Address,
    ) -> RecoveryResult<TransactionOutcome> {
        let request_id = Uuid::new_v4();
        let span = tracing::info_span!(
            "recovery",
            %request_id,
            user_record_id,
            new_client = %new_client
        );

        let request = match self
            .load_request(request_id, user_record_id, new_client)
            .instrument(span.clone())
            .await
        {
            Ok(request) => request,
            Err(e) => {
                span.in_scope(|| {
                    tracing::error!(
                        error = %e,
                        kind = ?e.kind(),
                        user_record_id,
                        new_client = %new_client,
                        "Recovery rejected"
                    )
                });
                metrics::record_recovery(e.kind().as_str());
                return Err(e);
            }
        };

        let result = self.recover(&request).instrument(span.clone()).await;

        match &result {
            Ok(outcome) => {
                metrics::record_recovery("success");
                span.in_scope(|| {
                    tracing::info!(
                        transaction_id = ?outcome.transaction_id,
                        record_synced = outcome.record_synced,
                        "Recovery complete"
                    )
                });
            }
            Err(e) => {
                metrics::record_recovery(e.kind().as_str());
                span.in_scope(|| {
                    tracing::error!(
                        error = %e,
                        kind = ?e.kind(),
                        user_record_id = %request.user_record_id,
                        old_client = %request.current_client,
                        new_client = %request.new_client,
                        wallet = %request.wallet,
                        "Recovery failed"
                    )
                });
            }
        }
        result
    }

    /// Run recoveries one after another.
    ///
    /// On-chain submissions for one guardian are never parallelized; each
    /// entry fails or succeeds independently.
    pub async fn recover_many(
        &self,
        entries: &[(String, Address)],
    ) -> Vec<RecoveryResult<TransactionOutcome>> {
        let mut results = Vec::with_capacity(entries.len());
        for (user_record_id, new_client) in entries {
            results.push(self.execute_recovery(user_record_id, *new_client).await);
        }
        results
    }

    async fn load_request(
        &self,
        request_id: Uuid,
        user_record_id: &str,
        new_client: Address,
    ) -> RecoveryResult<RecoveryRequest> {
        let record = self
            .store
            .find_by_id(user_record_id)
            .await?
            .ok_or_else(|| RecoveryError::NotFound(format!("user record {}", user_record_id)))?;

        let (wallet, current_client) = match (record.multi_sig_address, record.client_address) {
            (Some(wallet), Some(client)) => (wallet, client),
            _ => return Err(RecoveryError::InvariantViolation("missing wallet binding".to_string())),
        };

        Ok(RecoveryRequest {
            request_id,
            user_record_id: record.id,
            user_id: record.user_id,
            current_client,
            new_client,
            wallet,
        })
    }

    async fn recover(&self, request: &RecoveryRequest) -> RecoveryResult<TransactionOutcome> {
        let guardian = self.guardian.address();

        let snapshot = self
            .chain
            .wallet_snapshot(request.wallet, request.new_client, guardian)
            .await?;

        if snapshot.candidate_is_member() {
            tracing::info!(owners = ?snapshot.owners, "New client is already a wallet member");
            return Err(RecoveryError::DuplicateOwner {
                address: request.new_client,
                wallet: request.wallet,
            });
        }
        if !snapshot.guardian_authorized {
            return Err(RecoveryError::NotAuthorized {
                guardian,
                wallet: request.wallet,
            });
        }

        let data = self
            .chain
            .replace_client_data(request.current_client, request.new_client);

        let receipt = {
            let _guard = self.guardian.submission_lock.lock().await;
            self.executor
                .execute(|attempt| self.submit_once(request, &data, attempt))
                .await?
        };

        let transaction_id = extract_transaction_id(&receipt, request.wallet)?;
        tracing::info!(%transaction_id, tx_hash = %receipt.tx_hash, "Relay submission confirmed");

        let record_synced = match self
            .store
            .update_client_address(&request.user_id, request.new_client)
            .await
        {
            Ok(_) => true,
            Err(e) => {
                metrics::record_sync_failure();
                tracing::error!(
                    error = %e,
                    user_id = %request.user_id,
                    old_client = %request.current_client,
                    new_client = %request.new_client,
                    %transaction_id,
                    "Ledger updated but user record write failed; needs reconciliation"
                );
                false
            }
        };

        Ok(TransactionOutcome {
            transaction_id: Some(transaction_id),
            confirmed: true,
            tx_hash: Some(receipt.tx_hash),
            record_synced,
        })
    }

    /// One outer attempt: fresh nonce, fresh signature, fresh gas estimate.
    async fn submit_once(
        &self,
        request: &RecoveryRequest,
        data: &Bytes,
        attempt: u32,
    ) -> ChainResult<RelayReceipt> {
        let guardian = self.guardian.address();

        let nonce = self.chain.nonce_of(request.wallet, guardian).await?;
        let hash = self
            .chain
            .prepare_submit_hash(request.wallet, U256::ZERO, data, nonce)
            .await?;
        let signature = self
            .guardian
            .signer
            .sign(hash)
            .await
            .map_err(|e| ChainError::Signing(e.to_string()))?;

        let call = RelayCall {
            wallet: request.wallet,
            value: U256::ZERO,
            data: data.clone(),
            signature,
            submitter: guardian,
        };

        let gas = self.chain.estimate_relay_gas(&call).await?;
        tracing::debug!(attempt, %nonce, estimated_gas = gas, "Submitting relay");

        self.executor
            .attempt(gas, |gas_limit| self.chain.submit_relay(&call, gas_limit))
            .await
    }
}
