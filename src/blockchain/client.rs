//! Ledger gateway: wallet reads, call-data construction, relay submission.
//!
//! # Responsibilities
//! - Connect to JSON-RPC endpoints (primary + read failovers)
//! - Query wallet membership and guardian nonces
//! - Estimate gas and submit relay transactions
//! - Enforce a deadline on every call
//!
//! Nothing is cached. Every value is authoritative only at the instant it
//! was read.

use std::sync::Arc;
use std::time::Duration;

use alloy::network::TransactionBuilder;
use alloy::primitives::{Address, Bytes, B256, U256};
use alloy::providers::{DynProvider, Provider, ProviderBuilder};
use alloy::rpc::types::TransactionRequest;
use alloy::sol_types::SolCall;
use alloy::transports::TransportError;
use async_trait::async_trait;
use tokio::sync::OnceCell;
use tokio::time::timeout;

use crate::blockchain::contract::IKeyMultiSig;
use crate::blockchain::signer::{GuardianSigner, TransactionSigner};
use crate::blockchain::types::{
    ChainConfig, ChainError, ChainId, ChainResult, RelayCall, RelayReceipt, WalletSnapshot,
};
use crate::observability::metrics;
use crate::resilience::timeouts::with_deadline;

/// Read/write access to multisig wallets on the ledger.
#[async_trait]
pub trait ChainClient: Send + Sync {
    /// Current owner set of `wallet`.
    async fn owners(&self, wallet: Address) -> ChainResult<Vec<Address>>;

    /// Whether `account` is a registered client of `wallet`.
    async fn is_client(&self, wallet: Address, account: Address) -> ChainResult<bool>;

    /// Whether `account` is an authorized guardian of `wallet`.
    async fn is_guardian(&self, wallet: Address, account: Address) -> ChainResult<bool>;

    /// Relay nonce the wallet currently expects from `account`.
    async fn nonce_of(&self, wallet: Address, account: Address) -> ChainResult<U256>;

    /// Hash the wallet requires a signature over for a relayed submission.
    async fn prepare_submit_hash(
        &self,
        wallet: Address,
        value: U256,
        data: &Bytes,
        nonce: U256,
    ) -> ChainResult<B256>;

    /// Gas estimate for submitting `call`.
    async fn estimate_relay_gas(&self, call: &RelayCall) -> ChainResult<u64>;

    /// Submit `call` with an explicit gas limit and wait for it to be mined.
    ///
    /// A mined-but-reverted transaction is reported as `ChainError::Reverted`.
    async fn submit_relay(&self, call: &RelayCall, gas_limit: u64) -> ChainResult<RelayReceipt>;

    /// Unsigned call data replacing `old_client` with `new_client`.
    fn replace_client_data(&self, old_client: Address, new_client: Address) -> Bytes {
        Bytes::from(
            IKeyMultiSig::replaceClientCall {
                client: old_client,
                newClient: new_client,
            }
            .abi_encode(),
        )
    }

    /// Read the membership state a recovery must validate against.
    async fn wallet_snapshot(
        &self,
        wallet: Address,
        candidate: Address,
        guardian: Address,
    ) -> ChainResult<WalletSnapshot> {
        let (owners, candidate_is_client, guardian_authorized) = tokio::try_join!(
            self.owners(wallet),
            self.is_client(wallet, candidate),
            self.is_guardian(wallet, guardian),
        )?;

        Ok(WalletSnapshot {
            wallet,
            candidate,
            owners,
            candidate_is_client,
            guardian_authorized,
        })
    }
}

/// JSON-RPC implementation of [`ChainClient`] with read failover.
#[derive(Clone)]
pub struct AlloyChainClient {
    /// List of providers (primary + failovers). Submissions use the primary.
    providers: Vec<DynProvider>,
    /// Account paying for relay transactions.
    sender: Address,
    config: ChainConfig,
    timeout_duration: Duration,
    receipt_timeout: Duration,
    /// Set once the endpoint's chain id has been verified.
    ready: Arc<OnceCell<()>>,
}

impl AlloyChainClient {
    /// Create a client for the configured network.
    ///
    /// No network traffic happens here; the chain id is verified lazily on
    /// the first ledger call.
    pub fn new(config: ChainConfig, signer: &GuardianSigner) -> ChainResult<Self> {
        let wallet = signer.ethereum_wallet();
        let mut providers = Vec::new();

        // 1. Add primary provider
        let primary_url: url::Url = config.rpc_url.parse().map_err(|e| {
            ChainError::NotAvailable(format!("Invalid RPC URL '{}': {}", config.rpc_url, e))
        })?;
        providers.push(
            ProviderBuilder::new()
                .wallet(wallet.clone())
                .connect_http(primary_url)
                .erased(),
        );

        // 2. Add failover providers
        for url_str in &config.failover_urls {
            match url_str.parse::<url::Url>() {
                Ok(url) => providers.push(
                    ProviderBuilder::new()
                        .wallet(wallet.clone())
                        .connect_http(url)
                        .erased(),
                ),
                Err(_) => tracing::warn!(url = %url_str, "Ignoring invalid failover RPC URL"),
            }
        }

        tracing::info!(
            rpc_url = %config.rpc_url,
            failovers = providers.len() - 1,
            chain_id = config.chain_id,
            "Chain client created"
        );

        Ok(Self {
            providers,
            sender: signer.address(),
            timeout_duration: Duration::from_secs(config.rpc_timeout_secs),
            receipt_timeout: Duration::from_secs(config.receipt_timeout_secs),
            config,
            ready: Arc::new(OnceCell::new()),
        })
    }

    /// Wait until the endpoint is known to serve the configured chain.
    pub async fn ready(&self) -> ChainResult<()> {
        self.ready
            .get_or_try_init(|| async {
                self.verify_chain_id().await?;
                tracing::info!(chain_id = self.config.chain_id, "Chain client ready");
                Ok::<(), ChainError>(())
            })
            .await
            .map(|_| ())
    }

    /// Verify the connected chain ID matches configuration.
    pub async fn verify_chain_id(&self) -> ChainResult<()> {
        let chain_id = self.get_chain_id().await?;
        if chain_id.0 != self.config.chain_id {
            return Err(ChainError::ChainMismatch {
                expected: self.config.chain_id,
                actual: chain_id.0,
            });
        }
        Ok(())
    }

    /// Get the chain ID from the RPC.
    pub async fn get_chain_id(&self) -> ChainResult<ChainId> {
        for (i, provider) in self.providers.iter().enumerate() {
            match timeout(self.timeout_duration, provider.get_chain_id()).await {
                Ok(Ok(result)) => return Ok(ChainId(result)),
                Ok(Err(e)) => {
                    tracing::warn!(provider_idx = i, error = %e, "RPC error, trying next provider");
                }
                Err(_) => {
                    tracing::warn!(provider_idx = i, "RPC timeout, trying next provider");
                }
            }
        }
        Err(ChainError::Rpc("All RPC providers failed".to_string()))
    }

    /// Check if the ledger is reachable and serving the configured chain.
    pub async fn is_healthy(&self) -> bool {
        let healthy = self.verify_chain_id().await.is_ok();
        metrics::record_rpc_health(healthy);
        healthy
    }

    pub fn config(&self) -> &ChainConfig {
        &self.config
    }

    /// Execute a view call against `wallet`, failing over between providers.
    ///
    /// Reverts are returned immediately: another provider would revert too.
    async fn read<C: SolCall + Send>(&self, wallet: Address, call: C) -> ChainResult<C::Return> {
        self.ready().await?;

        let tx = TransactionRequest::default()
            .with_to(wallet)
            .with_input(call.abi_encode());

        let mut last_error = ChainError::Rpc("No RPC providers configured".to_string());
        for (i, provider) in self.providers.iter().enumerate() {
            match timeout(self.timeout_duration, provider.call(tx.clone())).await {
                Ok(Ok(output)) => {
                    return C::abi_decode_returns(&output)
                        .map_err(|e| ChainError::Abi(format!("{}: {}", C::SIGNATURE, e)));
                }
                Ok(Err(e)) => {
                    let err = map_transport_error(&e);
                    if matches!(err, ChainError::Reverted(_)) {
                        return Err(err);
                    }
                    tracing::warn!(provider_idx = i, method = C::SIGNATURE, error = %e, "RPC error");
                    last_error = err;
                }
                Err(_) => {
                    tracing::warn!(provider_idx = i, method = C::SIGNATURE, "RPC timeout");
                    last_error = ChainError::Timeout(self.timeout_duration.as_secs());
                }
            }
        }
        Err(last_error)
    }

    fn relay_request(&self, call: &RelayCall) -> TransactionRequest {
        let input = IKeyMultiSig::submitTransactionByRelayCall {
            destination: call.wallet,
            value: call.value,
            data: call.data.clone(),
            signature: call.signature.clone(),
            executor: call.submitter,
        }
        .abi_encode();

        TransactionRequest::default()
            .with_from(self.sender)
            .with_to(call.wallet)
            .with_input(input)
    }

    fn primary(&self) -> ChainResult<&DynProvider> {
        self.providers
            .first()
            .ok_or_else(|| ChainError::NotAvailable("No RPC providers configured".to_string()))
    }
}

#[async_trait]
impl ChainClient for AlloyChainClient {
    async fn owners(&self, wallet: Address) -> ChainResult<Vec<Address>> {
        self.read(wallet, IKeyMultiSig::getOwnersCall {}).await
    }

    async fn is_client(&self, wallet: Address, account: Address) -> ChainResult<bool> {
        self.read(wallet, IKeyMultiSig::clientsCall { account }).await
    }

    async fn is_guardian(&self, wallet: Address, account: Address) -> ChainResult<bool> {
        self.read(wallet, IKeyMultiSig::guardiansCall { account }).await
    }

    async fn nonce_of(&self, wallet: Address, account: Address) -> ChainResult<U256> {
        self.read(wallet, IKeyMultiSig::noncesCall { account }).await
    }

    async fn prepare_submit_hash(
        &self,
        wallet: Address,
        value: U256,
        data: &Bytes,
        nonce: U256,
    ) -> ChainResult<B256> {
        let call = IKeyMultiSig::prepareSubmitTransactionCall {
            destination: wallet,
            value,
            data: data.clone(),
            nonce,
        };
        self.read(wallet, call).await
    }

    async fn estimate_relay_gas(&self, call: &RelayCall) -> ChainResult<u64> {
        self.ready().await?;
        let provider = self.primary()?;
        let tx = self.relay_request(call);

        with_deadline(self.timeout_duration, async {
            provider.estimate_gas(tx).await.map_err(|e| match map_transport_error(&e) {
                // A failing estimate is the unpredictable-gas condition.
                ChainError::Reverted(msg) => ChainError::InsufficientGas(msg),
                other => other,
            })
        })
        .await
    }

    async fn submit_relay(&self, call: &RelayCall, gas_limit: u64) -> ChainResult<RelayReceipt> {
        self.ready().await?;
        let provider = self.primary()?;
        let tx = self.relay_request(call).with_gas_limit(gas_limit);

        let pending = with_deadline(self.timeout_duration, async {
            provider
                .send_transaction(tx)
                .await
                .map_err(|e| map_transport_error(&e))
        })
        .await?;

        let tx_hash = *pending.tx_hash();
        tracing::info!(tx_hash = %tx_hash, gas_limit, wallet = %call.wallet, "Relay transaction sent");

        let receipt = with_deadline(self.receipt_timeout, async {
            pending
                .get_receipt()
                .await
                .map_err(|e| ChainError::Rpc(format!("receipt for {}: {}", tx_hash, e)))
        })
        .await?;

        if !receipt.status() {
            return Err(ChainError::Reverted(format!(
                "relay transaction {} reverted (gas used {} of {})",
                tx_hash, receipt.gas_used, gas_limit
            )));
        }

        Ok(RelayReceipt {
            tx_hash,
            block_number: receipt.block_number,
            gas_used: receipt.gas_used,
            logs: receipt
                .inner
                .logs()
                .iter()
                .map(|log| log.inner.clone())
                .collect(),
        })
    }
}

impl std::fmt::Debug for AlloyChainClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AlloyChainClient")
            .field("rpc_url", &self.config.rpc_url)
            .field("chain_id", &self.config.chain_id)
            .field("sender", &self.sender)
            .field("timeout_secs", &self.config.rpc_timeout_secs)
            .finish()
    }
}

/// Translate a node error into the ledger error taxonomy.
fn map_transport_error(err: &TransportError) -> ChainError {
    match err.as_error_resp() {
        Some(payload) => classify_node_message(&payload.message),
        None => ChainError::Rpc(err.to_string()),
    }
}

/// Map a JSON-RPC error message reported by the node.
pub(crate) fn classify_node_message(message: &str) -> ChainError {
    let lower = message.to_lowercase();
    if lower.contains("revert") {
        ChainError::Reverted(message.to_string())
    } else if lower.contains("insufficient funds") {
        // Raising the gas limit only makes this worse.
        ChainError::InsufficientFunds(message.to_string())
    } else if lower.contains("gas") {
        ChainError::InsufficientGas(message.to_string())
    } else if lower.contains("nonce") {
        ChainError::Nonce(message.to_string())
    } else {
        ChainError::Rpc(message.to_string())
    }
}
