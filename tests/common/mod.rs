//! Shared fixtures for recovery integration tests.
//!
//! `FakeLedger` models a single multisig wallet in memory. Submissions can be
//! scripted to fail, and every ledger interaction is counted so tests can
//! assert on ordering (e.g. no nonce read before a rejected precondition).
#![allow(dead_code)]

use std::collections::{HashSet, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use alloy::primitives::{keccak256, Address, Bytes, Log, TxHash, B256, U256};
use alloy::sol_types::{SolCall, SolEvent};
use async_trait::async_trait;

use guardian_relay::blockchain::contract::IKeyMultiSig;
use guardian_relay::blockchain::signer::{SignerResult, TransactionSigner};
use guardian_relay::blockchain::{ChainClient, ChainError, ChainResult, GuardianSigner, RelayCall, RelayReceipt};
use guardian_relay::recovery::{GuardianIdentity, RecoveryOrchestrator, Reconciler};
use guardian_relay::resilience::{EscalationPolicy, GasEscalationExecutor};
use guardian_relay::store::{MemoryUserStore, StoreError, StoreResult, UserRecord, UserStore};

/// Anvil's first development key.
pub const GUARDIAN_KEY: &str = "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

pub const ESTIMATED_GAS: u64 = 100_000;

pub fn wallet() -> Address {
    Address::repeat_byte(0xaa)
}

pub fn client_a() -> Address {
    Address::repeat_byte(0x0a)
}

pub fn client_b() -> Address {
    Address::repeat_byte(0x0b)
}

pub fn client_c() -> Address {
    Address::repeat_byte(0x0c)
}

pub fn client_d() -> Address {
    Address::repeat_byte(0x0d)
}

pub fn guardian_signer() -> GuardianSigner {
    GuardianSigner::from_private_key(GUARDIAN_KEY).unwrap()
}

pub fn guardian_address() -> Address {
    guardian_signer().address()
}

/// Mutable wallet state.
#[derive(Debug, Clone)]
pub struct WalletState {
    pub owners: Vec<Address>,
    pub clients: HashSet<Address>,
    pub guardians: HashSet<Address>,
    pub nonce: U256,
}

/// In-memory wallet implementing [`ChainClient`].
pub struct FakeLedger {
    wallet: Address,
    state: Mutex<WalletState>,
    submit_failures: Mutex<VecDeque<ChainError>>,
    estimate_failures: Mutex<VecDeque<ChainError>>,
    emit_submission: AtomicBool,
    submit_delay_ms: AtomicU64,
    next_transaction_id: AtomicU64,
    pub nonce_reads: AtomicU32,
    pub hash_requests: AtomicU32,
    pub estimates: AtomicU32,
    pub submits: AtomicU32,
    pub gas_limits: Mutex<Vec<u64>>,
    pub signed_nonces: Mutex<Vec<U256>>,
    /// Ordered trace of nonce reads and submission start/finish.
    pub events: Mutex<Vec<&'static str>>,
}

impl FakeLedger {
    /// A wallet owned by the test guardian and `client`.
    pub fn new(client: Address) -> Self {
        let guardian = guardian_address();
        Self {
            wallet: wallet(),
            state: Mutex::new(WalletState {
                owners: vec![guardian, client],
                clients: HashSet::from([client]),
                guardians: HashSet::from([guardian]),
                nonce: U256::from(7),
            }),
            submit_failures: Mutex::new(VecDeque::new()),
            estimate_failures: Mutex::new(VecDeque::new()),
            emit_submission: AtomicBool::new(true),
            submit_delay_ms: AtomicU64::new(0),
            next_transaction_id: AtomicU64::new(42),
            nonce_reads: AtomicU32::new(0),
            hash_requests: AtomicU32::new(0),
            estimates: AtomicU32::new(0),
            submits: AtomicU32::new(0),
            gas_limits: Mutex::new(Vec::new()),
            signed_nonces: Mutex::new(Vec::new()),
            events: Mutex::new(Vec::new()),
        }
    }

    /// Fail the next submissions with these errors, in order.
    pub fn fail_submits(&self, errors: impl IntoIterator<Item = ChainError>) {
        self.submit_failures.lock().unwrap().extend(errors);
    }

    pub fn fail_estimates(&self, errors: impl IntoIterator<Item = ChainError>) {
        self.estimate_failures.lock().unwrap().extend(errors);
    }

    /// Mine successful submissions without a Submission log.
    pub fn suppress_submission_event(&self) {
        self.emit_submission.store(false, Ordering::SeqCst);
    }

    /// Hold every submission open for `delay` before it is mined.
    pub fn set_submit_delay(&self, delay: Duration) {
        self.submit_delay_ms.store(delay.as_millis() as u64, Ordering::SeqCst);
    }

    pub fn events(&self) -> Vec<&'static str> {
        self.events.lock().unwrap().clone()
    }

    pub fn revoke_guardian(&self, guardian: Address) {
        self.state.lock().unwrap().guardians.remove(&guardian);
    }

    pub fn add_client(&self, client: Address) {
        let mut state = self.state.lock().unwrap();
        state.owners.push(client);
        state.clients.insert(client);
    }

    pub fn state(&self) -> WalletState {
        self.state.lock().unwrap().clone()
    }

    pub fn count(counter: &AtomicU32) -> u32 {
        counter.load(Ordering::SeqCst)
    }

    fn check_wallet(&self, wallet: Address) -> ChainResult<()> {
        if wallet == self.wallet {
            Ok(())
        } else {
            Err(ChainError::Reverted(format!("no wallet at {}", wallet)))
        }
    }

    fn apply(&self, call: &RelayCall) -> ChainResult<()> {
        let replace = IKeyMultiSig::replaceClientCall::abi_decode(&call.data)
            .map_err(|e| ChainError::Abi(e.to_string()))?;
        let mut state = self.state.lock().unwrap();

        if !state.clients.contains(&replace.client) || state.clients.contains(&replace.newClient) {
            return Err(ChainError::Reverted("execution reverted: invalid client".to_string()));
        }
        state.clients.remove(&replace.client);
        state.clients.insert(replace.newClient);
        for owner in state.owners.iter_mut() {
            if *owner == replace.client {
                *owner = replace.newClient;
            }
        }
        state.nonce += U256::from(1);
        Ok(())
    }
}

#[async_trait]
impl ChainClient for FakeLedger {
    async fn owners(&self, wallet: Address) -> ChainResult<Vec<Address>> {
        self.check_wallet(wallet)?;
        Ok(self.state.lock().unwrap().owners.clone())
    }

    async fn is_client(&self, wallet: Address, account: Address) -> ChainResult<bool> {
        self.check_wallet(wallet)?;
        Ok(self.state.lock().unwrap().clients.contains(&account))
    }

    async fn is_guardian(&self, wallet: Address, account: Address) -> ChainResult<bool> {
        self.check_wallet(wallet)?;
        Ok(self.state.lock().unwrap().guardians.contains(&account))
    }

    async fn nonce_of(&self, wallet: Address, _account: Address) -> ChainResult<U256> {
        self.check_wallet(wallet)?;
        self.nonce_reads.fetch_add(1, Ordering::SeqCst);
        self.events.lock().unwrap().push("nonce");
        Ok(self.state.lock().unwrap().nonce)
    }

    async fn prepare_submit_hash(
        &self,
        wallet: Address,
        value: U256,
        data: &Bytes,
        nonce: U256,
    ) -> ChainResult<B256> {
        self.check_wallet(wallet)?;
        self.hash_requests.fetch_add(1, Ordering::SeqCst);
        self.signed_nonces.lock().unwrap().push(nonce);
        let mut preimage = Vec::new();
        preimage.extend_from_slice(wallet.as_slice());
        preimage.extend_from_slice(&value.to_be_bytes::<32>());
        preimage.extend_from_slice(data);
        preimage.extend_from_slice(&nonce.to_be_bytes::<32>());
        Ok(keccak256(preimage))
    }

    async fn estimate_relay_gas(&self, call: &RelayCall) -> ChainResult<u64> {
        self.check_wallet(call.wallet)?;
        self.estimates.fetch_add(1, Ordering::SeqCst);
        if let Some(error) = self.estimate_failures.lock().unwrap().pop_front() {
            return Err(error);
        }
        Ok(ESTIMATED_GAS)
    }

    async fn submit_relay(&self, call: &RelayCall, gas_limit: u64) -> ChainResult<RelayReceipt> {
        self.check_wallet(call.wallet)?;
        let n = self.submits.fetch_add(1, Ordering::SeqCst);
        self.gas_limits.lock().unwrap().push(gas_limit);
        self.events.lock().unwrap().push("submit");

        let delay = self.submit_delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }
        self.events.lock().unwrap().push("mined");

        let failure = self.submit_failures.lock().unwrap().pop_front();
        if let Some(error) = failure {
            return Err(error);
        }
        self.apply(call)?;

        let mut logs = Vec::new();
        if self.emit_submission.load(Ordering::SeqCst) {
            let id = self.next_transaction_id.fetch_add(1, Ordering::SeqCst);
            logs.push(Log {
                address: self.wallet,
                data: IKeyMultiSig::Submission {
                    transactionId: U256::from(id),
                }
                .encode_log_data(),
            });
        }

        Ok(RelayReceipt {
            tx_hash: TxHash::with_last_byte(n as u8 + 1),
            block_number: Some(1_000 + n as u64),
            gas_used: ESTIMATED_GAS,
            logs,
        })
    }
}

/// Delegating signer that counts signatures.
pub struct CountingSigner {
    inner: GuardianSigner,
    pub signs: AtomicU32,
}

impl CountingSigner {
    pub fn new() -> Self {
        Self {
            inner: guardian_signer(),
            signs: AtomicU32::new(0),
        }
    }
}

#[async_trait]
impl TransactionSigner for CountingSigner {
    fn address(&self) -> Address {
        self.inner.address()
    }

    async fn sign(&self, hash: B256) -> SignerResult<Bytes> {
        self.signs.fetch_add(1, Ordering::SeqCst);
        self.inner.sign(hash).await
    }
}

/// Store whose client-address writes always fail.
pub struct ReadOnlyStore {
    pub inner: MemoryUserStore,
}

#[async_trait]
impl UserStore for ReadOnlyStore {
    async fn find_by_id(&self, id: &str) -> StoreResult<Option<UserRecord>> {
        self.inner.find_by_id(id).await
    }

    async fn update_client_address(&self, _user_id: &str, _client: Address) -> StoreResult<UserRecord> {
        Err(StoreError::Io(std::io::Error::new(
            std::io::ErrorKind::PermissionDenied,
            "store is read-only",
        )))
    }

    async fn update_wallet_binding(
        &self,
        user_id: &str,
        multi_sig: Address,
        client: Option<Address>,
    ) -> StoreResult<UserRecord> {
        self.inner.update_wallet_binding(user_id, multi_sig, client).await
    }
}

pub fn user_record(client: Option<Address>) -> UserRecord {
    numbered_record(1, client)
}

pub fn numbered_record(n: u32, client: Option<Address>) -> UserRecord {
    UserRecord {
        id: format!("rec-{}", n),
        user_id: format!("user-{}", n),
        email: format!("user-{}@example.com", n),
        multi_sig_address: Some(wallet()),
        client_address: client,
        validate_email_token: None,
    }
}

pub fn seeded_store(client: Option<Address>) -> MemoryUserStore {
    let store = MemoryUserStore::new(None);
    store.insert(user_record(client));
    store
}

pub fn fast_executor() -> GasEscalationExecutor {
    GasEscalationExecutor::new(EscalationPolicy {
        outer_delay: Duration::from_millis(1),
        ..EscalationPolicy::default()
    })
}

/// Everything a recovery test inspects.
pub struct Harness {
    pub ledger: Arc<FakeLedger>,
    pub signer: Arc<CountingSigner>,
    pub orchestrator: RecoveryOrchestrator,
}

pub fn harness_with_store(ledger: FakeLedger, store: Arc<dyn UserStore>) -> Harness {
    let ledger = Arc::new(ledger);
    let signer = Arc::new(CountingSigner::new());
    let orchestrator = RecoveryOrchestrator::new(
        ledger.clone(),
        Arc::new(GuardianIdentity::new(signer.clone())),
        store,
        fast_executor(),
    );
    Harness {
        ledger,
        signer,
        orchestrator,
    }
}

pub fn reconciler(ledger: Arc<FakeLedger>, store: Arc<dyn UserStore>) -> Reconciler {
    Reconciler::new(ledger, store)
}
