//! Guardian credential and message signing.
//!
//! # Security
//! - The private key is loaded ONLY from an environment variable
//! - Keys are never logged or serialized; `Debug` shows the address only
//! - One credential per process, constructed at startup and shared by `Arc`

use alloy::network::EthereumWallet;
use alloy::primitives::{Address, Bytes, B256};
use alloy::signers::local::PrivateKeySigner;
use alloy::signers::Signer;
use async_trait::async_trait;
use thiserror::Error;

/// Default environment variable name for the guardian key.
pub const DEFAULT_KEY_ENV_VAR: &str = "GUARDIAN_PK";

/// Errors raised while loading or using the guardian credential.
#[derive(Debug, Error)]
pub enum SignerError {
    #[error("Environment variable {0} not set")]
    MissingKey(String),

    #[error("Invalid private key format: {0}")]
    InvalidKey(String),

    #[error("Signing failed: {0}")]
    Signing(String),
}

pub type SignerResult<T> = Result<T, SignerError>;

/// Signs prepared submission hashes on behalf of the guardian.
#[async_trait]
pub trait TransactionSigner: Send + Sync {
    /// Address of the held credential.
    fn address(&self) -> Address;

    /// Sign a prepared 32-byte hash, returning the joined `r || s || v` bytes.
    async fn sign(&self, hash: B256) -> SignerResult<Bytes>;
}

/// The guardian's in-memory signing key.
#[derive(Clone)]
pub struct GuardianSigner {
    signer: PrivateKeySigner,
}

impl GuardianSigner {
    /// Create a signer from a hex-encoded private key string.
    ///
    /// Accepts keys with or without the `0x` prefix.
    pub fn from_private_key(private_key_hex: &str) -> SignerResult<Self> {
        let key_hex = private_key_hex
            .trim()
            .strip_prefix("0x")
            .unwrap_or(private_key_hex.trim());

        let signer: PrivateKeySigner = key_hex
            .parse()
            .map_err(|e| SignerError::InvalidKey(format!("{}", e)))?;

        tracing::info!(address = %signer.address(), "Guardian signer initialized");

        Ok(Self { signer })
    }

    /// Load the guardian key from the named environment variable.
    pub fn from_env(var: &str) -> SignerResult<Self> {
        let private_key =
            std::env::var(var).map_err(|_| SignerError::MissingKey(var.to_string()))?;
        Self::from_private_key(&private_key)
    }

    /// Wallet used by the provider to pay for and sign relay transactions.
    pub fn ethereum_wallet(&self) -> EthereumWallet {
        EthereumWallet::from(self.signer.clone())
    }
}

#[async_trait]
impl TransactionSigner for GuardianSigner {
    fn address(&self) -> Address {
        self.signer.address()
    }

    /// The wallet contract recovers the signer from the EIP-191 prefixed
    /// hash, so the 32 bytes are signed as a personal message.
    async fn sign(&self, hash: B256) -> SignerResult<Bytes> {
        let signature = self
            .signer
            .sign_message(hash.as_slice())
            .await
            .map_err(|e| SignerError::Signing(e.to_string()))?;
        Ok(Bytes::from(signature.as_bytes().to_vec()))
    }
}

impl std::fmt::Debug for GuardianSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GuardianSigner")
            .field("address", &self.signer.address())
            .finish()
    }
}
