//! Off-chain user records.
//!
//! The recovery core reads a record's wallet binding and writes back a
//! single field, `clientAddress`. Everything else about the record is owned
//! by the surrounding service.

use alloy::primitives::Address;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod memory;

pub use memory::MemoryUserStore;

/// A user's off-chain record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    /// Record identifier (primary key).
    pub id: String,
    /// Stable external user identifier (unique).
    pub user_id: String,
    pub email: String,
    pub multi_sig_address: Option<Address>,
    pub client_address: Option<Address>,
    #[serde(default)]
    pub validate_email_token: Option<String>,
}

/// Errors raised by a user store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("No user record with user id {0}")]
    NotFound(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Persistence interface consumed by recovery, reconciliation and migration.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Look up a record by its record identifier.
    async fn find_by_id(&self, id: &str) -> StoreResult<Option<UserRecord>>;

    /// Set `clientAddress` on the record with the given user id.
    async fn update_client_address(&self, user_id: &str, client: Address) -> StoreResult<UserRecord>;

    /// Rebind the record with the given user id to a wallet.
    ///
    /// A `None` client leaves the stored client address untouched.
    async fn update_wallet_binding(
        &self,
        user_id: &str,
        multi_sig: Address,
        client: Option<Address>,
    ) -> StoreResult<UserRecord>;
}
