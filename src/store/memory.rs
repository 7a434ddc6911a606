//! In-memory user store with optional JSON persistence.

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;
use std::sync::{Arc, Mutex};

use alloy::primitives::Address;
use async_trait::async_trait;
use dashmap::DashMap;

use crate::store::{StoreError, StoreResult, UserRecord, UserStore};

/// A thread-safe user store keyed by record id.
#[derive(Clone, Default)]
pub struct MemoryUserStore {
    inner: Arc<DashMap<String, UserRecord>>,
    persistence_path: Option<String>,
    /// Serializes persist-then-commit so snapshots never drop a concurrent write.
    write_lock: Arc<Mutex<()>>,
}

impl MemoryUserStore {
    /// Create a new empty store.
    pub fn new(persistence_path: Option<String>) -> Self {
        Self {
            inner: Arc::new(DashMap::new()),
            persistence_path,
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Load from file if it exists; later writes are saved back to it.
    pub fn load_from_file(path: &str) -> StoreResult<Self> {
        let store = Self::new(Some(path.to_string()));
        if Path::new(path).exists() {
            let reader = BufReader::new(File::open(path)?);
            let records: Vec<UserRecord> = serde_json::from_reader(reader)?;
            for record in records {
                store.inner.insert(record.id.clone(), record);
            }
            tracing::info!(path = %path, records = store.inner.len(), "Loaded user records");
        }
        Ok(store)
    }

    /// Save to file, if a persistence path is set.
    pub fn save_to_file(&self) -> StoreResult<()> {
        if let Some(path) = &self.persistence_path {
            let records: Vec<UserRecord> = self.inner.iter().map(|r| r.value().clone()).collect();
            write_records(path, records)?;
        }
        Ok(())
    }

    /// Insert or replace a record.
    pub fn insert(&self, record: UserRecord) {
        self.inner.insert(record.id.clone(), record);
    }

    /// Look up a record by user id.
    pub fn get_by_user_id(&self, user_id: &str) -> Option<UserRecord> {
        self.inner
            .iter()
            .find(|r| r.value().user_id == user_id)
            .map(|r| r.value().clone())
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Apply `apply` to a copy of the record, persist, then commit.
    ///
    /// A failed save leaves the in-memory record untouched.
    fn modify<F>(&self, user_id: &str, apply: F) -> StoreResult<UserRecord>
    where
        F: FnOnce(&mut UserRecord),
    {
        let _guard = self.write_lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner());

        let mut updated = self
            .get_by_user_id(user_id)
            .ok_or_else(|| StoreError::NotFound(user_id.to_string()))?;
        apply(&mut updated);

        if let Some(path) = &self.persistence_path {
            let mut records: Vec<UserRecord> = self
                .inner
                .iter()
                .filter(|r| r.key() != &updated.id)
                .map(|r| r.value().clone())
                .collect();
            records.push(updated.clone());
            write_records(path, records)?;
        }

        self.inner.insert(updated.id.clone(), updated.clone());
        Ok(updated)
    }
}

fn write_records(path: &str, mut records: Vec<UserRecord>) -> StoreResult<()> {
    records.sort_by(|a, b| a.id.cmp(&b.id));
    let writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(writer, &records)?;
    tracing::debug!(path = %path, records = records.len(), "Saved user records");
    Ok(())
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn find_by_id(&self, id: &str) -> StoreResult<Option<UserRecord>> {
        Ok(self.inner.get(id).map(|r| r.value().clone()))
    }

    async fn update_client_address(&self, user_id: &str, client: Address) -> StoreResult<UserRecord> {
        self.modify(user_id, |record| record.client_address = Some(client))
    }

    async fn update_wallet_binding(
        &self,
        user_id: &str,
        multi_sig: Address,
        client: Option<Address>,
    ) -> StoreResult<UserRecord> {
        self.modify(user_id, |record| {
            record.multi_sig_address = Some(multi_sig);
            if let Some(client) = client {
                record.client_address = Some(client);
            }
        })
    }
}

impl std::fmt::Debug for MemoryUserStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryUserStore")
            .field("records", &self.inner.len())
            .field("persistence_path", &self.persistence_path)
            .finish()
    }
}
