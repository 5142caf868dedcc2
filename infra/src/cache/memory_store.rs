//! In-memory code store
//!
//! Records live in a `DashMap` keyed by normalized phone number. Every trait
//! operation touches exactly one shard, so independent phones never contend
//! on a global lock.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use tracing::debug;
use uuid::Uuid;

use pv_core::domain::entities::VerificationRecord;
use pv_core::services::verification::CodeStore;
use pv_shared::utils::phone::mask_phone_number;

/// Process-local store of pending verification records
#[derive(Debug, Default)]
pub struct InMemoryCodeStore {
    records: DashMap<String, VerificationRecord>,
}

impl InMemoryCodeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records currently held, expired ones included
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Drop every record whose expiry is more than `grace` before `now`
    ///
    /// Returns the number of records removed.
    pub fn purge_expired(&self, now: DateTime<Utc>, grace: Duration) -> usize {
        let mut purged = 0;
        self.records.retain(|_, record| {
            let keep = record.expires_at + grace >= now;
            if !keep {
                purged += 1;
            }
            keep
        });
        purged
    }
}

#[async_trait]
impl CodeStore for InMemoryCodeStore {
    async fn put(&self, phone: &str, record: VerificationRecord) -> Result<(), String> {
        let replaced = self.records.insert(phone.to_string(), record).is_some();
        debug!(
            phone = %mask_phone_number(phone),
            replaced = replaced,
            "Stored verification record"
        );
        Ok(())
    }

    async fn get(&self, phone: &str) -> Result<Option<VerificationRecord>, String> {
        Ok(self.records.get(phone).map(|entry| entry.value().clone()))
    }

    async fn delete(&self, phone: &str) -> Result<(), String> {
        self.records.remove(phone);
        Ok(())
    }

    async fn delete_if_current(&self, phone: &str, record_id: Uuid) -> Result<bool, String> {
        Ok(self
            .records
            .remove_if(phone, |_, record| record.id == record_id)
            .is_some())
    }
}
