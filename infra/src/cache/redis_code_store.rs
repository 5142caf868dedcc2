//! Redis-backed code store
//!
//! Each pending record is stored as JSON under `{prefix}:verification:record:{phone}`.
//! The key TTL covers the remaining code lifetime plus a grace period, so
//! a recently expired record can still be reported as expired and is then
//! removed by Redis itself.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use redis::Script;
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

use pv_core::domain::entities::VerificationRecord;
use pv_core::services::verification::{Clock, CodeStore};
use pv_shared::config::StoreConfig;
use pv_shared::utils::phone::mask_phone_number;

use super::redis_client::RedisClient;
use crate::InfrastructureError;

/// Deletes KEYS[1] only if the stored record's id equals ARGV[1]
const DELETE_IF_CURRENT_LUA: &str = r#"
local current = redis.call('GET', KEYS[1])
if not current then
    return 0
end
local ok, record = pcall(cjson.decode, current)
if ok and record['id'] == ARGV[1] then
    redis.call('DEL', KEYS[1])
    return 1
end
return 0
"#;

/// Code store shared between service instances through Redis
pub struct RedisCodeStore {
    client: RedisClient,
    config: StoreConfig,
    clock: Arc<dyn Clock>,
    grace_secs: i64,
    delete_if_current: Script,
}

impl RedisCodeStore {
    /// `clock` must be the one the verification service reads, so key
    /// lifetimes agree with record expiry
    pub fn new(
        client: RedisClient,
        config: StoreConfig,
        clock: Arc<dyn Clock>,
        grace_secs: i64,
    ) -> Self {
        Self {
            client,
            config,
            clock,
            grace_secs: grace_secs.max(0),
            delete_if_current: Script::new(DELETE_IF_CURRENT_LUA),
        }
    }

    fn record_key(&self, phone: &str) -> String {
        self.config.make_key(&format!("verification:record:{}", phone))
    }


    async fn put_record(&self, phone: &str, record: &VerificationRecord) -> Result<(), InfrastructureError> {
        let payload = serde_json::to_string(record)?;
        let ttl = key_ttl_secs(record, self.clock.now(), self.grace_secs);
        self.client
            .set_with_expiry(&self.record_key(phone), &payload, ttl)
            .await?;
        debug!(phone = %mask_phone_number(phone), ttl_secs = ttl, "Stored verification record in Redis");
        Ok(())
    }

    async fn get_record(&self, phone: &str) -> Result<Option<VerificationRecord>, InfrastructureError> {
        match self.client.get(&self.record_key(phone)).await? {
            Some(payload) => Ok(Some(serde_json::from_str(&payload)?)),
            None => Ok(None),
        }
    }

    /// Whether the Redis connection answers PING
    pub async fn health_check(&self) -> Result<bool, InfrastructureError> {
        self.client.health_check().await
    }
}

/// Key lifetime for `record` written at `now`: remaining validity plus grace
///
/// The remaining part never exceeds the record's full lifetime, so a clock
/// behind `issued_at` cannot stretch the key.
pub(crate) fn key_ttl_secs(record: &VerificationRecord, now: DateTime<Utc>, grace_secs: i64) -> u64 {
    let lifetime = (record.expires_at - record.issued_at).num_seconds().max(0);
    let remaining = (record.expires_at - now).num_seconds().clamp(0, lifetime);
    (remaining + grace_secs.max(0)).max(1) as u64
}

#[async_trait]
impl CodeStore for RedisCodeStore {
    async fn put(&self, phone: &str, record: VerificationRecord) -> Result<(), String> {
        self.put_record(phone, &record).await.map_err(|e| e.to_string())
    }

    async fn get(&self, phone: &str) -> Result<Option<VerificationRecord>, String> {
        self.get_record(phone).await.map_err(|e| e.to_string())
    }

    async fn delete(&self, phone: &str) -> Result<(), String> {
        self.client
            .delete(&self.record_key(phone))
            .await
            .map(|_| ())
            .map_err(|e| e.to_string())
    }

    async fn delete_if_current(&self, phone: &str, record_id: Uuid) -> Result<bool, String> {
        self.client
            .eval_script(
                &self.delete_if_current,
                &self.record_key(phone),
                &[record_id.to_string()],
            )
            .await
            .map(|removed| removed == 1)
            .map_err(|e| e.to_string())
    }
}
