//! Traits for SMS gateway and code store integration

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::entities::VerificationRecord;

/// Outbound SMS delivery
#[async_trait]
pub trait SmsGateway: Send + Sync {
    /// Send `message` to `phone`, returning the provider's message id
    async fn send(&self, phone: &str, message: &str) -> Result<String, String>;

    /// Short provider name used in logs
    fn provider_name(&self) -> &str;
}

/// Keyed storage of pending verification records
///
/// Keys are normalized phone numbers. Each operation is atomic per key and
/// implementations must be safe to call from many tasks at once.
#[async_trait]
pub trait CodeStore: Send + Sync {
    /// Insert or replace the record for `phone`
    async fn put(&self, phone: &str, record: VerificationRecord) -> Result<(), String>;

    /// Fetch the current record for `phone`, if any
    async fn get(&self, phone: &str) -> Result<Option<VerificationRecord>, String>;

    /// Remove any record for `phone`; a no-op when absent
    async fn delete(&self, phone: &str) -> Result<(), String>;

    /// Remove the record for `phone` only if it is still the issuance `record_id`
    ///
    /// Returns `true` when this call removed it. A concurrent consume or a
    /// newer issuance makes it return `false` without touching the store.
    async fn delete_if_current(&self, phone: &str, record_id: Uuid) -> Result<bool, String>;
}
