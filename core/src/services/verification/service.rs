//! Main verification service implementation

use constant_time_eq::constant_time_eq;
use std::sync::Arc;
use tracing;

use crate::domain::entities::VerificationRecord;
use crate::domain::value_objects::PhoneNumber;
use crate::errors::{VerificationError, VerificationResult};

use super::clock::{Clock, SystemClock};
use super::config::VerificationServiceConfig;
use super::generator::{CodeGenerator, OsRngCodeGenerator};
use super::traits::{CodeStore, SmsGateway};
use super::types::{ConfirmResult, PendingVerification, RequestCodeResult};

/// Compose the SMS body for an issued code
pub fn verification_message(code: &str, ttl_minutes: i64) -> String {
    format!(
        "Your verification code is: {}. This code will expire in {} minutes.",
        code, ttl_minutes
    )
}

/// Verification service for issuing and confirming SMS codes
///
/// The gateway and store are shared handles; both may be trait objects
/// (`Arc<dyn SmsGateway>`) so the backends can be chosen at startup.
pub struct VerificationService<S: SmsGateway + ?Sized, C: CodeStore + ?Sized> {
    /// SMS gateway for sending messages
    sms_gateway: Arc<S>,
    /// Store holding the pending record per phone
    code_store: Arc<C>,
    generator: Arc<dyn CodeGenerator>,
    clock: Arc<dyn Clock>,
    /// Service configuration
    config: VerificationServiceConfig,
}

impl<S: SmsGateway + ?Sized, C: CodeStore + ?Sized> VerificationService<S, C> {
    /// Create a new verification service backed by the OS random source
    /// and the system clock
    ///
    /// # Arguments
    ///
    /// * `sms_gateway` - SMS gateway implementation
    /// * `code_store` - Code store implementation
    /// * `config` - Service configuration
    pub fn new(
        sms_gateway: Arc<S>,
        code_store: Arc<C>,
        config: VerificationServiceConfig,
    ) -> Self {
        if config.diagnostics_mode {
            tracing::warn!(
                event = "diagnostics_mode_enabled",
                "Verification codes will be returned to callers"
            );
        }

        Self {
            sms_gateway,
            code_store,
            generator: Arc::new(OsRngCodeGenerator),
            clock: Arc::new(SystemClock),
            config,
        }
    }

    /// Replace the code generator
    pub fn with_generator(mut self, generator: Arc<dyn CodeGenerator>) -> Self {
        self.generator = generator;
        self
    }

    /// Replace the time source
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn config(&self) -> &VerificationServiceConfig {
        &self.config
    }

    /// Issue a fresh code for `phone` and send it by SMS
    ///
    /// Any previously issued code for the same phone is superseded. The new
    /// record is committed before delivery, so a `DeliveryFailed` result
    /// still leaves a confirmable code behind.
    ///
    /// # Errors
    ///
    /// * `InvalidPhoneNumber` - empty or not E.164 shaped after normalization
    /// * `EntropyUnavailable` - the secure random source failed, nothing stored
    /// * `StoreUnavailable` - the record could not be written
    /// * `DeliveryFailed` - the gateway failed or timed out
    pub async fn request_code(&self, phone: &str) -> VerificationResult<RequestCodeResult> {
        let phone = PhoneNumber::parse(phone).map_err(|e| {
            tracing::warn!(event = "invalid_phone_number", "Rejected verification request");
            e
        })?;
        let now = self.clock.now();

        let code = self.generator.generate().map_err(|e| {
            tracing::error!(
                phone = %phone.masked(),
                error = %e,
                event = "otp_generation_failed",
                "Failed to generate verification code"
            );
            e
        })?;

        let record = VerificationRecord::issue(phone.as_str(), code, now, self.config.code_ttl());
        let record_id = record.id;
        let expires_at = record.expires_at;
        let message = verification_message(&record.code, self.config.code_ttl_minutes);
        let diagnostic_code = self.config.diagnostics_mode.then(|| record.code.clone());

        self.code_store
            .put(phone.as_str(), record)
            .await
            .map_err(|e| store_failure(&phone, "otp_storage_failed", e))?;

        tracing::info!(
            phone = %phone.masked(),
            record_id = %record_id,
            expires_at = %expires_at,
            event = "otp_issued",
            "Issued verification code"
        );

        let message_id = self.deliver(&phone, &message).await?;

        tracing::info!(
            phone = %phone.masked(),
            record_id = %record_id,
            provider = self.sms_gateway.provider_name(),
            message_id = %message_id,
            event = "otp_sent",
            "Verification code sent"
        );

        Ok(RequestCodeResult {
            phone_number: phone.to_string(),
            expires_at,
            message_id,
            diagnostic_code,
        })
    }

    /// Check `submitted_code` against the pending record for `phone`
    ///
    /// A match consumes the record. A mismatch leaves it in place so the
    /// caller can retry. An expired record is consumed and reported as
    /// `CodeExpired`; after that the phone has nothing pending.
    pub async fn confirm(
        &self,
        phone: &str,
        submitted_code: &str,
    ) -> VerificationResult<ConfirmResult> {
        let phone = PhoneNumber::parse(phone)?;
        let submitted_code = submitted_code.trim();
        if submitted_code.is_empty() {
            return Err(VerificationError::MissingCode);
        }
        let now = self.clock.now();

        let record = match self
            .code_store
            .get(phone.as_str())
            .await
            .map_err(|e| store_failure(&phone, "otp_lookup_failed", e))?
        {
            Some(record) => record,
            None => {
                tracing::info!(
                    phone = %phone.masked(),
                    event = "otp_not_pending",
                    "Confirmation without a pending code"
                );
                return Err(VerificationError::NoPendingVerification);
            }
        };

        if record.is_expired_at(now) {
            self.code_store
                .delete_if_current(phone.as_str(), record.id)
                .await
                .map_err(|e| store_failure(&phone, "otp_purge_failed", e))?;
            tracing::info!(
                phone = %phone.masked(),
                record_id = %record.id,
                expired_at = %record.expires_at,
                event = "otp_expired",
                "Verification code expired"
            );
            return Err(VerificationError::CodeExpired);
        }

        if !codes_match(&record.code, submitted_code) {
            tracing::warn!(
                phone = %phone.masked(),
                record_id = %record.id,
                event = "otp_mismatch",
                "Verification code mismatch"
            );
            return Err(VerificationError::CodeMismatch);
        }

        let consumed = self
            .code_store
            .delete_if_current(phone.as_str(), record.id)
            .await
            .map_err(|e| store_failure(&phone, "otp_consume_failed", e))?;

        if !consumed {
            // Lost the race to another confirm or a re-issue after the read.
            let current = self
                .code_store
                .get(phone.as_str())
                .await
                .map_err(|e| store_failure(&phone, "otp_lookup_failed", e))?;
            tracing::info!(
                phone = %phone.masked(),
                record_id = %record.id,
                superseded = current.is_some(),
                event = "otp_consume_lost",
                "Verification code consumed concurrently"
            );
            return Err(match current {
                Some(_) => VerificationError::CodeMismatch,
                None => VerificationError::NoPendingVerification,
            });
        }

        tracing::info!(
            phone = %phone.masked(),
            record_id = %record.id,
            event = "otp_verified",
            "Phone number verified"
        );

        Ok(ConfirmResult {
            phone_number: phone.to_string(),
            verified_at: now,
        })
    }

    /// Describe the outstanding verification for `phone` without revealing
    /// the code. An expired record is purged and reported as `None`.
    pub async fn pending_verification(
        &self,
        phone: &str,
    ) -> VerificationResult<Option<PendingVerification>> {
        let phone = PhoneNumber::parse(phone)?;
        let now = self.clock.now();

        let record = match self
            .code_store
            .get(phone.as_str())
            .await
            .map_err(|e| store_failure(&phone, "otp_lookup_failed", e))?
        {
            Some(record) => record,
            None => return Ok(None),
        };

        if record.is_expired_at(now) {
            self.code_store
                .delete_if_current(phone.as_str(), record.id)
                .await
                .map_err(|e| store_failure(&phone, "otp_purge_failed", e))?;
            tracing::debug!(
                phone = %phone.masked(),
                record_id = %record.id,
                event = "otp_expired_purged",
                "Purged expired verification code"
            );
            return Ok(None);
        }

        Ok(Some(PendingVerification {
            phone_number: phone.to_string(),
            issued_at: record.issued_at,
            expires_at: record.expires_at,
            expires_in_seconds: record.time_remaining(now).num_seconds(),
        }))
    }

    /// Discard any pending code for `phone`. Cancelling twice is not an error.
    pub async fn cancel(&self, phone: &str) -> VerificationResult<()> {
        let phone = PhoneNumber::parse(phone)?;

        self.code_store
            .delete(phone.as_str())
            .await
            .map_err(|e| store_failure(&phone, "otp_cancel_failed", e))?;

        tracing::info!(
            phone = %phone.masked(),
            event = "otp_cancelled",
            "Pending verification cancelled"
        );
        Ok(())
    }

    async fn deliver(&self, phone: &PhoneNumber, message: &str) -> VerificationResult<String> {
        let send = self.sms_gateway.send(phone.as_str(), message);

        let outcome = match self.config.delivery_timeout {
            Some(limit) => match tokio::time::timeout(limit, send).await {
                Ok(result) => result,
                Err(_) => Err(format!("delivery timed out after {}ms", limit.as_millis())),
            },
            None => send.await,
        };

        outcome.map_err(|reason| {
            tracing::warn!(
                phone = %phone.masked(),
                provider = self.sms_gateway.provider_name(),
                reason = %reason,
                event = "otp_delivery_failed",
                "SMS delivery failed, issued code remains valid"
            );
            VerificationError::DeliveryFailed { reason }
        })
    }
}

fn store_failure(phone: &PhoneNumber, event: &'static str, message: String) -> VerificationError {
    tracing::error!(
        phone = %phone.masked(),
        error = %message,
        event = event,
        "Verification store operation failed"
    );
    VerificationError::StoreUnavailable { message }
}

/// Constant-time comparison of the stored and submitted codes
fn codes_match(stored: &str, submitted: &str) -> bool {
    if stored.len() != submitted.len() {
        return false;
    }
    constant_time_eq(stored.as_bytes(), submitted.as_bytes())
}
