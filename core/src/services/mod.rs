//! Business services containing domain logic and use cases.

pub mod verification;

// Re-export commonly used types
pub use verification::{
    verification_message, Clock, CodeGenerator, CodeStore, ConfirmResult, ManualClock,
    OsRngCodeGenerator, PendingVerification, RequestCodeResult, SmsGateway, SystemClock,
    VerificationService, VerificationServiceConfig,
};
