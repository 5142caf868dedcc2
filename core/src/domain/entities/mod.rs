//! Domain entities representing core business objects.

pub mod verification_record;

pub use verification_record::{VerificationRecord, CODE_LENGTH, DEFAULT_TTL_MINUTES};
