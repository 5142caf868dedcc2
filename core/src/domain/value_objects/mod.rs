//! Value objects representing domain concepts without identity.

pub mod phone_number;

pub use phone_number::PhoneNumber;
