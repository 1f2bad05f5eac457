//! Error kinds surfaced by canonicalization and derivation.
//!
//! Every failure is a precondition violation reported to the caller as-is.
//! Nothing is retried and nothing is coerced into a valid value.

/// Errors from [`crate::canonicalize_easy`], [`derive`](fn@crate::derive) and their variants.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HumanUuidError {
    /// A text field outside 1..=64 characters, or a canonical byte field of the wrong width.
    #[error("{field} has invalid length {actual}: expected {expected}")]
    InvalidLength {
        field: &'static str,
        expected: String,
        actual: usize,
    },

    /// A numeric input outside its declared bound, rejected before encoding.
    #[error("{field} value {value} is not an integer in {min}..={max}")]
    InvalidRange {
        field: &'static str,
        value: String,
        min: u32,
        max: u32,
    },

    /// A canonical byte field that is not plain big-endian (BOM, reserved bits set).
    #[error("{field} is not encoded correctly: {reason}")]
    WrongEncoding {
        field: &'static str,
        reason: &'static str,
    },

    /// A birth date that is out of range, not on the calendar, or not in the past.
    #[error("invalid birth date {year:04}-{month:02}-{day:02}: {reason}")]
    InvalidDate {
        year: u16,
        month: u8,
        day: u8,
        reason: &'static str,
    },

    /// The Argon2id backend rejected its compiled-in parameters.
    #[error("Argon2id backend failure: {0}")]
    Kdf(String),
}
