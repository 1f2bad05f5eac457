//! Argon2id backend with compiled-in parameters.
//!
//! The parameters match libsodium's `crypto_pwhash` "sensitive" tier with
//! `ALG_ARGON2ID13`. None of them are configurable: changing any one changes
//! every identifier.

use std::sync::OnceLock;

use argon2::{Algorithm, Argon2, Params, Version};

use crate::field::CanonicalBuffer;
use crate::HumanUuidError;

/// Domain-separation salt.
pub const SALT: [u8; 16] = *b"HumanUUID0000000";
/// Derived identifier size in bytes.
pub const OUTPUT_LEN: usize = 16;
/// Passes over memory (`crypto_pwhash_OPSLIMIT_SENSITIVE`).
pub const OPSLIMIT_SENSITIVE: u32 = 4;
/// Memory in KiB (`crypto_pwhash_MEMLIMIT_SENSITIVE`, 1 GiB).
pub const MEMLIMIT_SENSITIVE_KIB: u32 = 1_048_576;
/// Lanes. libsodium always uses one.
pub const PARALLELISM: u32 = 1;

static SENSITIVE: OnceLock<Argon2<'static>> = OnceLock::new();

/// Initialize the Argon2id backend.
///
/// Runs at most once per process; later calls and every derivation reuse the
/// same instance. Calling this up front is optional but moves the parameter
/// check out of the first derivation.
///
/// # Errors
///
/// Returns `HumanUuidError::Kdf` if the backend rejects the parameters.
pub fn init() -> Result<(), HumanUuidError> {
    sensitive().map(|_| ())
}

pub(crate) fn sensitive() -> Result<&'static Argon2<'static>, HumanUuidError> {
    if let Some(kdf) = SENSITIVE.get() {
        return Ok(kdf);
    }
    let params = Params::new(
        MEMLIMIT_SENSITIVE_KIB,
        OPSLIMIT_SENSITIVE,
        PARALLELISM,
        Some(OUTPUT_LEN),
    )
    .map_err(|e| HumanUuidError::Kdf(e.to_string()))?;

    Ok(SENSITIVE.get_or_init(|| {
        tracing::debug!(
            m_cost_kib = MEMLIMIT_SENSITIVE_KIB,
            t_cost = OPSLIMIT_SENSITIVE,
            p_cost = PARALLELISM,
            "Argon2id backend initialized"
        );
        Argon2::new(Algorithm::Argon2id, Version::V0x13, params)
    }))
}

/// Run Argon2id over a canonical buffer with the fixed salt.
pub(crate) fn hash(
    kdf: &Argon2<'_>,
    buffer: &CanonicalBuffer,
) -> Result<[u8; OUTPUT_LEN], HumanUuidError> {
    let mut out = [0u8; OUTPUT_LEN];
    kdf.hash_password_into(buffer.as_bytes(), &SALT, &mut out)
        .map_err(|e| HumanUuidError::Kdf(e.to_string()))?;
    Ok(out)
}

/// A tiny Argon2id profile so tests can exercise the derivation path quickly.
#[cfg(test)]
pub(crate) fn test_kdf() -> Argon2<'static> {
    let params = Params::new(64, 1, 1, Some(OUTPUT_LEN)).expect("valid test params");
    Argon2::new(Algorithm::Argon2id, Version::V0x13, params)
}
