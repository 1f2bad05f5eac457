//! Deterministic identifiers for natural persons.
//!
//! A `HumanUUID` is derived from birth-registration attributes: legal name
//! parts, birth certificate id, place of birth, country code and birth date.
//! The same attributes always yield the same 32-character identifier, so
//! records can be matched across systems without exchanging the attributes.
//!
//! Two layers:
//!
//! - [`canonicalize_easy`] turns caller text and numbers into fixed-width
//!   canonical byte fields.
//! - [`derive`](fn@derive) re-validates those fields, concatenates them into a 1032-byte
//!   buffer and runs Argon2id over it with a fixed salt.
//!
//! [`derive_easy`] composes the two. Derivation is deliberately slow and uses
//! 1 GiB of memory per call.

use chrono::{DateTime, Datelike, Utc};
use wasm_bindgen::prelude::*;

mod derive;
mod error;
mod field;
mod identifier;
mod kdf;
mod normalize;

pub use derive::{derive, derive_at, RawFields};
pub use error::HumanUuidError;
pub use field::{
    canonicalize_easy, canonicalize_easy_at, canonicalize_easy_with, encode_country_code,
    encode_day, encode_month, encode_year, BirthRecord, CanonicalBuffer, CanonicalFields,
    TextField, CANONICAL_LEN, MAX_COUNTRY_CODE, MIN_YEAR, TEXT_FIELD_CHARS, TEXT_FIELD_LEN,
};
pub use identifier::{HumanUuid, HumanUuidParseError};
pub use kdf::{init, SALT};
pub use normalize::{LatinListPolicy, NormalizationPolicy, PART_SEPARATOR};

/// Canonicalize a record and derive its identifier, using the system clock.
///
/// # Errors
///
/// Any error from [`canonicalize_easy`] or [`derive`](fn@derive).
pub fn derive_easy(record: &BirthRecord<'_>) -> Result<HumanUuid, HumanUuidError> {
    derive_easy_at(record, Utc::now())
}

/// Canonicalize a record and derive its identifier as of `now`.
///
/// # Errors
///
/// Any error from [`canonicalize_easy_at`] or [`derive_at`].
pub fn derive_easy_at(
    record: &BirthRecord<'_>,
    now: DateTime<Utc>,
) -> Result<HumanUuid, HumanUuidError> {
    let fields = canonicalize_easy_at(record, now.date_naive())?;
    derive_at(&fields.as_raw(), now)
}

/// Derive an identifier from raw attributes (WASM binding).
///
/// Numbers arrive as JavaScript numbers and must be exact integers within
/// each field's bounds; nothing is truncated or wrapped. For native Rust
/// code, use [`derive_easy`] instead.
///
/// # Errors
/// Returns `JsError` if any attribute is rejected
#[wasm_bindgen(js_name = "derive_easy")]
#[allow(clippy::too_many_arguments)]
pub fn derive_easy_js(
    family_name: &str,
    given_names: &str,
    birth_certificate_id: &str,
    place_of_birth: &str,
    country_code: f64,
    year: f64,
    month: f64,
    day: f64,
) -> Result<String, JsError> {
    let to_js = |e: HumanUuidError| JsError::new(&e.to_string());
    let current_year = u32::try_from(Utc::now().year()).unwrap_or(0);
    let record = BirthRecord {
        family_name,
        given_names,
        birth_certificate_id,
        place_of_birth,
        country_code: js_integer("country_code", country_code, 0, MAX_COUNTRY_CODE)
            .map_err(to_js)?,
        year: js_integer("year", year, u32::from(MIN_YEAR), current_year).map_err(to_js)?,
        month: js_integer("month", month, 1, 12).map_err(to_js)?,
        day: js_integer("day", day, 1, 31).map_err(to_js)?,
    };
    derive_easy(&record)
        .map(|id| id.to_string())
        .map_err(to_js)
}

/// Accept a JavaScript number only if it is an integer in `min..=max` that fits `T`.
#[allow(clippy::float_cmp, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn js_integer<T: TryFrom<u32>>(
    field: &'static str,
    value: f64,
    min: u32,
    max: u32,
) -> Result<T, HumanUuidError> {
    let out_of_range = || HumanUuidError::InvalidRange {
        field,
        value: value.to_string(),
        min,
        max,
    };
    if !value.is_finite() || value.fract() != 0.0 {
        return Err(out_of_range());
    }
    if value < f64::from(min) || value > f64::from(max) {
        return Err(out_of_range());
    }
    // Integral and within u32 bounds, so the cast is exact.
    T::try_from(value as u32).map_err(|_| out_of_range())
}
