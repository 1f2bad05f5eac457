//! Field canonicalization: raw birth-registration attributes to fixed-width bytes.
//!
//! Layout of the canonical buffer, in order:
//!
//! | Field                  | Size | Encoding                      |
//! |------------------------|------|-------------------------------|
//! | family name            | 256  | UTF-32BE, 64 code points      |
//! | given names            | 256  | UTF-32BE, 64 code points      |
//! | birth certificate id   | 256  | UTF-32BE, 64 code points      |
//! | place of birth         | 256  | UTF-32BE, 64 code points      |
//! | country code           | 4    | u32 big endian, top byte 0x00 |
//! | year                   | 2    | u16 big endian, top nibble 0  |
//! | month                  | 1    | u8                            |
//! | day                    | 1    | u8                            |

use std::fmt;
use std::iter;

use chrono::{Datelike, NaiveDate};

use crate::normalize::NormalizationPolicy;
use crate::HumanUuidError;

/// Code points per text field after padding.
pub const TEXT_FIELD_CHARS: usize = 64;
/// Encoded size of a text field.
pub const TEXT_FIELD_LEN: usize = TEXT_FIELD_CHARS * 4;
/// Encoded size of the country code.
pub const COUNTRY_CODE_LEN: usize = 4;
/// Encoded size of the year.
pub const YEAR_LEN: usize = 2;
/// Encoded size of the month.
pub const MONTH_LEN: usize = 1;
/// Encoded size of the day.
pub const DAY_LEN: usize = 1;
/// Total size of the canonical buffer (1032).
pub const CANONICAL_LEN: usize =
    4 * TEXT_FIELD_LEN + COUNTRY_CODE_LEN + YEAR_LEN + MONTH_LEN + DAY_LEN;

/// Largest accepted country code (28-bit code space).
pub const MAX_COUNTRY_CODE: u32 = 0x0FFF_FFFF;
/// Earliest accepted year of birth.
pub const MIN_YEAR: u16 = 1900;

/// Padding code point appended after the normalized text.
const PAD: char = ' ';

/// Raw birth-registration attributes, as a caller would type them.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct BirthRecord<'a> {
    pub family_name: &'a str,
    /// Space-delimited when there is more than one.
    pub given_names: &'a str,
    pub birth_certificate_id: &'a str,
    pub place_of_birth: &'a str,
    /// ISO 3166 numeric-style code.
    pub country_code: u32,
    pub year: u16,
    pub month: u8,
    pub day: u8,
}

impl fmt::Debug for BirthRecord<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BirthRecord").finish_non_exhaustive()
    }
}

/// A text attribute encoded as exactly 64 UTF-32BE code points.
#[derive(Clone, PartialEq, Eq)]
pub struct TextField([u8; TEXT_FIELD_LEN]);

impl TextField {
    /// Normalize and encode one text attribute.
    ///
    /// `field` names the attribute in error messages.
    ///
    /// # Errors
    ///
    /// Returns `HumanUuidError::InvalidLength` if `raw` is not 1 to 64
    /// characters long, or if the policy produced text outside that range.
    pub fn encode(
        field: &'static str,
        raw: &str,
        policy: &impl NormalizationPolicy,
    ) -> Result<Self, HumanUuidError> {
        check_char_count(field, raw)?;
        let normalized = policy.normalize(raw);
        check_char_count(field, &normalized)?;

        let mut bytes = [0u8; TEXT_FIELD_LEN];
        let code_points = normalized.chars().chain(iter::repeat(PAD));
        for (slot, ch) in bytes.chunks_exact_mut(4).zip(code_points) {
            slot.copy_from_slice(&u32::from(ch).to_be_bytes());
        }
        Ok(Self(bytes))
    }

    /// The 256 encoded bytes.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; TEXT_FIELD_LEN] {
        &self.0
    }
}

impl fmt::Debug for TextField {
    // Contents are personal data; keep them out of logs and panics.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TextField")
            .field("size", &self.0.len())
            .finish_non_exhaustive()
    }
}

fn check_char_count(field: &'static str, text: &str) -> Result<(), HumanUuidError> {
    let count = text.chars().count();
    if (1..=TEXT_FIELD_CHARS).contains(&count) {
        Ok(())
    } else {
        Err(HumanUuidError::InvalidLength {
            field,
            expected: format!("1 to {TEXT_FIELD_CHARS} characters"),
            actual: count,
        })
    }
}

/// Encode a country code as a big-endian u32.
///
/// # Errors
///
/// Returns `HumanUuidError::InvalidRange` above [`MAX_COUNTRY_CODE`].
pub fn encode_country_code(code: u32) -> Result<[u8; COUNTRY_CODE_LEN], HumanUuidError> {
    check_range("country_code", code, 0, MAX_COUNTRY_CODE)?;
    Ok(code.to_be_bytes())
}

/// Encode a year as a big-endian u16.
///
/// # Errors
///
/// Returns `HumanUuidError::InvalidRange` outside 1900 to `today`'s year.
pub fn encode_year(year: u16, today: NaiveDate) -> Result<[u8; YEAR_LEN], HumanUuidError> {
    let current = u32::try_from(today.year()).unwrap_or(0);
    check_range("year", u32::from(year), u32::from(MIN_YEAR), current)?;
    Ok(year.to_be_bytes())
}

/// Encode a month.
///
/// # Errors
///
/// Returns `HumanUuidError::InvalidRange` outside 1..=12.
pub fn encode_month(month: u8) -> Result<[u8; MONTH_LEN], HumanUuidError> {
    check_range("month", u32::from(month), 1, 12)?;
    Ok([month])
}

/// Encode a day of the month.
///
/// # Errors
///
/// Returns `HumanUuidError::InvalidRange` outside 1..=31.
pub fn encode_day(day: u8) -> Result<[u8; DAY_LEN], HumanUuidError> {
    check_range("day", u32::from(day), 1, 31)?;
    Ok([day])
}

fn check_range(field: &'static str, value: u32, min: u32, max: u32) -> Result<(), HumanUuidError> {
    if (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(HumanUuidError::InvalidRange {
            field,
            value: value.to_string(),
            min,
            max,
        })
    }
}

/// The eight canonical encodings of one person, ready for [`derive`](fn@crate::derive).
#[derive(Clone, PartialEq, Eq)]
pub struct CanonicalFields {
    pub family_name: TextField,
    pub given_names: TextField,
    pub birth_certificate_id: TextField,
    pub place_of_birth: TextField,
    pub country_code: [u8; COUNTRY_CODE_LEN],
    pub year: [u8; YEAR_LEN],
    pub month: [u8; MONTH_LEN],
    pub day: [u8; DAY_LEN],
}

impl CanonicalFields {
    /// Concatenate the fields into the 1032-byte canonical buffer.
    #[must_use]
    pub fn to_buffer(&self) -> CanonicalBuffer {
        CanonicalBuffer::concat(&[
            self.family_name.as_bytes(),
            self.given_names.as_bytes(),
            self.birth_certificate_id.as_bytes(),
            self.place_of_birth.as_bytes(),
            &self.country_code,
            &self.year,
            &self.month,
            &self.day,
        ])
    }
}

impl fmt::Debug for CanonicalFields {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CanonicalFields").finish_non_exhaustive()
    }
}

/// The exact byte string fed to the KDF.
#[derive(Clone, PartialEq, Eq)]
pub struct CanonicalBuffer([u8; CANONICAL_LEN]);

impl CanonicalBuffer {
    /// Concatenate fields in order.
    ///
    /// # Panics
    ///
    /// Panics if the parts do not add up to exactly [`CANONICAL_LEN`] bytes.
    /// Callers only pass fixed-width fields, so this is a defect in this
    /// crate and no identifier may be produced from the result.
    pub(crate) fn concat(parts: &[&[u8]]) -> Self {
        let mut bytes = [0u8; CANONICAL_LEN];
        let mut upto = 0;
        for part in parts {
            let end = upto + part.len();
            assert!(
                end <= CANONICAL_LEN,
                "fatal: canonical buffer overflows at {end} bytes"
            );
            bytes[upto..end].copy_from_slice(part);
            upto = end;
        }
        assert_eq!(
            upto, CANONICAL_LEN,
            "fatal: canonical buffer assembled to the wrong length"
        );
        Self(bytes)
    }

    /// The 1032 buffer bytes.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; CANONICAL_LEN] {
        &self.0
    }
}

impl fmt::Debug for CanonicalBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CanonicalBuffer")
            .field("size", &self.0.len())
            .finish_non_exhaustive()
    }
}

/// Canonicalize a record with [`crate::LatinListPolicy`], reading today's date from the clock.
///
/// # Errors
///
/// See [`canonicalize_easy_with`].
pub fn canonicalize_easy(record: &BirthRecord<'_>) -> Result<CanonicalFields, HumanUuidError> {
    canonicalize_easy_at(record, chrono::Utc::now().date_naive())
}

/// Canonicalize a record with [`crate::LatinListPolicy`] against an explicit `today`.
///
/// # Errors
///
/// See [`canonicalize_easy_with`].
pub fn canonicalize_easy_at(
    record: &BirthRecord<'_>,
    today: NaiveDate,
) -> Result<CanonicalFields, HumanUuidError> {
    canonicalize_easy_with(record, &crate::LatinListPolicy, today)
}

/// Canonicalize a record with a custom normalization policy.
///
/// All scalar ranges are checked before any text is encoded. Calendar
/// validity is left to [`derive`](fn@crate::derive), which checks it on every path.
///
/// # Errors
///
/// Returns `HumanUuidError::InvalidRange` for a country code, year, month or
/// day out of bounds, and `HumanUuidError::InvalidLength` for a text field
/// outside 1 to 64 characters.
pub fn canonicalize_easy_with(
    record: &BirthRecord<'_>,
    policy: &impl NormalizationPolicy,
    today: NaiveDate,
) -> Result<CanonicalFields, HumanUuidError> {
    let country_code = encode_country_code(record.country_code)?;
    let year = encode_year(record.year, today)?;
    let month = encode_month(record.month)?;
    let day = encode_day(record.day)?;

    Ok(CanonicalFields {
        family_name: TextField::encode("family_name", record.family_name, policy)?,
        given_names: TextField::encode("given_names", record.given_names, policy)?,
        birth_certificate_id: TextField::encode(
            "birth_certificate_id",
            record.birth_certificate_id,
            policy,
        )?,
        place_of_birth: TextField::encode("place_of_birth", record.place_of_birth, policy)?,
        country_code,
        year,
        month,
        day,
    })
}
