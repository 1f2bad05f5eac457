//! Identifier derivation from canonical byte fields.
//!
//! The inputs may come from anywhere, not only [`crate::canonicalize_easy`],
//! so every width, encoding and date constraint is checked again here before
//! the buffer is assembled and hashed.

use argon2::Argon2;
use chrono::{DateTime, Datelike, NaiveDate, NaiveTime, Utc};

use crate::field::{
    CanonicalBuffer, CanonicalFields, COUNTRY_CODE_LEN, DAY_LEN, MIN_YEAR, MONTH_LEN,
    TEXT_FIELD_LEN, YEAR_LEN,
};
use crate::{kdf, HumanUuid, HumanUuidError};

/// UTF-32 byte-order marks seen through a little-endian read of the first word.
const BOM_WORDS: [u32; 2] = [0xFFFE_0000, 0x0000_FFFE];

/// The eight canonical byte fields, borrowed from the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawFields<'a> {
    /// UTF-32BE, 256 bytes.
    pub family_name: &'a [u8],
    /// UTF-32BE, 256 bytes.
    pub given_names: &'a [u8],
    /// UTF-32BE, 256 bytes.
    pub birth_certificate_id: &'a [u8],
    /// UTF-32BE, 256 bytes.
    pub place_of_birth: &'a [u8],
    /// Big-endian u32, 4 bytes.
    pub country_code: &'a [u8],
    /// Big-endian u16, 2 bytes.
    pub year: &'a [u8],
    /// 1 byte.
    pub month: &'a [u8],
    /// 1 byte.
    pub day: &'a [u8],
}

impl CanonicalFields {
    /// Borrow these fields as derivation input.
    #[must_use]
    pub fn as_raw(&self) -> RawFields<'_> {
        RawFields {
            family_name: self.family_name.as_bytes(),
            given_names: self.given_names.as_bytes(),
            birth_certificate_id: self.birth_certificate_id.as_bytes(),
            place_of_birth: self.place_of_birth.as_bytes(),
            country_code: &self.country_code,
            year: &self.year,
            month: &self.month,
            day: &self.day,
        }
    }
}

/// Derive the identifier for a set of canonical fields, using the system clock.
///
/// Deliberately slow and memory-hard (1 GiB); keep it off latency-critical paths.
///
/// # Errors
///
/// See [`derive_at`].
pub fn derive(fields: &RawFields<'_>) -> Result<HumanUuid, HumanUuidError> {
    derive_at(fields, Utc::now())
}

/// Derive the identifier for a set of canonical fields as of `now`.
///
/// # Errors
///
/// Returns `HumanUuidError::InvalidLength` for a field of the wrong width,
/// `HumanUuidError::WrongEncoding` for a byte-order mark, a code point that is
/// not a Unicode scalar value or reserved high bits, `HumanUuidError::InvalidDate`
/// for a birth date that is out of range, not on the calendar or not before
/// `now`, and `HumanUuidError::Kdf` if the backend cannot be initialized.
///
/// # Panics
///
/// Panics if the validated fields do not assemble into exactly 1032 bytes,
/// which would be a defect in this crate.
pub fn derive_at(fields: &RawFields<'_>, now: DateTime<Utc>) -> Result<HumanUuid, HumanUuidError> {
    derive_with(kdf::sensitive()?, fields, now)
}

#[tracing::instrument(level = "debug", skip_all)]
pub(crate) fn derive_with(
    kdf: &Argon2<'_>,
    fields: &RawFields<'_>,
    now: DateTime<Utc>,
) -> Result<HumanUuid, HumanUuidError> {
    let buffer = validate(fields, now)?;
    let out = kdf::hash(kdf, &buffer)?;
    tracing::debug!("identifier derived");
    Ok(HumanUuid::from_bytes(&out))
}

/// Check every field and assemble the canonical buffer.
fn validate(fields: &RawFields<'_>, now: DateTime<Utc>) -> Result<CanonicalBuffer, HumanUuidError> {
    let text = [
        ("family_name", fields.family_name),
        ("given_names", fields.given_names),
        ("birth_certificate_id", fields.birth_certificate_id),
        ("place_of_birth", fields.place_of_birth),
    ];
    for (field, bytes) in text {
        check_text_field(field, bytes)?;
    }

    let country_code: [u8; COUNTRY_CODE_LEN] = fixed("country_code", fields.country_code)?;
    if country_code[0] != 0 {
        return Err(wrong_encoding(
            "country_code",
            "must be big endian with a 0x00 top byte",
        ));
    }
    let year: [u8; YEAR_LEN] = fixed("year", fields.year)?;
    if year[0] & 0xF0 != 0 {
        return Err(wrong_encoding(
            "year",
            "must be big endian with a zero top nibble",
        ));
    }
    let [month]: [u8; MONTH_LEN] = fixed("month", fields.month)?;
    let [day]: [u8; DAY_LEN] = fixed("day", fields.day)?;
    check_birth_date(u16::from_be_bytes(year), month, day, now)?;

    Ok(CanonicalBuffer::concat(&[
        fields.family_name,
        fields.given_names,
        fields.birth_certificate_id,
        fields.place_of_birth,
        &country_code,
        &year,
        &[month],
        &[day],
    ]))
}

fn fixed<const N: usize>(field: &'static str, bytes: &[u8]) -> Result<[u8; N], HumanUuidError> {
    <[u8; N]>::try_from(bytes).map_err(|_| HumanUuidError::InvalidLength {
        field,
        expected: format!("{N} bytes"),
        actual: bytes.len(),
    })
}

fn check_text_field(field: &'static str, bytes: &[u8]) -> Result<(), HumanUuidError> {
    let words: [u8; TEXT_FIELD_LEN] = fixed(field, bytes)?;

    let first = u32::from_le_bytes([words[0], words[1], words[2], words[3]]);
    if BOM_WORDS.contains(&first) {
        return Err(wrong_encoding(
            field,
            "must be UTF-32BE without a byte-order mark",
        ));
    }
    // Little-endian or otherwise garbled input shows up as out-of-range code points.
    let all_scalars = words
        .chunks_exact(4)
        .all(|w| char::from_u32(u32::from_be_bytes([w[0], w[1], w[2], w[3]])).is_some());
    if !all_scalars {
        return Err(wrong_encoding(
            field,
            "must be UTF-32BE unicode scalar values",
        ));
    }
    Ok(())
}

fn wrong_encoding(field: &'static str, reason: &'static str) -> HumanUuidError {
    tracing::warn!(field, reason, "rejected canonical field");
    HumanUuidError::WrongEncoding { field, reason }
}

/// A birth date must be on the proleptic Gregorian calendar, no earlier than
/// 1900, and its UTC midnight must lie strictly before `now`.
fn check_birth_date(
    year: u16,
    month: u8,
    day: u8,
    now: DateTime<Utc>,
) -> Result<NaiveDate, HumanUuidError> {
    let invalid = |reason| HumanUuidError::InvalidDate {
        year,
        month,
        day,
        reason,
    };

    if year < MIN_YEAR || i32::from(year) > now.year() {
        return Err(invalid("year must be between 1900 and the current year"));
    }
    if !(1..=12).contains(&month) {
        return Err(invalid("month must be between 1 and 12"));
    }
    if !(1..=31).contains(&day) {
        return Err(invalid("day must be between 1 and 31"));
    }
    let date = NaiveDate::from_ymd_opt(i32::from(year), u32::from(month), u32::from(day))
        .ok_or_else(|| invalid("date does not exist on the Gregorian calendar"))?;
    if date.and_time(NaiveTime::MIN).and_utc() >= now {
        return Err(invalid("date must be in the past"));
    }
    Ok(date)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::{canonicalize_easy_at, BirthRecord};
    use crate::kdf::test_kdf;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    fn smith() -> CanonicalFields {
        let record = BirthRecord {
            family_name: "Smith",
            given_names: "John Apple",
            birth_certificate_id: "10001",
            place_of_birth: "San Francisco",
            country_code: 0,
            year: 1901,
            month: 1,
            day: 1,
        };
        canonicalize_easy_at(&record, now().date_naive()).expect("canonicalize")
    }

    fn derive_test(fields: &RawFields<'_>) -> Result<HumanUuid, HumanUuidError> {
        derive_with(&test_kdf(), fields, now())
    }

    #[test]
    fn matches_reference_vector() {
        // Same Argon2id call with a tiny cost profile, computed independently.
        let fields = smith();
        let id = derive_test(&fields.as_raw()).expect("derive");
        assert_eq!(id.as_str(), "f16df0ef1a7537c6b574859a67aa9eda");
    }

    #[test]
    fn day_change_changes_identifier() {
        let mut fields = smith();
        fields.day = [2];
        let id = derive_test(&fields.as_raw()).expect("derive");
        assert_eq!(id.as_str(), "2acda5558832268e63be617e8453e63f");
    }

    #[test]
    fn validated_buffer_equals_canonicalizer_buffer() {
        let fields = smith();
        let buffer = validate(&fields.as_raw(), now()).expect("valid");
        assert_eq!(buffer, fields.to_buffer());
    }

    #[test]
    fn hand_built_fields_are_accepted() {
        let mut text = Vec::with_capacity(TEXT_FIELD_LEN);
        for ch in "Doe".chars().chain(std::iter::repeat(' ')).take(64) {
            text.extend_from_slice(&u32::from(ch).to_be_bytes());
        }
        let fields = RawFields {
            family_name: &text,
            given_names: &text,
            birth_certificate_id: &text,
            place_of_birth: &text,
            country_code: &[0, 0, 0x03, 0x48],
            year: &[0x07, 0xD0],
            month: &[2],
            day: &[29],
        };
        assert!(derive_test(&fields).is_ok());
    }

    #[test]
    fn rejects_wrong_text_width() {
        let fields = smith();
        let short = [0u8; 255];
        let raw = RawFields {
            place_of_birth: &short,
            ..fields.as_raw()
        };
        assert!(matches!(
            derive_test(&raw),
            Err(HumanUuidError::InvalidLength {
                field: "place_of_birth",
                actual: 255,
                ..
            })
        ));
    }

    #[test]
    fn rejects_wrong_scalar_widths() {
        let fields = smith();
        let cases: [(RawFields<'_>, &str); 4] = [
            (RawFields { country_code: &[0, 0, 0], ..fields.as_raw() }, "country_code"),
            (RawFields { year: &[0x07, 0x6D, 0], ..fields.as_raw() }, "year"),
            (RawFields { month: &[], ..fields.as_raw() }, "month"),
            (RawFields { day: &[1, 1], ..fields.as_raw() }, "day"),
        ];
        for (raw, expected) in cases {
            match derive_test(&raw) {
                Err(HumanUuidError::InvalidLength { field, .. }) => assert_eq!(field, expected),
                other => panic!("expected InvalidLength for {expected}, got {other:?}"),
            }
        }
    }

    #[test]
    fn rejects_byte_order_marks() {
        let fields = smith();
        for bom in [[0x00, 0x00, 0xFE, 0xFF], [0xFE, 0xFF, 0x00, 0x00]] {
            let mut text = *fields.given_names.as_bytes();
            text[..4].copy_from_slice(&bom);
            let raw = RawFields {
                given_names: &text,
                ..fields.as_raw()
            };
            match derive_test(&raw) {
                Err(HumanUuidError::WrongEncoding {
                    field: "given_names",
                    reason,
                }) => assert!(reason.contains("byte-order mark"), "{bom:?}: {reason}"),
                other => panic!("expected a byte-order mark rejection for {bom:?}, got {other:?}"),
            }
        }
    }

    #[test]
    fn rejects_little_endian_text() {
        let fields = smith();
        let mut text = *fields.family_name.as_bytes();
        for word in text.chunks_exact_mut(4) {
            word.reverse();
        }
        let raw = RawFields {
            family_name: &text,
            ..fields.as_raw()
        };
        assert!(matches!(
            derive_test(&raw),
            Err(HumanUuidError::WrongEncoding {
                field: "family_name",
                ..
            })
        ));
    }

    #[test]
    fn rejects_reserved_high_bits() {
        let fields = smith();
        let raw = RawFields {
            country_code: &[1, 0, 0, 0],
            ..fields.as_raw()
        };
        assert!(matches!(
            derive_test(&raw),
            Err(HumanUuidError::WrongEncoding {
                field: "country_code",
                ..
            })
        ));

        // 1901 little endian: 0x6D 0x07
        let raw = RawFields {
            year: &[0x6D, 0x07],
            ..fields.as_raw()
        };
        assert!(matches!(
            derive_test(&raw),
            Err(HumanUuidError::WrongEncoding { field: "year", .. })
        ));
    }

    #[test]
    fn rejects_implausible_dates() {
        let fields = smith();
        let cases: [(&[u8], &[u8], &[u8]); 7] = [
            (&[0x07, 0x6B], &[1], &[1]),  // 1899
            (&[0x07, 0xE9], &[1], &[1]),  // 2025, after the current year
            (&[0x07, 0xD1], &[0], &[1]),  // month 0
            (&[0x07, 0xD1], &[13], &[1]), // month 13
            (&[0x07, 0xD1], &[4], &[31]), // 31 April
            (&[0x07, 0xD1], &[2], &[29]), // 29 February 2001
            (&[0x07, 0xE8], &[6], &[2]),  // tomorrow
        ];
        for (year, month, day) in cases {
            let raw = RawFields {
                year,
                month,
                day,
                ..fields.as_raw()
            };
            assert!(
                matches!(derive_test(&raw), Err(HumanUuidError::InvalidDate { .. })),
                "accepted {year:?}-{month:?}-{day:?}"
            );
        }
    }

    #[test]
    fn birth_date_is_compared_at_utc_midnight() {
        let today = NaiveDate::from_ymd_opt(2024, 6, 1).expect("valid date");
        assert!(check_birth_date(2024, 6, 1, now()).is_ok());

        let midnight = today.and_time(NaiveTime::MIN).and_utc();
        assert!(matches!(
            check_birth_date(2024, 6, 1, midnight),
            Err(HumanUuidError::InvalidDate { .. })
        ));
    }

    #[test]
    fn leap_day_is_accepted_in_leap_years() {
        assert!(check_birth_date(2000, 2, 29, now()).is_ok());
        assert!(check_birth_date(1900, 2, 29, now()).is_err());
    }
}
