//! `HumanUuid`: the derived identifier as 32 lowercase hex characters.

use std::fmt;
use std::str::FromStr;

use crate::kdf::OUTPUT_LEN;

/// A derived identifier: 16 bytes, shown as 32 lowercase hex characters.
///
/// Produced by [`derive`](fn@crate::derive), or parsed with [`HumanUuid::from_str`]
/// when reading back a stored identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HumanUuid {
    bytes: [u8; OUTPUT_LEN],
    hex: String,
}

/// Error returned when text is not a well-formed `HumanUuid`.
#[derive(Debug, thiserror::Error)]
#[error("invalid HumanUUID: {reason}")]
pub struct HumanUuidParseError {
    reason: &'static str,
}

/// Length of the hex form.
const HEX_LENGTH: usize = OUTPUT_LEN * 2;

impl HumanUuid {
    pub(crate) fn from_bytes(bytes: &[u8; OUTPUT_LEN]) -> Self {
        Self {
            bytes: *bytes,
            hex: hex::encode(bytes),
        }
    }

    /// The hex form, as stored and exchanged between systems.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.hex
    }

    /// The 16 bytes the KDF produced.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; OUTPUT_LEN] {
        &self.bytes
    }
}

impl FromStr for HumanUuid {
    type Err = HumanUuidParseError;

    /// Only the canonical lowercase form is accepted, so parsed and derived
    /// identifiers compare equal as strings too.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() != HEX_LENGTH {
            return Err(HumanUuidParseError {
                reason: "must be exactly 32 characters",
            });
        }
        if !s.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f')) {
            return Err(HumanUuidParseError {
                reason: "contains invalid characters (expected lowercase hex)",
            });
        }
        let mut bytes = [0u8; OUTPUT_LEN];
        hex::decode_to_slice(s, &mut bytes).map_err(|_| HumanUuidParseError {
            reason: "is not valid hex",
        })?;
        Ok(Self::from_bytes(&bytes))
    }
}

impl fmt::Display for HumanUuid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.hex)
    }
}

impl AsRef<str> for HumanUuid {
    fn as_ref(&self) -> &str {
        &self.hex
    }
}

impl serde::Serialize for HumanUuid {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.hex)
    }
}

impl<'de> serde::Deserialize<'de> for HumanUuid {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
