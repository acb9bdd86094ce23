//! Fixed-width announce identifier

use std::fmt;
use std::str::FromStr;

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// Length of an info hash in bytes.
pub const INFO_HASH_LEN: usize = 20;

/// A 20-byte info hash as carried by DHT announce_peer queries.
///
/// Serializes as its lowercase hex form, which is also the wire format of
/// the notification body.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InfoHash([u8; INFO_HASH_LEN]);

#[derive(Debug, Error, PartialEq)]
pub enum ParseInfoHashError {
    #[error("info hash must be {expected} hex characters, got {actual}")]
    Length { expected: usize, actual: usize },
    #[error("info hash is not valid hex: {0}")]
    Hex(#[from] hex::FromHexError),
}

impl InfoHash {
    pub const fn new(bytes: [u8; INFO_HASH_LEN]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; INFO_HASH_LEN] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl From<[u8; INFO_HASH_LEN]> for InfoHash {
    fn from(bytes: [u8; INFO_HASH_LEN]) -> Self {
        Self(bytes)
    }
}

impl FromStr for InfoHash {
    type Err = ParseInfoHashError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.len() != INFO_HASH_LEN * 2 {
            return Err(ParseInfoHashError::Length {
                expected: INFO_HASH_LEN * 2,
                actual: s.len(),
            });
        }
        let mut bytes = [0u8; INFO_HASH_LEN];
        hex::decode_to_slice(s, &mut bytes)?;
        Ok(Self(bytes))
    }
}

impl fmt::Display for InfoHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for InfoHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "InfoHash({})", self.to_hex())
    }
}

impl Serialize for InfoHash {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for InfoHash {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEX: &str = "52fdfc072182654f163f5f0f9a621d729566c74d";

    #[test]
    fn test_parse_and_display() {
        let hash: InfoHash = HEX.parse().unwrap();
        assert_eq!(hash.as_bytes()[0], 0x52);
        assert_eq!(hash.to_string(), HEX);
    }

    #[test]
    fn test_parse_accepts_uppercase() {
        let hash: InfoHash = HEX.to_uppercase().parse().unwrap();
        assert_eq!(hash.to_string(), HEX);
    }

    #[test]
    fn test_parse_rejects_bad_input() {
        assert_eq!(
            "abcd".parse::<InfoHash>(),
            Err(ParseInfoHashError::Length {
                expected: 40,
                actual: 4
            })
        );
        let not_hex = "zz".repeat(20);
        assert!(matches!(
            not_hex.parse::<InfoHash>(),
            Err(ParseInfoHashError::Hex(_))
        ));
    }

    #[test]
    fn test_json_is_hex_string() {
        let hash: InfoHash = HEX.parse().unwrap();
        let json = serde_json::to_value(vec![hash]).unwrap();
        assert_eq!(json, serde_json::json!([HEX]));

        let back: Vec<InfoHash> = serde_json::from_value(json).unwrap();
        assert_eq!(back, vec![hash]);
    }
}
