//! Application identifiers.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::{Error, Result};

/// Shortest valid AID, in bytes.
pub const MIN_LENGTH: usize = 5;
/// Longest valid AID, in bytes.
pub const MAX_LENGTH: usize = 16;

/// A JavaCard application or package identifier (5 to 16 bytes).
///
/// Equality, ordering and hashing are byte-for-byte. The text form is
/// uppercase hex.
///
/// ```
/// use capfile_core::Aid;
///
/// let aid: Aid = "A0000000620001".parse()?;
/// assert_eq!(aid.len(), 7);
/// assert_eq!(aid.to_string(), "A0000000620001");
/// # Ok::<(), capfile_core::Error>(())
/// ```
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Aid(Vec<u8>);

impl Aid {
    /// Create an AID from raw bytes.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidLength`] unless `5 <= bytes.len() <= 16`.
    pub fn new(bytes: impl Into<Vec<u8>>) -> Result<Self> {
        let bytes = bytes.into();
        if !(MIN_LENGTH..=MAX_LENGTH).contains(&bytes.len()) {
            return Err(Error::InvalidLength(bytes.len()));
        }
        Ok(Self(bytes))
    }

    /// Parse an AID from hex text. ASCII whitespace is ignored.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidEncoding`] for malformed hex, then
    /// [`Error::InvalidLength`] for a decoded length outside the bounds.
    pub fn from_hex(text: &str) -> Result<Self> {
        let compact: String = text.chars().filter(|c| !c.is_ascii_whitespace()).collect();
        let bytes =
            hex::decode(&compact).map_err(|e| Error::InvalidEncoding(format!("'{text}': {e}")))?;
        Self::new(bytes)
    }

    /// The identifier bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Length in bytes (always 5 to 16).
    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> usize {
        self.0.len()
    }
}

impl fmt::Display for Aid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode_upper(&self.0))
    }
}

impl fmt::Debug for Aid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Aid({self})")
    }
}

impl FromStr for Aid {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_hex(s)
    }
}

impl TryFrom<&[u8]> for Aid {
    type Error = Error;

    fn try_from(bytes: &[u8]) -> Result<Self> {
        Self::new(bytes)
    }
}

impl AsRef<[u8]> for Aid {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl Serialize for Aid {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Aid {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn length_bounds() {
        for len in 0..=20 {
            let result = Aid::new(vec![0xA0; len]);
            if (5..=16).contains(&len) {
                assert_eq!(result.unwrap().len(), len);
            } else {
                assert!(matches!(result, Err(Error::InvalidLength(l)) if l == len));
            }
        }
    }

    #[test]
    fn hex_round_trip() {
        for len in 5..=16 {
            let bytes: Vec<u8> = (0..len).map(|i| (i as u8).wrapping_mul(37)).collect();
            let aid = Aid::new(bytes.clone()).unwrap();
            let parsed: Aid = aid.to_string().parse().unwrap();
            assert_eq!(parsed.as_bytes(), bytes.as_slice());
            assert_eq!(parsed, aid);
        }
    }

    #[test]
    fn parse_ignores_whitespace_and_case() {
        let a: Aid = "a0 00 00 00 62 00 01".parse().unwrap();
        let b: Aid = "A0000000620001".parse().unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn malformed_hex_is_encoding_error() {
        assert!(matches!(
            "A00000006Z0001".parse::<Aid>(),
            Err(Error::InvalidEncoding(_))
        ));
        assert!(matches!(
            "A0000000620".parse::<Aid>(),
            Err(Error::InvalidEncoding(_))
        ));
    }

    #[test]
    fn valid_hex_with_bad_length_is_length_error() {
        assert!(Aid::from_hex("A000000062").is_ok());
        assert!(matches!(
            Aid::from_hex("A0000000"),
            Err(Error::InvalidLength(4))
        ));
    }
}
