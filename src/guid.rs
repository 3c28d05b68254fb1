use std::fmt;
use std::str;

use serde::{Deserialize, Serialize};

/// A 64-bit transaction identifier.
///
/// Rendered as 16 lowercase hex characters in text and wire form. Every
/// transaction is assigned one at start; payloads carry them as `id`,
/// `trip_id` and `parent_id`.
#[derive(Serialize, Deserialize, Debug, Copy, Clone, Eq, PartialEq, Hash)]
#[serde(try_from = "String", into = "String")]
pub struct Guid([u8; 8]);

impl Guid {
    /// Generates a new random identifier.
    pub fn new() -> Self {
        Self(rand::random())
    }

    /// Returns the raw bytes of the identifier.
    pub fn as_bytes(&self) -> &[u8; 8] {
        &self.0
    }
}

impl Default for Guid {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for Guid {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(fmt, "{}", hex::encode(self.0))
    }
}

impl From<Guid> for String {
    fn from(guid: Guid) -> Self {
        guid.to_string()
    }
}

impl str::FromStr for Guid {
    type Err = hex::FromHexError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let mut buf = [0; 8];
        hex::decode_to_slice(input, &mut buf)?;
        Ok(Self(buf))
    }
}

impl TryFrom<String> for Guid {
    type Error = hex::FromHexError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    #[test]
    fn parses_and_displays() {
        let guid = Guid::from_str("b854df4feb2b1f06").unwrap();
        assert_eq!(guid.to_string(), "b854df4feb2b1f06");
        assert_eq!(guid.as_bytes(), &[0xb8, 0x54, 0xdf, 0x4f, 0xeb, 0x2b, 0x1f, 0x06]);
    }

    #[test]
    fn rejects_invalid_input() {
        assert!(Guid::from_str("").is_err());
        assert!(Guid::from_str("b854df4feb2b1f").is_err());
        assert!(Guid::from_str("b854df4feb2b1f06aa").is_err());
        assert!(Guid::from_str("g854df4feb2b1f06").is_err());
    }

    #[test]
    fn generated_guids_are_distinct() {
        assert_ne!(Guid::new(), Guid::new());
    }

    #[test]
    fn serializes_as_string() {
        let guid = Guid::from_str("7e249074f277923d").unwrap();
        let json = serde_json::to_string(&guid).unwrap();
        assert_eq!(json, "\"7e249074f277923d\"");
        let parsed: Guid = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, guid);
    }
}
