//! Secret payload bytes.

use std::fmt;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use secrecy::{ExposeSecret, SecretBox};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Secret bytes held by a concrete item.
///
/// Zeroized on drop and redacted in `Debug`; the bytes are only reachable
/// through [`ExposeSecret`].
pub struct SecretData(SecretBox<[u8]>);

impl SecretData {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(SecretBox::new(bytes.into().into_boxed_slice()))
    }

    pub fn len(&self) -> usize {
        self.expose_secret().len()
    }

    pub fn is_empty(&self) -> bool {
        self.expose_secret().is_empty()
    }
}

impl ExposeSecret<[u8]> for SecretData {
    fn expose_secret(&self) -> &[u8] {
        self.0.expose_secret()
    }
}

impl Clone for SecretData {
    fn clone(&self) -> Self {
        Self::new(self.expose_secret().to_vec())
    }
}

impl PartialEq for SecretData {
    fn eq(&self, other: &Self) -> bool {
        self.expose_secret() == other.expose_secret()
    }
}

impl Eq for SecretData {}

impl fmt::Debug for SecretData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SecretData([REDACTED])")
    }
}

impl From<Vec<u8>> for SecretData {
    fn from(bytes: Vec<u8>) -> Self {
        Self::new(bytes)
    }
}

impl From<&[u8]> for SecretData {
    fn from(bytes: &[u8]) -> Self {
        Self::new(bytes.to_vec())
    }
}

impl<const N: usize> From<&[u8; N]> for SecretData {
    fn from(bytes: &[u8; N]) -> Self {
        Self::new(bytes.to_vec())
    }
}

impl From<&str> for SecretData {
    fn from(s: &str) -> Self {
        Self::new(s.as_bytes().to_vec())
    }
}

impl From<String> for SecretData {
    fn from(s: String) -> Self {
        Self::new(s.into_bytes())
    }
}

// Only the model conversion boundary serializes items; the payload travels as base64.
impl Serialize for SecretData {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(self.expose_secret()))
    }
}

impl<'de> Deserialize<'de> for SecretData {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        STANDARD
            .decode(encoded.as_bytes())
            .map(Self::new)
            .map_err(D::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_is_redacted() {
        let secret = SecretData::from("hunter2");
        let printed = format!("{:?}", secret);
        assert!(!printed.contains("hunter2"));
        assert!(printed.contains("REDACTED"));
    }

    #[test]
    fn test_clone_and_eq() {
        let secret = SecretData::from(b"p@ss");
        let copy = secret.clone();
        assert_eq!(secret, copy);
        assert_eq!(copy.expose_secret(), b"p@ss");
        assert_ne!(secret, SecretData::from("other"));
    }

    #[test]
    fn test_json_form_is_base64() {
        let secret = SecretData::from("p@ss");
        let json = serde_json::to_string(&secret).unwrap();
        assert_eq!(json, "\"cEBzcw==\"");

        let back: SecretData = serde_json::from_str(&json).unwrap();
        assert_eq!(back, secret);
    }

    #[test]
    fn test_empty() {
        assert!(SecretData::new(Vec::new()).is_empty());
        assert_eq!(SecretData::from("abc").len(), 3);
    }
}
