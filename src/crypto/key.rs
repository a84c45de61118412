//! Store Key
//!
//! The 256-bit key that seals secret payloads in the SQLite store. Callers
//! own its provisioning (platform keyring, KDF, hardware token); the store
//! only checks it against a sealed check value.

use rand::RngCore;
use zeroize::{Zeroize, ZeroizeOnDrop};

use super::encryption::{open_bytes, seal_bytes};
use super::{CryptoError, CryptoResult};

const KEY_CHECK_PLAINTEXT: &[u8] = b"keychain-kit/key-check/v1";

#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct StoreKey {
    key: [u8; 32],
}

impl StoreKey {
    /// Generate a new random key
    pub fn generate() -> Self {
        let mut key = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut key);
        Self { key }
    }

    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self { key: bytes }
    }

    pub fn from_slice(bytes: &[u8]) -> CryptoResult<Self> {
        let key: [u8; 32] = bytes
            .try_into()
            .map_err(|_| CryptoError::InvalidKeyLength(bytes.len()))?;
        Ok(Self { key })
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.key
    }

    /// Sealed value persisted next to the data to recognise this key later
    pub fn check_value(&self) -> CryptoResult<String> {
        seal_bytes(&self.key, KEY_CHECK_PLAINTEXT)
    }

    /// Whether `check_value` was produced by this key
    pub fn verify(&self, check_value: &str) -> bool {
        open_bytes(&self.key, check_value)
            .map(|plain| plain.as_slice() == KEY_CHECK_PLAINTEXT)
            .unwrap_or(false)
    }
}

impl AsRef<[u8]> for StoreKey {
    fn as_ref(&self) -> &[u8] {
        &self.key
    }
}

impl std::fmt::Debug for StoreKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("StoreKey([REDACTED])")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_generation() {
        let key1 = StoreKey::generate();
        let key2 = StoreKey::generate();

        assert_ne!(key1.as_bytes(), key2.as_bytes());
    }

    #[test]
    fn test_check_value() {
        let key = StoreKey::from_bytes([0x42u8; 32]);
        let check = key.check_value().unwrap();

        assert!(key.verify(&check));
        assert!(!StoreKey::from_bytes([0x43u8; 32]).verify(&check));
        assert!(!key.verify("not hex"));
    }

    #[test]
    fn test_from_slice_length() {
        assert!(StoreKey::from_slice(&[1u8; 32]).is_ok());
        assert!(matches!(
            StoreKey::from_slice(&[1u8; 16]),
            Err(CryptoError::InvalidKeyLength(16))
        ));
    }

    #[test]
    fn test_debug_is_redacted() {
        let printed = format!("{:?}", StoreKey::from_bytes([0x41u8; 32]));
        assert!(!printed.contains("65"));
        assert!(printed.contains("REDACTED"));
    }
}
