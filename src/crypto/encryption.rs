//! Encryption Module
//!
//! ChaCha20-Poly1305 AEAD sealing of secret payloads. The sealed form is
//! hex text with the nonce prepended, ready for a TEXT column.

use chacha20poly1305::{
    aead::{Aead, KeyInit},
    ChaCha20Poly1305, Nonce,
};
use rand::RngCore;
use zeroize::Zeroizing;

use super::{CryptoError, CryptoResult};

/// Nonce size for ChaCha20-Poly1305 (96 bits)
pub const NONCE_SIZE: usize = 12;

/// Seal bytes under `key`
pub fn seal_bytes(key: &[u8], plaintext: &[u8]) -> CryptoResult<String> {
    if key.len() != 32 {
        return Err(CryptoError::InvalidKeyLength(key.len()));
    }

    let cipher = ChaCha20Poly1305::new_from_slice(key)
        .map_err(|e| CryptoError::EncryptionFailed(e.to_string()))?;

    let mut nonce_bytes = [0u8; NONCE_SIZE];
    rand::thread_rng().fill_bytes(&mut nonce_bytes);
    let nonce = Nonce::from_slice(&nonce_bytes);

    let ciphertext = cipher
        .encrypt(nonce, plaintext)
        .map_err(|e| CryptoError::EncryptionFailed(e.to_string()))?;

    let mut result = nonce_bytes.to_vec();
    result.extend(ciphertext);

    Ok(hex::encode(result))
}

/// Open a sealed value; the plaintext buffer is wiped when dropped
pub fn open_bytes(key: &[u8], sealed: &str) -> CryptoResult<Zeroizing<Vec<u8>>> {
    if key.len() != 32 {
        return Err(CryptoError::InvalidKeyLength(key.len()));
    }

    let data = hex::decode(sealed).map_err(|e| CryptoError::DecryptionFailed(e.to_string()))?;

    if data.len() < NONCE_SIZE {
        return Err(CryptoError::DecryptionFailed(
            "Ciphertext too short".to_string(),
        ));
    }

    let (nonce_bytes, ciphertext_bytes) = data.split_at(NONCE_SIZE);
    let nonce = Nonce::from_slice(nonce_bytes);

    let cipher = ChaCha20Poly1305::new_from_slice(key)
        .map_err(|e| CryptoError::DecryptionFailed(e.to_string()))?;

    cipher
        .decrypt(nonce, ciphertext_bytes)
        .map(Zeroizing::new)
        .map_err(|e| CryptoError::DecryptionFailed(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_key() -> [u8; 32] {
        [0x42u8; 32]
    }

    #[test]
    fn test_seal_open() {
        let key = test_key();
        let plaintext = b"p@ss \x00\x01\x02";

        let sealed = seal_bytes(&key, plaintext).unwrap();
        let opened = open_bytes(&key, &sealed).unwrap();

        assert_eq!(plaintext.as_slice(), opened.as_slice());
    }

    #[test]
    fn test_different_nonces() {
        let key = test_key();

        let sealed1 = seal_bytes(&key, b"Same message").unwrap();
        let sealed2 = seal_bytes(&key, b"Same message").unwrap();

        assert_ne!(sealed1, sealed2);
        assert_eq!(
            open_bytes(&key, &sealed1).unwrap().as_slice(),
            open_bytes(&key, &sealed2).unwrap().as_slice()
        );
    }

    #[test]
    fn test_wrong_key_fails() {
        let sealed = seal_bytes(&[0x42u8; 32], b"Secret").unwrap();
        assert!(open_bytes(&[0x43u8; 32], &sealed).is_err());
    }

    #[test]
    fn test_invalid_key_length() {
        let result = seal_bytes(&[0u8; 16], b"test");
        assert!(matches!(result, Err(CryptoError::InvalidKeyLength(16))));
    }

    #[test]
    fn test_tampered_ciphertext_fails() {
        let key = test_key();
        let sealed = seal_bytes(&key, b"Secret message").unwrap();

        let mut bytes: Vec<u8> = hex::decode(&sealed).unwrap();
        bytes[NONCE_SIZE + 5] ^= 0x01;

        assert!(open_bytes(&key, &hex::encode(bytes)).is_err());
    }

    #[test]
    fn test_truncated_input_fails() {
        assert!(open_bytes(&test_key(), "00ff").is_err());
    }
}
