//! At-Rest Encryption
//!
//! ChaCha20-Poly1305 sealing of secret payloads for the SQLite store.

pub mod encryption;
pub mod key;

use thiserror::Error;

/// Cryptographic errors
#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("Encryption failed: {0}")]
    EncryptionFailed(String),

    #[error("Decryption failed: {0}")]
    DecryptionFailed(String),

    #[error("Invalid key length: expected 32, got {0}")]
    InvalidKeyLength(usize),
}

pub type CryptoResult<T> = Result<T, CryptoError>;

// Re-exports
pub use encryption::{open_bytes, seal_bytes};
pub use key::StoreKey;
