//! Error types for the crypto provider layer.

use thiserror::Error;

/// Result type for crypto operations.
pub type CryptoResult<T> = Result<T, CryptoError>;

/// Errors that can occur in cryptographic operations.
#[derive(Debug, Error)]
pub enum CryptoError {
    /// The environment cannot supply the required primitives (no CSPRNG, …).
    #[error("crypto provider unavailable: {0}")]
    UnsupportedEnvironment(String),

    /// Key derivation failed.
    #[error("key derivation failed: {0}")]
    KeyDerivation(String),

    /// Encryption failed.
    #[error("encryption failed: {0}")]
    Encryption(String),

    /// Decryption failed. Carries no detail: AEAD cannot tell a wrong
    /// password from a tampered ciphertext, and neither does this error.
    #[error("decryption failed")]
    DecryptFailed,

    /// The identity handle does not refer to a live identity.
    #[error("unknown identity handle")]
    InvalidHandle,
}
