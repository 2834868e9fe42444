//! Error types for the vault engine.

use keyhaven_crypto::CryptoError;
use keyhaven_store::StoreError;
use thiserror::Error;

/// Result type for vault operations.
pub type VaultResult<T> = Result<T, VaultError>;

/// Errors surfaced by the vault engine.
///
/// The engine never retries; every failure propagates to the caller. By
/// policy a wrong password and a tampered ciphertext are both reported as
/// [`VaultError::AuthenticationFailed`]: the envelope's AEAD layer makes
/// them indistinguishable and the engine keeps it that way. Messages never
/// contain passwords, keys, or secret values.
#[derive(Debug, Error)]
pub enum VaultError {
    /// The engine has not been initialized, or provider init failed.
    #[error("vault engine not initialized: {0}")]
    Initialization(String),

    /// Wrong password, wrong recovery code, or unknown identity.
    #[error("authentication failed: {0}")]
    AuthenticationFailed(String),

    /// The operation requires an unlocked session.
    #[error("no authenticated session")]
    NotAuthenticated,

    /// The envelope decrypted but its embedded id does not match the store
    /// key. The data is wrong, not the credentials; do not retry.
    #[error("envelope integrity violation: payload id does not match store key")]
    Integrity,

    /// The envelope decrypted but the payload is unparseable.
    #[error("corrupt vault payload: {0}")]
    CorruptData(String),

    /// Recovery was requested but the envelope carries no recovery
    /// ciphertext.
    #[error("identity has no recovery capability")]
    RecoveryUnavailable,

    /// A crypto primitive failed unexpectedly.
    #[error("crypto error: {0}")]
    Crypto(#[from] CryptoError),

    /// The blob store failed.
    #[error("storage error: {0}")]
    Storage(#[from] StoreError),

    /// The engine has been disposed; no further operations are possible.
    #[error("vault engine disposed")]
    Disposed,
}
