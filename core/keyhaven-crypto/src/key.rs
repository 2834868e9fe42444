//! Session key material and KDF cost parameters.
//!
//! A session key is the Argon2id output that wraps the identity's private
//! key. It lives only in memory, is never persisted, and wipes itself when
//! dropped. The cost parameters are part of a provider build's contract:
//! the same password and salt only re-derive the same key while the
//! parameters stay fixed.

use zeroize::{Zeroize, ZeroizeOnDrop};

/// Size of session keys in bytes (256 bits).
pub const KEY_SIZE: usize = 32;

/// Size of KDF salts in bytes.
pub const SALT_SIZE: usize = 16;

/// 32-byte password-derived wrapping key.
///
/// Zeroized on drop. `Debug` never renders the bytes, so the key cannot
/// leak through log formatting.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SessionKey([u8; KEY_SIZE]);

impl SessionKey {
    /// Wraps raw derived-key bytes.
    #[must_use]
    pub fn from_bytes(bytes: [u8; KEY_SIZE]) -> Self {
        Self(bytes)
    }

    /// Exposes the key bytes to a cipher.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.0
    }
}

impl std::fmt::Debug for SessionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SessionKey(..)")
    }
}

/// 16-byte KDF salt, fixed at registration for the lifetime of an
/// identity.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Salt([u8; SALT_SIZE]);

impl Salt {
    /// Wraps raw salt bytes.
    #[must_use]
    pub const fn from_bytes(bytes: [u8; SALT_SIZE]) -> Self {
        Self(bytes)
    }

    /// Builds a salt from a slice; `None` unless it is exactly
    /// [`SALT_SIZE`] bytes long.
    #[must_use]
    pub fn from_slice(bytes: &[u8]) -> Option<Self> {
        <[u8; SALT_SIZE]>::try_from(bytes).ok().map(Self)
    }

    /// The salt bytes.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; SALT_SIZE] {
        &self.0
    }
}

/// Argon2id cost parameters.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KdfParams {
    /// Memory cost in KiB.
    pub memory_kib: u32,
    /// Number of passes over memory.
    pub iterations: u32,
    /// Degree of parallelism.
    pub lanes: u32,
}

impl Default for KdfParams {
    /// The OWASP password-storage baseline for Argon2id:
    /// m = 19456 KiB, t = 2, p = 1.
    fn default() -> Self {
        Self {
            memory_kib: 19_456,
            iterations: 2,
            lanes: 1,
        }
    }
}

impl KdfParams {
    /// Cheap parameters so test suites are not dominated by the KDF.
    /// Far below any secure setting; never ship these.
    #[must_use]
    pub fn fast_insecure() -> Self {
        Self {
            memory_kib: 1024,
            iterations: 1,
            lanes: 1,
        }
    }
}
