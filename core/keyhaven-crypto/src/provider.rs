//! Abstract crypto provider port.
//!
//! The engine depends on `Arc<dyn CryptoProvider>` and never sees raw key
//! material: identities live in provider-owned memory behind opaque handles.
//! Concrete providers decide where that memory is (a software table, an
//! isolated module, a hardware element) as long as private key bytes never
//! reach the caller's heap.

use crate::error::CryptoResult;
use crate::key::{Salt, SessionKey};
use async_trait::async_trait;

/// Opaque handle to an identity living in provider-owned memory.
///
/// Handles are only meaningful to the provider that issued them. Dropping
/// the handle value does NOT release the identity; call
/// [`CryptoProvider::drop_identity`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IdentityHandle(u64);

impl IdentityHandle {
    /// Builds a handle from its raw token. Provider implementations only.
    #[must_use]
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// Returns the raw token.
    #[must_use]
    pub const fn as_raw(&self) -> u64 {
        self.0
    }
}

/// Capability set required from a crypto provider.
///
/// All primitives are synchronous; only `init` may suspend (a provider may
/// need to load or probe its environment).
#[async_trait]
pub trait CryptoProvider: Send + Sync {
    /// Prepares the provider. Fails with `UnsupportedEnvironment` when the
    /// required primitives are unavailable.
    async fn init(&self) -> CryptoResult<()>;

    /// Returns `n` bytes from a CSPRNG.
    fn random(&self, n: usize) -> CryptoResult<Vec<u8>>;

    /// Derives a 32-byte session key from password + salt via Argon2id.
    /// Deterministic for a given provider build.
    fn derive_key(&self, password: &str, salt: &Salt) -> CryptoResult<SessionKey>;

    /// Seals plaintext under a password into a self-describing blob
    /// `[magic(13) || kdf_salt(16) || nonce(24) || ciphertext+tag]`.
    /// The internal salt and nonce are fresh per call.
    fn aead_seal(&self, plaintext: &[u8], password: &str) -> CryptoResult<Vec<u8>>;

    /// Inverse of [`aead_seal`](Self::aead_seal). `DecryptFailed` does not
    /// distinguish a wrong password from a tampered blob.
    fn aead_open(&self, blob: &[u8], password: &str) -> CryptoResult<Vec<u8>>;

    /// Generates a fresh Ed25519 identity in provider-owned memory.
    fn new_identity(&self) -> CryptoResult<IdentityHandle>;

    /// Returns the identity's stable identifier (a deterministic function of
    /// the public key).
    fn identity_id(&self, handle: IdentityHandle) -> CryptoResult<String>;

    /// Returns the identity's 32-byte public key.
    fn identity_public_key(&self, handle: IdentityHandle) -> CryptoResult<[u8; 32]>;

    /// Exports the private key wrapped under the session key:
    /// `[nonce(12) || ciphertext || tag(16)]`, ChaCha20-Poly1305.
    fn export_wrapped(&self, handle: IdentityHandle, key: &SessionKey) -> CryptoResult<Vec<u8>>;

    /// Restores an identity from a wrapped export. `DecryptFailed` when the
    /// session key does not match.
    fn restore_from_wrapped(
        &self,
        wrapped: &[u8],
        key: &SessionKey,
    ) -> CryptoResult<IdentityHandle>;

    /// Signs `data` with the identity's Ed25519 key.
    fn sign(&self, handle: IdentityHandle, data: &[u8]) -> CryptoResult<[u8; 64]>;

    /// Releases and wipes the identity. Tolerant of unknown handles, so a
    /// double drop is a no-op.
    fn drop_identity(&self, handle: IdentityHandle);
}
