//! Owner of the active identity handle.
//!
//! The keyring is the single owner of one provider handle. It forwards the
//! identity operations the engine needs and guarantees the handle is
//! released (and the provider wipes the key material) on drop, whichever
//! way the session ends.

use keyhaven_crypto::{CryptoProvider, CryptoResult, IdentityHandle, SessionKey};
use std::sync::Arc;

/// Exclusive owner of a live identity inside the crypto provider.
pub struct IdentityKeyring {
    provider: Arc<dyn CryptoProvider>,
    handle: IdentityHandle,
}

impl IdentityKeyring {
    /// Takes ownership of `handle`. The keyring will drop it on teardown.
    #[must_use]
    pub fn new(provider: Arc<dyn CryptoProvider>, handle: IdentityHandle) -> Self {
        Self { provider, handle }
    }

    /// The identity's stable identifier.
    pub fn id(&self) -> CryptoResult<String> {
        self.provider.identity_id(self.handle)
    }

    /// The identity's 32-byte public key.
    pub fn public_key(&self) -> CryptoResult<[u8; 32]> {
        self.provider.identity_public_key(self.handle)
    }

    /// Signs `data` with the identity's Ed25519 key.
    pub fn sign(&self, data: &[u8]) -> CryptoResult<[u8; 64]> {
        self.provider.sign(self.handle, data)
    }

    /// Exports the private key wrapped under `key`.
    pub fn export_wrapped(&self, key: &SessionKey) -> CryptoResult<Vec<u8>> {
        self.provider.export_wrapped(self.handle, key)
    }
}

impl Drop for IdentityKeyring {
    fn drop(&mut self) {
        // The provider tolerates double drops, so this is safe even when a
        // caller already released the handle through other means.
        self.provider.drop_identity(self.handle);
    }
}
