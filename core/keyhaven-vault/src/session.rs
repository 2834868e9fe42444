//! In-memory authenticated session state.
//!
//! A session bundles the unlocked identity (keyring), the password-derived
//! session key, the cached password, and the decrypted secrets map. At most
//! one session exists per engine; establishing a new one destroys the prior
//! bundle first. Teardown wipes the key, the cached password, and every
//! secret value before the memory goes back to the allocator: the session
//! key via `ZeroizeOnDrop`, the strings explicitly in `Drop`.

use crate::error::{VaultError, VaultResult};
use crate::keyring::IdentityKeyring;
use keyhaven_crypto::SessionKey;
use keyhaven_types::VaultId;
use std::collections::BTreeMap;
use zeroize::Zeroize;

struct ActiveSession {
    keyring: IdentityKeyring,
    session_key: SessionKey,
    id: VaultId,
    password: String,
    secrets: BTreeMap<String, String>,
}

impl Drop for ActiveSession {
    fn drop(&mut self) {
        self.password.zeroize();
        for value in self.secrets.values_mut() {
            value.zeroize();
        }
        self.secrets.clear();
        // session_key zeroizes itself; keyring drops the provider handle.
    }
}

/// Holder of the engine's single authenticated session.
#[derive(Default)]
pub struct SessionState {
    inner: Option<ActiveSession>,
}

impl SessionState {
    /// Creates an empty (locked) session state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Installs a new session, destroying any prior one first.
    ///
    /// The secrets map is owned by the session from here on; callers keep
    /// no handle through which they could mutate it.
    pub fn establish(
        &mut self,
        keyring: IdentityKeyring,
        session_key: SessionKey,
        id: VaultId,
        password: String,
        secrets: BTreeMap<String, String>,
    ) {
        self.clear();
        self.inner = Some(ActiveSession {
            keyring,
            session_key,
            id,
            password,
            secrets,
        });
    }

    /// Destroys the session, wiping key material. Idempotent.
    pub fn clear(&mut self) {
        self.inner = None;
    }

    /// Whether an authenticated session exists.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.inner.is_some()
    }

    fn active(&self) -> VaultResult<&ActiveSession> {
        self.inner.as_ref().ok_or(VaultError::NotAuthenticated)
    }

    fn active_mut(&mut self) -> VaultResult<&mut ActiveSession> {
        self.inner.as_mut().ok_or(VaultError::NotAuthenticated)
    }

    /// The active identity's identifier.
    pub fn id(&self) -> VaultResult<&VaultId> {
        Ok(&self.active()?.id)
    }

    /// The active identity's keyring.
    pub fn keyring(&self) -> VaultResult<&IdentityKeyring> {
        Ok(&self.active()?.keyring)
    }

    /// The session key derived at unlock.
    pub fn session_key(&self) -> VaultResult<&SessionKey> {
        Ok(&self.active()?.session_key)
    }

    /// The cached password used to re-seal the envelope on writes.
    pub fn password(&self) -> VaultResult<&str> {
        Ok(&self.active()?.password)
    }

    /// Reads one secret from the decrypted cache.
    pub fn secret(&self, key: &str) -> VaultResult<Option<String>> {
        Ok(self.active()?.secrets.get(key).cloned())
    }

    /// Writes one secret into the decrypted cache.
    pub fn set_secret(&mut self, key: &str, value: &str) -> VaultResult<()> {
        self.active_mut()?
            .secrets
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    /// Removes one secret from the decrypted cache, wiping its value.
    pub fn remove_secret(&mut self, key: &str) -> VaultResult<()> {
        if let Some(mut value) = self.active_mut()?.secrets.remove(key) {
            value.zeroize();
        }
        Ok(())
    }

    /// Returns a copy of the whole secrets map.
    pub fn all_secrets(&self) -> VaultResult<BTreeMap<String, String>> {
        Ok(self.active()?.secrets.clone())
    }

    /// Returns the secret names.
    pub fn secret_keys(&self) -> VaultResult<Vec<String>> {
        Ok(self.active()?.secrets.keys().cloned().collect())
    }
}
