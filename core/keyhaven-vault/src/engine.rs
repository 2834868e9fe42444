//! Vault engine façade.
//!
//! Orchestrates register / login / recover / secret mutation / lock against
//! the two ports (crypto provider, blob store). The engine owns the single
//! session; all operations on one engine instance are serialized in call
//! order, and suspension only happens inside store calls and provider init.

use crate::codec::{self, InternalPayload};
use crate::error::{VaultError, VaultResult};
use crate::keyring::IdentityKeyring;
use crate::recovery::{self, RECOVERY_ENTROPY_BYTES};
use crate::session::SessionState;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use keyhaven_crypto::{CryptoError, CryptoProvider, CryptoResult, Salt, SALT_SIZE};
use keyhaven_store::{BlobStore, StoreError};
use keyhaven_types::{unix_now_ms, EnvelopeBlob, VaultId};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Engine lifecycle states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    /// Constructed, `init` not yet called.
    Uninitialized,
    /// Initialized, no identities in the store.
    Ready,
    /// Identities exist, no session.
    Locked,
    /// An authenticated session is active.
    Unlocked,
    /// Provider initialization failed; `init` may be retried.
    Error,
    /// Terminally shut down.
    Disposed,
}

/// Result of [`VaultEngine::register`].
///
/// The recovery code is returned here exactly once and never again; it is
/// not persisted anywhere in cleartext.
pub struct Registration {
    /// The new identity's identifier.
    pub id: VaultId,
    /// One-shot recovery credential; show it to the user now or lose it.
    pub recovery_code: String,
}

/// Result of [`VaultEngine::login`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginOutcome {
    /// The unlocked identity.
    pub id: VaultId,
    /// Its Ed25519 public key.
    pub public_key: [u8; 32],
}

/// Parameters for [`VaultEngine::recover`].
pub struct RecoverRequest {
    /// The recovery code handed out at registration (or last rotation).
    pub recovery_code: String,
    /// Password the envelope will be re-sealed under.
    pub new_password: String,
    /// Target identity; defaults to the first stored one.
    pub id: Option<VaultId>,
    /// When set, a fresh recovery code replaces the old one.
    pub rotate: bool,
}

/// Result of [`VaultEngine::recover`].
pub struct RecoveryOutcome {
    /// The recovered identity.
    pub id: VaultId,
    /// Replacement recovery code, present only when rotation was requested.
    pub new_recovery_code: Option<String>,
}

/// Façade over the envelope codec, identity keyring, session state, and the
/// two ports.
///
/// Recovery restores access to the *identity*; secrets added after
/// registration are not in the recovery ciphertext and are lost on
/// recovery. See the module documentation of [`crate::codec`] for why the
/// recovery wrapping stays frozen at its registration-time snapshot.
pub struct VaultEngine {
    crypto: Arc<dyn CryptoProvider>,
    store: Arc<dyn BlobStore>,
    session: SessionState,
    state: EngineState,
    has_identities: bool,
}

impl VaultEngine {
    /// Creates an engine over the given ports. Call [`init`](Self::init)
    /// before anything else.
    #[must_use]
    pub fn new(crypto: Arc<dyn CryptoProvider>, store: Arc<dyn BlobStore>) -> Self {
        Self {
            crypto,
            store,
            session: SessionState::new(),
            state: EngineState::Uninitialized,
            has_identities: false,
        }
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> EngineState {
        self.state
    }

    /// Initializes the provider and probes the store. Idempotent: calling
    /// again after success is a no-op; after a provider failure it retries.
    pub async fn init(&mut self) -> VaultResult<()> {
        match self.state {
            EngineState::Disposed => return Err(VaultError::Disposed),
            EngineState::Uninitialized | EngineState::Error => {}
            _ => return Ok(()),
        }

        if let Err(e) = self.crypto.init().await {
            self.state = EngineState::Error;
            return Err(VaultError::Initialization(e.to_string()));
        }

        let ids = self.store.list_ids().await?;
        self.has_identities = !ids.is_empty();
        self.state = if self.has_identities {
            EngineState::Locked
        } else {
            EngineState::Ready
        };
        info!(identities = ids.len(), "vault engine initialized");
        Ok(())
    }

    fn ensure_operable(&self) -> VaultResult<()> {
        match self.state {
            EngineState::Disposed => Err(VaultError::Disposed),
            EngineState::Uninitialized | EngineState::Error => Err(VaultError::Initialization(
                "engine not initialized".to_string(),
            )),
            _ => Ok(()),
        }
    }

    /// Creates a new identity protected by `password`.
    ///
    /// Persists the envelope (with both the password and the recovery
    /// wrapping of the same payload), establishes a session, and returns
    /// the identifier plus the one-shot recovery code.
    pub async fn register(&mut self, password: &str) -> VaultResult<Registration> {
        self.ensure_operable()?;

        let handle = self.crypto.new_identity()?;
        let keyring = IdentityKeyring::new(Arc::clone(&self.crypto), handle);
        let id = VaultId::from(keyring.id()?);

        let salt_bytes = self.crypto.random(SALT_SIZE)?;
        let salt = Salt::from_slice(&salt_bytes).ok_or_else(|| {
            VaultError::Crypto(CryptoError::Encryption(
                "provider returned short salt".to_string(),
            ))
        })?;
        let session_key = self.crypto.derive_key(password, &salt)?;
        let wrapped = keyring.export_wrapped(&session_key)?;

        let now = unix_now_ms();
        let payload = InternalPayload {
            id: id.clone(),
            wrapped: BASE64.encode(&wrapped),
            salt: BASE64.encode(salt.as_bytes()),
            secrets: BTreeMap::new(),
            created_at: now,
            modified_at: now,
        };
        let plaintext = codec::serialize_payload(&payload)?;

        let main_ct = self.crypto.aead_seal(&plaintext, password)?;
        let recovery_code = self.fresh_recovery_code()?;
        let recovery_ct = self.crypto.aead_seal(&plaintext, &recovery_code)?;

        let envelope = codec::make_envelope(
            id.clone(),
            payload.salt.clone(),
            BASE64.encode(&main_ct),
            Some(BASE64.encode(&recovery_ct)),
        );
        self.store.put(&id, &envelope).await?;

        self.session.establish(
            keyring,
            session_key,
            id.clone(),
            password.to_string(),
            BTreeMap::new(),
        );
        self.has_identities = true;
        self.state = EngineState::Unlocked;
        info!(id = %id, "registered new identity");
        Ok(Registration { id, recovery_code })
    }

    /// Unlocks an identity with its password.
    ///
    /// Without an explicit `id`, the first stored identity is the target.
    pub async fn login(
        &mut self,
        password: &str,
        id: Option<&VaultId>,
    ) -> VaultResult<LoginOutcome> {
        self.ensure_operable()?;
        let target = self.resolve_target(id).await?;
        let envelope = self
            .store
            .get(&target)
            .await?
            .ok_or_else(|| VaultError::AuthenticationFailed("identity not found".to_string()))?;
        codec::check_envelope_version(&envelope)?;

        let main_ct = decode_ciphertext(&envelope.main_ct, "bad password")?;
        let plaintext = open_or_auth(self.crypto.aead_open(&main_ct, password), "bad password")?;

        let payload = codec::parse_payload(&plaintext)?;
        if payload.id != target {
            warn!(id = %target, "decrypted payload does not match its store key");
            return Err(VaultError::Integrity);
        }

        let salt_bytes = BASE64
            .decode(&payload.salt)
            .map_err(|e| VaultError::CorruptData(format!("invalid salt encoding: {e}")))?;
        let salt = Salt::from_slice(&salt_bytes)
            .ok_or_else(|| VaultError::CorruptData("invalid salt length".to_string()))?;
        let session_key = self.crypto.derive_key(password, &salt)?;

        let wrapped = BASE64
            .decode(&payload.wrapped)
            .map_err(|e| VaultError::CorruptData(format!("invalid wrapped-key encoding: {e}")))?;
        let handle = open_or_auth(
            self.crypto.restore_from_wrapped(&wrapped, &session_key),
            "bad password",
        )?;
        let keyring = IdentityKeyring::new(Arc::clone(&self.crypto), handle);
        let public_key = keyring.public_key()?;

        self.session.establish(
            keyring,
            session_key,
            target.clone(),
            password.to_string(),
            payload.secrets,
        );
        self.state = EngineState::Unlocked;
        debug!(id = %target, "session established");
        Ok(LoginOutcome {
            id: target,
            public_key,
        })
    }

    /// Re-seals an identity's envelope under a new password, authorized by
    /// its recovery code.
    ///
    /// Does NOT establish a session; call [`login`](Self::login) with the
    /// new password afterwards. Secrets revert to the registration-time
    /// snapshot captured in the recovery ciphertext.
    pub async fn recover(&mut self, request: RecoverRequest) -> VaultResult<RecoveryOutcome> {
        self.ensure_operable()?;
        if !recovery::is_well_formed(&request.recovery_code) {
            return Err(VaultError::AuthenticationFailed(
                "invalid recovery code".to_string(),
            ));
        }

        let target = self.resolve_target(request.id.as_ref()).await?;
        let mut envelope = self
            .store
            .get(&target)
            .await?
            .ok_or_else(|| VaultError::AuthenticationFailed("identity not found".to_string()))?;
        codec::check_envelope_version(&envelope)?;
        let recovery_ct_b64 = envelope
            .recovery_ct
            .as_deref()
            .ok_or(VaultError::RecoveryUnavailable)?;

        let recovery_ct = decode_ciphertext(recovery_ct_b64, "invalid recovery code")?;
        let plaintext = open_or_auth(
            self.crypto.aead_open(&recovery_ct, &request.recovery_code),
            "invalid recovery code",
        )?;
        // Validate the structure before writing anything back.
        codec::parse_payload(&plaintext)?;

        let new_main_ct = self.crypto.aead_seal(&plaintext, &request.new_password)?;
        let new_recovery_code = if request.rotate {
            let code = self.fresh_recovery_code()?;
            let ct = self.crypto.aead_seal(&plaintext, &code)?;
            envelope.recovery_ct = Some(BASE64.encode(&ct));
            Some(code)
        } else {
            None
        };

        envelope.main_ct = BASE64.encode(&new_main_ct);
        envelope.updated_at = unix_now_ms();
        self.store.put(&target, &envelope).await?;

        info!(id = %target, rotated = request.rotate, "identity recovered");
        Ok(RecoveryOutcome {
            id: target,
            new_recovery_code,
        })
    }

    /// Stores a named secret. Requires an authenticated session.
    pub async fn save_secret(&mut self, key: &str, value: &str) -> VaultResult<()> {
        self.ensure_operable()?;
        let (id, envelope, payload) = self.load_active_envelope().await?;

        // Cache update precedes the store write. If the write below fails,
        // the cache is ahead of storage and reads are uncommitted until the
        // caller re-logs-in.
        self.session.set_secret(key, value)?;

        self.write_back_secrets(&id, envelope, payload).await?;
        debug!(id = %id, "secret saved");
        Ok(())
    }

    /// Removes a named secret. Requires an authenticated session.
    pub async fn delete_secret(&mut self, key: &str) -> VaultResult<()> {
        self.ensure_operable()?;
        let (id, envelope, payload) = self.load_active_envelope().await?;

        self.session.remove_secret(key)?;

        self.write_back_secrets(&id, envelope, payload).await?;
        debug!(id = %id, "secret deleted");
        Ok(())
    }

    /// Reads a secret from the session cache; storage is not touched.
    pub fn get_secret(&self, key: &str) -> VaultResult<Option<String>> {
        self.ensure_operable()?;
        self.session.secret(key)
    }

    /// Lists the secret names in the session cache.
    pub fn list_secret_keys(&self) -> VaultResult<Vec<String>> {
        self.ensure_operable()?;
        self.session.secret_keys()
    }

    /// Signs `data` with the unlocked identity's Ed25519 key.
    pub fn sign(&self, data: &[u8]) -> VaultResult<[u8; 64]> {
        self.ensure_operable()?;
        Ok(self.session.keyring()?.sign(data)?)
    }

    /// The unlocked identity's identifier.
    pub fn id(&self) -> VaultResult<VaultId> {
        self.ensure_operable()?;
        Ok(self.session.id()?.clone())
    }

    /// The unlocked identity's Ed25519 public key.
    pub fn public_key(&self) -> VaultResult<[u8; 32]> {
        self.ensure_operable()?;
        Ok(self.session.keyring()?.public_key()?)
    }

    /// Whether an authenticated session is active.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.state == EngineState::Unlocked && self.session.is_authenticated()
    }

    /// Lists every identity with a stored envelope.
    pub async fn list_stored_ids(&self) -> VaultResult<Vec<VaultId>> {
        self.ensure_operable()?;
        Ok(self.store.list_ids().await?)
    }

    /// Destroys the session and wipes its key material. Idempotent.
    pub fn lock(&mut self) {
        if self.state == EngineState::Disposed {
            return;
        }
        self.session.clear();
        if matches!(
            self.state,
            EngineState::Ready | EngineState::Locked | EngineState::Unlocked
        ) {
            self.state = if self.has_identities {
                EngineState::Locked
            } else {
                EngineState::Ready
            };
        }
    }

    /// Locks and permanently retires the engine. Every subsequent
    /// operation fails with [`VaultError::Disposed`]. Idempotent.
    pub fn dispose(&mut self) {
        self.session.clear();
        if self.state != EngineState::Disposed {
            debug!("vault engine disposed");
        }
        self.state = EngineState::Disposed;
    }

    async fn resolve_target(&self, id: Option<&VaultId>) -> VaultResult<VaultId> {
        if let Some(id) = id {
            return Ok(id.clone());
        }
        let ids = self.store.list_ids().await?;
        ids.into_iter()
            .next()
            .ok_or_else(|| VaultError::AuthenticationFailed("no identities".to_string()))
    }

    fn fresh_recovery_code(&self) -> VaultResult<String> {
        let entropy = self.crypto.random(RECOVERY_ENTROPY_BYTES)?;
        let entropy: [u8; RECOVERY_ENTROPY_BYTES] =
            entropy.as_slice().try_into().map_err(|_| {
                VaultError::Crypto(CryptoError::Encryption(
                    "provider returned short random buffer".to_string(),
                ))
            })?;
        Ok(recovery::format_recovery_code(&entropy))
    }

    /// Loads and re-opens the active session's envelope with the cached
    /// password.
    async fn load_active_envelope(
        &self,
    ) -> VaultResult<(VaultId, EnvelopeBlob, InternalPayload)> {
        let id = self.session.id()?.clone();
        let envelope = self.store.get(&id).await?.ok_or_else(|| {
            VaultError::Storage(StoreError::Backend(format!(
                "envelope missing for active session {id}"
            )))
        })?;
        codec::check_envelope_version(&envelope)?;

        let main_ct = decode_ciphertext(&envelope.main_ct, "bad password")?;
        let plaintext = open_or_auth(
            self.crypto.aead_open(&main_ct, self.session.password()?),
            "bad password",
        )?;
        let payload = codec::parse_payload(&plaintext)?;
        Ok((id, envelope, payload))
    }

    /// Re-seals the payload with the session cache's current secrets and
    /// persists it. Only `main_ct` changes; the recovery wrapping stays at
    /// its registration-time snapshot.
    async fn write_back_secrets(
        &mut self,
        id: &VaultId,
        mut envelope: EnvelopeBlob,
        mut payload: InternalPayload,
    ) -> VaultResult<()> {
        payload.secrets = self.session.all_secrets()?;
        payload.modified_at = unix_now_ms();

        let plaintext = codec::serialize_payload(&payload)?;
        let new_ct = self
            .crypto
            .aead_seal(&plaintext, self.session.password()?)?;
        envelope.main_ct = BASE64.encode(&new_ct);
        envelope.updated_at = unix_now_ms();
        self.store.put(id, &envelope).await?;
        Ok(())
    }
}

impl Drop for VaultEngine {
    fn drop(&mut self) {
        // Session teardown wipes the key, password, and secret values.
        self.session.clear();
    }
}

fn decode_ciphertext(field: &str, reason: &str) -> VaultResult<Vec<u8>> {
    // A ciphertext field that no longer decodes was tampered with; by
    // policy that is indistinguishable from wrong credentials.
    BASE64
        .decode(field)
        .map_err(|_| VaultError::AuthenticationFailed(reason.to_string()))
}

/// Maps a failed decrypt to `AuthenticationFailed`; everything else stays a
/// crypto error.
fn open_or_auth<T>(result: CryptoResult<T>, reason: &str) -> VaultResult<T> {
    result.map_err(|e| match e {
        CryptoError::DecryptFailed => VaultError::AuthenticationFailed(reason.to_string()),
        other => VaultError::Crypto(other),
    })
}
