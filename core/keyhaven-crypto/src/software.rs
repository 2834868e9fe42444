//! Software crypto provider.
//!
//! Implements the [`CryptoProvider`] port with in-process primitives:
//! Argon2id for key derivation, XChaCha20-Poly1305 for password sealing,
//! ChaCha20-Poly1305 for private-key wrapping, Ed25519 for signatures.
//!
//! Private keys live in a provider-owned table keyed by opaque handles and
//! are zeroized when dropped. Callers interact with identities exclusively
//! through handle-based operations.

use crate::error::{CryptoError, CryptoResult};
use crate::key::{KdfParams, Salt, SessionKey, KEY_SIZE, SALT_SIZE};
use crate::provider::{CryptoProvider, IdentityHandle};
use argon2::{Argon2, Params, Version};
use async_trait::async_trait;
use chacha20poly1305::{
    aead::{Aead, KeyInit},
    ChaCha20Poly1305, Nonce, XChaCha20Poly1305, XNonce,
};
use ed25519_dalek::{Signer as _, SigningKey};
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};
use zeroize::Zeroize;

/// Leading magic of every sealed blob (13 bytes).
pub const SEAL_MAGIC: &[u8; 13] = b"KEYHAVEN.SEAL";

/// Size of the XChaCha20-Poly1305 nonce in a sealed blob.
pub const SEAL_NONCE_SIZE: usize = 24;

/// Size of the ChaCha20-Poly1305 nonce in a wrapped private key.
pub const WRAP_NONCE_SIZE: usize = 12;

/// Size of the Poly1305 authentication tag.
pub const TAG_SIZE: usize = 16;

const SEAL_HEADER_SIZE: usize = SEAL_MAGIC.len() + SALT_SIZE + SEAL_NONCE_SIZE;

/// In-process [`CryptoProvider`] backed by the OS CSPRNG.
pub struct SoftwareCryptoProvider {
    params: KdfParams,
    identities: Mutex<HashMap<u64, SigningKey>>,
    next_handle: AtomicU64,
}

impl SoftwareCryptoProvider {
    /// Creates a provider with the default (OWASP) Argon2id parameters.
    #[must_use]
    pub fn new() -> Self {
        Self::with_params(KdfParams::default())
    }

    /// Creates a provider with explicit Argon2id parameters.
    #[must_use]
    pub fn with_params(params: KdfParams) -> Self {
        Self {
            params,
            identities: Mutex::new(HashMap::new()),
            next_handle: AtomicU64::new(1),
        }
    }

    fn table(&self) -> CryptoResult<MutexGuard<'_, HashMap<u64, SigningKey>>> {
        self.identities
            .lock()
            .map_err(|_| CryptoError::UnsupportedEnvironment("identity table poisoned".into()))
    }

    fn derive_raw(&self, password: &str, salt: &[u8]) -> CryptoResult<[u8; KEY_SIZE]> {
        let params = Params::new(
            self.params.memory_kib,
            self.params.iterations,
            self.params.lanes,
            Some(KEY_SIZE),
        )
        .map_err(|e| CryptoError::KeyDerivation(e.to_string()))?;

        let argon2 = Argon2::new(argon2::Algorithm::Argon2id, Version::V0x13, params);

        let mut key = [0u8; KEY_SIZE];
        argon2
            .hash_password_into(password.as_bytes(), salt, &mut key)
            .map_err(|e| CryptoError::KeyDerivation(e.to_string()))?;
        Ok(key)
    }

    fn insert_identity(&self, signing_key: SigningKey) -> CryptoResult<IdentityHandle> {
        let raw = self.next_handle.fetch_add(1, Ordering::Relaxed);
        self.table()?.insert(raw, signing_key);
        Ok(IdentityHandle::from_raw(raw))
    }

    fn with_identity<T>(
        &self,
        handle: IdentityHandle,
        f: impl FnOnce(&SigningKey) -> T,
    ) -> CryptoResult<T> {
        let table = self.table()?;
        let key = table.get(&handle.as_raw()).ok_or(CryptoError::InvalidHandle)?;
        Ok(f(key))
    }
}

impl Default for SoftwareCryptoProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CryptoProvider for SoftwareCryptoProvider {
    async fn init(&self) -> CryptoResult<()> {
        // Probe the CSPRNG once; everything else is pure computation.
        let mut probe = [0u8; 1];
        OsRng
            .try_fill_bytes(&mut probe)
            .map_err(|e| CryptoError::UnsupportedEnvironment(format!("no CSPRNG: {e}")))?;
        Ok(())
    }

    fn random(&self, n: usize) -> CryptoResult<Vec<u8>> {
        let mut bytes = vec![0u8; n];
        OsRng
            .try_fill_bytes(&mut bytes)
            .map_err(|e| CryptoError::UnsupportedEnvironment(format!("no CSPRNG: {e}")))?;
        Ok(bytes)
    }

    fn derive_key(&self, password: &str, salt: &Salt) -> CryptoResult<SessionKey> {
        let key = self.derive_raw(password, salt.as_bytes())?;
        Ok(SessionKey::from_bytes(key))
    }

    fn aead_seal(&self, plaintext: &[u8], password: &str) -> CryptoResult<Vec<u8>> {
        let mut salt = [0u8; SALT_SIZE];
        OsRng
            .try_fill_bytes(&mut salt)
            .map_err(|e| CryptoError::UnsupportedEnvironment(format!("no CSPRNG: {e}")))?;
        let mut nonce_bytes = [0u8; SEAL_NONCE_SIZE];
        OsRng
            .try_fill_bytes(&mut nonce_bytes)
            .map_err(|e| CryptoError::UnsupportedEnvironment(format!("no CSPRNG: {e}")))?;

        let mut key = self.derive_raw(password, &salt)?;
        let cipher = XChaCha20Poly1305::new((&key).into());
        let ciphertext = cipher
            .encrypt(XNonce::from_slice(&nonce_bytes), plaintext)
            .map_err(|e| CryptoError::Encryption(e.to_string()));
        key.zeroize();
        let ciphertext = ciphertext?;

        let mut blob = Vec::with_capacity(SEAL_HEADER_SIZE + ciphertext.len());
        blob.extend_from_slice(SEAL_MAGIC);
        blob.extend_from_slice(&salt);
        blob.extend_from_slice(&nonce_bytes);
        blob.extend_from_slice(&ciphertext);
        Ok(blob)
    }

    fn aead_open(&self, blob: &[u8], password: &str) -> CryptoResult<Vec<u8>> {
        // Any shape violation is treated exactly like a failed tag check.
        if blob.len() < SEAL_HEADER_SIZE + TAG_SIZE || &blob[..SEAL_MAGIC.len()] != SEAL_MAGIC {
            return Err(CryptoError::DecryptFailed);
        }
        let salt = &blob[SEAL_MAGIC.len()..SEAL_MAGIC.len() + SALT_SIZE];
        let nonce = &blob[SEAL_MAGIC.len() + SALT_SIZE..SEAL_HEADER_SIZE];
        let ciphertext = &blob[SEAL_HEADER_SIZE..];

        let mut key = self.derive_raw(password, salt)?;
        let cipher = XChaCha20Poly1305::new((&key).into());
        let plaintext = cipher
            .decrypt(XNonce::from_slice(nonce), ciphertext)
            .map_err(|_| CryptoError::DecryptFailed);
        key.zeroize();
        plaintext
    }

    fn new_identity(&self) -> CryptoResult<IdentityHandle> {
        let signing_key = SigningKey::generate(&mut OsRng);
        self.insert_identity(signing_key)
    }

    fn identity_id(&self, handle: IdentityHandle) -> CryptoResult<String> {
        self.with_identity(handle, |key| {
            let digest = Sha256::digest(key.verifying_key().as_bytes());
            let hex: String = digest.iter().map(|b| format!("{b:02x}")).collect();
            format!("kh-{hex}")
        })
    }

    fn identity_public_key(&self, handle: IdentityHandle) -> CryptoResult<[u8; 32]> {
        self.with_identity(handle, |key| key.verifying_key().to_bytes())
    }

    fn export_wrapped(&self, handle: IdentityHandle, key: &SessionKey) -> CryptoResult<Vec<u8>> {
        let mut secret = self.with_identity(handle, |k| k.to_bytes())?;

        let mut nonce_bytes = [0u8; WRAP_NONCE_SIZE];
        let rng = OsRng
            .try_fill_bytes(&mut nonce_bytes)
            .map_err(|e| CryptoError::UnsupportedEnvironment(format!("no CSPRNG: {e}")));
        if let Err(e) = rng {
            secret.zeroize();
            return Err(e);
        }

        let cipher = ChaCha20Poly1305::new(key.as_bytes().into());
        let ciphertext = cipher
            .encrypt(Nonce::from_slice(&nonce_bytes), secret.as_ref())
            .map_err(|e| CryptoError::Encryption(e.to_string()));
        secret.zeroize();
        let ciphertext = ciphertext?;

        let mut wrapped = Vec::with_capacity(WRAP_NONCE_SIZE + ciphertext.len());
        wrapped.extend_from_slice(&nonce_bytes);
        wrapped.extend_from_slice(&ciphertext);
        Ok(wrapped)
    }

    fn restore_from_wrapped(
        &self,
        wrapped: &[u8],
        key: &SessionKey,
    ) -> CryptoResult<IdentityHandle> {
        if wrapped.len() < WRAP_NONCE_SIZE + TAG_SIZE {
            return Err(CryptoError::DecryptFailed);
        }
        let nonce = &wrapped[..WRAP_NONCE_SIZE];
        let ciphertext = &wrapped[WRAP_NONCE_SIZE..];

        let cipher = ChaCha20Poly1305::new(key.as_bytes().into());
        let mut secret = cipher
            .decrypt(Nonce::from_slice(nonce), ciphertext)
            .map_err(|_| CryptoError::DecryptFailed)?;

        let mut arr: [u8; 32] = match secret.as_slice().try_into() {
            Ok(arr) => arr,
            Err(_) => {
                secret.zeroize();
                return Err(CryptoError::DecryptFailed);
            }
        };
        secret.zeroize();

        let signing_key = SigningKey::from_bytes(&arr);
        arr.zeroize();
        self.insert_identity(signing_key)
    }

    fn sign(&self, handle: IdentityHandle, data: &[u8]) -> CryptoResult<[u8; 64]> {
        self.with_identity(handle, |key| key.sign(data).to_bytes())
    }

    fn drop_identity(&self, handle: IdentityHandle) {
        // SigningKey zeroizes its secret on drop. A missing entry (double
        // drop) is fine, as is a poisoned table during teardown.
        if let Ok(mut table) = self.identities.lock() {
            table.remove(&handle.as_raw());
        }
    }
}
