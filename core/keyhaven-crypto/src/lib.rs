//! Crypto provider port and software implementation for KeyHaven.
//!
//! The vault engine talks to cryptography exclusively through the
//! [`CryptoProvider`] trait: key derivation (Argon2id), password sealing
//! (XChaCha20-Poly1305), private-key wrapping (ChaCha20-Poly1305), and
//! Ed25519 identities behind opaque handles.
//!
//! [`SoftwareCryptoProvider`] is the in-process implementation. Hosts with
//! stronger isolation (hardware elements, sandboxed modules) supply their
//! own provider; the engine cannot tell the difference.

mod error;
mod key;
mod provider;
mod software;

pub use error::{CryptoError, CryptoResult};
pub use key::{KdfParams, Salt, SessionKey, KEY_SIZE, SALT_SIZE};
pub use provider::{CryptoProvider, IdentityHandle};
pub use software::{
    SoftwareCryptoProvider, SEAL_MAGIC, SEAL_NONCE_SIZE, TAG_SIZE, WRAP_NONCE_SIZE,
};
