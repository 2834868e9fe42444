//! Core type definitions for the KeyHaven identity vault.
//!
//! This crate defines the fundamental types shared between the vault engine
//! and its persistence layer:
//! - Vault identifiers (opaque, provider-assigned primary keys)
//! - The persisted envelope record
//! - Wall-clock helpers (Unix milliseconds)
//!
//! Cryptographic types (keys, salts, handles) belong to `keyhaven-crypto`;
//! engine-internal types (payload, session) belong to `keyhaven-vault`.

mod clock;
mod envelope;
mod ids;

pub use clock::unix_now_ms;
pub use envelope::{EnvelopeBlob, ENVELOPE_VERSION};
pub use ids::VaultId;
