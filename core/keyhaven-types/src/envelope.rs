//! The persisted vault envelope record.
//!
//! An envelope carries one or two independent AEAD wrappings of the same
//! internal payload: `main_ct` sealed under the user password and
//! `recovery_ct` sealed under the recovery code. Binary fields are stored
//! base64-encoded so the record survives any text-based store backend.

use crate::VaultId;
use serde::{Deserialize, Serialize};

/// Current envelope schema version.
pub const ENVELOPE_VERSION: u32 = 1;

/// The structured record persisted per identity in the blob store.
///
/// The `id` field duplicates the store key on purpose: after decryption the
/// engine checks that the payload's embedded identifier matches it, which
/// turns a swapped-record attack into an integrity error instead of a
/// silently wrong identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvelopeBlob {
    /// Schema version, currently [`ENVELOPE_VERSION`].
    pub version: u32,
    /// Same value as the store key; integrity anchor.
    pub id: VaultId,
    /// Base64 of the 16-byte KDF salt fixed at registration.
    pub salt: String,
    /// Base64 AEAD blob sealed under the user password.
    pub main_ct: String,
    /// Base64 AEAD blob sealed under the recovery code.
    /// Absence means the identity has no recovery capability.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recovery_ct: Option<String>,
    /// Unix milliseconds of the last write.
    pub updated_at: u64,
}
