//! Envelope payload codec.
//!
//! The internal payload is the plaintext the envelope's AEAD layer
//! protects: identity, wrapped private key, KDF salt, the secrets map, and
//! timestamps. It serializes to canonical UTF-8 JSON; whatever this module
//! produced, [`parse_payload`] reads back to an equal value.

use crate::error::{VaultError, VaultResult};
use keyhaven_types::{unix_now_ms, EnvelopeBlob, VaultId, ENVELOPE_VERSION};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Plaintext document protected by the envelope's AEAD wrappings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InternalPayload {
    /// Identity this payload belongs to; must match the envelope's store
    /// key after decryption.
    pub id: VaultId,
    /// Base64 of the wrapped private key.
    pub wrapped: String,
    /// Base64 of the 16-byte KDF salt.
    pub salt: String,
    /// Named cleartext secrets.
    pub secrets: BTreeMap<String, String>,
    /// Unix ms of registration. Never rewritten after creation.
    pub created_at: u64,
    /// Unix ms of the last secret mutation.
    pub modified_at: u64,
}

/// Serializes a payload to its canonical byte form.
pub fn serialize_payload(payload: &InternalPayload) -> VaultResult<Vec<u8>> {
    serde_json::to_vec(payload).map_err(|e| VaultError::CorruptData(e.to_string()))
}

/// Parses payload bytes produced by [`serialize_payload`].
///
/// Fails with `CorruptData` when the bytes are not valid JSON or a required
/// field is missing or has the wrong type.
pub fn parse_payload(bytes: &[u8]) -> VaultResult<InternalPayload> {
    serde_json::from_slice(bytes).map_err(|e| VaultError::CorruptData(e.to_string()))
}

/// Checks that a loaded envelope carries a schema version this codec
/// understands.
///
/// An unknown version means the record was written by a newer build (or
/// mangled); reading on would misinterpret its fields, so it is rejected
/// as corrupt before any decryption is attempted.
pub fn check_envelope_version(envelope: &EnvelopeBlob) -> VaultResult<()> {
    if envelope.version != ENVELOPE_VERSION {
        return Err(VaultError::CorruptData(format!(
            "unsupported envelope version {}",
            envelope.version
        )));
    }
    Ok(())
}

/// Builds a version-1 envelope around already-sealed ciphertexts.
#[must_use]
pub fn make_envelope(
    id: VaultId,
    salt_b64: String,
    main_ct_b64: String,
    recovery_ct_b64: Option<String>,
) -> EnvelopeBlob {
    EnvelopeBlob {
        version: ENVELOPE_VERSION,
        id,
        salt: salt_b64,
        main_ct: main_ct_b64,
        recovery_ct: recovery_ct_b64,
        updated_at: unix_now_ms(),
    }
}
