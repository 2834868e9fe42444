//! Blob store port and reference implementations for KeyHaven.
//!
//! The engine persists one [`EnvelopeBlob`] per identity through the
//! [`BlobStore`] trait. All operations may suspend; a store only promises
//! per-record atomicity and read-your-writes within a single engine
//! instance, and nothing across instances.
//!
//! Two implementations ship with the crate:
//! - [`MemoryBlobStore`] — HashMap-backed, for tests and ephemeral hosts.
//! - [`FileBlobStore`] — one JSON record per identity under a directory,
//!   written with the write-to-temp-then-rename pattern so a record is
//!   always either fully old or fully new.

mod error;
mod file;
mod memory;

pub use error::{StoreError, StoreResult};
pub use file::FileBlobStore;
pub use memory::MemoryBlobStore;

use async_trait::async_trait;
use keyhaven_types::{EnvelopeBlob, VaultId};

/// Persistence port for vault envelopes, keyed by identity.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Stores (or replaces) the envelope under `id`. Must reject an
    /// envelope whose embedded id differs from `id`.
    async fn put(&self, id: &VaultId, blob: &EnvelopeBlob) -> StoreResult<()>;

    /// Loads the envelope stored under `id`, if any.
    async fn get(&self, id: &VaultId) -> StoreResult<Option<EnvelopeBlob>>;

    /// Removes the envelope stored under `id`. Removing a missing record is
    /// not an error.
    async fn remove(&self, id: &VaultId) -> StoreResult<()>;

    /// Lists the identities with a stored envelope.
    async fn list_ids(&self) -> StoreResult<Vec<VaultId>>;

    /// Removes every stored envelope.
    async fn clear(&self) -> StoreResult<()>;
}

/// Shared `put` precondition: the envelope must carry the key it is stored
/// under.
pub(crate) fn check_envelope_id(id: &VaultId, blob: &EnvelopeBlob) -> StoreResult<()> {
    if &blob.id != id {
        return Err(StoreError::IdMismatch {
            expected: id.to_string(),
            actual: blob.id.to_string(),
        });
    }
    Ok(())
}
