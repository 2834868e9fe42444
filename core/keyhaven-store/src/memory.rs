//! In-memory blob store.

use crate::{check_envelope_id, BlobStore, StoreError, StoreResult};
use async_trait::async_trait;
use keyhaven_types::{EnvelopeBlob, VaultId};
use std::collections::HashMap;
use std::sync::RwLock;

/// HashMap-backed [`BlobStore`] for tests and ephemeral hosts.
///
/// Nothing survives the process; hosts that need persistence use
/// [`FileBlobStore`](crate::FileBlobStore) or their own implementation.
#[derive(Default)]
pub struct MemoryBlobStore {
    blobs: RwLock<HashMap<VaultId, EnvelopeBlob>>,
}

impl MemoryBlobStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored envelopes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.blobs.read().map(|b| b.len()).unwrap_or(0)
    }

    /// Returns `true` if no envelopes are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn put(&self, id: &VaultId, blob: &EnvelopeBlob) -> StoreResult<()> {
        check_envelope_id(id, blob)?;
        let mut blobs = self
            .blobs
            .write()
            .map_err(|e| StoreError::Backend(e.to_string()))?;
        blobs.insert(id.clone(), blob.clone());
        Ok(())
    }

    async fn get(&self, id: &VaultId) -> StoreResult<Option<EnvelopeBlob>> {
        let blobs = self
            .blobs
            .read()
            .map_err(|e| StoreError::Backend(e.to_string()))?;
        Ok(blobs.get(id).cloned())
    }

    async fn remove(&self, id: &VaultId) -> StoreResult<()> {
        let mut blobs = self
            .blobs
            .write()
            .map_err(|e| StoreError::Backend(e.to_string()))?;
        blobs.remove(id);
        Ok(())
    }

    async fn list_ids(&self) -> StoreResult<Vec<VaultId>> {
        let blobs = self
            .blobs
            .read()
            .map_err(|e| StoreError::Backend(e.to_string()))?;
        let mut ids: Vec<VaultId> = blobs.keys().cloned().collect();
        ids.sort();
        Ok(ids)
    }

    async fn clear(&self) -> StoreResult<()> {
        let mut blobs = self
            .blobs
            .write()
            .map_err(|e| StoreError::Backend(e.to_string()))?;
        blobs.clear();
        Ok(())
    }
}
