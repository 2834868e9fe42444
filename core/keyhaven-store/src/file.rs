//! File-backed blob store.
//!
//! Each envelope is a JSON file under the store directory, named by the
//! SHA-256 of its identity so arbitrary id strings are filesystem-safe.
//! Writes go to a `.tmp` sibling and are renamed into place; a record on
//! disk is therefore always either the complete old content or the
//! complete new content, never a partial write.

use crate::{check_envelope_id, BlobStore, StoreError, StoreResult};
use async_trait::async_trait;
use keyhaven_types::{EnvelopeBlob, VaultId};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use tracing::warn;

const RECORD_EXT: &str = "json";

/// Directory-of-JSON-records [`BlobStore`].
pub struct FileBlobStore {
    root: PathBuf,
}

impl FileBlobStore {
    /// Opens a store rooted at `dir`, creating the directory if needed.
    pub async fn open(dir: impl Into<PathBuf>) -> StoreResult<Self> {
        let root = dir.into();
        tokio::fs::create_dir_all(&root)
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))?;
        Ok(Self { root })
    }

    /// Returns the store's root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn record_path(&self, id: &VaultId) -> PathBuf {
        let digest = Sha256::digest(id.as_str().as_bytes());
        let name: String = digest.iter().map(|b| format!("{b:02x}")).collect();
        self.root.join(format!("{name}.{RECORD_EXT}"))
    }
}

#[async_trait]
impl BlobStore for FileBlobStore {
    async fn put(&self, id: &VaultId, blob: &EnvelopeBlob) -> StoreResult<()> {
        check_envelope_id(id, blob)?;
        let bytes = serde_json::to_vec(blob).map_err(|e| StoreError::Backend(e.to_string()))?;

        let path = self.record_path(id);
        let tmp = path.with_extension("tmp");
        tokio::fs::write(&tmp, &bytes)
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))?;
        tokio::fs::rename(&tmp, &path)
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))?;
        Ok(())
    }

    async fn get(&self, id: &VaultId) -> StoreResult<Option<EnvelopeBlob>> {
        let path = self.record_path(id);
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(StoreError::Backend(e.to_string())),
        };
        let blob: EnvelopeBlob =
            serde_json::from_slice(&bytes).map_err(|e| StoreError::Corrupt(e.to_string()))?;
        Ok(Some(blob))
    }

    async fn remove(&self, id: &VaultId) -> StoreResult<()> {
        let path = self.record_path(id);
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StoreError::Backend(e.to_string())),
        }
    }

    async fn list_ids(&self) -> StoreResult<Vec<VaultId>> {
        let mut entries = tokio::fs::read_dir(&self.root)
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))?;

        let mut ids = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))?
        {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some(RECORD_EXT) {
                continue;
            }
            // The filename is a digest; the id lives inside the record.
            match tokio::fs::read(&path).await {
                Ok(bytes) => match serde_json::from_slice::<EnvelopeBlob>(&bytes) {
                    Ok(blob) => ids.push(blob.id),
                    Err(e) => {
                        warn!(path = %path.display(), error = %e, "skipping unreadable record");
                    }
                },
                Err(e) => return Err(StoreError::Backend(e.to_string())),
            }
        }
        ids.sort();
        Ok(ids)
    }

    async fn clear(&self) -> StoreResult<()> {
        let mut entries = tokio::fs::read_dir(&self.root)
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))?;
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))?
        {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) == Some(RECORD_EXT) {
                tokio::fs::remove_file(&path)
                    .await
                    .map_err(|e| StoreError::Backend(e.to_string()))?;
            }
        }
        Ok(())
    }
}
