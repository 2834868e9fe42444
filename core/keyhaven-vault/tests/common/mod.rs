use keyhaven_crypto::{KdfParams, SoftwareCryptoProvider};
use keyhaven_store::MemoryBlobStore;
use keyhaven_vault::VaultEngine;
use std::sync::Arc;

/// Engine plus direct handles on its ports, for tests that need to inspect
/// or corrupt state behind the engine's back.
pub struct Harness {
    pub crypto: Arc<SoftwareCryptoProvider>,
    pub store: Arc<MemoryBlobStore>,
    pub engine: VaultEngine,
}

/// Builds an initialized engine over fast (insecure) KDF parameters and an
/// in-memory store.
pub async fn harness() -> Harness {
    let crypto = Arc::new(SoftwareCryptoProvider::with_params(KdfParams::fast_insecure()));
    let store = Arc::new(MemoryBlobStore::new());
    let mut engine = VaultEngine::new(crypto.clone(), store.clone());
    engine.init().await.expect("engine init");
    Harness {
        crypto,
        store,
        engine,
    }
}
