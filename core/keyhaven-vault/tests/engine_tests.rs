mod common;

use common::harness;
use keyhaven_vault::{EngineState, VaultError};

// ── Initialization & state machine ───────────────────────────────

#[tokio::test]
async fn init_with_empty_store_is_ready() {
    let h = harness().await;
    assert_eq!(h.engine.state(), EngineState::Ready);
    assert!(!h.engine.is_authenticated());
}

#[tokio::test]
async fn init_is_idempotent() {
    let mut h = harness().await;
    h.engine.init().await.unwrap();
    h.engine.init().await.unwrap();
    assert_eq!(h.engine.state(), EngineState::Ready);
}

#[tokio::test]
async fn operations_before_init_fail() {
    let crypto = std::sync::Arc::new(keyhaven_crypto::SoftwareCryptoProvider::with_params(
        keyhaven_crypto::KdfParams::fast_insecure(),
    ));
    let store = std::sync::Arc::new(keyhaven_store::MemoryBlobStore::new());
    let mut engine = keyhaven_vault::VaultEngine::new(crypto, store);

    assert!(matches!(
        engine.register("pw").await,
        Err(VaultError::Initialization(_))
    ));
    assert!(matches!(
        engine.list_stored_ids().await,
        Err(VaultError::Initialization(_))
    ));
}

// ── Register ─────────────────────────────────────────────────────

#[tokio::test]
async fn register_unlocks_and_persists() {
    let mut h = harness().await;
    let registration = h.engine.register("pw1").await.unwrap();

    assert!(h.engine.is_authenticated());
    assert_eq!(h.engine.state(), EngineState::Unlocked);
    assert_eq!(h.engine.id().unwrap(), registration.id);

    let ids = h.engine.list_stored_ids().await.unwrap();
    assert_eq!(ids, vec![registration.id]);
}

#[tokio::test]
async fn register_returns_well_formed_recovery_code() {
    let mut h = harness().await;
    let registration = h.engine.register("pw1").await.unwrap();
    assert!(keyhaven_vault::recovery::is_well_formed(&registration.recovery_code));
}

#[tokio::test]
async fn register_envelope_has_both_wrappings() {
    let mut h = harness().await;
    let registration = h.engine.register("pw1").await.unwrap();

    use keyhaven_store::BlobStore;
    let envelope = h.store.get(&registration.id).await.unwrap().unwrap();
    assert_eq!(envelope.version, 1);
    assert_eq!(envelope.id, registration.id);
    assert!(envelope.recovery_ct.is_some());
    assert!(envelope.updated_at > 0);
}

// ── Login / lock ─────────────────────────────────────────────────

#[tokio::test]
async fn lock_then_login_restores_identity() {
    let mut h = harness().await;
    let registration = h.engine.register("pw1").await.unwrap();
    h.engine.lock();

    assert!(!h.engine.is_authenticated());
    assert_eq!(h.engine.state(), EngineState::Locked);
    assert!(matches!(h.engine.id(), Err(VaultError::NotAuthenticated)));

    let outcome = h.engine.login("pw1", None).await.unwrap();
    assert_eq!(outcome.id, registration.id);
    assert!(h.engine.is_authenticated());
    assert_eq!(h.engine.public_key().unwrap(), outcome.public_key);
}

#[tokio::test]
async fn wrong_password_fails_and_stays_locked() {
    let mut h = harness().await;
    h.engine.register("pw1").await.unwrap();
    h.engine.lock();

    assert!(matches!(
        h.engine.login("pw2", None).await,
        Err(VaultError::AuthenticationFailed(_))
    ));
    assert!(!h.engine.is_authenticated());
    assert_eq!(h.engine.state(), EngineState::Locked);
}

#[tokio::test]
async fn login_with_no_identities_fails() {
    let mut h = harness().await;
    assert!(matches!(
        h.engine.login("pw", None).await,
        Err(VaultError::AuthenticationFailed(_))
    ));
}

#[tokio::test]
async fn login_with_unknown_id_fails() {
    let mut h = harness().await;
    h.engine.register("pw1").await.unwrap();
    h.engine.lock();
    let unknown = keyhaven_types::VaultId::from("kh-missing");
    assert!(matches!(
        h.engine.login("pw1", Some(&unknown)).await,
        Err(VaultError::AuthenticationFailed(_))
    ));
}

#[tokio::test]
async fn lock_is_idempotent() {
    let mut h = harness().await;
    h.engine.register("pw1").await.unwrap();
    h.engine.lock();
    h.engine.lock();
    assert_eq!(h.engine.state(), EngineState::Locked);
}

#[tokio::test]
async fn lock_without_identities_returns_to_ready() {
    let mut h = harness().await;
    h.engine.lock();
    assert_eq!(h.engine.state(), EngineState::Ready);
}

#[tokio::test]
async fn login_over_active_session_replaces_it() {
    let mut h = harness().await;
    let registration = h.engine.register("pw1").await.unwrap();
    // No lock in between: establishing the new session must tear down the
    // old bundle first.
    let outcome = h.engine.login("pw1", None).await.unwrap();
    assert_eq!(outcome.id, registration.id);
    assert!(h.engine.is_authenticated());
}

// ── Secrets ──────────────────────────────────────────────────────

#[tokio::test]
async fn save_then_get_secret() {
    let mut h = harness().await;
    h.engine.register("pw1").await.unwrap();
    h.engine.save_secret("k", "v").await.unwrap();
    assert_eq!(h.engine.get_secret("k").unwrap().as_deref(), Some("v"));
}

#[tokio::test]
async fn secrets_survive_lock_and_login() {
    let mut h = harness().await;
    h.engine.register("pw1").await.unwrap();
    h.engine.save_secret("k", "v").await.unwrap();
    h.engine.lock();
    h.engine.login("pw1", None).await.unwrap();
    assert_eq!(h.engine.get_secret("k").unwrap().as_deref(), Some("v"));
}

#[tokio::test]
async fn save_secret_overwrites() {
    let mut h = harness().await;
    h.engine.register("pw1").await.unwrap();
    h.engine.save_secret("k", "v1").await.unwrap();
    h.engine.save_secret("k", "v2").await.unwrap();
    assert_eq!(h.engine.get_secret("k").unwrap().as_deref(), Some("v2"));

    h.engine.lock();
    h.engine.login("pw1", None).await.unwrap();
    assert_eq!(h.engine.get_secret("k").unwrap().as_deref(), Some("v2"));
}

#[tokio::test]
async fn delete_secret_removes_it() {
    let mut h = harness().await;
    h.engine.register("pw1").await.unwrap();
    h.engine.save_secret("k", "v").await.unwrap();
    h.engine.delete_secret("k").await.unwrap();
    assert_eq!(h.engine.get_secret("k").unwrap(), None);

    h.engine.lock();
    h.engine.login("pw1", None).await.unwrap();
    assert_eq!(h.engine.get_secret("k").unwrap(), None);
}

#[tokio::test]
async fn get_missing_secret_returns_none() {
    let mut h = harness().await;
    h.engine.register("pw1").await.unwrap();
    assert_eq!(h.engine.get_secret("absent").unwrap(), None);
}

#[tokio::test]
async fn list_secret_keys_reflects_cache() {
    let mut h = harness().await;
    h.engine.register("pw1").await.unwrap();
    assert!(h.engine.list_secret_keys().unwrap().is_empty());

    h.engine.save_secret("b", "2").await.unwrap();
    h.engine.save_secret("a", "1").await.unwrap();
    assert_eq!(h.engine.list_secret_keys().unwrap(), vec!["a", "b"]);
}

#[tokio::test]
async fn secret_ops_while_locked_fail() {
    let mut h = harness().await;
    h.engine.register("pw1").await.unwrap();
    h.engine.lock();

    assert!(matches!(
        h.engine.save_secret("k", "v").await,
        Err(VaultError::NotAuthenticated)
    ));
    assert!(matches!(
        h.engine.get_secret("k"),
        Err(VaultError::NotAuthenticated)
    ));
    assert!(matches!(
        h.engine.delete_secret("k").await,
        Err(VaultError::NotAuthenticated)
    ));
    assert!(matches!(
        h.engine.list_secret_keys(),
        Err(VaultError::NotAuthenticated)
    ));
}

// ── Signing ──────────────────────────────────────────────────────

#[tokio::test]
async fn sign_requires_session() {
    let mut h = harness().await;
    h.engine.register("pw1").await.unwrap();
    let signature = h.engine.sign(b"message").unwrap();
    assert_eq!(signature.len(), 64);

    h.engine.lock();
    assert!(matches!(
        h.engine.sign(b"message"),
        Err(VaultError::NotAuthenticated)
    ));
}

#[tokio::test]
async fn signature_stable_across_relogin() {
    let mut h = harness().await;
    h.engine.register("pw1").await.unwrap();
    let before = h.engine.sign(b"msg").unwrap();

    h.engine.lock();
    h.engine.login("pw1", None).await.unwrap();
    let after = h.engine.sign(b"msg").unwrap();

    // Ed25519 is deterministic; the restored identity is the same key.
    assert_eq!(before, after);
}

// ── Dispose ──────────────────────────────────────────────────────

#[tokio::test]
async fn dispose_is_final() {
    let mut h = harness().await;
    h.engine.register("pw").await.unwrap();
    h.engine.dispose();

    assert_eq!(h.engine.state(), EngineState::Disposed);
    assert!(!h.engine.is_authenticated());
    assert!(matches!(
        h.engine.login("pw", None).await,
        Err(VaultError::Disposed)
    ));
    assert!(matches!(h.engine.register("pw").await, Err(VaultError::Disposed)));
    assert!(matches!(h.engine.sign(b"m"), Err(VaultError::Disposed)));
    assert!(matches!(h.engine.get_secret("k"), Err(VaultError::Disposed)));
    assert!(matches!(
        h.engine.list_stored_ids().await,
        Err(VaultError::Disposed)
    ));
    assert!(matches!(h.engine.init().await, Err(VaultError::Disposed)));
}

#[tokio::test]
async fn dispose_is_idempotent() {
    let mut h = harness().await;
    h.engine.dispose();
    h.engine.dispose();
    assert_eq!(h.engine.state(), EngineState::Disposed);
}

// ── Second engine over the same store ────────────────────────────

#[tokio::test]
async fn fresh_engine_sees_persisted_identity() {
    let mut h = harness().await;
    let registration = h.engine.register("pw1").await.unwrap();
    h.engine.save_secret("k", "v").await.unwrap();
    h.engine.dispose();

    let mut engine = keyhaven_vault::VaultEngine::new(h.crypto.clone(), h.store.clone());
    engine.init().await.unwrap();
    assert_eq!(engine.state(), EngineState::Locked);

    let outcome = engine.login("pw1", None).await.unwrap();
    assert_eq!(outcome.id, registration.id);
    assert_eq!(engine.get_secret("k").unwrap().as_deref(), Some("v"));
}
