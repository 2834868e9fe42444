mod common;

use common::harness;
use keyhaven_store::BlobStore;
use keyhaven_vault::{RecoverRequest, VaultError};

fn request(code: &str, new_password: &str, rotate: bool) -> RecoverRequest {
    RecoverRequest {
        recovery_code: code.to_string(),
        new_password: new_password.to_string(),
        id: None,
        rotate,
    }
}

// ── Recovery without rotation ────────────────────────────────────

#[tokio::test]
async fn recover_reseals_under_new_password() {
    let mut h = harness().await;
    let registration = h.engine.register("pw1").await.unwrap();
    h.engine.lock();

    let outcome = h
        .engine
        .recover(request(&registration.recovery_code, "pw2", false))
        .await
        .unwrap();
    assert_eq!(outcome.id, registration.id);
    assert!(outcome.new_recovery_code.is_none());

    // Recovery does not establish a session.
    assert!(!h.engine.is_authenticated());

    // Old password is dead, new one works.
    assert!(matches!(
        h.engine.login("pw1", None).await,
        Err(VaultError::AuthenticationFailed(_))
    ));
    let login = h.engine.login("pw2", None).await.unwrap();
    assert_eq!(login.id, registration.id);
}

#[tokio::test]
async fn recover_with_wrong_code_fails() {
    let mut h = harness().await;
    h.engine.register("pw1").await.unwrap();
    h.engine.lock();

    let wrong = "RK-00000000-11111111-22222222-33333333";
    assert!(matches!(
        h.engine.recover(request(wrong, "pw2", false)).await,
        Err(VaultError::AuthenticationFailed(_))
    ));
    // Old password still works; nothing was rewritten.
    h.engine.login("pw1", None).await.unwrap();
}

#[tokio::test]
async fn recover_with_malformed_code_fails() {
    let mut h = harness().await;
    h.engine.register("pw1").await.unwrap();
    h.engine.lock();

    assert!(matches!(
        h.engine.recover(request("not-a-code", "pw2", false)).await,
        Err(VaultError::AuthenticationFailed(_))
    ));
}

#[tokio::test]
async fn same_code_works_twice_without_rotation() {
    let mut h = harness().await;
    let registration = h.engine.register("pw1").await.unwrap();
    h.engine.lock();

    h.engine
        .recover(request(&registration.recovery_code, "pw2", false))
        .await
        .unwrap();
    h.engine
        .recover(request(&registration.recovery_code, "pw3", false))
        .await
        .unwrap();
    h.engine.login("pw3", None).await.unwrap();
}

// ── Recovery with rotation ───────────────────────────────────────

#[tokio::test]
async fn rotation_invalidates_old_code() {
    let mut h = harness().await;
    let registration = h.engine.register("pw1").await.unwrap();
    h.engine.lock();

    let outcome = h
        .engine
        .recover(request(&registration.recovery_code, "pw2", true))
        .await
        .unwrap();
    let new_code = outcome.new_recovery_code.expect("rotated code");
    assert!(keyhaven_vault::recovery::is_well_formed(&new_code));
    assert_ne!(new_code, registration.recovery_code);

    // The old code no longer opens the envelope.
    assert!(matches!(
        h.engine
            .recover(request(&registration.recovery_code, "pw3", false))
            .await,
        Err(VaultError::AuthenticationFailed(_))
    ));

    // The new one does.
    h.engine.recover(request(&new_code, "pw3", false)).await.unwrap();
    h.engine.login("pw3", None).await.unwrap();
}

// ── Boundary behaviors ───────────────────────────────────────────

#[tokio::test]
async fn recover_without_recovery_ct_is_unavailable() {
    let mut h = harness().await;
    let registration = h.engine.register("pw1").await.unwrap();
    h.engine.lock();

    // Strip the recovery wrapping behind the engine's back.
    let mut envelope = h.store.get(&registration.id).await.unwrap().unwrap();
    envelope.recovery_ct = None;
    h.store.put(&registration.id, &envelope).await.unwrap();

    assert!(matches!(
        h.engine
            .recover(request(&registration.recovery_code, "pw2", false))
            .await,
        Err(VaultError::RecoveryUnavailable)
    ));
}

#[tokio::test]
async fn recover_with_no_identities_fails() {
    let mut h = harness().await;
    assert!(matches!(
        h.engine
            .recover(request("RK-00000000-11111111-22222222-33333333", "pw", false))
            .await,
        Err(VaultError::AuthenticationFailed(_))
    ));
}

// ── Snapshot semantics ───────────────────────────────────────────

#[tokio::test]
async fn secrets_added_after_registration_are_lost_on_recovery() {
    let mut h = harness().await;
    let registration = h.engine.register("pw1").await.unwrap();
    h.engine.save_secret("post-reg", "value").await.unwrap();
    h.engine.lock();

    // The recovery wrapping is a registration-time snapshot: it predates
    // the secret, so the recovered envelope does too.
    h.engine
        .recover(request(&registration.recovery_code, "pw2", false))
        .await
        .unwrap();
    h.engine.login("pw2", None).await.unwrap();
    assert_eq!(h.engine.get_secret("post-reg").unwrap(), None);
}

#[tokio::test]
async fn secret_updates_do_not_touch_recovery_ct() {
    let mut h = harness().await;
    let registration = h.engine.register("pw1").await.unwrap();
    let before = h.store.get(&registration.id).await.unwrap().unwrap();

    h.engine.save_secret("k", "v").await.unwrap();
    let after = h.store.get(&registration.id).await.unwrap().unwrap();

    assert_ne!(before.main_ct, after.main_ct);
    assert_eq!(before.recovery_ct, after.recovery_ct);
}
