//! Client-side encrypted identity vault engine.
//!
//! KeyHaven lets an untrusted host application create a long-lived Ed25519
//! identity, protect it with a user password, persist it through a
//! pluggable blob store, and operate on stored secrets, all without
//! private key material or cleartext secrets ever leaving the core's
//! controlled memory.
//!
//! # Architecture
//!
//! [`VaultEngine`] is a façade over four pieces:
//! - the envelope payload codec ([`codec`]),
//! - the identity keyring ([`IdentityKeyring`]), sole owner of the live
//!   provider handle,
//! - the session state ([`SessionState`]), which enforces the
//!   locked/unlocked invariant and wipes key material on teardown,
//! - the two ports: `CryptoProvider` (keyhaven-crypto) and `BlobStore`
//!   (keyhaven-store).
//!
//! # Dual unlock paths
//!
//! Every envelope carries the same internal payload sealed twice: under the
//! user password (`main_ct`) and under a one-shot recovery code
//! (`recovery_ct`). Secret mutations rewrite only `main_ct`; the recovery
//! wrapping stays frozen at its registration-time snapshot, so secrets
//! added later are lost on recovery. Rewriting it on every update would
//! require keeping the recovery code in memory for the whole session,
//! which defeats its purpose.
//!
//! # Example
//!
//! ```no_run
//! use keyhaven_crypto::SoftwareCryptoProvider;
//! use keyhaven_store::MemoryBlobStore;
//! use keyhaven_vault::VaultEngine;
//! use std::sync::Arc;
//!
//! # async fn run() -> Result<(), keyhaven_vault::VaultError> {
//! let mut engine = VaultEngine::new(
//!     Arc::new(SoftwareCryptoProvider::new()),
//!     Arc::new(MemoryBlobStore::new()),
//! );
//! engine.init().await?;
//!
//! let registration = engine.register("hunter2 but better").await?;
//! // Show registration.recovery_code to the user once; it is never
//! // retrievable again.
//! engine.save_secret("api-token", "tok_123").await?;
//! engine.lock();
//! # Ok(())
//! # }
//! ```

pub mod codec;
mod engine;
mod error;
mod keyring;
pub mod recovery;
mod session;

pub use engine::{
    EngineState, LoginOutcome, RecoverRequest, RecoveryOutcome, Registration, VaultEngine,
};
pub use error::{VaultError, VaultResult};
pub use keyring::IdentityKeyring;
pub use session::SessionState;
