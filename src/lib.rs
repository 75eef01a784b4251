//! Passphrase-derived encryption for stored secrets.
//!
//! [`SecretService`] is the whole contract persistence layers see:
//! `encrypt_with_identity`, `decrypt_with_identity`, `self_test`,
//! `set_passphrase`, `clear_passphrase`. The passphrase comes from a
//! [`PassphraseGate`] backed by an injected [`KeyValueStore`] and
//! [`PassphrasePrompter`]. The primitives live in `secretgate-crypto`.
//!
//! Known limitation: there is no key rotation. Changing a passphrase requires
//! the caller to decrypt and re-encrypt every stored record.

pub mod config;
pub mod error;
pub mod gate;
pub mod prompt;
pub mod service;
pub mod store;

pub use config::SecretServiceConfig;
pub use error::{ErrorKind, Result, SecretError};
pub use gate::{Passphrase, PassphraseGate};
pub use prompt::{PassphrasePrompter, PromptError};
pub use service::{SecretService, VerificationState};
pub use store::{KeyValueStore, MemoryKeyValueStore};

pub use secretgate_crypto as crypto;
