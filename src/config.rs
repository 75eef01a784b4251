use serde::Deserialize;

/// Default prefix for persisted passphrase keys: `secretgate_passphrase_<identity>`.
pub const DEFAULT_STORAGE_KEY_PREFIX: &str = "secretgate_passphrase_";

/// Fixed plaintext encrypted and decrypted by the self-test.
pub const DEFAULT_SELF_TEST_PROBE: &str = "secretgate-self-test";

/// Settings for [`SecretService`](crate::SecretService).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SecretServiceConfig {
    /// Prefix for the per-identity key in the persistent store.
    pub storage_key_prefix: String,
    /// When false the gate keeps passphrases in memory only and never
    /// touches the persistent store.
    pub persist_passphrase: bool,
    pub self_test_probe: String,
}

impl Default for SecretServiceConfig {
    fn default() -> Self {
        Self {
            storage_key_prefix: DEFAULT_STORAGE_KEY_PREFIX.to_string(),
            persist_passphrase: true,
            self_test_probe: DEFAULT_SELF_TEST_PROBE.to_string(),
        }
    }
}
