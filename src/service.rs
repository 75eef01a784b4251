//! `SecretService`: the facade persistence layers call to encrypt and decrypt
//! stored secrets (API keys, tokens, environment variables).

use std::sync::Arc;

use secretgate_crypto::{
    cipher, derive_master_key_material, derive_per_record_key, generate_iv, generate_salt, parse,
    serialize, EncryptedRecord, KeyMaterial, ParsedRecord,
};
use tracing::{debug, warn};
use zeroize::Zeroizing;

use crate::config::SecretServiceConfig;
use crate::error::{Result, SecretError};
use crate::gate::PassphraseGate;
use crate::prompt::PassphrasePrompter;
use crate::store::KeyValueStore;

/// Passphrase-correctness indicator shown by the calling UI.
///
/// From [`SecretService::verify_passphrase`] this only says whether the crypto
/// path works under the current passphrase; a round trip under one passphrase
/// cannot tell a wrong passphrase from a right one. Use
/// [`SecretService::verify_record`] with a stored record to detect a wrong one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerificationState {
    /// No passphrase could be obtained, so nothing was checked.
    Unknown,
    Verified,
    /// The round trip failed (e.g. RNG failure), or a stored record did not
    /// decrypt under the current passphrase.
    Failed,
}

/// Encrypts and decrypts secret strings under a passphrase-derived key.
///
/// Holds no key material between calls: every operation re-derives from the
/// passphrase the gate resolves.
pub struct SecretService {
    gate: PassphraseGate,
    config: SecretServiceConfig,
}

impl SecretService {
    pub fn new(store: Arc<dyn KeyValueStore>, prompter: Arc<dyn PassphrasePrompter>) -> Self {
        Self::with_config(store, prompter, SecretServiceConfig::default())
    }

    pub fn with_config(
        store: Arc<dyn KeyValueStore>,
        prompter: Arc<dyn PassphrasePrompter>,
        config: SecretServiceConfig,
    ) -> Self {
        let gate = PassphraseGate::with_config(store, prompter, &config);
        Self { gate, config }
    }

    pub fn gate(&self) -> &PassphraseGate {
        &self.gate
    }

    pub fn config(&self) -> &SecretServiceConfig {
        &self.config
    }

    async fn master_key(&self, identity: &str) -> Result<KeyMaterial> {
        let passphrase = self.gate.resolve(identity).await?;
        Ok(derive_master_key_material(identity, &passphrase)?)
    }

    /// Encrypt `value` for `identity`, returning the serialized record.
    ///
    /// A fresh salt and IV are drawn on every call, so encrypting the same value
    /// twice never yields the same record.
    pub async fn encrypt_with_identity(&self, value: &str, identity: &str) -> Result<String> {
        let master = self.master_key(identity).await?;

        let salt = generate_salt()?;
        let iv = generate_iv()?;
        let key = derive_per_record_key(&master, &salt)?;
        let ciphertext = cipher::encrypt(value, &key, &iv)?;

        Ok(serialize(&EncryptedRecord {
            ciphertext,
            iv,
            salt,
        })?)
    }

    /// Decrypt a record produced by [`encrypt_with_identity`](Self::encrypt_with_identity)
    /// or by the legacy salt-in-blob format.
    ///
    /// The record is parsed before the passphrase is resolved, so a corrupt
    /// record never triggers a prompt.
    pub async fn decrypt_with_identity(&self, raw: &str, identity: &str) -> Result<String> {
        let record = parse(raw)?;
        let master = self.master_key(identity).await?;

        let plaintext = match record {
            ParsedRecord::Current(record) => {
                let key = derive_per_record_key(&master, &record.salt)?;
                cipher::decrypt(&record.ciphertext, &key, &record.iv)?
            }
            ParsedRecord::Legacy(legacy) => {
                debug!(identity = %identity, "decrypting legacy-format record");
                let (salt, iv, ciphertext) = legacy.split();
                let key = derive_per_record_key(&master, salt)?;
                cipher::decrypt(ciphertext, &key, iv)?
            }
        };
        Ok(plaintext)
    }

    /// Round-trip the configured probe string under `identity`'s passphrase.
    ///
    /// `Ok(false)` means the round trip ran but did not reproduce the probe.
    /// Failure to obtain a passphrase is an error, not `false`.
    pub async fn self_test(&self, identity: &str) -> Result<bool> {
        let probe = self.config.self_test_probe.as_str();
        let encrypted = self.encrypt_with_identity(probe, identity).await?;
        match self.decrypt_with_identity(&encrypted, identity).await {
            Ok(decrypted) => {
                let decrypted = Zeroizing::new(decrypted);
                Ok(decrypted.as_str() == probe)
            }
            Err(SecretError::DecryptionFailed) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Map [`self_test`](Self::self_test) onto the three-state UI indicator.
    pub async fn verify_passphrase(&self, identity: &str) -> VerificationState {
        match self.self_test(identity).await {
            Ok(true) => VerificationState::Verified,
            Ok(false) => {
                warn!(identity = %identity, "passphrase self-test failed");
                VerificationState::Failed
            }
            Err(SecretError::PassphraseRequired { .. }) | Err(SecretError::InvalidInput(_)) => {
                VerificationState::Unknown
            }
            Err(e) => {
                warn!(identity = %identity, error = %e, "passphrase self-test errored");
                VerificationState::Failed
            }
        }
    }

    /// Check the current passphrase against a record already in storage.
    ///
    /// Unlike [`verify_passphrase`](Self::verify_passphrase) this detects a
    /// wrong passphrase, since the record was written under the original one.
    pub async fn verify_record(&self, identity: &str, raw: &str) -> VerificationState {
        match self.decrypt_with_identity(raw, identity).await {
            Ok(plaintext) => {
                drop(Zeroizing::new(plaintext));
                VerificationState::Verified
            }
            Err(SecretError::PassphraseRequired { .. }) | Err(SecretError::InvalidInput(_)) => {
                VerificationState::Unknown
            }
            Err(e) => {
                warn!(identity = %identity, error = %e, "stored record failed verification");
                VerificationState::Failed
            }
        }
    }

    /// Cache a passphrase obtained outside the prompt (e.g. account setup).
    pub fn set_passphrase(&self, identity: &str, passphrase: &str) -> Result<()> {
        self.gate.set(identity, passphrase)
    }

    /// Forget `identity`'s passphrase; the next operation prompts again.
    /// Call on logout and on "reset encryption key".
    pub fn clear_passphrase(&self, identity: &str) {
        self.gate.clear(identity)
    }

    /// Whether `raw` is a legacy-format record that should be re-encrypted.
    ///
    /// Callers that want to migrate lazily decrypt, then re-encrypt and store
    /// the new record when this returns true.
    pub fn needs_upgrade(raw: &str) -> bool {
        matches!(parse(raw), Ok(ParsedRecord::Legacy(_)))
    }
}
