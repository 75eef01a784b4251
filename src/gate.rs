//! Passphrase resolution and the per-identity passphrase cache.
//!
//! Resolve order: in-memory cache → persistent store → prompt. Concurrent
//! resolves for one identity share a single outstanding prompt: the first
//! caller (the leader) runs it and publishes the outcome on a `watch` channel
//! that every later caller subscribes to until it settles.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::watch;
use tracing::{debug, warn};
use zeroize::Zeroizing;

use crate::config::SecretServiceConfig;
use crate::error::{Result, SecretError};
use crate::prompt::PassphrasePrompter;
use crate::store::KeyValueStore;

/// A passphrase handed out by the gate. Wiped when dropped.
pub type Passphrase = Zeroizing<String>;

#[derive(Clone)]
enum PromptState {
    Pending,
    Resolved(Arc<Passphrase>),
    Unavailable,
}

enum Role {
    Leader(watch::Sender<PromptState>),
    Follower(watch::Receiver<PromptState>),
}

/// Removes the in-flight entry when the leading prompt settles or is dropped.
struct InFlightGuard<'a> {
    in_flight: &'a Mutex<HashMap<String, watch::Receiver<PromptState>>>,
    identity: &'a str,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.in_flight.lock().remove(self.identity);
    }
}

/// Owns the `identity → passphrase` cache for the process lifetime.
///
/// Entries are only ever removed by [`clear`](Self::clear); nothing expires.
pub struct PassphraseGate {
    store: Arc<dyn KeyValueStore>,
    prompter: Arc<dyn PassphrasePrompter>,
    storage_key_prefix: String,
    persist: bool,
    cache: Mutex<HashMap<String, Passphrase>>,
    in_flight: Mutex<HashMap<String, watch::Receiver<PromptState>>>,
}

impl PassphraseGate {
    pub fn new(store: Arc<dyn KeyValueStore>, prompter: Arc<dyn PassphrasePrompter>) -> Self {
        Self::with_config(store, prompter, &SecretServiceConfig::default())
    }

    pub fn with_config(
        store: Arc<dyn KeyValueStore>,
        prompter: Arc<dyn PassphrasePrompter>,
        config: &SecretServiceConfig,
    ) -> Self {
        Self {
            store,
            prompter,
            storage_key_prefix: config.storage_key_prefix.clone(),
            persist: config.persist_passphrase,
            cache: Mutex::new(HashMap::new()),
            in_flight: Mutex::new(HashMap::new()),
        }
    }

    fn storage_key(&self, identity: &str) -> String {
        format!("{}{}", self.storage_key_prefix, identity)
    }

    fn cached(&self, identity: &str) -> Option<Passphrase> {
        self.cache.lock().get(identity).cloned()
    }

    /// Cache first, then the persistent store. Never prompts.
    fn lookup(&self, identity: &str) -> Option<Passphrase> {
        if let Some(passphrase) = self.cached(identity) {
            return Some(passphrase);
        }
        if !self.persist {
            return None;
        }
        let stored = Zeroizing::new(self.store.get(&self.storage_key(identity))?);
        if stored.is_empty() {
            return None;
        }
        self.cache
            .lock()
            .insert(identity.to_string(), stored.clone());
        Some(stored)
    }

    fn remember(&self, identity: &str, passphrase: &Passphrase) {
        self.cache
            .lock()
            .insert(identity.to_string(), passphrase.clone());
        if self.persist {
            self.store.set(&self.storage_key(identity), passphrase);
        }
    }

    /// Whether a passphrase is available for `identity` without prompting.
    pub fn has_passphrase(&self, identity: &str) -> bool {
        self.lookup(identity).is_some()
    }

    /// Resolve the passphrase for `identity`, prompting at most once per
    /// outstanding request.
    pub async fn resolve(&self, identity: &str) -> Result<Passphrase> {
        if identity.is_empty() {
            return Err(SecretError::InvalidInput("identity must not be empty".into()));
        }
        if let Some(passphrase) = self.lookup(identity) {
            return Ok(passphrase);
        }

        let role = {
            let mut in_flight = self.in_flight.lock();
            // A leader may have settled between the lookup above and taking the lock.
            // Only the cache is consulted here; the store is embedder code.
            if let Some(passphrase) = self.cached(identity) {
                return Ok(passphrase);
            }
            match in_flight.get(identity) {
                Some(rx) => Role::Follower(rx.clone()),
                None => {
                    let (tx, rx) = watch::channel(PromptState::Pending);
                    in_flight.insert(identity.to_string(), rx);
                    Role::Leader(tx)
                }
            }
        };

        match role {
            Role::Leader(tx) => self.lead_prompt(identity, tx).await,
            Role::Follower(rx) => Self::follow_prompt(identity, rx).await,
        }
    }

    async fn lead_prompt(
        &self,
        identity: &str,
        tx: watch::Sender<PromptState>,
    ) -> Result<Passphrase> {
        let guard = InFlightGuard {
            in_flight: &self.in_flight,
            identity,
        };

        debug!(identity = %identity, "prompting for passphrase");
        let answer = match self.prompter.prompt_for_passphrase(identity).await {
            Ok(answer) => answer,
            Err(e) => {
                warn!(identity = %identity, error = %e, "passphrase prompt failed");
                None
            }
        };

        match answer.map(Zeroizing::new) {
            Some(passphrase) if !passphrase.is_empty() => {
                self.remember(identity, &passphrase);
                // Unregister before publishing so no new caller joins a settled prompt.
                drop(guard);
                tx.send_replace(PromptState::Resolved(Arc::new(passphrase.clone())));
                Ok(passphrase)
            }
            _ => {
                debug!(identity = %identity, "passphrase prompt cancelled");
                drop(guard);
                tx.send_replace(PromptState::Unavailable);
                Err(SecretError::passphrase_required(identity))
            }
        }
    }

    async fn follow_prompt(
        identity: &str,
        mut rx: watch::Receiver<PromptState>,
    ) -> Result<Passphrase> {
        debug!(identity = %identity, "joining in-flight passphrase prompt");
        // A dropped sender means the leader was cancelled mid-prompt.
        let settled = rx
            .wait_for(|state| !matches!(state, PromptState::Pending))
            .await
            .map(|state| state.clone());
        match settled {
            Ok(PromptState::Resolved(passphrase)) => Ok(Passphrase::clone(&passphrase)),
            _ => Err(SecretError::passphrase_required(identity)),
        }
    }

    /// Store a passphrase obtained through another flow (e.g. initial setup).
    pub fn set(&self, identity: &str, passphrase: &str) -> Result<()> {
        if identity.is_empty() {
            return Err(SecretError::InvalidInput("identity must not be empty".into()));
        }
        if passphrase.is_empty() {
            return Err(SecretError::InvalidInput("passphrase must not be empty".into()));
        }
        self.remember(identity, &Zeroizing::new(passphrase.to_string()));
        Ok(())
    }

    /// Forget the passphrase for `identity`. Idempotent.
    pub fn clear(&self, identity: &str) {
        self.cache.lock().remove(identity);
        if self.persist {
            self.store.remove(&self.storage_key(identity));
        }
        debug!(identity = %identity, "passphrase cleared");
    }
}
