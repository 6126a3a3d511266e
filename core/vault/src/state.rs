//! Persisted master-secret state.
//!
//! The salt and verification hash live in the settings store. This struct
//! is the explicit, caller-owned view of that state: it is loaded on
//! demand and passed into the verifier and rotation pipeline instead of
//! living in a process-wide global.

use strongbox_crypto::Salt;
use strongbox_store::{SettingsStore, SETTING_MASTER_HASH, SETTING_MASTER_SALT};

use strongbox_common::Result;

/// Salt and authentication hash for the master password.
///
/// Lifecycle: both fields start absent on a fresh vault; the hash is
/// written on first successful verification (bootstrap), the salt on
/// first derivation. Rotation replaces both. Outside rotation the salt is
/// immutable once set.
#[derive(Debug, Clone, Default)]
pub struct MasterSecretState {
    pub salt: Option<Salt>,
    pub password_hash: Option<String>,
}

impl MasterSecretState {
    /// Load the state from the settings store.
    ///
    /// An empty stored string is treated as absent; a malformed stored
    /// salt is surfaced as an error.
    pub fn load<S: SettingsStore>(store: &S) -> Result<Self> {
        let salt = match non_empty(store.get_setting(SETTING_MASTER_SALT)?) {
            Some(encoded) => Some(Salt::from_base64(&encoded)?),
            None => None,
        };
        let password_hash = non_empty(store.get_setting(SETTING_MASTER_HASH)?);
        Ok(Self {
            salt,
            password_hash,
        })
    }

    /// Return the salt, generating and persisting one first if none
    /// exists yet.
    pub fn ensure_salt<S: SettingsStore>(&mut self, store: &mut S) -> Result<Salt> {
        if let Some(salt) = &self.salt {
            return Ok(salt.clone());
        }
        let salt = Salt::generate();
        store.set_setting(SETTING_MASTER_SALT, &salt.to_base64())?;
        self.salt = Some(salt.clone());
        Ok(salt)
    }

    /// Persist a new salt, replacing any existing one.
    ///
    /// Only the rotation pipeline may call this once a salt exists.
    pub fn replace_salt<S: SettingsStore>(&mut self, store: &mut S, salt: Salt) -> Result<()> {
        store.set_setting(SETTING_MASTER_SALT, &salt.to_base64())?;
        self.salt = Some(salt);
        Ok(())
    }

    /// Persist a new authentication hash.
    pub fn store_hash<S: SettingsStore>(&mut self, store: &mut S, hash: String) -> Result<()> {
        store.set_setting(SETTING_MASTER_HASH, &hash)?;
        self.password_hash = Some(hash);
        Ok(())
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}
