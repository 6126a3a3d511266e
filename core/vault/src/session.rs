//! Vault session management.
//!
//! A session holds the working key in memory and nothing else. The key is
//! derived at unlock, lives only for the session, and is zeroized when
//! the session is locked or dropped. It is never persisted.

use tracing::{debug, info};
use uuid::Uuid;

use crate::state::MasterSecretState;
use crate::verifier::SecretVerifier;
use strongbox_common::{Error, Result};
use strongbox_crypto::{derive_working_key, WorkingKey};
use strongbox_store::SettingsStore;

/// Session handle for tracking active sessions.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionHandle(String);

impl SessionHandle {
    /// Generate a new unique session handle.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Get the handle string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for SessionHandle {
    fn default() -> Self {
        Self::new()
    }
}

/// State of the vault session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Session is active and the working key is available.
    Active,
    /// Session is locked, the key has been cleared.
    Locked,
}

/// Active vault session.
///
/// Holds the working key derived from the master password. The key is
/// zeroized when the session is dropped or locked.
pub struct VaultSession {
    handle: SessionHandle,
    working_key: Option<WorkingKey>,
    state: SessionState,
}

impl VaultSession {
    /// Unlock the vault with the master password.
    ///
    /// Runs full verification (including bootstrap and legacy-format
    /// migration), then derives the working key from the password and
    /// the persisted salt.
    ///
    /// # Errors
    /// - `NotPermitted` if the password does not verify
    pub fn unlock<S: SettingsStore>(store: &mut S, password: &str) -> Result<Self> {
        if !SecretVerifier::verify(store, password)? {
            return Err(Error::NotPermitted("Invalid master password".to_string()));
        }

        let mut state = MasterSecretState::load(store)?;
        let salt = state.ensure_salt(store)?;
        let working_key = derive_working_key(password, &salt)?;

        let handle = SessionHandle::new();
        info!(session = handle.as_str(), "Vault unlocked");

        Ok(Self {
            handle,
            working_key: Some(working_key),
            state: SessionState::Active,
        })
    }

    /// Get the session handle.
    pub fn handle(&self) -> &SessionHandle {
        &self.handle
    }

    /// Get the working key, if the session is active.
    ///
    /// # Errors
    /// - Returns error if the session is locked
    pub fn working_key(&self) -> Result<&WorkingKey> {
        match self.state {
            SessionState::Active => self
                .working_key
                .as_ref()
                .ok_or_else(|| Error::NotPermitted("Working key not available".to_string())),
            SessionState::Locked => Err(Error::NotPermitted("Session is locked".to_string())),
        }
    }

    /// Replace the working key after a master-password rotation.
    pub(crate) fn replace_key(&mut self, key: WorkingKey) {
        self.working_key = Some(key);
        self.state = SessionState::Active;
    }

    /// Get the current session state.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Check if the session is active.
    pub fn is_active(&self) -> bool {
        self.state == SessionState::Active
    }

    /// Lock the session, clearing the key from memory.
    ///
    /// # Postconditions
    /// - Working key is zeroized and removed
    /// - Session can no longer decrypt or encrypt
    pub fn lock(&mut self) {
        if let Some(key) = self.working_key.take() {
            // Zeroized on drop
            drop(key);
        }
        if self.state != SessionState::Locked {
            debug!(session = self.handle.as_str(), "Session locked");
        }
        self.state = SessionState::Locked;
    }
}

impl Drop for VaultSession {
    fn drop(&mut self) {
        self.lock();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strongbox_store::MemoryStore;

    fn unlocked_session() -> (MemoryStore, VaultSession) {
        let mut store = MemoryStore::new();
        let session = VaultSession::unlock(&mut store, "test-password").unwrap();
        (store, session)
    }

    #[test]
    fn test_unlock_bootstraps_and_activates() {
        let (_, session) = unlocked_session();
        assert!(session.is_active());
        assert!(session.working_key().is_ok());
    }

    #[test]
    fn test_wrong_password_fails_after_bootstrap() {
        let (mut store, _session) = unlocked_session();

        let result = VaultSession::unlock(&mut store, "wrong-password");
        assert!(matches!(result, Err(Error::NotPermitted(_))));
    }

    #[test]
    fn test_lock_clears_key() {
        let (_, mut session) = unlocked_session();
        session.lock();

        assert!(!session.is_active());
        assert_eq!(session.state(), SessionState::Locked);
        assert!(session.working_key().is_err());
    }

    #[test]
    fn test_same_password_same_key_across_sessions() {
        let mut store = MemoryStore::new();
        let first = VaultSession::unlock(&mut store, "pw").unwrap();
        let key1 = first.working_key().unwrap().as_bytes().to_vec();
        drop(first);

        let second = VaultSession::unlock(&mut store, "pw").unwrap();
        assert_eq!(second.working_key().unwrap().as_bytes().to_vec(), key1);
    }

    #[test]
    fn test_handles_are_unique() {
        let mut store = MemoryStore::new();
        let a = VaultSession::unlock(&mut store, "pw").unwrap();
        let b = VaultSession::unlock(&mut store, "pw").unwrap();
        assert_ne!(a.handle(), b.handle());
    }
}
