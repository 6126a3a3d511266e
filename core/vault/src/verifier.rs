//! Master-password verification with legacy-format migration.
//!
//! Three stored-hash formats have existed:
//! 1. current: base64 of PBKDF2-HMAC-SHA256(password, salt)
//! 2. legacy plaintext: the raw password string (pre-hashing releases)
//! 3. legacy digest: base64(SHA-256(password)), unsalted
//!
//! Verification tries each format in order as an explicit strategy list.
//! A matching legacy format migrates the stored value to the current
//! format in place before returning success. A strategy that errors (for
//! example a malformed stored salt) is logged and treated as a mismatch
//! so the remaining formats still get their chance.

use subtle::ConstantTimeEq;
use tracing::{debug, info, warn};

use crate::state::MasterSecretState;
use strongbox_common::Result;
use strongbox_crypto::kdf;
use strongbox_store::{SettingsStore, SETTING_MASTER_HASH};

/// Ordered verification strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Strategy {
    /// Salted PBKDF2 hash, the current format.
    Current,
    /// Raw password stored verbatim by pre-hashing releases.
    LegacyPlaintext,
    /// Unsalted SHA-256 digest from early releases.
    LegacyDigest,
}

impl Strategy {
    const ORDER: [Strategy; 3] = [
        Strategy::Current,
        Strategy::LegacyPlaintext,
        Strategy::LegacyDigest,
    ];

    /// Whether a match under this strategy requires migrating the stored
    /// hash to the current format.
    fn migrates(self) -> bool {
        self != Strategy::Current
    }

    fn check<S: SettingsStore>(
        self,
        store: &S,
        password: &str,
        stored_hash: &str,
    ) -> Result<bool> {
        match self {
            Strategy::Current => {
                let state = MasterSecretState::load(store)?;
                let Some(salt) = state.salt else {
                    // No salt on record: the current format cannot have
                    // produced this hash.
                    return Ok(false);
                };
                let computed = kdf::auth_hash(password, &salt)?;
                Ok(constant_time_eq(&computed, stored_hash))
            }
            Strategy::LegacyPlaintext => Ok(constant_time_eq(password, stored_hash)),
            Strategy::LegacyDigest => {
                let digest = kdf::legacy_sha256_digest(password);
                Ok(constant_time_eq(&digest, stored_hash))
            }
        }
    }
}

fn constant_time_eq(a: &str, b: &str) -> bool {
    a.as_bytes().ct_eq(b.as_bytes()).into()
}

/// Master-password verifier.
pub struct SecretVerifier;

impl SecretVerifier {
    /// Verify a candidate master password against the stored state.
    ///
    /// # Postconditions
    /// - First run (no stored hash): any non-empty password is accepted
    ///   and becomes the master password; its current-format hash is
    ///   persisted
    /// - A match under a legacy format migrates the stored hash to the
    ///   current format
    ///
    /// # Errors
    /// - A wrong password is `Ok(false)`, never an error
    /// - Only store access failures during bootstrap surface as errors
    pub fn verify<S: SettingsStore>(store: &mut S, password: &str) -> Result<bool> {
        let stored_hash = store
            .get_setting(SETTING_MASTER_HASH)?
            .filter(|h| !h.is_empty());

        let Some(stored_hash) = stored_hash else {
            // First-time setup: this password becomes the master password.
            if password.is_empty() {
                return Ok(false);
            }
            persist_current_hash(store, password)?;
            info!("Master password established");
            return Ok(true);
        };

        for strategy in Strategy::ORDER {
            match strategy.check(store, password, &stored_hash) {
                Ok(true) => {
                    if strategy.migrates() {
                        // Best effort: a failed migration still allows
                        // login, the stored hash just stays in its old
                        // format until the next successful attempt.
                        match persist_current_hash(store, password) {
                            Ok(()) => {
                                info!(?strategy, "Migrated stored master hash to current format")
                            }
                            Err(e) => {
                                warn!(?strategy, error = %e, "Failed to migrate stored master hash")
                            }
                        }
                    }
                    return Ok(true);
                }
                Ok(false) => {}
                Err(e) => {
                    warn!(?strategy, error = %e, "Verification strategy failed, trying next format");
                }
            }
        }

        debug!("No verification strategy matched");
        Ok(false)
    }
}

/// Compute and persist the current-format hash, creating a salt first if
/// none exists.
fn persist_current_hash<S: SettingsStore>(store: &mut S, password: &str) -> Result<()> {
    let mut state = MasterSecretState::load(store)?;
    let salt = state.ensure_salt(store)?;
    let hash = kdf::auth_hash(password, &salt)?;
    state.store_hash(store, hash)
}
