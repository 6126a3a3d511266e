//! Key and salt types with secure memory handling.
//!
//! The working key automatically zeroizes its memory on drop to prevent
//! sensitive data from persisting in memory after the session ends.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

use strongbox_common::{Error, Result};

/// Length of encryption keys in bytes (256-bit).
pub const KEY_LENGTH: usize = 32;

/// Length of the master-password salt in bytes.
pub const SALT_LENGTH: usize = 16;

/// Length of a CBC initialization vector in bytes (one AES block).
pub const IV_LENGTH: usize = 16;

/// Symmetric key derived from the master password.
///
/// Held only in memory for the lifetime of an authenticated session.
/// Never persisted; zeroized on drop.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct WorkingKey {
    key: [u8; KEY_LENGTH],
}

impl WorkingKey {
    /// Create a working key from raw bytes.
    pub fn from_bytes(key: [u8; KEY_LENGTH]) -> Self {
        Self { key }
    }

    /// Get the key bytes.
    ///
    /// # Security
    /// The returned slice should be used immediately and not stored.
    pub fn as_bytes(&self) -> &[u8; KEY_LENGTH] {
        &self.key
    }
}

impl fmt::Debug for WorkingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "WorkingKey([REDACTED])")
    }
}

/// Salt for master-password key derivation.
///
/// Generated once per vault lifetime and replaced only during
/// master-password rotation. Persisted base64-encoded in the settings
/// store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Salt([u8; SALT_LENGTH]);

impl Salt {
    /// Generate a random salt.
    pub fn generate() -> Self {
        use rand::RngCore;
        let mut salt = [0u8; SALT_LENGTH];
        rand::thread_rng().fill_bytes(&mut salt);
        Self(salt)
    }

    /// Create from bytes.
    pub fn from_bytes(bytes: [u8; SALT_LENGTH]) -> Self {
        Self(bytes)
    }

    /// Get the salt bytes.
    pub fn as_bytes(&self) -> &[u8; SALT_LENGTH] {
        &self.0
    }

    /// Encode for persistence in the settings store.
    pub fn to_base64(&self) -> String {
        STANDARD.encode(self.0)
    }

    /// Decode a salt persisted by [`Salt::to_base64`].
    ///
    /// # Errors
    /// - Returns error if the input is not valid base64 or has the wrong
    ///   length
    pub fn from_base64(encoded: &str) -> Result<Self> {
        let bytes = STANDARD
            .decode(encoded)
            .map_err(|e| Error::InvalidInput(format!("Invalid salt encoding: {}", e)))?;
        let bytes: [u8; SALT_LENGTH] = bytes.try_into().map_err(|_| {
            Error::InvalidInput(format!("Salt must be {} bytes", SALT_LENGTH))
        })?;
        Ok(Self(bytes))
    }
}
