//! Key derivation using PBKDF2-HMAC-SHA256.
//!
//! Two derivations share the same primitive and salt but serve distinct
//! purposes with distinct iteration counts:
//!
//! - the **working key** (100,000 iterations) encrypts record fields
//! - the **authentication hash** (65,536 iterations) is stored base64
//!   encoded and compared at login
//!
//! Both counts are fixed: stored hashes and existing ciphertexts must keep
//! verifying and decrypting across releases.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use pbkdf2::pbkdf2_hmac;
use sha2::{Digest, Sha256};

use crate::keys::{Salt, WorkingKey, KEY_LENGTH};
use strongbox_common::{Error, Result};

/// Iteration count for working-key derivation.
pub const KEY_ITERATIONS: u32 = 100_000;

/// Iteration count for the stored authentication hash.
pub const AUTH_ITERATIONS: u32 = 65_536;

/// Parameters for PBKDF2 key derivation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KdfParams {
    /// Number of PBKDF2 iterations.
    pub iterations: u32,
}

impl KdfParams {
    /// Parameters for deriving the field-encryption working key.
    pub fn working_key() -> Self {
        Self {
            iterations: KEY_ITERATIONS,
        }
    }

    /// Parameters for the stored authentication hash.
    pub fn auth_hash() -> Self {
        Self {
            iterations: AUTH_ITERATIONS,
        }
    }
}

/// Derive 256 bits of key material from a password and salt.
///
/// # Postconditions
/// - Deterministic: identical inputs always yield identical output
///
/// # Errors
/// - Returns `KeyDerivation` if the password is empty or the iteration
///   count is zero
fn derive_bytes(password: &str, salt: &Salt, params: &KdfParams) -> Result<[u8; KEY_LENGTH]> {
    if password.is_empty() {
        return Err(Error::KeyDerivation("Password cannot be empty".to_string()));
    }
    if params.iterations == 0 {
        return Err(Error::KeyDerivation(
            "Iteration count must be non-zero".to_string(),
        ));
    }

    let mut out = [0u8; KEY_LENGTH];
    pbkdf2_hmac::<Sha256>(
        password.as_bytes(),
        salt.as_bytes(),
        params.iterations,
        &mut out,
    );
    Ok(out)
}

/// Derive the working key used for field-level encryption.
///
/// # Security
/// - The password is not stored or logged
/// - The returned key zeroizes on drop
pub fn derive_working_key(password: &str, salt: &Salt) -> Result<WorkingKey> {
    let bytes = derive_bytes(password, salt, &KdfParams::working_key())?;
    Ok(WorkingKey::from_bytes(bytes))
}

/// Compute the current-format authentication hash: base64 of the PBKDF2
/// output at [`AUTH_ITERATIONS`].
///
/// This is the value persisted under the master-hash setting and compared
/// at login.
pub fn auth_hash(password: &str, salt: &Salt) -> Result<String> {
    let bytes = derive_bytes(password, salt, &KdfParams::auth_hash())?;
    Ok(STANDARD.encode(bytes))
}

/// Compute the legacy unsalted digest: base64(SHA-256(password)).
///
/// Only used to recognize hashes written by pre-PBKDF2 releases so they
/// can be migrated on successful login.
pub fn legacy_sha256_digest(password: &str) -> String {
    let digest = Sha256::digest(password.as_bytes());
    STANDARD.encode(digest)
}
