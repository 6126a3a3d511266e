//! Common error types for Strongbox.

use thiserror::Error;

/// Top-level error type for Strongbox operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Key derivation failed (invalid parameters or empty password).
    #[error("Key derivation error: {0}")]
    KeyDerivation(String),

    /// Decryption failed: wrong key, corrupted ciphertext, or padding
    /// mismatch. Callers interpret this as "wrong master password" or
    /// "corrupt record" depending on context.
    #[error("Decryption error: {0}")]
    Decryption(String),

    /// An export file could not be decrypted (wrong key or corrupted file).
    #[error("Import decryption error: {0}")]
    ImportDecryption(String),

    /// An export file decrypted but its payload could not be parsed.
    #[error("Import parse error: {0}")]
    ImportParse(String),

    /// Store backup failed. Non-fatal during rotation.
    #[error("Backup error: {0}")]
    Backup(String),

    /// Storage operation failed.
    #[error("Storage error: {0}")]
    Storage(String),

    /// I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization or deserialization failed.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Invalid input provided.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Operation not permitted.
    #[error("Not permitted: {0}")]
    NotPermitted(String),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),
}

/// Result type alias using the common Error.
pub type Result<T> = std::result::Result<T, Error>;
