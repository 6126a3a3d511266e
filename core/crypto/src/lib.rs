//! Cryptographic primitives for Strongbox.
//!
//! This module provides:
//! - Password-based key derivation using PBKDF2-HMAC-SHA256
//! - Field-level encryption using AES-256-CBC with PKCS7 padding
//! - Secure key management with automatic zeroization
//!
//! # Security Guarantees
//! - All key material is automatically zeroized on drop
//! - No plaintext or key material is ever logged
//! - Every encryption call uses a fresh random IV
//!
//! # Format note
//! The cipher mode carries no authentication tag: a failed unpadding after
//! decryption is the only signal that the key was wrong or the data was
//! corrupted. This matches the on-disk format of existing vaults and
//! export files.

pub mod cipher;
pub mod kdf;
pub mod keys;

pub use cipher::{decrypt_field, encrypt_field, EncryptedField};
pub use kdf::{auth_hash, derive_working_key, legacy_sha256_digest, KdfParams};
pub use keys::{Salt, WorkingKey, IV_LENGTH, KEY_LENGTH, SALT_LENGTH};
