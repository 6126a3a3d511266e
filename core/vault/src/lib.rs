//! Vault engine for Strongbox.
//!
//! This module provides:
//! - Master-password verification with legacy-format migration
//! - Session handling with secure working-key management
//! - Credential CRUD with field-level encryption
//! - Master-password rotation with full re-encryption
//! - Encrypted export/import of the whole vault
//!
//! # Architecture
//! The vault module sits between UI collaborators and the store,
//! handling all encryption/decryption transparently. Stores only ever
//! see ciphertext.

pub mod envelope;
pub mod operations;
pub mod rotation;
pub mod session;
pub mod state;
pub mod verifier;

pub use envelope::{export_vault, import_vault, looks_like_export_file, EXPORT_VERSION};
pub use operations::{CredentialDraft, Vault};
pub use rotation::{change_master_password, BackupOutcome, RotationReport};
pub use session::{SessionHandle, SessionState, VaultSession};
pub use state::MasterSecretState;
pub use verifier::SecretVerifier;
