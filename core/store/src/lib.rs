//! Persistence collaborators for Strongbox.
//!
//! The vault core never talks to a database directly; it goes through the
//! traits defined here. Two implementations are provided:
//! - [`SqliteStore`]: the production store, one SQLite file per vault
//! - [`MemoryStore`]: in-memory store for tests
//!
//! Stores persist opaque byte blobs and strings only. Encryption and
//! decryption happen entirely in the vault core; a store never sees a
//! plaintext secret.

pub mod memory;
pub mod record;
pub mod sqlite;

pub use memory::MemoryStore;
pub use record::CredentialRecord;
pub use sqlite::SqliteStore;

use strongbox_common::Result;

/// Settings key for the master-password verification hash.
pub const SETTING_MASTER_HASH: &str = "master_password_hash";

/// Settings key for the base64-encoded master-password salt.
pub const SETTING_MASTER_SALT: &str = "master_password_salt";

/// Key-value settings persistence.
///
/// Values are opaque strings; base64 encoding of binary values is the
/// caller's concern. An empty stored string is treated as absent by
/// callers.
pub trait SettingsStore {
    /// Fetch a setting, `None` if the key has never been written.
    fn get_setting(&self, key: &str) -> Result<Option<String>>;

    /// Write or overwrite a setting.
    fn set_setting(&mut self, key: &str, value: &str) -> Result<()>;
}

/// Credential record persistence.
///
/// `ciphertext` and `iv` are stored as binary columns and must always be
/// written together.
pub trait RecordStore {
    /// All records, ordered by title.
    fn list_all_records(&self) -> Result<Vec<CredentialRecord>>;

    /// Insert a record (the `id` field is ignored) and return its new id.
    fn add_record(&mut self, record: &CredentialRecord) -> Result<i64>;

    /// Overwrite a record by id, including its ciphertext+iv pair.
    fn update_record(&mut self, record: &CredentialRecord) -> Result<()>;

    /// Delete a record by id.
    fn delete_record(&mut self, id: i64) -> Result<()>;

    /// Records whose title, website, or username contains `query`.
    fn search_records(&self, query: &str) -> Result<Vec<CredentialRecord>>;
}

/// Best-effort whole-store backup.
pub trait StoreBackup {
    /// Copy the entire persisted store to a timestamped backup location
    /// and return that location.
    ///
    /// # Errors
    /// - Returns `Backup` if the store has no backing file or the copy
    ///   fails. Callers treat this as non-fatal.
    fn backup(&self) -> Result<String>;
}

/// Everything the vault core needs from one store.
pub trait VaultStore: SettingsStore + RecordStore + StoreBackup {}

impl<T: SettingsStore + RecordStore + StoreBackup> VaultStore for T {}
