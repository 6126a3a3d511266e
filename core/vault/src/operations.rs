//! Credential operations over an unlocked vault.
//!
//! `Vault` owns the store and the session and is what UI collaborators
//! talk to: every secret passes through the field codec on its way in or
//! out, and plaintext is returned to the caller only on an explicit
//! reveal — nothing is cached.

use tracing::{debug, info};

use crate::envelope;
use crate::rotation::{self, RotationReport};
use crate::session::VaultSession;
use crate::state::MasterSecretState;
use strongbox_common::{Error, Result};
use strongbox_crypto::{cipher, derive_working_key};
use strongbox_store::{CredentialRecord, VaultStore};

/// Plaintext input for a new or updated credential.
#[derive(Debug, Clone)]
pub struct CredentialDraft {
    pub title: String,
    pub website: String,
    pub username: String,
    /// The secret; encrypted before it ever reaches the store.
    pub password: String,
    pub category: String,
    pub notes: String,
}

/// An unlocked credential vault.
pub struct Vault<S: VaultStore> {
    store: S,
    session: VaultSession,
}

impl<S: VaultStore> Vault<S> {
    /// Unlock the vault with the master password.
    ///
    /// On a fresh store this bootstraps the master password; on an
    /// existing one it verifies (migrating legacy hash formats) and
    /// derives the working key.
    ///
    /// # Errors
    /// - `NotPermitted` if the password does not verify
    pub fn unlock(mut store: S, password: &str) -> Result<Self> {
        let session = VaultSession::unlock(&mut store, password)?;
        Ok(Self { store, session })
    }

    /// The underlying session.
    pub fn session(&self) -> &VaultSession {
        &self.session
    }

    /// Encrypt and persist a new credential.
    pub fn add_credential(&mut self, draft: CredentialDraft) -> Result<CredentialRecord> {
        let key = self.session.working_key()?;
        let field = cipher::encrypt_field(&draft.password, key)?;

        let mut record = CredentialRecord::new(
            draft.title,
            draft.website,
            draft.username,
            field.ciphertext,
            field.iv.to_vec(),
            draft.category,
            draft.notes,
        );
        record.id = self.store.add_record(&record)?;

        info!(id = record.id, "Credential added");
        Ok(record)
    }

    /// All records, ordered by title. Secrets stay encrypted.
    pub fn list(&self) -> Result<Vec<CredentialRecord>> {
        self.store.list_all_records()
    }

    /// Records matching a title/website/username substring.
    pub fn search(&self, query: &str) -> Result<Vec<CredentialRecord>> {
        self.store.search_records(query)
    }

    /// Decrypt a record's password.
    ///
    /// # Errors
    /// - `Decryption` for a corrupt record (or a record written under a
    ///   different master password)
    pub fn reveal_password(&self, record: &CredentialRecord) -> Result<String> {
        let key = self.session.working_key()?;
        cipher::decrypt_field(&record.ciphertext, &record.iv, key)
    }

    /// Update a credential, re-encrypting its password.
    ///
    /// The ciphertext+iv pair is regenerated and written together with
    /// the metadata in one record update.
    pub fn update_credential(&mut self, id: i64, draft: CredentialDraft) -> Result<CredentialRecord> {
        let existing = self
            .store
            .list_all_records()?
            .into_iter()
            .find(|r| r.id == id)
            .ok_or_else(|| Error::NotFound(format!("No record with id {}", id)))?;

        let key = self.session.working_key()?;
        let field = cipher::encrypt_field(&draft.password, key)?;

        let mut record = existing;
        record.title = draft.title;
        record.website = draft.website;
        record.username = draft.username;
        record.category = draft.category;
        record.notes = draft.notes;
        record.set_encrypted(field.ciphertext, field.iv.to_vec());

        self.store.update_record(&record)?;
        debug!(id, "Credential updated");
        Ok(record)
    }

    /// Delete a credential by id.
    pub fn delete(&mut self, id: i64) -> Result<()> {
        self.store.delete_record(id)?;
        info!(id, "Credential deleted");
        Ok(())
    }

    /// Export every record into a self-contained encrypted file.
    pub fn export(&self, device_name: &str) -> Result<Vec<u8>> {
        let records = self.store.list_all_records()?;
        envelope::export_vault(&records, self.session.working_key()?, device_name)
    }

    /// Import records from an export file produced with the same master
    /// password, persisting each one. Returns how many were added.
    pub fn import(&mut self, data: &[u8]) -> Result<usize> {
        let records = envelope::import_vault(data, self.session.working_key()?)?;
        let count = records.len();
        for record in records {
            self.store.add_record(&record)?;
        }
        info!(count, "Records imported");
        Ok(count)
    }

    /// Change the master password, re-encrypting every record, then
    /// re-key the session so it stays usable.
    ///
    /// See [`rotation::change_master_password`] for the pipeline and its
    /// best-effort semantics.
    pub fn change_master_password(
        &mut self,
        old_password: &str,
        new_password: &str,
    ) -> Result<RotationReport> {
        let report = rotation::change_master_password(&mut self.store, old_password, new_password)?;

        // Re-derive the working key from the new password and salt
        let state = MasterSecretState::load(&self.store)?;
        let salt = state
            .salt
            .ok_or_else(|| Error::Storage("Salt missing after rotation".to_string()))?;
        self.session
            .replace_key(derive_working_key(new_password, &salt)?);

        Ok(report)
    }

    /// Lock the vault, zeroizing the working key.
    pub fn lock(&mut self) {
        self.session.lock();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strongbox_store::MemoryStore;

    fn draft(title: &str, password: &str) -> CredentialDraft {
        CredentialDraft {
            title: title.to_string(),
            website: "https://example.com".to_string(),
            username: "alice".to_string(),
            password: password.to_string(),
            category: "General".to_string(),
            notes: String::new(),
        }
    }

    fn unlocked_vault() -> Vault<MemoryStore> {
        Vault::unlock(MemoryStore::new(), "master").unwrap()
    }

    #[test]
    fn test_add_and_reveal() {
        let mut vault = unlocked_vault();
        let record = vault.add_credential(draft("GitHub", "gh-secret")).unwrap();

        assert!(record.id > 0);
        // The store never saw the plaintext
        assert_ne!(record.ciphertext, b"gh-secret");
        assert_eq!(vault.reveal_password(&record).unwrap(), "gh-secret");
    }

    #[test]
    fn test_update_reencrypts_pair() {
        let mut vault = unlocked_vault();
        let record = vault.add_credential(draft("GitHub", "old-secret")).unwrap();
        let old_iv = record.iv.clone();

        let updated = vault
            .update_credential(record.id, draft("GitHub (work)", "new-secret"))
            .unwrap();

        assert_eq!(updated.title, "GitHub (work)");
        assert_ne!(updated.iv, old_iv);
        assert_eq!(vault.reveal_password(&updated).unwrap(), "new-secret");
        assert_eq!(updated.created_at, record.created_at);
    }

    #[test]
    fn test_update_unknown_id_fails() {
        let mut vault = unlocked_vault();
        assert!(matches!(
            vault.update_credential(999, draft("x", "y")),
            Err(Error::NotFound(_))
        ));
    }

    #[test]
    fn test_delete() {
        let mut vault = unlocked_vault();
        let record = vault.add_credential(draft("GitHub", "s")).unwrap();

        vault.delete(record.id).unwrap();
        assert!(vault.list().unwrap().is_empty());
    }

    #[test]
    fn test_locked_vault_refuses_operations() {
        let mut vault = unlocked_vault();
        let record = vault.add_credential(draft("GitHub", "s")).unwrap();
        vault.lock();

        assert!(vault.reveal_password(&record).is_err());
        assert!(vault.add_credential(draft("Other", "s2")).is_err());
    }

    #[test]
    fn test_export_import_roundtrip_through_vault() {
        let mut vault = unlocked_vault();
        vault.add_credential(draft("GitHub", "s1")).unwrap();
        vault.add_credential(draft("Bank", "s2")).unwrap();

        let file = vault.export("laptop").unwrap();
        assert!(envelope::looks_like_export_file(&file));

        let added = vault.import(&file).unwrap();
        assert_eq!(added, 2);
        assert_eq!(vault.list().unwrap().len(), 4);

        // Imported copies decrypt under the same session key
        for record in vault.list().unwrap() {
            assert!(vault.reveal_password(&record).is_ok());
        }
    }

    #[test]
    fn test_rotation_keeps_session_usable() {
        let mut vault = unlocked_vault();
        let record = vault.add_credential(draft("GitHub", "s1")).unwrap();

        let report = vault.change_master_password("master", "new-master").unwrap();
        assert!(report.is_clean());

        // Old record object is stale (old ciphertext), reload from store
        let record = vault
            .list()
            .unwrap()
            .into_iter()
            .find(|r| r.id == record.id)
            .unwrap();
        assert_eq!(vault.reveal_password(&record).unwrap(), "s1");

        // New credentials encrypt under the new key
        let new_record = vault.add_credential(draft("Bank", "s2")).unwrap();
        assert_eq!(vault.reveal_password(&new_record).unwrap(), "s2");
    }

    #[test]
    fn test_reopen_with_new_password_after_rotation() {
        let mut store = MemoryStore::new();
        {
            let mut vault = Vault::unlock(std::mem::take(&mut store), "master").unwrap();
            vault.add_credential(draft("GitHub", "s1")).unwrap();
            vault.change_master_password("master", "rotated").unwrap();
            store = vault.store;
        }

        assert!(Vault::unlock(std::mem::take(&mut store), "master").is_err());
    }
}
