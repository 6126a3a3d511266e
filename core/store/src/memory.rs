//! In-memory store for testing.

use std::collections::HashMap;

use crate::record::CredentialRecord;
use crate::{RecordStore, SettingsStore, StoreBackup};
use strongbox_common::{Error, Result};

/// In-memory vault store.
///
/// Useful for testing and development. All data is lost on drop. Backup
/// always fails, which exercises the non-fatal backup path of the
/// rotation pipeline.
#[derive(Debug)]
pub struct MemoryStore {
    settings: HashMap<String, String>,
    records: Vec<CredentialRecord>,
    next_id: i64,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    /// Create a new empty memory store.
    pub fn new() -> Self {
        Self {
            settings: HashMap::new(),
            records: Vec::new(),
            next_id: 1,
        }
    }

    /// Number of stored records.
    pub fn record_count(&self) -> usize {
        self.records.len()
    }
}

impl SettingsStore for MemoryStore {
    fn get_setting(&self, key: &str) -> Result<Option<String>> {
        Ok(self.settings.get(key).cloned())
    }

    fn set_setting(&mut self, key: &str, value: &str) -> Result<()> {
        self.settings.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

impl RecordStore for MemoryStore {
    fn list_all_records(&self) -> Result<Vec<CredentialRecord>> {
        let mut records = self.records.clone();
        records.sort_by(|a, b| a.title.cmp(&b.title));
        Ok(records)
    }

    fn add_record(&mut self, record: &CredentialRecord) -> Result<i64> {
        let id = self.next_id;
        self.next_id += 1;

        let mut stored = record.clone();
        stored.id = id;
        self.records.push(stored);
        Ok(id)
    }

    fn update_record(&mut self, record: &CredentialRecord) -> Result<()> {
        let existing = self
            .records
            .iter_mut()
            .find(|r| r.id == record.id)
            .ok_or_else(|| Error::NotFound(format!("No record with id {}", record.id)))?;
        *existing = record.clone();
        Ok(())
    }

    fn delete_record(&mut self, id: i64) -> Result<()> {
        let before = self.records.len();
        self.records.retain(|r| r.id != id);
        if self.records.len() == before {
            return Err(Error::NotFound(format!("No record with id {}", id)));
        }
        Ok(())
    }

    fn search_records(&self, query: &str) -> Result<Vec<CredentialRecord>> {
        let needle = query.to_lowercase();
        let mut matches: Vec<CredentialRecord> = self
            .records
            .iter()
            .filter(|r| {
                r.title.to_lowercase().contains(&needle)
                    || r.website.to_lowercase().contains(&needle)
                    || r.username.to_lowercase().contains(&needle)
            })
            .cloned()
            .collect();
        matches.sort_by(|a, b| a.title.cmp(&b.title));
        Ok(matches)
    }
}

impl StoreBackup for MemoryStore {
    fn backup(&self) -> Result<String> {
        Err(Error::Backup(
            "In-memory store has no backing file".to_string(),
        ))
    }
}
