//! Credential record model.

use chrono::Utc;

/// A stored website login.
///
/// The secret itself lives in `ciphertext`, encrypted under the session
/// working key with the per-encryption `iv`. The two are an atomic pair:
/// mutating one without the other corrupts the record, so every
/// create/update writes both together. All other fields are plaintext
/// metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialRecord {
    /// Store-assigned identifier (0 until first persisted).
    pub id: i64,
    pub title: String,
    pub website: String,
    pub username: String,
    /// Encrypted password field.
    pub ciphertext: Vec<u8>,
    /// IV the ciphertext was produced with.
    pub iv: Vec<u8>,
    pub category: String,
    pub notes: String,
    /// Creation time, ms since epoch.
    pub created_at: i64,
    /// Last update time, ms since epoch.
    pub updated_at: i64,
}

impl CredentialRecord {
    /// Build an unpersisted record with both timestamps set to now.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        title: impl Into<String>,
        website: impl Into<String>,
        username: impl Into<String>,
        ciphertext: Vec<u8>,
        iv: Vec<u8>,
        category: impl Into<String>,
        notes: impl Into<String>,
    ) -> Self {
        let now = Utc::now().timestamp_millis();
        Self {
            id: 0,
            title: title.into(),
            website: website.into(),
            username: username.into(),
            ciphertext,
            iv,
            category: category.into(),
            notes: notes.into(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Replace the ciphertext+iv pair and bump `updated_at`.
    ///
    /// The only sanctioned way to mutate the encrypted fields.
    pub fn set_encrypted(&mut self, ciphertext: Vec<u8>, iv: Vec<u8>) {
        self.ciphertext = ciphertext;
        self.iv = iv;
        self.updated_at = Utc::now().timestamp_millis();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_record_timestamps() {
        let record = CredentialRecord::new(
            "Example",
            "https://example.com",
            "alice",
            vec![1, 2, 3],
            vec![0; 16],
            "General",
            "",
        );

        assert_eq!(record.id, 0);
        assert_eq!(record.created_at, record.updated_at);
        assert!(record.created_at > 0);
    }

    #[test]
    fn test_set_encrypted_replaces_pair() {
        let mut record = CredentialRecord::new(
            "Example",
            "",
            "alice",
            vec![1, 2, 3],
            vec![0; 16],
            "General",
            "",
        );
        let before = record.updated_at;

        record.set_encrypted(vec![9, 9, 9], vec![1; 16]);

        assert_eq!(record.ciphertext, vec![9, 9, 9]);
        assert_eq!(record.iv, vec![1; 16]);
        assert!(record.updated_at >= before);
    }
}
