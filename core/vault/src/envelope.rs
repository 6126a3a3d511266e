//! Encrypted vault export/import.
//!
//! The export file is self-contained: `IV(16 bytes) || ciphertext`, where
//! the ciphertext decrypts to a JSON payload holding every record with
//! its ciphertext and IV base64-encoded, plus version, export timestamp,
//! and device name. The payload is encrypted under the exporting
//! session's working key, so the file opens only for someone who knows
//! that vault's master password — there is no separate export passphrase.
//!
//! Record passwords stay encrypted inside the payload; an export never
//! contains a plaintext secret at any layer.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use strongbox_common::{Error, Result};
use strongbox_crypto::{cipher, WorkingKey, IV_LENGTH};
use strongbox_store::CredentialRecord;

/// Current export format version.
pub const EXPORT_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ExportPayload {
    version: u32,
    /// Export time, ms since epoch.
    export_date: i64,
    device_name: String,
    records: Vec<ExportedRecord>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ExportedRecord {
    id: String,
    title: String,
    website: String,
    username: String,
    /// Base64 of the record's ciphertext.
    encrypted_data: String,
    /// Base64 of the record's IV.
    iv: String,
    category: String,
    notes: String,
    /// The record's `updated_at`, ms since epoch.
    last_modified: i64,
}

/// Serialize and encrypt all records into an export file.
///
/// # Postconditions
/// - Output is `IV || ciphertext` with a fresh random IV
/// - Record ciphertexts are embedded as-is (base64), not re-encrypted
pub fn export_vault(
    records: &[CredentialRecord],
    key: &WorkingKey,
    device_name: &str,
) -> Result<Vec<u8>> {
    let payload = ExportPayload {
        version: EXPORT_VERSION,
        export_date: Utc::now().timestamp_millis(),
        device_name: device_name.to_string(),
        records: records
            .iter()
            .map(|record| ExportedRecord {
                id: record.id.to_string(),
                title: record.title.clone(),
                website: record.website.clone(),
                username: record.username.clone(),
                encrypted_data: STANDARD.encode(&record.ciphertext),
                iv: STANDARD.encode(&record.iv),
                category: record.category.clone(),
                notes: record.notes.clone(),
                last_modified: record.updated_at,
            })
            .collect(),
    };

    let json = serde_json::to_string(&payload).map_err(|e| Error::Serialization(e.to_string()))?;
    let field = cipher::encrypt_field(&json, key)?;

    let mut out = Vec::with_capacity(IV_LENGTH + field.ciphertext.len());
    out.extend_from_slice(&field.iv);
    out.extend_from_slice(&field.ciphertext);

    info!(records = records.len(), "Vault exported");
    Ok(out)
}

/// Decrypt and parse an export file back into credential records.
///
/// Imported records keep their exported `updated_at` and get a fresh
/// `created_at`; ids are carried over and reassigned by the store on
/// insert.
///
/// # Errors
/// - `ImportDecryption` when the file cannot be decrypted (wrong key,
///   truncated, or corrupted file)
/// - `ImportParse` when the decrypted payload is not a valid export
///   (bad JSON, bad base64, malformed id)
pub fn import_vault(data: &[u8], key: &WorkingKey) -> Result<Vec<CredentialRecord>> {
    if data.len() <= IV_LENGTH {
        return Err(Error::ImportDecryption(
            "File too short to contain an export".to_string(),
        ));
    }

    let (iv, ciphertext) = data.split_at(IV_LENGTH);
    let json = cipher::decrypt_field(ciphertext, iv, key)
        .map_err(|e| Error::ImportDecryption(e.to_string()))?;

    let payload: ExportPayload =
        serde_json::from_str(&json).map_err(|e| Error::ImportParse(e.to_string()))?;

    debug!(
        version = payload.version,
        device = %payload.device_name,
        records = payload.records.len(),
        "Parsed export payload"
    );

    let now = Utc::now().timestamp_millis();
    payload
        .records
        .into_iter()
        .map(|dto| {
            let ciphertext = STANDARD
                .decode(&dto.encrypted_data)
                .map_err(|e| Error::ImportParse(format!("Invalid record ciphertext: {}", e)))?;
            let iv = STANDARD
                .decode(&dto.iv)
                .map_err(|e| Error::ImportParse(format!("Invalid record IV: {}", e)))?;
            let id: i64 = dto
                .id
                .parse()
                .map_err(|e| Error::ImportParse(format!("Invalid record id: {}", e)))?;

            Ok(CredentialRecord {
                id,
                title: dto.title,
                website: dto.website,
                username: dto.username,
                ciphertext,
                iv,
                category: dto.category,
                notes: dto.notes,
                created_at: now,
                updated_at: dto.last_modified,
            })
        })
        .collect()
}

/// Cheap structural check: could these bytes be an export file?
///
/// Only verifies there is room for an IV plus at least one ciphertext
/// byte. Never inspects content.
pub fn looks_like_export_file(data: &[u8]) -> bool {
    data.len() > IV_LENGTH
}
