//! Field-level encryption using AES-256-CBC with PKCS7 padding.
//!
//! Each call generates a fresh random 16-byte IV. The ciphertext and IV
//! form an atomic pair: callers must persist both together, and neither
//! may be rewritten without the other.
//!
//! There is no authentication tag in this format. A wrong key, corrupted
//! ciphertext, or mismatched IV surfaces as a padding (or UTF-8) failure
//! on decryption, which is the only wrong-password signal available at
//! the field level.

use aes::cipher::{block_padding::Pkcs7, BlockDecryptMut, BlockEncryptMut, KeyIvInit};

use crate::keys::{WorkingKey, IV_LENGTH};
use strongbox_common::{Error, Result};

type Aes256CbcEnc = cbc::Encryptor<aes::Aes256>;
type Aes256CbcDec = cbc::Decryptor<aes::Aes256>;

/// Ciphertext plus the IV it was produced with.
///
/// The two fields must be persisted together in every create/update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncryptedField {
    /// Block-aligned CBC ciphertext.
    pub ciphertext: Vec<u8>,
    /// Random IV used for this encryption.
    pub iv: [u8; IV_LENGTH],
}

/// Encrypt a plaintext field under the working key.
///
/// # Postconditions
/// - The IV is freshly generated from the CSPRNG and unique per call
/// - `ciphertext.len()` is a multiple of the AES block size
pub fn encrypt_field(plaintext: &str, key: &WorkingKey) -> Result<EncryptedField> {
    use rand::RngCore;

    let mut iv = [0u8; IV_LENGTH];
    rand::thread_rng().fill_bytes(&mut iv);

    let ciphertext = Aes256CbcEnc::new(key.as_bytes().into(), (&iv).into())
        .encrypt_padded_vec_mut::<Pkcs7>(plaintext.as_bytes());

    Ok(EncryptedField { ciphertext, iv })
}

/// Decrypt a field previously produced by [`encrypt_field`].
///
/// # Errors
/// - Returns `Decryption` if the key/iv/ciphertext combination is invalid:
///   wrong key, corrupted data, padding mismatch, or non-UTF-8 plaintext
pub fn decrypt_field(ciphertext: &[u8], iv: &[u8], key: &WorkingKey) -> Result<String> {
    let decryptor = Aes256CbcDec::new_from_slices(key.as_bytes(), iv)
        .map_err(|_| Error::Decryption(format!("IV must be {} bytes", IV_LENGTH)))?;

    let plaintext = decryptor
        .decrypt_padded_vec_mut::<Pkcs7>(ciphertext)
        .map_err(|_| Error::Decryption("Padding check failed".to_string()))?;

    String::from_utf8(plaintext)
        .map_err(|_| Error::Decryption("Plaintext is not valid UTF-8".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::{WorkingKey, KEY_LENGTH};
    use proptest::prelude::*;
    use std::collections::HashSet;

    fn test_key(byte: u8) -> WorkingKey {
        WorkingKey::from_bytes([byte; KEY_LENGTH])
    }

    #[test]
    fn test_encrypt_decrypt_roundtrip() {
        let key = test_key(42);
        let plaintext = "correct horse battery staple";

        let field = encrypt_field(plaintext, &key).unwrap();
        let decrypted = decrypt_field(&field.ciphertext, &field.iv, &key).unwrap();

        assert_eq!(decrypted, plaintext);
    }

    #[test]
    fn test_ciphertext_is_block_aligned() {
        let key = test_key(42);
        let field = encrypt_field("short", &key).unwrap();

        assert_eq!(field.ciphertext.len() % 16, 0);
        // PKCS7 always pads, even block-sized input
        let exact = encrypt_field("sixteen bytes!!!", &key).unwrap();
        assert_eq!(exact.ciphertext.len(), 32);
    }

    #[test]
    fn test_fresh_iv_each_call() {
        let key = test_key(42);

        let a = encrypt_field("same plaintext", &key).unwrap();
        let b = encrypt_field("same plaintext", &key).unwrap();

        assert_ne!(a.iv, b.iv);
        assert_ne!(a.ciphertext, b.ciphertext);
    }

    #[test]
    fn test_no_duplicate_iv_in_10_000_calls() {
        let key = test_key(7);
        let mut seen = HashSet::new();

        for _ in 0..10_000 {
            let field = encrypt_field("x", &key).unwrap();
            assert!(seen.insert(field.iv), "duplicate IV generated");
        }
    }

    #[test]
    fn test_wrong_key_fails() {
        let field = encrypt_field("secret data", &test_key(1)).unwrap();
        let result = decrypt_field(&field.ciphertext, &field.iv, &test_key(2));

        assert!(matches!(result, Err(strongbox_common::Error::Decryption(_))));
    }

    #[test]
    fn test_tampered_ciphertext_fails() {
        let key = test_key(42);
        let mut field = encrypt_field("important data", &key).unwrap();
        let last = field.ciphertext.len() - 1;
        field.ciphertext[last] ^= 0xFF;

        assert!(decrypt_field(&field.ciphertext, &field.iv, &key).is_err());
    }

    #[test]
    fn test_wrong_iv_length_fails() {
        let key = test_key(42);
        let field = encrypt_field("data", &key).unwrap();

        assert!(decrypt_field(&field.ciphertext, &field.iv[..8], &key).is_err());
    }

    #[test]
    fn test_empty_plaintext() {
        let key = test_key(42);
        let field = encrypt_field("", &key).unwrap();

        // One full padding block
        assert_eq!(field.ciphertext.len(), 16);
        assert_eq!(decrypt_field(&field.ciphertext, &field.iv, &key).unwrap(), "");
    }

    #[test]
    fn test_unicode_plaintext() {
        let key = test_key(42);
        let plaintext = "pässwörd 密码 🔐";

        let field = encrypt_field(plaintext, &key).unwrap();
        assert_eq!(
            decrypt_field(&field.ciphertext, &field.iv, &key).unwrap(),
            plaintext
        );
    }

    proptest! {
        #[test]
        fn prop_roundtrip_any_plaintext(plaintext in ".{0,512}", key_byte in any::<u8>()) {
            let key = test_key(key_byte);
            let field = encrypt_field(&plaintext, &key).unwrap();
            let decrypted = decrypt_field(&field.ciphertext, &field.iv, &key).unwrap();
            prop_assert_eq!(decrypted, plaintext);
        }
    }
}
