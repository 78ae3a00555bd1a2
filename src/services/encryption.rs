// Encryption Service
// At-rest protection for secret settings values using AES-256-GCM
//
// Secrets are encrypted under a per-install key kept next to the app data.
// Values are stored as "ENC::" + base64(nonce || ciphertext); anything
// without the prefix is treated as legacy plaintext, accepted on read and
// upgraded on the next save.

use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Nonce,
};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use rand::Rng;
use std::path::Path;
use zeroize::{Zeroize, Zeroizing};

const NONCE_LEN: usize = 12;
const KEY_LEN: usize = 32;

// Prefix for identifying encrypted values
const SECRET_PREFIX: &str = "ENC::";

const KEY_FILE_NAME: &str = ".device_key";

/// Encryption service for secret settings values
pub struct Encryption;

impl Encryption {
    /// Get or create the per-install encryption key.
    /// Returns a zeroizing key that is erased from memory on drop.
    fn get_or_create_device_key(app_data_dir: &Path) -> Result<Zeroizing<[u8; KEY_LEN]>, String> {
        let key_file = app_data_dir.join(KEY_FILE_NAME);

        if key_file.exists() {
            let mut key_data = std::fs::read(&key_file)
                .map_err(|e| format!("Failed to read device key: {e}"))?;

            if key_data.len() != KEY_LEN {
                key_data.zeroize();
                return Err("Invalid device key file".to_string());
            }

            let mut key = Zeroizing::new([0u8; KEY_LEN]);
            key.copy_from_slice(&key_data);
            key_data.zeroize();

            Ok(key)
        } else {
            let mut rng = rand::thread_rng();
            let key = Zeroizing::new(rng.gen::<[u8; KEY_LEN]>());

            std::fs::write(&key_file, *key)
                .map_err(|e| format!("Failed to save device key: {e}"))?;

            // Key file must not be readable by other users
            #[cfg(unix)]
            {
                use std::os::unix::fs::PermissionsExt;
                let perms = std::fs::Permissions::from_mode(0o600);
                std::fs::set_permissions(&key_file, perms)
                    .map_err(|e| format!("Failed to set key file permissions: {e}"))?;
            }

            Ok(key)
        }
    }

    /// Encrypt a secret value for storage.
    /// Empty and already-encrypted values pass through unchanged.
    pub fn encrypt_token(token: &str, app_data_dir: &Path) -> Result<String, String> {
        if token.is_empty() || token.starts_with(SECRET_PREFIX) {
            return Ok(token.to_string());
        }

        let device_key = Self::get_or_create_device_key(app_data_dir)?;

        let mut rng = rand::thread_rng();
        let nonce_bytes: [u8; NONCE_LEN] = rng.gen();

        let cipher = Aes256Gcm::new_from_slice(&*device_key)
            .map_err(|e| format!("Failed to create cipher: {e}"))?;
        let nonce = Nonce::from_slice(&nonce_bytes);

        let ciphertext = cipher
            .encrypt(nonce, token.as_bytes())
            .map_err(|e| format!("Token encryption failed: {e}"))?;

        let mut combined = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        combined.extend_from_slice(&nonce_bytes);
        combined.extend_from_slice(&ciphertext);

        Ok(format!("{}{}", SECRET_PREFIX, BASE64.encode(combined)))
    }

    /// Decrypt a stored secret value.
    /// Values without the prefix are returned as-is.
    pub fn decrypt_token(encrypted: &str, app_data_dir: &Path) -> Result<String, String> {
        if !encrypted.starts_with(SECRET_PREFIX) {
            return Ok(encrypted.to_string());
        }

        let device_key = Self::get_or_create_device_key(app_data_dir)?;

        let encoded = &encrypted[SECRET_PREFIX.len()..];
        let mut combined = BASE64
            .decode(encoded)
            .map_err(|e| format!("Failed to decode encrypted value: {e}"))?;

        if combined.len() < NONCE_LEN {
            combined.zeroize();
            return Err("Invalid encrypted value".to_string());
        }

        let cipher = Aes256Gcm::new_from_slice(&*device_key)
            .map_err(|e| format!("Failed to create cipher: {e}"))?;
        let nonce = Nonce::from_slice(&combined[..NONCE_LEN]);

        let plaintext = cipher
            .decrypt(nonce, &combined[NONCE_LEN..])
            .map_err(|e| format!("Decryption failed: {e}"))?;

        combined.zeroize();

        String::from_utf8(plaintext).map_err(|e| format!("Decrypted value is not UTF-8: {e}"))
    }

    /// Check whether a stored value is encrypted
    pub fn is_encrypted(value: &str) -> bool {
        value.starts_with(SECRET_PREFIX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_round_trip() {
        let temp = tempdir().unwrap();
        let encrypted = Encryption::encrypt_token("sk-secret-key", temp.path()).unwrap();
        assert!(Encryption::is_encrypted(&encrypted));
        assert_ne!(encrypted, "sk-secret-key");

        let decrypted = Encryption::decrypt_token(&encrypted, temp.path()).unwrap();
        assert_eq!(decrypted, "sk-secret-key");
    }

    #[test]
    fn test_empty_and_encrypted_values_pass_through() {
        let temp = tempdir().unwrap();
        assert_eq!(Encryption::encrypt_token("", temp.path()).unwrap(), "");

        let encrypted = Encryption::encrypt_token("value", temp.path()).unwrap();
        let twice = Encryption::encrypt_token(&encrypted, temp.path()).unwrap();
        assert_eq!(encrypted, twice);
    }

    #[test]
    fn test_legacy_plaintext_passes_through_decrypt() {
        let temp = tempdir().unwrap();
        assert_eq!(
            Encryption::decrypt_token("sk-plaintext", temp.path()).unwrap(),
            "sk-plaintext"
        );
    }

    #[test]
    fn test_decrypt_with_wrong_key_fails() {
        let temp_a = tempdir().unwrap();
        let temp_b = tempdir().unwrap();
        let encrypted = Encryption::encrypt_token("sk-secret-key", temp_a.path()).unwrap();
        assert!(Encryption::decrypt_token(&encrypted, temp_b.path()).is_err());
    }

    #[test]
    fn test_tampered_value_fails() {
        let temp = tempdir().unwrap();
        // Prime the device key, then hand decrypt a forged ciphertext
        Encryption::encrypt_token("sk-secret-key", temp.path()).unwrap();
        let forged = format!("ENC::{}", BASE64.encode(b"not a real nonce or ciphertext"));
        assert!(Encryption::decrypt_token(&forged, temp.path()).is_err());

        let truncated = format!("ENC::{}", BASE64.encode(b"short"));
        assert!(Encryption::decrypt_token(&truncated, temp.path()).is_err());
    }
}
