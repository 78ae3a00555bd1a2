// Settings Manager Service
// Handles settings persistence for the local client cache

use std::path::PathBuf;
use std::sync::RwLock;

use serde_json::Value;
use thiserror::Error;

use crate::models::Settings;
use crate::services::Encryption;

const SETTINGS_FILE: &str = "settings.json";

/// Fields in settings.json that hold secrets and are encrypted at rest.
const SENSITIVE_FIELDS: &[&str] = &["inferenceOpenAIKey"];

/// Errors surfaced by the write path. The read path never fails: a missing
/// or corrupt file degrades to defaults.
#[derive(Debug, Error)]
pub enum SettingsStoreError {
    #[error("Failed to write settings: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to serialize settings: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Default app data directory for embedders that do not supply one.
pub fn default_app_data_dir() -> PathBuf {
    dirs_next::data_dir()
        .map(|dir| dir.join("Tether"))
        .unwrap_or_else(|| PathBuf::from("data"))
}

/// Manages settings storage and retrieval
pub struct SettingsManager {
    settings_path: PathBuf,
    app_data_dir: PathBuf,
    cache: RwLock<Option<Settings>>,
}

impl SettingsManager {
    /// Create a new SettingsManager with the given app data directory
    pub fn new(app_data_dir: PathBuf) -> Self {
        let settings_path = app_data_dir.join(SETTINGS_FILE);
        Self {
            settings_path,
            app_data_dir,
            cache: RwLock::new(None),
        }
    }

    pub fn settings_path(&self) -> &PathBuf {
        &self.settings_path
    }

    /// Load settings from disk. Never fails: a missing file yields defaults
    /// (which are written out), an unreadable one is set aside and replaced
    /// by defaults.
    pub fn load(&self) -> Settings {
        if let Ok(cache) = self.cache.read() {
            if let Some(ref settings) = *cache {
                return settings.clone();
            }
        }

        let settings = if self.settings_path.exists() {
            match self.read_from_disk() {
                Ok(settings) => settings,
                Err(error) => {
                    log::warn!("Settings file unreadable, reverting to defaults: {error}");
                    self.quarantine_corrupt_file();
                    let defaults = Settings::default();
                    if let Err(error) = self.save_internal(&defaults) {
                        log::warn!("Failed to write default settings: {error}");
                    }
                    defaults
                }
            }
        } else {
            let defaults = Settings::default();
            if let Err(error) = self.save_internal(&defaults) {
                log::warn!("Failed to write default settings: {error}");
            }
            defaults
        };

        if let Ok(mut cache) = self.cache.write() {
            *cache = Some(settings.clone());
        }

        settings
    }

    /// Drop the cache and load straight from disk. Used when the file was
    /// changed from outside the process.
    pub fn reload(&self) -> Settings {
        if let Ok(mut cache) = self.cache.write() {
            *cache = None;
        }
        self.load()
    }

    /// Save settings to disk
    pub fn save(&self, settings: &Settings) -> Result<(), SettingsStoreError> {
        self.save_internal(settings)?;

        if let Ok(mut cache) = self.cache.write() {
            *cache = Some(settings.clone());
        }

        Ok(())
    }

    /// Delete the settings file and cache (logout / local wipe). The
    /// embedder removes the rest of the app data directory itself.
    pub fn clear_data(&self) -> Result<(), SettingsStoreError> {
        if let Ok(mut cache) = self.cache.write() {
            *cache = None;
        }

        if self.settings_path.exists() {
            std::fs::remove_file(&self.settings_path)?;
        }

        Ok(())
    }

    fn read_from_disk(&self) -> Result<Settings, String> {
        let content = std::fs::read_to_string(&self.settings_path)
            .map_err(|e| format!("Failed to read settings: {e}"))?;

        let mut raw: Value = serde_json::from_str(&content)
            .map_err(|e| format!("Failed to parse settings: {e}"))?;

        // Decrypt before resolving so the in-memory record always holds
        // plaintext secrets
        self.decrypt_sensitive_fields(&mut raw);

        let settings = Settings::parse(&raw);

        // Write back when resolution changed the stored form (migrations,
        // newly defaulted fields) so the file converges to the current
        // schema. Unknown keys ride along untouched.
        match serde_json::to_value(&settings) {
            Ok(resolved) => {
                if resolved != raw {
                    log::info!("Settings file modernized on load");
                    if let Err(error) = self.save_internal(&settings) {
                        log::warn!("Failed to write back modernized settings: {error}");
                    }
                }
            }
            Err(error) => {
                log::warn!("Failed to re-serialize settings: {error}");
            }
        }

        Ok(settings)
    }

    /// Internal save without cache update
    fn save_internal(&self, settings: &Settings) -> Result<(), SettingsStoreError> {
        if let Some(parent) = self.settings_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let mut value = serde_json::to_value(settings)?;

        // Encrypt secrets before anything touches the disk
        self.encrypt_sensitive_fields(&mut value);

        let content = serde_json::to_string_pretty(&value)?;

        // Write-then-rename so a crash never leaves a half-written file
        let tmp = self.settings_path.with_extension("json.tmp");
        std::fs::write(&tmp, content)?;
        std::fs::rename(&tmp, &self.settings_path)?;

        Ok(())
    }

    /// Move an unreadable settings file aside so it can be recovered
    fn quarantine_corrupt_file(&self) {
        let stamp = chrono::Utc::now().format("%Y%m%d_%H%M%S");
        let backup = self
            .settings_path
            .with_extension(format!("json.bak-{stamp}"));
        match std::fs::rename(&self.settings_path, &backup) {
            Ok(()) => log::warn!("Corrupt settings file moved to {backup:?}"),
            Err(error) => log::warn!("Failed to set aside corrupt settings file: {error}"),
        }
    }

    /// Decrypt sensitive fields in a JSON Value (ENC:: -> plaintext)
    fn decrypt_sensitive_fields(&self, value: &mut Value) {
        if let Value::Object(map) = value {
            for &field in SENSITIVE_FIELDS {
                if let Some(Value::String(val)) = map.get(field) {
                    if Encryption::is_encrypted(val) {
                        match Encryption::decrypt_token(val, &self.app_data_dir) {
                            Ok(plaintext) => {
                                map.insert(field.to_string(), Value::String(plaintext));
                            }
                            Err(error) => {
                                log::warn!("Failed to decrypt settings field '{field}': {error}");
                            }
                        }
                    }
                }
            }
        }
    }

    /// Encrypt sensitive fields in a JSON Value (plaintext -> ENC::)
    fn encrypt_sensitive_fields(&self, value: &mut Value) {
        if let Value::Object(map) = value {
            for &field in SENSITIVE_FIELDS {
                if let Some(Value::String(val)) = map.get(field) {
                    if !val.is_empty() && !Encryption::is_encrypted(val) {
                        match Encryption::encrypt_token(val, &self.app_data_dir) {
                            Ok(encrypted) => {
                                map.insert(field.to_string(), Value::String(encrypted));
                            }
                            Err(error) => {
                                log::warn!("Failed to encrypt settings field '{field}': {error}");
                            }
                        }
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    #[test]
    fn test_default_app_data_dir_is_usable() {
        let dir = default_app_data_dir();
        assert!(dir.ends_with("Tether") || dir == PathBuf::from("data"));
    }

    #[test]
    fn test_load_missing_file_writes_defaults() {
        let temp = tempdir().unwrap();
        let manager = SettingsManager::new(temp.path().to_path_buf());

        let settings = manager.load();
        assert_eq!(settings, Settings::default());
        assert!(manager.settings_path().exists());

        let content = std::fs::read_to_string(manager.settings_path()).unwrap();
        let doc: Value = serde_json::from_str(&content).unwrap();
        assert_eq!(doc["expandTodos"], json!(true));
        assert_eq!(doc["avatarStyle"], json!("brutalist"));
    }

    #[test]
    fn test_save_load_round_trip_keeps_unknown_fields() {
        let temp = tempdir().unwrap();
        let manager = SettingsManager::new(temp.path().to_path_buf());

        let mut settings = Settings {
            view_inline: true,
            ..Settings::default()
        };
        settings
            .extra
            .insert("futureFeature".to_string(), json!({ "nested": [1, 2, 3] }));
        manager.save(&settings).unwrap();

        // On disk and through a fresh manager
        let content = std::fs::read_to_string(manager.settings_path()).unwrap();
        let doc: Value = serde_json::from_str(&content).unwrap();
        assert_eq!(doc["futureFeature"], json!({ "nested": [1, 2, 3] }));

        let fresh = SettingsManager::new(temp.path().to_path_buf());
        assert_eq!(fresh.load(), settings);
    }

    #[test]
    fn test_corrupt_file_degrades_to_defaults_and_is_kept() {
        let temp = tempdir().unwrap();
        let manager = SettingsManager::new(temp.path().to_path_buf());
        std::fs::write(manager.settings_path(), "{ not json").unwrap();

        assert_eq!(manager.load(), Settings::default());

        let backups: Vec<_> = std::fs::read_dir(temp.path())
            .unwrap()
            .filter_map(|entry| entry.ok())
            .filter(|entry| {
                entry
                    .file_name()
                    .to_string_lossy()
                    .starts_with("settings.json.bak-")
            })
            .collect();
        assert_eq!(backups.len(), 1);
        assert!(manager.settings_path().exists());
    }

    #[test]
    fn test_legacy_file_is_modernized_on_load() {
        let temp = tempdir().unwrap();
        let manager = SettingsManager::new(temp.path().to_path_buf());
        std::fs::write(
            manager.settings_path(),
            serde_json::to_string(&json!({
                "preferredLanguage": "zh",
                "futureFeature": "keep me",
            }))
            .unwrap(),
        )
        .unwrap();

        let settings = manager.load();
        assert_eq!(settings.preferred_language.as_deref(), Some("zh-Hans"));
        assert_eq!(settings.extra["futureFeature"], json!("keep me"));

        let content = std::fs::read_to_string(manager.settings_path()).unwrap();
        let doc: Value = serde_json::from_str(&content).unwrap();
        assert_eq!(doc["preferredLanguage"], json!("zh-Hans"));
        assert_eq!(doc["futureFeature"], json!("keep me"));
        // The record on disk is now total
        assert_eq!(doc["expandTodos"], json!(true));
    }

    #[test]
    fn test_api_key_is_encrypted_at_rest() {
        let temp = tempdir().unwrap();
        let manager = SettingsManager::new(temp.path().to_path_buf());

        let settings = Settings {
            inference_open_ai_key: Some("sk-very-secret".to_string()),
            ..Settings::default()
        };
        manager.save(&settings).unwrap();

        let content = std::fs::read_to_string(manager.settings_path()).unwrap();
        assert!(!content.contains("sk-very-secret"));
        let doc: Value = serde_json::from_str(&content).unwrap();
        let stored = doc["inferenceOpenAIKey"].as_str().unwrap();
        assert!(Encryption::is_encrypted(stored));

        let fresh = SettingsManager::new(temp.path().to_path_buf());
        assert_eq!(
            fresh.load().inference_open_ai_key.as_deref(),
            Some("sk-very-secret")
        );
    }

    #[test]
    fn test_clear_data_removes_file_and_cache() {
        let temp = tempdir().unwrap();
        let manager = SettingsManager::new(temp.path().to_path_buf());
        manager
            .save(&Settings {
                view_inline: true,
                ..Settings::default()
            })
            .unwrap();

        manager.clear_data().unwrap();
        assert!(!manager.settings_path().exists());

        // A fresh load starts over from defaults
        assert_eq!(manager.load(), Settings::default());
    }

    #[test]
    fn test_reload_picks_up_external_changes() {
        let temp = tempdir().unwrap();
        let manager = SettingsManager::new(temp.path().to_path_buf());
        manager.load();

        // Another process rewrites the file behind our back
        std::fs::write(
            manager.settings_path(),
            serde_json::to_string(&json!({ "viewInline": true })).unwrap(),
        )
        .unwrap();

        // The cache still answers until a reload is forced
        assert!(!manager.load().view_inline);
        assert!(manager.reload().view_inline);
    }
}
