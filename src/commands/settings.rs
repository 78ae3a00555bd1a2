// Settings Commands
// Thin consumer-facing operations over the sync service

use serde_json::Value;

use crate::models::{record_machine_path, Settings, SettingsDelta};
use crate::services::SyncService;

/// Current total record
pub fn get_settings(sync: &SyncService) -> Settings {
    sync.settings()
}

/// Apply a partial update. Callers hold type-correct values (a toggle
/// flipping a bool, a picker storing a mode string); nothing is validated
/// beyond the merge itself.
pub fn update_settings(sync: &SyncService, delta: &SettingsDelta) -> Settings {
    sync.apply_settings(delta)
}

/// Fold in a record that arrived from outside the process boundary
pub fn import_settings(sync: &SyncService, raw: &Value) -> Settings {
    sync.apply_incoming(raw)
}

/// Remember that a session was started on `machine_id` at `path`. The MRU
/// update is an ordinary field delta through the merge engine.
pub fn record_path_use(sync: &SyncService, machine_id: &str, path: &str) -> Settings {
    let recents = sync.settings().recent_machine_paths;
    let updated = record_machine_path(&recents, machine_id, path);
    sync.apply_settings(&SettingsDelta {
        recent_machine_paths: Some(updated),
        ..SettingsDelta::default()
    })
}

/// The voice agent to talk to: the stored id unless blank, the shipped
/// default otherwise.
pub fn effective_voice_agent_id(settings: &Settings) -> String {
    let stored = settings.voice_assistant_agent_id.trim();
    if stored.is_empty() {
        Settings::default().voice_assistant_agent_id
    } else {
        stored.to_string()
    }
}

/// Store a voice agent id edit; clearing the field restores the default.
pub fn set_voice_agent_id(sync: &SyncService, input: &str) -> Settings {
    let trimmed = input.trim();
    let value = if trimmed.is_empty() {
        Settings::default().voice_assistant_agent_id
    } else {
        trimmed.to_string()
    };
    sync.apply_settings(&SettingsDelta {
        voice_assistant_agent_id: Some(value),
        ..SettingsDelta::default()
    })
}
