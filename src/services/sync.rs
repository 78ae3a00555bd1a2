// Sync Service
// Owns the process-wide settings record and is its only mutation surface
//
// Reads hand out snapshots; writes go through apply_settings/apply_incoming
// under one lock, so concurrent UI surfaces get last-writer-wins without
// tearing. Persistence and replication happen after the in-memory record is
// updated and never block or fail a mutation: losing a write to disk is
// recoverable, blocking the UI is not.

use std::sync::{Arc, RwLock};
use std::thread;
use std::time::{Duration, Instant};

use notify::{RecursiveMode, Watcher};
use serde_json::Value;

use crate::models::{Settings, SettingsDelta};
use crate::services::{emit_event, EventSink, SettingsManager, SETTINGS_UPDATED};

/// Replication seam. The wire protocol lives with the embedder; the core
/// only hands over the full serialized record after each local mutation.
pub trait SettingsTransport: Send + Sync {
    fn push_settings(&self, record: &Value);
}

/// Transport for embedders that replicate elsewhere (or not at all).
pub struct NoopTransport;

impl SettingsTransport for NoopTransport {
    fn push_settings(&self, _record: &Value) {}
}

/// Process-wide settings state container.
pub struct SyncService {
    settings: RwLock<Settings>,
    manager: Arc<SettingsManager>,
    event_sink: Arc<dyn EventSink>,
    transport: Arc<dyn SettingsTransport>,
}

impl SyncService {
    /// Build the container, seeding the record from the local cache (or
    /// defaults on first run).
    pub fn new(
        manager: Arc<SettingsManager>,
        event_sink: Arc<dyn EventSink>,
        transport: Arc<dyn SettingsTransport>,
    ) -> Self {
        let settings = manager.load();
        Self {
            settings: RwLock::new(settings),
            manager,
            event_sink,
            transport,
        }
    }

    /// Snapshot of the current record. Always total, never stale mid-read.
    pub fn settings(&self) -> Settings {
        self.settings
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Merge a delta into the record, then notify, persist, and replicate.
    /// The merge itself is synchronous and optimistic: callers see the new
    /// record immediately regardless of what storage does later.
    pub fn apply_settings(&self, delta: &SettingsDelta) -> Settings {
        let next = {
            let mut guard = self
                .settings
                .write()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            let next = guard.apply(delta);
            *guard = next.clone();
            next
        };

        emit_event(self.event_sink.as_ref(), SETTINGS_UPDATED, &next);
        self.persist(&next);
        match serde_json::to_value(&next) {
            Ok(record) => self.transport.push_settings(&record),
            Err(error) => log::warn!("Failed to serialize settings for replication: {error}"),
        }

        next
    }

    /// Fold in a record that crossed the process boundary (remote sync
    /// payload, cold-start cache). The payload is untrusted and goes
    /// through the full tolerant parse; nothing is pushed back out.
    pub fn apply_incoming(&self, raw: &Value) -> Settings {
        let parsed = Settings::parse(raw);

        let changed = {
            let mut guard = self
                .settings
                .write()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            if *guard == parsed {
                false
            } else {
                *guard = parsed.clone();
                true
            }
        };

        if changed {
            emit_event(self.event_sink.as_ref(), SETTINGS_UPDATED, &parsed);
            self.persist(&parsed);
        }

        parsed
    }

    /// Reset to defaults and drop the local cache (logout / data wipe).
    pub fn reset(&self) {
        let defaults = Settings::default();
        {
            let mut guard = self
                .settings
                .write()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            *guard = defaults.clone();
        }
        if let Err(error) = self.manager.clear_data() {
            log::warn!("Failed to clear settings storage: {error}");
        }
        emit_event(self.event_sink.as_ref(), SETTINGS_UPDATED, &defaults);
    }

    fn persist(&self, settings: &Settings) {
        if let Err(error) = self.manager.save(settings) {
            log::warn!("Failed to persist settings: {error}");
        }
    }

    /// Watch the settings file for writes from outside the process and fold
    /// them back in. Runs on its own thread for the life of the process.
    pub fn start_watcher(self: &Arc<Self>) {
        let service = Arc::clone(self);
        let settings_path = service.manager.settings_path().clone();
        let watch_dir = match settings_path.parent() {
            Some(parent) => parent.to_path_buf(),
            None => settings_path.clone(),
        };

        thread::spawn(move || {
            let (tx, rx) = std::sync::mpsc::channel();
            let mut watcher = match notify::recommended_watcher(tx) {
                Ok(watcher) => watcher,
                Err(error) => {
                    log::warn!("Settings watcher failed to start: {error}");
                    return;
                }
            };

            if let Err(error) = watcher.watch(&watch_dir, RecursiveMode::NonRecursive) {
                log::warn!("Failed to watch settings directory: {error}");
                return;
            }

            let mut last_update = Instant::now();
            for event in rx {
                if event.is_err() {
                    continue;
                }

                // Debounce: an atomic replace produces several fs events,
                // and our own saves land here too
                let now = Instant::now();
                if now.duration_since(last_update) < Duration::from_secs(1) {
                    continue;
                }
                last_update = now;

                let current = service.settings();
                let reloaded = service.manager.reload();
                if reloaded != current {
                    {
                        let mut guard = service
                            .settings
                            .write()
                            .unwrap_or_else(|poisoned| poisoned.into_inner());
                        *guard = reloaded.clone();
                    }
                    emit_event(service.event_sink.as_ref(), SETTINGS_UPDATED, &reloaded);
                }
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::EventBus;
    use serde_json::json;
    use std::sync::Mutex;
    use tempfile::tempdir;

    struct RecordingTransport {
        pushed: Mutex<Vec<Value>>,
    }

    impl RecordingTransport {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                pushed: Mutex::new(Vec::new()),
            })
        }

        fn pushed(&self) -> Vec<Value> {
            self.pushed.lock().unwrap().clone()
        }
    }

    impl SettingsTransport for RecordingTransport {
        fn push_settings(&self, record: &Value) {
            self.pushed.lock().unwrap().push(record.clone());
        }
    }

    fn service_with(
        dir: &std::path::Path,
    ) -> (Arc<SyncService>, EventBus, Arc<RecordingTransport>) {
        let manager = Arc::new(SettingsManager::new(dir.to_path_buf()));
        let bus = EventBus::new();
        let transport = RecordingTransport::new();
        let service = Arc::new(SyncService::new(
            manager,
            Arc::new(bus.clone()),
            transport.clone(),
        ));
        (service, bus, transport)
    }

    #[test]
    fn test_apply_updates_notifies_persists_replicates() {
        let temp = tempdir().unwrap();
        let (service, bus, transport) = service_with(temp.path());
        let mut rx = bus.subscribe();

        let next = service.apply_settings(&SettingsDelta {
            view_inline: Some(true),
            ..SettingsDelta::default()
        });
        assert!(next.view_inline);
        assert!(service.settings().view_inline);

        let event = rx.try_recv().unwrap();
        assert_eq!(event.event, SETTINGS_UPDATED);
        assert_eq!(event.payload["viewInline"], json!(true));

        let pushed = transport.pushed();
        assert_eq!(pushed.len(), 1);
        assert_eq!(pushed[0]["viewInline"], json!(true));

        // Survives a cold start
        let manager = SettingsManager::new(temp.path().to_path_buf());
        assert!(manager.load().view_inline);
    }

    #[test]
    fn test_incoming_is_parsed_not_replicated() {
        let temp = tempdir().unwrap();
        let (service, bus, transport) = service_with(temp.path());
        let mut rx = bus.subscribe();

        let parsed = service.apply_incoming(&json!({
            "viewInline": "not a boolean",
            "expandTodos": false,
            "futureFeature": { "from": "newer client" },
        }));
        assert!(!parsed.view_inline);
        assert!(!parsed.expand_todos);
        assert_eq!(parsed.extra["futureFeature"], json!({ "from": "newer client" }));

        assert_eq!(rx.try_recv().unwrap().event, SETTINGS_UPDATED);
        // Echoing a synced record back out would loop
        assert!(transport.pushed().is_empty());

        // An identical payload changes nothing and stays silent
        service.apply_incoming(&json!({
            "viewInline": "not a boolean",
            "expandTodos": false,
            "futureFeature": { "from": "newer client" },
        }));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_sequential_writes_are_last_writer_wins() {
        let temp = tempdir().unwrap();
        let (service, _bus, _transport) = service_with(temp.path());

        service.apply_settings(&SettingsDelta {
            avatar_style: Some("gradient".to_string()),
            ..SettingsDelta::default()
        });
        service.apply_settings(&SettingsDelta {
            avatar_style: Some("pixelated".to_string()),
            ..SettingsDelta::default()
        });

        assert_eq!(service.settings().avatar_style, "pixelated");
    }

    #[test]
    fn test_incoming_does_not_drop_concurrent_unknowns() {
        let temp = tempdir().unwrap();
        let (service, _bus, _transport) = service_with(temp.path());

        service.apply_incoming(&json!({ "futureFeature": 7 }));
        let next = service.apply_settings(&SettingsDelta {
            view_inline: Some(true),
            ..SettingsDelta::default()
        });

        // The read-modify-write cycle kept the newer client's field
        assert_eq!(next.extra["futureFeature"], json!(7));
        assert!(next.view_inline);
    }

    #[test]
    fn test_reset_returns_to_defaults() {
        let temp = tempdir().unwrap();
        let (service, _bus, _transport) = service_with(temp.path());

        service.apply_settings(&SettingsDelta {
            view_inline: Some(true),
            ..SettingsDelta::default()
        });
        service.reset();

        assert_eq!(service.settings(), Settings::default());
        let manager = SettingsManager::new(temp.path().to_path_buf());
        assert_eq!(manager.load(), Settings::default());
    }
}
