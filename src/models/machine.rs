// Machine Model
// A development machine running the Tether daemon, as synced to the client

use serde::{Deserialize, Serialize};

/// Daemon-reported machine metadata. Everything is optional: older daemons
/// report less.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MachineMetadata {
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub host: Option<String>,
    #[serde(default)]
    pub home_dir: Option<String>,
}

/// A known machine. Ids are assigned daemon-side and opaque here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Machine {
    pub id: String,
    #[serde(default)]
    pub metadata: Option<MachineMetadata>,
}

impl Machine {
    /// Display label: configured name first, bare host as fallback.
    pub fn label(&self) -> Option<&str> {
        let metadata = self.metadata.as_ref()?;
        metadata
            .display_name
            .as_deref()
            .or(metadata.host.as_deref())
    }

    /// The daemon user's home directory, when reported.
    pub fn home_dir(&self) -> Option<&str> {
        self.metadata.as_ref()?.home_dir.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_label_prefers_display_name() {
        let machine: Machine = serde_json::from_value(json!({
            "id": "m1",
            "metadata": { "displayName": "Workstation", "host": "ws.local" },
        }))
        .unwrap();
        assert_eq!(machine.label(), Some("Workstation"));

        let machine: Machine = serde_json::from_value(json!({
            "id": "m2",
            "metadata": { "host": "ws.local" },
        }))
        .unwrap();
        assert_eq!(machine.label(), Some("ws.local"));

        let machine: Machine = serde_json::from_value(json!({ "id": "m3" })).unwrap();
        assert_eq!(machine.label(), None);
        assert_eq!(machine.home_dir(), None);
    }
}
