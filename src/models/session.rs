// Session Model
// A coding-agent session record, as synced to the client

use serde::{Deserialize, Serialize};

/// Where a session ran. Older records may lack either field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionMetadata {
    #[serde(default)]
    pub machine_id: Option<String>,
    #[serde(default)]
    pub path: Option<String>,
}

/// A session record. Timestamps are epoch milliseconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub id: String,
    pub created_at: i64,
    #[serde(default)]
    pub updated_at: Option<i64>,
    #[serde(default)]
    pub metadata: Option<SessionMetadata>,
}

impl Session {
    /// Last activity: update time when present, creation time otherwise.
    pub fn last_activity_at(&self) -> i64 {
        self.updated_at.unwrap_or(self.created_at)
    }
}
