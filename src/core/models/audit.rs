use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Application-level action log entry.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AppLog {
    pub id: String,
    pub action: String,
    pub user_id: Option<String>,
    pub details: serde_json::Value,
    pub timestamp: DateTime<Utc>,
}

/// Per-group audit entry mirroring a mutating action.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GroupAudit {
    pub id: String,
    pub group_id: String,
    pub action: String,
    pub user_id: Option<String>,
    pub details: serde_json::Value,
    pub timestamp: DateTime<Utc>,
}
