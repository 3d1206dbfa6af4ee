use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Group {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    /// The creator is always a member and cannot be removed.
    pub created_by: String,
    pub member_ids: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl Group {
    pub fn is_member(&self, user_id: &str) -> bool {
        self.member_ids.iter().any(|id| id == user_id)
    }

    pub fn is_creator(&self, user_id: &str) -> bool {
        self.created_by == user_id
    }
}
