use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Per-user supplementary record. Exactly one exists for every user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    pub user_id: Uuid,
    /// Path of the avatar relative to the media root.
    pub avatar: String,
    pub updated_at: DateTime<Utc>,
}

impl Profile {
    pub const DEFAULT_AVATAR: &'static str = "avatars/default.png";

    pub fn has_custom_avatar(&self) -> bool {
        self.avatar != Self::DEFAULT_AVATAR
    }
}
