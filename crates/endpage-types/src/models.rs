use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A registered account. `password` holds the argon2 hash, never the
/// plaintext. The struct is deliberately not serializable: API responses
/// go through `api::UserResponse` so the hash cannot leak.
#[derive(Debug, Clone)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub password: String,
    pub created_at: DateTime<Utc>,
}

/// A goodbye page. `creator_id` is set from the authenticated caller at
/// creation time and never changes afterwards.
#[derive(Debug, Clone)]
pub struct Page {
    pub id: Uuid,
    pub creator_name: String,
    pub creator_id: Uuid,
    pub reason_of_leaving: String,
    pub theme_name: String,
    pub custom_theme: Option<CustomTheme>,
    pub creator_message: String,
    pub images: Vec<String>,
    pub gifs: Vec<String>,
    pub videos: Vec<String>,
    pub liked_by: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl Page {
    pub fn likes(&self) -> usize {
        self.liked_by.len()
    }
}

/// Three-color override of the fixed palette referenced by `theme_name`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomTheme {
    pub bg_color: String,
    pub text_color: String,
    pub accent_color: String,
}
