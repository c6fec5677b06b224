use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{CustomTheme, Page, User};

// -- JWT Claims --

/// Bearer token claims shared by the auth handlers and the request
/// middleware. Canonical definition lives here to eliminate duplication.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub username: String,
    pub exp: usize,
}

// -- Auth --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub id: Uuid,
    pub username: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
}

// -- Pages --

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CreatePageRequest {
    pub creator_name: String,
    pub reason_of_leaving: String,
    pub theme_name: String,
    pub custom_theme: Option<CustomTheme>,
    pub creator_message: String,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub gifs: Vec<String>,
    #[serde(default)]
    pub videos: Vec<String>,
}

/// Partial update. The id, creator id, liker set, and creation time are
/// not client-writable.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct UpdatePageRequest {
    pub creator_name: Option<String>,
    pub reason_of_leaving: Option<String>,
    pub theme_name: Option<String>,
    pub custom_theme: Option<CustomTheme>,
    pub creator_message: Option<String>,
    pub images: Option<Vec<String>>,
    pub gifs: Option<Vec<String>>,
    pub videos: Option<Vec<String>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageResponse {
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
    pub likes: usize,
    pub created_at: DateTime<Utc>,
}

impl From<Page> for PageResponse {
    fn from(page: Page) -> Self {
        Self {
            id: page.id,
            creator_name: page.creator_name,
            creator_id: page.creator_id,
            reason_of_leaving: page.reason_of_leaving,
            theme_name: page.theme_name,
            custom_theme: page.custom_theme,
            creator_message: page.creator_message,
            images: page.images,
            gifs: page.gifs,
            videos: page.videos,
            likes: page.liked_by.len(),
            liked_by: page.liked_by,
            created_at: page.created_at,
        }
    }
}

// -- Users --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateUserRequest {
    pub username: Option<String>,
    pub password: Option<String>,
}

/// Public view of an account; the password hash never leaves the server.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: Uuid,
    pub username: String,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            created_at: user.created_at,
        }
    }
}

// -- Media --

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub url: String,
}
