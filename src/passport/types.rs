//! Passport data types

use serde::{Deserialize, Serialize};

/// Asset served when a brawler has not set an avatar
pub const DEFAULT_AVATAR_URL: &str = "/assets/default.avatar.jpg";

/// The authenticated user's cached profile
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Passport {
    pub id: i64,
    pub display_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
}

impl Passport {
    /// Display avatar URL, falling back to the default asset
    pub fn avatar_or_default(&self) -> &str {
        self.avatar_url.as_deref().unwrap_or(DEFAULT_AVATAR_URL)
    }
}

/// Login form payload
#[derive(Debug, Clone, Serialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

/// Registration form payload
#[derive(Debug, Clone, Serialize)]
pub struct Registration {
    pub username: String,
    pub password: String,
    pub display_name: String,
}
