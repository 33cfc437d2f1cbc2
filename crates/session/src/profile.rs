//! User profiles and session configuration

use serde::{Deserialize, Serialize};

/// Collection holding one profile per identity, keyed by uid
pub const USERS_COLLECTION: &str = "users";

/// Profile document stored at `users/{uid}`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserProfile {
    pub name: String,
    pub email: String,
    pub role: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pin: Option<String>,
    pub disabled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

/// The user on whose behalf a record is written
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Actor {
    pub user_id: String,
    pub user_name: String,
}

/// Role defaults
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Role reported at login when the profile has none
    pub default_role: String,
    /// Role written for self-registered accounts
    pub registration_role: String,
    /// Role reported by the session when no profile is loaded
    pub fallback_role: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            default_role: "technician".to_string(),
            registration_role: "admin".to_string(),
            fallback_role: "viewer".to_string(),
        }
    }
}
