//! User models and related types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[cfg(feature = "utoipa")]
use crate::utoipa::ToSchema;

/// Role a user plays in the energy pool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa", derive(ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum UserType {
    /// Owns at least one producing device
    Provider,
    /// Only submits energy requests
    Consumer,
    /// Both produces and consumes
    Both,
}

impl UserType {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserType::Provider => "provider",
            UserType::Consumer => "consumer",
            UserType::Both => "both",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "provider" => Some(UserType::Provider),
            "consumer" => Some(UserType::Consumer),
            "both" => Some(UserType::Both),
            _ => None,
        }
    }
}

impl Default for UserType {
    fn default() -> Self {
        UserType::Consumer
    }
}

/// User model
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa", derive(ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Unique user ID
    pub id: i64,
    /// Unique username
    pub username: String,
    /// Unique email address
    pub email: String,
    /// Stored credential, never serialized out
    #[serde(skip_serializing)]
    pub password: String,
    /// Display name shown to other users
    pub display_name: String,
    /// Role in the energy pool
    pub user_type: UserType,
    /// Free-form location string
    pub location: Option<String>,
    /// Profile image URL
    pub profile_image: Option<String>,
    /// Registration timestamp
    pub created_at: DateTime<Utc>,
}

/// Payload for registering a new user
#[derive(Debug, Clone, Deserialize)]
#[cfg_attr(feature = "utoipa", derive(ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password: String,
    pub display_name: String,
    #[serde(default)]
    pub user_type: UserType,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub profile_image: Option<String>,
}
