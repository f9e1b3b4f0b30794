use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{GlobalCapability, SpaceCapability};

/// The authenticated identity attached to a request. Identity fields come
/// from the IdP; the role comes from the role registry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Principal {
    pub user_id: String,
    pub username: String,
    pub email: Option<String>,
    pub global_role: String,
}

impl Principal {
    #[must_use]
    pub fn is_global_admin(&self) -> bool {
        self.global_role == crate::roles::ADMIN_ROLE
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    pub username: String,
    pub role: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub picture: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Space {
    pub id: String,
    pub name: String,
    pub invisible: bool,
    pub joinable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub picture: Option<String>,
    pub members: Vec<String>,
    pub admins: Vec<String>,
    pub invites: Vec<String>,
    pub requests: Vec<String>,
    pub files: Vec<FileRef>,
    pub created_at: DateTime<Utc>,
}

impl Space {
    #[must_use]
    pub fn is_member(&self, username: &str) -> bool {
        self.members.iter().any(|m| m == username)
    }

    #[must_use]
    pub fn is_admin(&self, username: &str) -> bool {
        self.admins.iter().any(|a| a == username)
    }

    #[must_use]
    pub fn is_invited(&self, username: &str) -> bool {
        self.invites.iter().any(|i| i == username)
    }

    #[must_use]
    pub fn has_requested(&self, username: &str) -> bool {
        self.requests.iter().any(|r| r == username)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileRef {
    pub file_id: String,
    pub space_id: String,
    pub filename: String,
    pub content_type: String,
    pub author: String,
    pub belongs_to_post: bool,
    pub created_at: DateTime<Utc>,
}

/// One row per role: system-wide capabilities.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GlobalAclRow {
    pub role: String,
    pub caps: GlobalCapability,
}

/// One row per (role, space): per-space capabilities. Spaces are always
/// referenced by id here, never by name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpaceAclRow {
    pub role: String,
    pub space_id: String,
    pub caps: SpaceCapability,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub id: String,
    pub space_id: String,
    pub author: String,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    pub id: String,
    pub post_id: String,
    pub author: String,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportStatus {
    Open,
    Closed,
}

impl ReportStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Closed => "closed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "open" => Some(Self::Open),
            "closed" => Some(Self::Closed),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    pub report_id: String,
    pub item_type: String,
    pub item_id: String,
    pub reporter: String,
    pub reason: String,
    pub status: ReportStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    JoinRequest,
    Invite,
}

impl NotificationKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::JoinRequest => "join_request",
            Self::Invite => "invite",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "join_request" => Some(Self::JoinRequest),
            "invite" => Some(Self::Invite),
            _ => None,
        }
    }
}

/// A delivered in-app notification, scoped to a space so that deleting the
/// space removes it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub id: String,
    pub kind: NotificationKind,
    pub actor: String,
    pub recipient: String,
    pub space_id: String,
    pub space_name: String,
    pub created_at: DateTime<Utc>,
}
