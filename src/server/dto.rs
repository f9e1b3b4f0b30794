use std::collections::BTreeMap;

use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
pub struct CreateSpaceParams {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub invisible: bool,
    #[serde(default)]
    pub joinable: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SpaceParams {
    #[serde(default)]
    pub id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SpaceUserParams {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub user: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SpaceInfoBody {
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub picture: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct FileParams {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub file_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct TimelineParams {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub count: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct PostBody {
    pub text: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct CommentParams {
    #[serde(default)]
    pub post_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub query: Option<String>,
    #[serde(default)]
    pub count: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UserParams {
    #[serde(default)]
    pub user: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ProfileBody {
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub picture: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RoleParams {
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct AclParams {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
}

/// Capability grants as submitted by the ACL update endpoints: full
/// name → granted map. Ordered so responses are stable.
pub type CapabilityMap = BTreeMap<String, bool>;

#[derive(Debug, Deserialize)]
pub struct ReportBody {
    pub item_type: String,
    pub item_id: String,
    pub reason: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct ReportListParams {
    #[serde(default)]
    pub open_only: bool,
}

#[derive(Debug, Default, Deserialize)]
pub struct ReportParams {
    #[serde(default)]
    pub id: Option<String>,
}
