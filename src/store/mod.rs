mod schema;
mod sqlite;

pub use sqlite::SqliteStore;

use crate::error::Result;
use crate::types::*;

/// Store defines the persistence interface. Per-document writes are atomic;
/// that is the serialization point for conflicting membership transitions.
pub trait Store: Send + Sync {
    fn initialize(&self) -> Result<()>;

    // Profile / role registry operations
    fn get_profile(&self, username: &str) -> Result<Option<Profile>>;
    fn ensure_profile(&self, username: &str) -> Result<Profile>;
    fn update_profile(&self, profile: &Profile) -> Result<()>;
    fn set_role(&self, username: &str, role: &str) -> Result<()>;
    fn distinct_roles(&self) -> Result<Vec<String>>;
    fn add_follow(&self, username: &str, target: &str) -> Result<bool>;
    fn remove_follow(&self, username: &str, target: &str) -> Result<bool>;
    fn list_follows(&self, username: &str) -> Result<Vec<String>>;

    // Space operations
    fn create_space(&self, space: &Space) -> Result<()>;
    fn get_space(&self, id: &str) -> Result<Option<Space>>;
    fn list_spaces(&self) -> Result<Vec<Space>>;
    fn update_space(&self, space: &Space) -> Result<()>;
    fn delete_space(&self, id: &str) -> Result<bool>;

    // Membership edges
    fn add_member(&self, space_id: &str, username: &str) -> Result<()>;
    fn remove_member(&self, space_id: &str, username: &str) -> Result<bool>;
    fn set_space_admin(&self, space_id: &str, username: &str, is_admin: bool) -> Result<()>;
    fn add_invite(&self, space_id: &str, username: &str) -> Result<bool>;
    fn remove_invite(&self, space_id: &str, username: &str) -> Result<bool>;
    fn add_request(&self, space_id: &str, username: &str) -> Result<bool>;
    fn remove_request(&self, space_id: &str, username: &str) -> Result<bool>;

    // Space files
    fn add_space_file(&self, file: &FileRef) -> Result<()>;
    fn get_space_file(&self, space_id: &str, file_id: &str) -> Result<Option<FileRef>>;
    fn remove_space_file(&self, space_id: &str, file_id: &str) -> Result<bool>;

    // Global ACL
    fn get_global_acl(&self, role: &str) -> Result<Option<GlobalAclRow>>;
    fn list_global_acl(&self) -> Result<Vec<GlobalAclRow>>;
    fn upsert_global_acl(&self, row: &GlobalAclRow) -> Result<()>;

    // Space ACL
    fn get_space_acl(&self, role: &str, space_id: &str) -> Result<Option<SpaceAclRow>>;
    fn list_space_acl(&self, space_id: &str) -> Result<Vec<SpaceAclRow>>;
    fn upsert_space_acl(&self, row: &SpaceAclRow) -> Result<()>;

    // Posts and comments
    fn create_post(&self, post: &Post) -> Result<()>;
    fn get_post(&self, id: &str) -> Result<Option<Post>>;
    fn list_space_posts(&self, space_id: &str, limit: i64) -> Result<Vec<Post>>;
    fn list_posts_by_authors(
        &self,
        authors: &[String],
        member_spaces: &[String],
        limit: i64,
    ) -> Result<Vec<Post>>;
    fn list_all_posts(&self, limit: i64) -> Result<Vec<Post>>;
    fn search_posts(
        &self,
        term: &str,
        authors: &[String],
        spaces: &[String],
        limit: i64,
    ) -> Result<Vec<Post>>;
    fn create_comment(&self, comment: &Comment) -> Result<()>;
    fn list_post_comments(&self, post_id: &str) -> Result<Vec<Comment>>;

    // Reports
    fn create_report(&self, report: &Report) -> Result<()>;
    fn get_report(&self, id: &str) -> Result<Option<Report>>;
    fn list_reports(&self, open_only: bool) -> Result<Vec<Report>>;
    fn close_report(&self, id: &str) -> Result<bool>;

    // Notifications
    fn insert_notification(&self, notification: &Notification) -> Result<()>;
    fn list_notifications(&self, recipient: &str) -> Result<Vec<Notification>>;
}
