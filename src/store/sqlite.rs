use std::path::Path;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, params, params_from_iter};

use super::Store;
use super::schema::SCHEMA;
use crate::error::{Error, Result};
use crate::types::*;

pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn new<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let conn = Connection::open(db_path)?;

        conn.pragma_update(None, "foreign_keys", "ON")?;
        conn.pragma_update(None, "journal_mode", "WAL")?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// In-memory store, used by the test suites.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> std::sync::MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|e| e.into_inner())
    }
}

fn parse_datetime(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .or_else(|_| {
            // Handle SQLite's default datetime format: "YYYY-MM-DD HH:MM:SS"
            chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").map(|ndt| ndt.and_utc())
        })
        .unwrap_or_else(|e| {
            tracing::error!("Invalid datetime in database: '{}' - {}", s, e);
            Utc::now()
        })
}

fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339()
}

/// Builds "?1, ?2, ..." for a dynamic IN clause, offset by `start`.
fn placeholders(start: usize, count: usize) -> String {
    (start..start + count)
        .map(|i| format!("?{i}"))
        .collect::<Vec<_>>()
        .join(", ")
}

fn row_to_post(row: &rusqlite::Row<'_>) -> rusqlite::Result<Post> {
    Ok(Post {
        id: row.get(0)?,
        space_id: row.get(1)?,
        author: row.get(2)?,
        text: row.get(3)?,
        created_at: parse_datetime(&row.get::<_, String>(4)?),
    })
}

impl Store for SqliteStore {
    fn initialize(&self) -> Result<()> {
        self.conn().execute_batch(SCHEMA)?;
        Ok(())
    }

    // Profile / role registry operations

    fn get_profile(&self, username: &str) -> Result<Option<Profile>> {
        let conn = self.conn();
        conn.query_row(
            "SELECT username, role, bio, picture, created_at FROM profiles WHERE username = ?1",
            params![username],
            |row| {
                Ok(Profile {
                    username: row.get(0)?,
                    role: row.get(1)?,
                    bio: row.get(2)?,
                    picture: row.get(3)?,
                    created_at: parse_datetime(&row.get::<_, String>(4)?),
                })
            },
        )
        .optional()
        .map_err(Error::from)
    }

    fn ensure_profile(&self, username: &str) -> Result<Profile> {
        self.conn().execute(
            "INSERT OR IGNORE INTO profiles (username, role, created_at) VALUES (?1, 'guest', ?2)",
            params![username, format_datetime(&Utc::now())],
        )?;
        self.get_profile(username)?.ok_or(Error::NotFound)
    }

    fn update_profile(&self, profile: &Profile) -> Result<()> {
        let rows = self.conn().execute(
            "UPDATE profiles SET bio = ?1, picture = ?2 WHERE username = ?3",
            params![profile.bio, profile.picture, profile.username],
        )?;
        if rows == 0 {
            return Err(Error::NotFound);
        }
        Ok(())
    }

    fn set_role(&self, username: &str, role: &str) -> Result<()> {
        let rows = self.conn().execute(
            "UPDATE profiles SET role = ?1 WHERE username = ?2",
            params![role, username],
        )?;
        if rows == 0 {
            return Err(Error::NotFound);
        }
        Ok(())
    }

    fn distinct_roles(&self) -> Result<Vec<String>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT DISTINCT role FROM profiles WHERE role != '' ORDER BY role",
        )?;
        let rows = stmt.query_map([], |row| row.get(0))?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn add_follow(&self, username: &str, target: &str) -> Result<bool> {
        let rows = self.conn().execute(
            "INSERT OR IGNORE INTO follows (username, target, created_at) VALUES (?1, ?2, ?3)",
            params![username, target, format_datetime(&Utc::now())],
        )?;
        Ok(rows > 0)
    }

    fn remove_follow(&self, username: &str, target: &str) -> Result<bool> {
        let rows = self.conn().execute(
            "DELETE FROM follows WHERE username = ?1 AND target = ?2",
            params![username, target],
        )?;
        Ok(rows > 0)
    }

    fn list_follows(&self, username: &str) -> Result<Vec<String>> {
        let conn = self.conn();
        let mut stmt =
            conn.prepare("SELECT target FROM follows WHERE username = ?1 ORDER BY target")?;
        let rows = stmt.query_map(params![username], |row| row.get(0))?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    // Space operations

    fn create_space(&self, space: &Space) -> Result<()> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;
        tx.execute(
            "INSERT INTO spaces (id, name, invisible, joinable, description, picture, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                space.id,
                space.name,
                space.invisible,
                space.joinable,
                space.description,
                space.picture,
                format_datetime(&space.created_at),
            ],
        )?;
        for member in &space.members {
            tx.execute(
                "INSERT INTO space_members (space_id, username, is_admin) VALUES (?1, ?2, ?3)",
                params![space.id, member, space.admins.contains(member)],
            )?;
        }
        tx.commit()?;
        Ok(())
    }

    fn get_space(&self, id: &str) -> Result<Option<Space>> {
        let conn = self.conn();
        let base = conn
            .query_row(
                "SELECT id, name, invisible, joinable, description, picture, created_at
                 FROM spaces WHERE id = ?1",
                params![id],
                |row| {
                    Ok(Space {
                        id: row.get(0)?,
                        name: row.get(1)?,
                        invisible: row.get(2)?,
                        joinable: row.get(3)?,
                        description: row.get(4)?,
                        picture: row.get(5)?,
                        members: Vec::new(),
                        admins: Vec::new(),
                        invites: Vec::new(),
                        requests: Vec::new(),
                        files: Vec::new(),
                        created_at: parse_datetime(&row.get::<_, String>(6)?),
                    })
                },
            )
            .optional()?;

        let Some(mut space) = base else {
            return Ok(None);
        };

        let mut stmt = conn.prepare(
            "SELECT username, is_admin FROM space_members WHERE space_id = ?1 ORDER BY username",
        )?;
        let members = stmt.query_map(params![id], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, bool>(1)?))
        })?;
        for member in members {
            let (username, is_admin) = member?;
            if is_admin {
                space.admins.push(username.clone());
            }
            space.members.push(username);
        }

        let mut stmt = conn
            .prepare("SELECT username FROM space_invites WHERE space_id = ?1 ORDER BY username")?;
        let invites = stmt.query_map(params![id], |row| row.get(0))?;
        space.invites = invites.collect::<std::result::Result<Vec<_>, _>>()?;

        let mut stmt = conn
            .prepare("SELECT username FROM space_requests WHERE space_id = ?1 ORDER BY username")?;
        let requests = stmt.query_map(params![id], |row| row.get(0))?;
        space.requests = requests.collect::<std::result::Result<Vec<_>, _>>()?;

        let mut stmt = conn.prepare(
            "SELECT file_id, space_id, filename, content_type, author, belongs_to_post, created_at
             FROM space_files WHERE space_id = ?1 ORDER BY created_at",
        )?;
        let files = stmt.query_map(params![id], |row| {
            Ok(FileRef {
                file_id: row.get(0)?,
                space_id: row.get(1)?,
                filename: row.get(2)?,
                content_type: row.get(3)?,
                author: row.get(4)?,
                belongs_to_post: row.get(5)?,
                created_at: parse_datetime(&row.get::<_, String>(6)?),
            })
        })?;
        space.files = files.collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(Some(space))
    }

    fn list_spaces(&self) -> Result<Vec<Space>> {
        let ids: Vec<String> = {
            let conn = self.conn();
            let mut stmt = conn.prepare("SELECT id FROM spaces ORDER BY name")?;
            let rows = stmt.query_map([], |row| row.get(0))?;
            rows.collect::<std::result::Result<Vec<_>, _>>()?
        };

        let mut spaces = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(space) = self.get_space(&id)? {
                spaces.push(space);
            }
        }
        Ok(spaces)
    }

    fn update_space(&self, space: &Space) -> Result<()> {
        let rows = self.conn().execute(
            "UPDATE spaces SET name = ?1, invisible = ?2, joinable = ?3, description = ?4,
             picture = ?5 WHERE id = ?6",
            params![
                space.name,
                space.invisible,
                space.joinable,
                space.description,
                space.picture,
                space.id
            ],
        )?;
        if rows == 0 {
            return Err(Error::NotFound);
        }
        Ok(())
    }

    fn delete_space(&self, id: &str) -> Result<bool> {
        // Membership edges, ACL rows, files, posts and notifications cascade.
        let rows = self
            .conn()
            .execute("DELETE FROM spaces WHERE id = ?1", params![id])?;
        Ok(rows > 0)
    }

    // Membership edges

    fn add_member(&self, space_id: &str, username: &str) -> Result<()> {
        self.conn().execute(
            "INSERT OR IGNORE INTO space_members (space_id, username, is_admin) VALUES (?1, ?2, 0)",
            params![space_id, username],
        )?;
        Ok(())
    }

    fn remove_member(&self, space_id: &str, username: &str) -> Result<bool> {
        let rows = self.conn().execute(
            "DELETE FROM space_members WHERE space_id = ?1 AND username = ?2",
            params![space_id, username],
        )?;
        Ok(rows > 0)
    }

    fn set_space_admin(&self, space_id: &str, username: &str, is_admin: bool) -> Result<()> {
        let rows = self.conn().execute(
            "UPDATE space_members SET is_admin = ?1 WHERE space_id = ?2 AND username = ?3",
            params![is_admin, space_id, username],
        )?;
        if rows == 0 {
            return Err(Error::NotFound);
        }
        Ok(())
    }

    fn add_invite(&self, space_id: &str, username: &str) -> Result<bool> {
        let rows = self.conn().execute(
            "INSERT OR IGNORE INTO space_invites (space_id, username, created_at) VALUES (?1, ?2, ?3)",
            params![space_id, username, format_datetime(&Utc::now())],
        )?;
        Ok(rows > 0)
    }

    fn remove_invite(&self, space_id: &str, username: &str) -> Result<bool> {
        let rows = self.conn().execute(
            "DELETE FROM space_invites WHERE space_id = ?1 AND username = ?2",
            params![space_id, username],
        )?;
        Ok(rows > 0)
    }

    fn add_request(&self, space_id: &str, username: &str) -> Result<bool> {
        let rows = self.conn().execute(
            "INSERT OR IGNORE INTO space_requests (space_id, username, created_at) VALUES (?1, ?2, ?3)",
            params![space_id, username, format_datetime(&Utc::now())],
        )?;
        Ok(rows > 0)
    }

    fn remove_request(&self, space_id: &str, username: &str) -> Result<bool> {
        let rows = self.conn().execute(
            "DELETE FROM space_requests WHERE space_id = ?1 AND username = ?2",
            params![space_id, username],
        )?;
        Ok(rows > 0)
    }

    // Space files

    fn add_space_file(&self, file: &FileRef) -> Result<()> {
        self.conn().execute(
            "INSERT INTO space_files (file_id, space_id, filename, content_type, author,
             belongs_to_post, created_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                file.file_id,
                file.space_id,
                file.filename,
                file.content_type,
                file.author,
                file.belongs_to_post,
                format_datetime(&file.created_at),
            ],
        )?;
        Ok(())
    }

    fn get_space_file(&self, space_id: &str, file_id: &str) -> Result<Option<FileRef>> {
        let conn = self.conn();
        conn.query_row(
            "SELECT file_id, space_id, filename, content_type, author, belongs_to_post, created_at
             FROM space_files WHERE space_id = ?1 AND file_id = ?2",
            params![space_id, file_id],
            |row| {
                Ok(FileRef {
                    file_id: row.get(0)?,
                    space_id: row.get(1)?,
                    filename: row.get(2)?,
                    content_type: row.get(3)?,
                    author: row.get(4)?,
                    belongs_to_post: row.get(5)?,
                    created_at: parse_datetime(&row.get::<_, String>(6)?),
                })
            },
        )
        .optional()
        .map_err(Error::from)
    }

    fn remove_space_file(&self, space_id: &str, file_id: &str) -> Result<bool> {
        let rows = self.conn().execute(
            "DELETE FROM space_files WHERE space_id = ?1 AND file_id = ?2",
            params![space_id, file_id],
        )?;
        Ok(rows > 0)
    }

    // Global ACL

    fn get_global_acl(&self, role: &str) -> Result<Option<GlobalAclRow>> {
        let conn = self.conn();
        conn.query_row(
            "SELECT role, caps FROM global_acl WHERE role = ?1",
            params![role],
            |row| {
                Ok(GlobalAclRow {
                    role: row.get(0)?,
                    caps: GlobalCapability::from(row.get::<_, i64>(1)?),
                })
            },
        )
        .optional()
        .map_err(Error::from)
    }

    fn list_global_acl(&self) -> Result<Vec<GlobalAclRow>> {
        let conn = self.conn();
        let mut stmt = conn.prepare("SELECT role, caps FROM global_acl ORDER BY role")?;
        let rows = stmt.query_map([], |row| {
            Ok(GlobalAclRow {
                role: row.get(0)?,
                caps: GlobalCapability::from(row.get::<_, i64>(1)?),
            })
        })?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn upsert_global_acl(&self, row: &GlobalAclRow) -> Result<()> {
        self.conn().execute(
            "INSERT INTO global_acl (role, caps, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(role) DO UPDATE SET caps = ?2, updated_at = ?3",
            params![
                row.role,
                i64::from(row.caps),
                format_datetime(&Utc::now())
            ],
        )?;
        Ok(())
    }

    // Space ACL

    fn get_space_acl(&self, role: &str, space_id: &str) -> Result<Option<SpaceAclRow>> {
        let conn = self.conn();
        conn.query_row(
            "SELECT role, space_id, caps FROM space_acl WHERE role = ?1 AND space_id = ?2",
            params![role, space_id],
            |row| {
                Ok(SpaceAclRow {
                    role: row.get(0)?,
                    space_id: row.get(1)?,
                    caps: SpaceCapability::from(row.get::<_, i64>(2)?),
                })
            },
        )
        .optional()
        .map_err(Error::from)
    }

    fn list_space_acl(&self, space_id: &str) -> Result<Vec<SpaceAclRow>> {
        let conn = self.conn();
        let mut stmt = conn
            .prepare("SELECT role, space_id, caps FROM space_acl WHERE space_id = ?1 ORDER BY role")?;
        let rows = stmt.query_map(params![space_id], |row| {
            Ok(SpaceAclRow {
                role: row.get(0)?,
                space_id: row.get(1)?,
                caps: SpaceCapability::from(row.get::<_, i64>(2)?),
            })
        })?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn upsert_space_acl(&self, row: &SpaceAclRow) -> Result<()> {
        self.conn().execute(
            "INSERT INTO space_acl (role, space_id, caps, updated_at) VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(role, space_id) DO UPDATE SET caps = ?3, updated_at = ?4",
            params![
                row.role,
                row.space_id,
                i64::from(row.caps),
                format_datetime(&Utc::now())
            ],
        )?;
        Ok(())
    }

    // Posts and comments

    fn create_post(&self, post: &Post) -> Result<()> {
        self.conn().execute(
            "INSERT INTO posts (id, space_id, author, text, created_at) VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                post.id,
                post.space_id,
                post.author,
                post.text,
                format_datetime(&post.created_at)
            ],
        )?;
        Ok(())
    }

    fn get_post(&self, id: &str) -> Result<Option<Post>> {
        let conn = self.conn();
        conn.query_row(
            "SELECT id, space_id, author, text, created_at FROM posts WHERE id = ?1",
            params![id],
            row_to_post,
        )
        .optional()
        .map_err(Error::from)
    }

    fn list_space_posts(&self, space_id: &str, limit: i64) -> Result<Vec<Post>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT id, space_id, author, text, created_at FROM posts
             WHERE space_id = ?1 ORDER BY created_at DESC LIMIT ?2",
        )?;
        let rows = stmt.query_map(params![space_id, limit], row_to_post)?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn list_posts_by_authors(
        &self,
        authors: &[String],
        member_spaces: &[String],
        limit: i64,
    ) -> Result<Vec<Post>> {
        if authors.is_empty() || member_spaces.is_empty() {
            return Ok(Vec::new());
        }
        let conn = self.conn();
        let sql = format!(
            "SELECT id, space_id, author, text, created_at FROM posts
             WHERE author IN ({}) AND space_id IN ({})
             ORDER BY created_at DESC LIMIT ?{}",
            placeholders(1, authors.len()),
            placeholders(1 + authors.len(), member_spaces.len()),
            1 + authors.len() + member_spaces.len(),
        );
        let mut stmt = conn.prepare(&sql)?;
        let mut args: Vec<rusqlite::types::Value> = authors
            .iter()
            .chain(member_spaces.iter())
            .map(|s| rusqlite::types::Value::from(s.clone()))
            .collect();
        args.push(rusqlite::types::Value::from(limit));
        let rows = stmt.query_map(params_from_iter(args), row_to_post)?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn list_all_posts(&self, limit: i64) -> Result<Vec<Post>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT id, space_id, author, text, created_at FROM posts
             ORDER BY created_at DESC LIMIT ?1",
        )?;
        let rows = stmt.query_map(params![limit], row_to_post)?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn search_posts(
        &self,
        term: &str,
        authors: &[String],
        spaces: &[String],
        limit: i64,
    ) -> Result<Vec<Post>> {
        if authors.is_empty() || spaces.is_empty() {
            return Ok(Vec::new());
        }
        let conn = self.conn();
        // Pre-filter: the candidate set is fixed before the text match runs.
        let next = 1 + authors.len() + spaces.len();
        let sql = format!(
            "SELECT id, space_id, author, text, created_at FROM posts
             WHERE author IN ({}) AND space_id IN ({}) AND text LIKE ?{}
             ORDER BY created_at DESC LIMIT ?{}",
            placeholders(1, authors.len()),
            placeholders(1 + authors.len(), spaces.len()),
            next,
            next + 1,
        );
        let mut stmt = conn.prepare(&sql)?;
        let mut args: Vec<rusqlite::types::Value> = authors
            .iter()
            .chain(spaces.iter())
            .map(|s| rusqlite::types::Value::from(s.clone()))
            .collect();
        args.push(rusqlite::types::Value::from(format!("%{term}%")));
        args.push(rusqlite::types::Value::from(limit));
        let rows = stmt.query_map(params_from_iter(args), row_to_post)?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn create_comment(&self, comment: &Comment) -> Result<()> {
        self.conn().execute(
            "INSERT INTO comments (id, post_id, author, text, created_at) VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                comment.id,
                comment.post_id,
                comment.author,
                comment.text,
                format_datetime(&comment.created_at)
            ],
        )?;
        Ok(())
    }

    fn list_post_comments(&self, post_id: &str) -> Result<Vec<Comment>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT id, post_id, author, text, created_at FROM comments
             WHERE post_id = ?1 ORDER BY created_at",
        )?;
        let rows = stmt.query_map(params![post_id], |row| {
            Ok(Comment {
                id: row.get(0)?,
                post_id: row.get(1)?,
                author: row.get(2)?,
                text: row.get(3)?,
                created_at: parse_datetime(&row.get::<_, String>(4)?),
            })
        })?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    // Reports

    fn create_report(&self, report: &Report) -> Result<()> {
        self.conn().execute(
            "INSERT INTO reports (report_id, item_type, item_id, reporter, reason, status, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                report.report_id,
                report.item_type,
                report.item_id,
                report.reporter,
                report.reason,
                report.status.as_str(),
                format_datetime(&report.created_at),
            ],
        )?;
        Ok(())
    }

    fn get_report(&self, id: &str) -> Result<Option<Report>> {
        let conn = self.conn();
        conn.query_row(
            "SELECT report_id, item_type, item_id, reporter, reason, status, created_at
             FROM reports WHERE report_id = ?1",
            params![id],
            row_to_report,
        )
        .optional()
        .map_err(Error::from)
    }

    fn list_reports(&self, open_only: bool) -> Result<Vec<Report>> {
        let conn = self.conn();
        let sql = if open_only {
            "SELECT report_id, item_type, item_id, reporter, reason, status, created_at
             FROM reports WHERE status = 'open' ORDER BY created_at DESC"
        } else {
            "SELECT report_id, item_type, item_id, reporter, reason, status, created_at
             FROM reports ORDER BY created_at DESC"
        };
        let mut stmt = conn.prepare(sql)?;
        let rows = stmt.query_map([], row_to_report)?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn close_report(&self, id: &str) -> Result<bool> {
        let rows = self.conn().execute(
            "UPDATE reports SET status = 'closed' WHERE report_id = ?1",
            params![id],
        )?;
        Ok(rows > 0)
    }

    // Notifications

    fn insert_notification(&self, notification: &Notification) -> Result<()> {
        self.conn().execute(
            "INSERT INTO notifications (id, kind, actor, recipient, space_id, space_name, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                notification.id,
                notification.kind.as_str(),
                notification.actor,
                notification.recipient,
                notification.space_id,
                notification.space_name,
                format_datetime(&notification.created_at),
            ],
        )?;
        Ok(())
    }

    fn list_notifications(&self, recipient: &str) -> Result<Vec<Notification>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT id, kind, actor, recipient, space_id, space_name, created_at
             FROM notifications WHERE recipient = ?1 ORDER BY created_at DESC",
        )?;
        let rows = stmt.query_map(params![recipient], |row| {
            let kind: String = row.get(1)?;
            Ok(Notification {
                id: row.get(0)?,
                kind: NotificationKind::parse(&kind).unwrap_or(NotificationKind::JoinRequest),
                actor: row.get(2)?,
                recipient: row.get(3)?,
                space_id: row.get(4)?,
                space_name: row.get(5)?,
                created_at: parse_datetime(&row.get::<_, String>(6)?),
            })
        })?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }
}

fn row_to_report(row: &rusqlite::Row<'_>) -> rusqlite::Result<Report> {
    let status: String = row.get(5)?;
    Ok(Report {
        report_id: row.get(0)?,
        item_type: row.get(1)?,
        item_id: row.get(2)?,
        reporter: row.get(3)?,
        reason: row.get(4)?,
        status: ReportStatus::parse(&status).unwrap_or(ReportStatus::Open),
        created_at: parse_datetime(&row.get::<_, String>(6)?),
    })
}
