pub const SCHEMA: &str = r#"
-- Profiles double as the role registry: one row per known user
CREATE TABLE IF NOT EXISTS profiles (
    username TEXT PRIMARY KEY,
    role TEXT NOT NULL DEFAULT 'guest',
    bio TEXT,
    picture TEXT,
    created_at TEXT DEFAULT (datetime('now'))
);

-- Who follows whom (for user timelines and search pre-filtering)
CREATE TABLE IF NOT EXISTS follows (
    username TEXT NOT NULL REFERENCES profiles(username) ON DELETE CASCADE,
    target TEXT NOT NULL,
    created_at TEXT DEFAULT (datetime('now')),
    PRIMARY KEY (username, target)
);

-- Collaboration spaces
CREATE TABLE IF NOT EXISTS spaces (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    invisible INTEGER NOT NULL DEFAULT 0,
    joinable INTEGER NOT NULL DEFAULT 1,
    description TEXT,
    picture TEXT,
    created_at TEXT DEFAULT (datetime('now'))
);

-- Membership edges; a member row with is_admin=1 is a space admin
CREATE TABLE IF NOT EXISTS space_members (
    space_id TEXT NOT NULL REFERENCES spaces(id) ON DELETE CASCADE,
    username TEXT NOT NULL,
    is_admin INTEGER NOT NULL DEFAULT 0,
    created_at TEXT DEFAULT (datetime('now')),
    PRIMARY KEY (space_id, username)
);

CREATE TABLE IF NOT EXISTS space_invites (
    space_id TEXT NOT NULL REFERENCES spaces(id) ON DELETE CASCADE,
    username TEXT NOT NULL,
    created_at TEXT DEFAULT (datetime('now')),
    PRIMARY KEY (space_id, username)
);

CREATE TABLE IF NOT EXISTS space_requests (
    space_id TEXT NOT NULL REFERENCES spaces(id) ON DELETE CASCADE,
    username TEXT NOT NULL,
    created_at TEXT DEFAULT (datetime('now')),
    PRIMARY KEY (space_id, username)
);

-- Files attached to a space; belongs_to_post files are owned by their post
CREATE TABLE IF NOT EXISTS space_files (
    file_id TEXT PRIMARY KEY,
    space_id TEXT NOT NULL REFERENCES spaces(id) ON DELETE CASCADE,
    filename TEXT NOT NULL,
    content_type TEXT NOT NULL,
    author TEXT NOT NULL,
    belongs_to_post INTEGER NOT NULL DEFAULT 0,
    created_at TEXT DEFAULT (datetime('now'))
);

-- Global ACL: one row per role, capabilities stored as a bit set
CREATE TABLE IF NOT EXISTS global_acl (
    role TEXT PRIMARY KEY,
    caps INTEGER NOT NULL DEFAULT 0,
    updated_at TEXT DEFAULT (datetime('now'))
);

-- Space ACL: one row per (role, space)
CREATE TABLE IF NOT EXISTS space_acl (
    role TEXT NOT NULL,
    space_id TEXT NOT NULL REFERENCES spaces(id) ON DELETE CASCADE,
    caps INTEGER NOT NULL DEFAULT 0,
    updated_at TEXT DEFAULT (datetime('now')),
    PRIMARY KEY (role, space_id)
);

-- Posts and comments (minimal; enough to drive the authorization filter)
CREATE TABLE IF NOT EXISTS posts (
    id TEXT PRIMARY KEY,
    space_id TEXT NOT NULL REFERENCES spaces(id) ON DELETE CASCADE,
    author TEXT NOT NULL,
    text TEXT NOT NULL,
    created_at TEXT DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS comments (
    id TEXT PRIMARY KEY,
    post_id TEXT NOT NULL REFERENCES posts(id) ON DELETE CASCADE,
    author TEXT NOT NULL,
    text TEXT NOT NULL,
    created_at TEXT DEFAULT (datetime('now'))
);

-- User reports; admin-only read/close
CREATE TABLE IF NOT EXISTS reports (
    report_id TEXT PRIMARY KEY,
    item_type TEXT NOT NULL,
    item_id TEXT NOT NULL,
    reporter TEXT NOT NULL,
    reason TEXT NOT NULL,
    status TEXT NOT NULL DEFAULT 'open',
    created_at TEXT DEFAULT (datetime('now'))
);

-- Delivered in-app notifications, scoped to their space
CREATE TABLE IF NOT EXISTS notifications (
    id TEXT PRIMARY KEY,
    kind TEXT NOT NULL,
    actor TEXT NOT NULL,
    recipient TEXT NOT NULL,
    space_id TEXT NOT NULL REFERENCES spaces(id) ON DELETE CASCADE,
    space_name TEXT NOT NULL,
    created_at TEXT DEFAULT (datetime('now'))
);

CREATE INDEX IF NOT EXISTS idx_members_user ON space_members(username);
CREATE INDEX IF NOT EXISTS idx_invites_user ON space_invites(username);
CREATE INDEX IF NOT EXISTS idx_requests_user ON space_requests(username);
CREATE INDEX IF NOT EXISTS idx_files_space ON space_files(space_id);
CREATE INDEX IF NOT EXISTS idx_space_acl_space ON space_acl(space_id);
CREATE INDEX IF NOT EXISTS idx_posts_space ON posts(space_id);
CREATE INDEX IF NOT EXISTS idx_posts_author ON posts(author);
CREATE INDEX IF NOT EXISTS idx_comments_post ON comments(post_id);
CREATE INDEX IF NOT EXISTS idx_notifications_recipient ON notifications(recipient);
CREATE INDEX IF NOT EXISTS idx_reports_status ON reports(status);
"#;
