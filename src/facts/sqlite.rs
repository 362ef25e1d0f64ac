//! SQLite-backed fact provider.
//!
//! Reads facts from a host database with the tables below. The provider only
//! issues `SELECT`s while serving documents; the insert helpers exist for
//! provisioning fixtures and local development databases.
//!
//! Schema:
//! - users: (id INTEGER PRIMARY KEY, login TEXT, can_publish INTEGER)
//! - posts: (id INTEGER PRIMARY KEY, author_id INTEGER, status TEXT, published_at TEXT)
//! - comments: (id INTEGER PRIMARY KEY, post_id INTEGER, approved INTEGER)
//! - options: (name TEXT PRIMARY KEY, value TEXT)

use std::path::Path;

use chrono::{DateTime, SecondsFormat, Utc};
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension};

use super::{AuthorId, FactProvider, SiteIdentity};
use crate::error::FactError;

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS users (
        id INTEGER PRIMARY KEY,
        login TEXT NOT NULL,
        can_publish INTEGER NOT NULL DEFAULT 1
    );
    CREATE TABLE IF NOT EXISTS posts (
        id INTEGER PRIMARY KEY,
        author_id INTEGER NOT NULL,
        status TEXT NOT NULL,
        published_at TEXT NOT NULL
    );
    CREATE INDEX IF NOT EXISTS posts_status_published ON posts (status, published_at);
    CREATE TABLE IF NOT EXISTS comments (
        id INTEGER PRIMARY KEY,
        post_id INTEGER NOT NULL,
        approved INTEGER NOT NULL DEFAULT 0
    );
    CREATE TABLE IF NOT EXISTS options (
        name TEXT PRIMARY KEY,
        value TEXT NOT NULL
    );
";

/// Option names read by the provider.
pub mod option {
    pub const USERS_CAN_REGISTER: &str = "users_can_register";
    pub const SITE_NAME: &str = "blogname";
    pub const SITE_DESCRIPTION: &str = "blogdescription";
    pub const SITE_ICON_URL: &str = "site_icon_url";
    pub const HOME_URL: &str = "home";
    pub const SOFTWARE_VERSION: &str = "software_version";
}

const PUBLISHED: &str = "publish";

/// Timestamps are stored as UTC RFC 3339 with second precision so that
/// string comparison orders them chronologically.
fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Fact provider over a SQLite connection.
///
/// The connection sits behind a `parking_lot::Mutex`; every fact is a single
/// statement so builds never observe each other's state.
pub struct SqliteFacts {
    conn: Mutex<Connection>,
}

impl SqliteFacts {
    /// Open (or create) a database file and ensure the schema exists.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, FactError> {
        Self::with_connection(Connection::open(path)?)
    }

    pub fn open_in_memory() -> Result<Self, FactError> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self, FactError> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    // -----------------------------------------------------------------------
    // Provisioning helpers
    // -----------------------------------------------------------------------

    pub fn add_user(&self, login: &str, can_publish: bool) -> Result<AuthorId, FactError> {
        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO users (login, can_publish) VALUES (?1, ?2)",
            params![login, can_publish],
        )?;
        Ok(conn.last_insert_rowid() as AuthorId)
    }

    /// Insert a post with the given status (`"publish"`, `"draft"`, ...).
    pub fn add_post(
        &self,
        author: AuthorId,
        status: &str,
        published_at: DateTime<Utc>,
    ) -> Result<i64, FactError> {
        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO posts (author_id, status, published_at) VALUES (?1, ?2, ?3)",
            params![author as i64, status, timestamp(published_at)],
        )?;
        Ok(conn.last_insert_rowid())
    }

    pub fn add_comment(&self, post_id: i64, approved: bool) -> Result<(), FactError> {
        self.conn.lock().execute(
            "INSERT INTO comments (post_id, approved) VALUES (?1, ?2)",
            params![post_id, approved],
        )?;
        Ok(())
    }

    pub fn set_option(&self, name: &str, value: &str) -> Result<(), FactError> {
        self.conn.lock().execute(
            "INSERT INTO options (name, value) VALUES (?1, ?2)
             ON CONFLICT(name) DO UPDATE SET value = excluded.value",
            params![name, value],
        )?;
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Internal helpers
    // -----------------------------------------------------------------------

    fn get_option(&self, name: &str) -> Result<Option<String>, FactError> {
        Ok(self
            .conn
            .lock()
            .query_row(
                "SELECT value FROM options WHERE name = ?1",
                params![name],
                |row| row.get(0),
            )
            .optional()?)
    }

    fn count(&self, sql: &str, fact: &'static str) -> Result<u64, FactError> {
        let n: i64 = self.conn.lock().query_row(sql, [], |row| row.get(0))?;
        u64::try_from(n).map_err(|_| FactError::InvalidValue {
            fact,
            value: n.to_string(),
        })
    }
}

impl FactProvider for SqliteFacts {
    fn users_can_register(&self) -> Result<bool, FactError> {
        let value = self.get_option(option::USERS_CAN_REGISTER)?;
        Ok(matches!(value.as_deref(), Some("1") | Some("true")))
    }

    fn author_count(&self) -> Result<u64, FactError> {
        self.count(
            "SELECT COUNT(*) FROM users WHERE can_publish = 1",
            "author_count",
        )
    }

    fn published_post_count(&self) -> Result<u64, FactError> {
        self.count(
            "SELECT COUNT(*) FROM posts WHERE status = 'publish'",
            "published_post_count",
        )
    }

    fn approved_comment_count(&self) -> Result<u64, FactError> {
        self.count(
            "SELECT COUNT(*) FROM comments WHERE approved = 1",
            "approved_comment_count",
        )
    }

    fn published_post_authors(&self, since: DateTime<Utc>) -> Result<Vec<AuthorId>, FactError> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            "SELECT author_id FROM posts WHERE status = ?1 AND published_at >= ?2",
        )?;
        let rows = stmt.query_map(params![PUBLISHED, timestamp(since)], |row| {
            row.get::<_, i64>(0)
        })?;

        let mut authors = Vec::new();
        for row in rows {
            let id = row?;
            authors.push(AuthorId::try_from(id).map_err(|_| FactError::InvalidValue {
                fact: "post author",
                value: id.to_string(),
            })?);
        }
        Ok(authors)
    }

    fn site_identity(&self) -> Result<SiteIdentity, FactError> {
        let text = |name| -> Result<String, FactError> {
            Ok(self.get_option(name)?.unwrap_or_default())
        };
        Ok(SiteIdentity {
            name: text(option::SITE_NAME)?,
            description: text(option::SITE_DESCRIPTION)?,
            icon_url: text(option::SITE_ICON_URL)?,
            home_url: text(option::HOME_URL)?,
            software_version: text(option::SOFTWARE_VERSION)?,
        })
    }
}
