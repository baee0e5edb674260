//! Database row types. These map directly to SQLite rows and are kept
//! distinct from the blogr-types models so the password hash stays here.

use anyhow::{Result, anyhow};
use chrono::{DateTime, NaiveDateTime, Utc};

use blogr_types::models::{Post, User};

pub struct UserRow {
    pub id: i64,
    pub username: String,
    pub password: String,
}

impl UserRow {
    pub fn to_user(&self) -> User {
        User {
            id: self.id,
            username: self.username.clone(),
        }
    }
}

pub struct PostRow {
    pub id: i64,
    pub author_id: i64,
    pub author_username: String,
    pub title: String,
    pub body: String,
    pub created: String,
}

impl PostRow {
    pub fn into_post(self) -> Result<Post> {
        let created = parse_timestamp(&self.created)?;
        Ok(Post {
            id: self.id,
            author_id: self.author_id,
            author_username: self.author_username,
            title: self.title,
            body: self.body,
            created,
        })
    }
}

/// SQLite's CURRENT_TIMESTAMP is "YYYY-MM-DD HH:MM:SS" in UTC, no offset.
fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    raw.parse::<DateTime<Utc>>()
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S").map(|ndt| ndt.and_utc()))
        .map_err(|e| anyhow!("Corrupt timestamp '{}': {}", raw, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    #[test]
    fn parses_sqlite_timestamps() {
        let ts = parse_timestamp("2024-03-01 12:34:56").unwrap();
        assert_eq!((ts.year(), ts.month(), ts.day()), (2024, 3, 1));
        assert_eq!((ts.hour(), ts.minute(), ts.second()), (12, 34, 56));
    }

    #[test]
    fn rejects_garbage_timestamps() {
        assert!(parse_timestamp("yesterday").is_err());
    }
}
