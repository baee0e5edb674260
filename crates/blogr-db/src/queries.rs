use anyhow::Result;
use rusqlite::{Connection, OptionalExtension, Row, ffi};

use crate::ConnectionScope;
use crate::models::{PostRow, UserRow};

const POST_COLUMNS: &str = "p.id AS id, p.author_id AS author_id, u.username AS username, \
     p.title AS title, p.body AS body, p.created AS created";

impl ConnectionScope {
    // -- Users --

    /// Insert a user. Returns `None` if the username is already taken.
    pub fn create_user(&self, username: &str, password_hash: &str) -> Result<Option<i64>> {
        self.with_tx(|tx| {
            let inserted = tx.execute(
                "INSERT INTO user (username, password) VALUES (?1, ?2)",
                (username, password_hash),
            );

            match inserted {
                Ok(_) => Ok(Some(tx.last_insert_rowid())),
                Err(rusqlite::Error::SqliteFailure(e, _))
                    if e.extended_code == ffi::SQLITE_CONSTRAINT_UNIQUE =>
                {
                    Ok(None)
                }
                Err(e) => Err(e.into()),
            }
        })
    }

    pub fn get_user_by_username(&self, username: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| {
            let row = conn
                .query_row(
                    "SELECT id, username, password FROM user WHERE username = ?1",
                    [username],
                    user_from_row,
                )
                .optional()?;
            Ok(row)
        })
    }

    pub fn get_user_by_id(&self, id: i64) -> Result<Option<UserRow>> {
        self.with_conn(|conn| {
            let row = conn
                .query_row(
                    "SELECT id, username, password FROM user WHERE id = ?1",
                    [id],
                    user_from_row,
                )
                .optional()?;
            Ok(row)
        })
    }

    // -- Posts --

    /// All posts, newest first.
    pub fn list_posts(&self) -> Result<Vec<PostRow>> {
        self.with_conn(query_posts)
    }

    pub fn get_post(&self, id: i64) -> Result<Option<PostRow>> {
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {POST_COLUMNS} FROM post p JOIN user u ON p.author_id = u.id WHERE p.id = ?1"
            );
            let row = conn.query_row(&sql, [id], post_from_row).optional()?;
            Ok(row)
        })
    }

    pub fn insert_post(&self, author_id: i64, title: &str, body: &str) -> Result<i64> {
        self.with_tx(|tx| {
            tx.execute(
                "INSERT INTO post (title, body, author_id) VALUES (?1, ?2, ?3)",
                rusqlite::params![title, body, author_id],
            )?;
            Ok(tx.last_insert_rowid())
        })
    }

    /// Overwrite title and body. Returns false if no such post exists.
    pub fn update_post(&self, id: i64, title: &str, body: &str) -> Result<bool> {
        self.with_tx(|tx| {
            let changed = tx.execute(
                "UPDATE post SET title = ?1, body = ?2 WHERE id = ?3",
                rusqlite::params![title, body, id],
            )?;
            Ok(changed > 0)
        })
    }

    /// Returns false if no such post exists.
    pub fn delete_post(&self, id: i64) -> Result<bool> {
        self.with_tx(|tx| {
            let changed = tx.execute("DELETE FROM post WHERE id = ?1", [id])?;
            Ok(changed > 0)
        })
    }
}

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<UserRow> {
    Ok(UserRow {
        id: row.get(0)?,
        username: row.get(1)?,
        password: row.get(2)?,
    })
}

fn post_from_row(row: &Row<'_>) -> rusqlite::Result<PostRow> {
    Ok(PostRow {
        id: row.get("id")?,
        author_id: row.get("author_id")?,
        author_username: row.get("username")?,
        title: row.get("title")?,
        body: row.get("body")?,
        created: row.get("created")?,
    })
}

fn query_posts(conn: &Connection) -> Result<Vec<PostRow>> {
    // Same-second inserts share a timestamp, so id breaks the tie
    let sql = format!(
        "SELECT {POST_COLUMNS}
         FROM post p
         JOIN user u ON p.author_id = u.id
         ORDER BY p.created DESC, p.id DESC"
    );
    let mut stmt = conn.prepare(&sql)?;

    let rows = stmt
        .query_map([], post_from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(rows)
}
