use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

/// Destructive: drops both tables (post first, it references user) and
/// recreates them empty.
const SCHEMA: &str = "
    DROP TABLE IF EXISTS post;
    DROP TABLE IF EXISTS user;

    CREATE TABLE user (
        id          INTEGER PRIMARY KEY AUTOINCREMENT,
        username    TEXT UNIQUE NOT NULL,
        password    TEXT NOT NULL
    );

    CREATE TABLE post (
        id          INTEGER PRIMARY KEY AUTOINCREMENT,
        author_id   INTEGER NOT NULL,
        created     TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
        title       TEXT NOT NULL,
        body        TEXT NOT NULL,
        FOREIGN KEY (author_id) REFERENCES user (id)
    );
";

pub fn reset(conn: &Connection) -> Result<()> {
    conn.execute_batch(SCHEMA)?;

    info!("Schema recreated");
    Ok(())
}

pub fn is_present(conn: &Connection) -> Result<bool> {
    let tables: i64 = conn.query_row(
        "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name IN ('user', 'post')",
        [],
        |row| row.get(0),
    )?;
    Ok(tables == 2)
}
