pub mod models;
pub mod queries;
pub mod schema;
pub mod scope;

use anyhow::Result;
use rusqlite::Connection;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

pub use scope::ConnectionScope;

/// Opens connections to the blog database. Holds no connection itself:
/// each request gets its own through [`ConnectionManager::scope`].
#[derive(Debug, Clone)]
pub struct ConnectionManager {
    path: Arc<PathBuf>,
}

impl ConnectionManager {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Arc::new(path.into()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Open a fresh, fully configured connection.
    pub fn open(&self) -> Result<Connection> {
        let conn = Connection::open(self.path.as_path())?;

        // WAL mode for concurrent readers across requests
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        conn.busy_timeout(Duration::from_secs(5))?;

        debug!("Opened connection to {}", self.path.display());
        Ok(conn)
    }

    /// Create an empty request scope. Nothing is opened until first use.
    pub fn scope(&self) -> ConnectionScope {
        ConnectionScope::new(self.clone())
    }

    /// Drop and recreate all tables. Destroys every user and post.
    pub fn init_schema(&self) -> Result<()> {
        let conn = self.open()?;
        schema::reset(&conn)?;
        info!("Initialized database schema at {}", self.path.display());
        Ok(())
    }

    /// Whether both tables exist, without touching their contents.
    pub fn schema_present(&self) -> Result<bool> {
        let conn = self.open()?;
        schema::is_present(&conn)
    }
}
