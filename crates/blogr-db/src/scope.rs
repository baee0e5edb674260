use std::sync::{Mutex, MutexGuard, PoisonError};

use anyhow::{Result, anyhow};
use rusqlite::{Connection, Transaction};
use tracing::{debug, warn};

use crate::ConnectionManager;

/// A request-scoped database handle.
///
/// The connection is opened on first use and reused until [`release`] runs.
/// Dropping the scope releases it as well, so the connection is closed on
/// every exit path of the request.
///
/// [`release`]: ConnectionScope::release
pub struct ConnectionScope {
    manager: ConnectionManager,
    conn: Mutex<Option<Connection>>,
}

impl ConnectionScope {
    pub(crate) fn new(manager: ConnectionManager) -> Self {
        Self {
            manager,
            conn: Mutex::new(None),
        }
    }

    /// Run `f` against this request's connection, opening it if needed.
    pub fn with_conn<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        let mut slot = self.lock()?;
        let conn = self.acquire(&mut slot)?;
        f(conn)
    }

    /// Run `f` inside a transaction on this request's connection.
    ///
    /// Commits when `f` succeeds. On error the transaction is dropped,
    /// which rolls it back.
    pub fn with_tx<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Transaction<'_>) -> Result<T>,
    {
        let mut slot = self.lock()?;
        let conn = self.acquire(&mut slot)?;
        let tx = conn.transaction()?;
        let out = f(&tx)?;
        tx.commit()?;
        Ok(out)
    }

    /// Whether a connection has been opened and not yet released.
    pub fn is_open(&self) -> bool {
        self.conn
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Close the connection if one was opened. Safe to call repeatedly.
    pub fn release(&self) {
        let taken = self
            .conn
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();

        if let Some(conn) = taken {
            match conn.close() {
                Ok(()) => debug!("Released connection to {}", self.manager.path().display()),
                Err((_, e)) => warn!("Failed to close connection cleanly: {}", e),
            }
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, Option<Connection>>> {
        self.conn
            .lock()
            .map_err(|e| anyhow!("Connection lock poisoned: {}", e))
    }

    fn acquire<'a>(&self, slot: &'a mut Option<Connection>) -> Result<&'a mut Connection> {
        if slot.is_none() {
            *slot = Some(self.manager.open()?);
        }
        slot.as_mut()
            .ok_or_else(|| anyhow!("Connection slot empty after open"))
    }
}

impl Drop for ConnectionScope {
    fn drop(&mut self) {
        self.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn manager() -> (TempDir, ConnectionManager) {
        let dir = tempfile::tempdir().unwrap();
        let manager = ConnectionManager::new(dir.path().join("scope.sqlite"));
        manager.init_schema().unwrap();
        (dir, manager)
    }

    #[test]
    fn opens_lazily_and_reuses() {
        let (_dir, manager) = manager();
        let scope = manager.scope();
        assert!(!scope.is_open());

        scope
            .with_conn(|conn| {
                conn.execute("CREATE TEMP TABLE marker (x INTEGER)", [])?;
                Ok(())
            })
            .unwrap();
        assert!(scope.is_open());

        // Temp tables are per-connection, so seeing it proves reuse
        let count: i64 = scope
            .with_conn(|conn| Ok(conn.query_row("SELECT COUNT(*) FROM marker", [], |r| r.get(0))?))
            .unwrap();
        assert_eq!(count, 0);
    }

    #[test]
    fn release_is_idempotent() {
        let (_dir, manager) = manager();
        let scope = manager.scope();

        // Nothing acquired yet
        scope.release();
        assert!(!scope.is_open());

        scope.with_conn(|_| Ok(())).unwrap();
        scope.release();
        scope.release();
        assert!(!scope.is_open());
    }

    #[test]
    fn failed_transaction_rolls_back() {
        let (_dir, manager) = manager();
        let scope = manager.scope();

        let result: Result<()> = scope.with_tx(|tx| {
            tx.execute(
                "INSERT INTO user (username, password) VALUES ('ghost', 'x')",
                [],
            )?;
            Err(anyhow!("abort after insert"))
        });
        assert!(result.is_err());

        let count: i64 = scope
            .with_conn(|conn| Ok(conn.query_row("SELECT COUNT(*) FROM user", [], |r| r.get(0))?))
            .unwrap();
        assert_eq!(count, 0);
    }

    #[test]
    fn scopes_do_not_share_connections() {
        let (_dir, manager) = manager();
        let a = manager.scope();
        let b = manager.scope();

        a.with_conn(|conn| {
            conn.execute("CREATE TEMP TABLE only_in_a (x INTEGER)", [])?;
            Ok(())
        })
        .unwrap();

        let seen = b.with_conn(|conn| {
            Ok(conn.query_row("SELECT COUNT(*) FROM only_in_a", [], |r| r.get::<_, i64>(0))?)
        });
        assert!(seen.is_err());
    }
}
