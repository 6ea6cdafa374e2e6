//! Database module for Pulsecore
//!
//! Provides SQLite storage for heart-rate sessions.

pub mod schema;
pub mod sessions;

use crate::error::{CoreError, Result};
use rusqlite::Connection;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};

/// Shared handle to the sessions database
///
/// One connection guarded by a mutex; every statement serializes on it.
pub struct Database {
    conn: Arc<Mutex<Connection>>,
    path: Option<PathBuf>,
}

impl Database {
    /// Open (or create) the database file and initialize the schema
    pub fn new(db_path: PathBuf) -> Result<Self> {
        // Ensure parent directory exists
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(&db_path)?;
        schema::init_db(&conn)?;

        tracing::debug!("Opened session database at {}", db_path.display());

        Ok(Database {
            conn: Arc::new(Mutex::new(conn)),
            path: Some(db_path),
        })
    }

    /// Open a private in-memory database (used by tests and embedding)
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        schema::init_db(&conn)?;

        Ok(Database {
            conn: Arc::new(Mutex::new(conn)),
            path: None,
        })
    }

    /// Lock the connection for synchronous use
    pub fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| CoreError::Task("database connection lock poisoned".to_string()))
    }

    /// Run `f` against the connection on the blocking thread pool
    pub async fn with_conn<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let mut guard = conn
                .lock()
                .map_err(|_| CoreError::Task("database connection lock poisoned".to_string()))?;
            f(&mut guard)
        })
        .await?
    }
}

impl Drop for Database {
    fn drop(&mut self) {
        match &self.path {
            Some(path) => tracing::debug!("Closing session database at {}", path.display()),
            None => tracing::debug!("Closing in-memory session database"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_database_creation() {
        let temp_dir = tempfile::tempdir().unwrap();
        let db_path = temp_dir.path().join("data").join("sessions.db");

        let db = Database::new(db_path.clone());
        assert!(db.is_ok());
        assert!(db_path.exists());
    }

    #[test]
    fn test_reopen_keeps_rows() {
        let temp_dir = tempfile::tempdir().unwrap();
        let db_path = temp_dir.path().join("sessions.db");

        {
            let db = Database::new(db_path.clone()).unwrap();
            let conn = db.conn().unwrap();
            sessions::open_session(&conn, 4).unwrap();
        }

        let db = Database::new(db_path).unwrap();
        let conn = db.conn().unwrap();
        assert_eq!(sessions::get_last_id(&conn).unwrap(), Some(4));
    }

    #[tokio::test]
    async fn test_with_conn_runs_closure() {
        let db = Database::open_in_memory().unwrap();
        let id = db.with_conn(sessions::allocate_session).await.unwrap();
        assert_eq!(id, 0);

        let last = db
            .with_conn(|conn| sessions::get_last_id(conn))
            .await
            .unwrap();
        assert_eq!(last, Some(0));
    }
}
