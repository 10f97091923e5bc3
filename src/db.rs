use rusqlite::Connection;
use std::fmt;
use std::ops::{Deref, DerefMut};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::config::Config;
use crate::error::{classify_db_error, AppError};

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// What the connection provider needs to reach the database.
#[derive(Clone)]
pub struct ConnectionConfig {
    pub server: String,
    pub database: String,
    pub username: String,
    pub password: String,
}

impl ConnectionConfig {
    pub fn from_config(config: &Config) -> Self {
        Self {
            server: config.sql_server.clone(),
            database: config.sql_database.trim().to_string(),
            username: config.sql_username.clone(),
            password: config.sql_password.clone(),
        }
    }

    pub fn database_path(&self) -> PathBuf {
        Path::new(&self.server).join(format!("{}.sqlite3", self.database))
    }
}

impl fmt::Debug for ConnectionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionConfig")
            .field("server", &self.server)
            .field("database", &self.database)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

pub fn open_db(config: &ConnectionConfig) -> Result<Connection, AppError> {
    std::fs::create_dir_all(&config.server).map_err(|e| {
        AppError::Internal(format!("cannot create data directory {}: {e}", config.server))
    })?;
    let conn = Connection::open(config.database_path()).map_err(AppError::Connection)?;
    conn.busy_timeout(BUSY_TIMEOUT).map_err(classify_db_error)?;
    conn.execute_batch("PRAGMA foreign_keys = ON").map_err(classify_db_error)?;
    ensure_schema(&conn).map_err(classify_db_error)?;
    Ok(conn)
}

pub fn ensure_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS StudentMarks(
            StudentID INTEGER PRIMARY KEY AUTOINCREMENT,
            Name TEXT NOT NULL,
            Semester TEXT NOT NULL,
            Subject TEXT NOT NULL,
            Marks REAL NOT NULL,
            TotalMarks REAL NOT NULL
        )",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_student_marks_subject_semester
         ON StudentMarks(Subject, Semester)",
        [],
    )?;
    Ok(())
}

/// Hands out connections and takes them back when the lease is dropped.
#[derive(Clone)]
pub struct Pool {
    inner: Arc<PoolInner>,
}

struct PoolInner {
    config: ConnectionConfig,
    idle: Mutex<Vec<Connection>>,
    max_idle: usize,
}

impl Pool {
    /// Opens one connection up front so a bad configuration fails here.
    pub fn new(config: ConnectionConfig, max_idle: usize) -> Result<Self, AppError> {
        let first = open_db(&config)?;
        let max_idle = max_idle.max(1);
        let mut idle = Vec::with_capacity(max_idle);
        idle.push(first);
        Ok(Self {
            inner: Arc::new(PoolInner {
                config,
                idle: Mutex::new(idle),
                max_idle,
            }),
        })
    }

    pub fn get(&self) -> Result<PooledConnection, AppError> {
        let reused = self.lock_idle().pop();
        let conn = match reused {
            Some(conn) => conn,
            None => open_db(&self.inner.config)?,
        };
        Ok(PooledConnection {
            conn: Some(conn),
            pool: Arc::clone(&self.inner),
        })
    }

    pub fn idle_count(&self) -> usize {
        self.lock_idle().len()
    }

    pub fn config(&self) -> &ConnectionConfig {
        &self.inner.config
    }

    fn lock_idle(&self) -> std::sync::MutexGuard<'_, Vec<Connection>> {
        self.inner.lock_idle()
    }
}

impl PoolInner {
    // A panic while holding the lock cannot leave the Vec half-updated.
    fn lock_idle(&self) -> std::sync::MutexGuard<'_, Vec<Connection>> {
        self.idle.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// A leased connection. Returned to the pool on drop.
pub struct PooledConnection {
    // Always `Some` outside `Drop`, the only place that takes it.
    conn: Option<Connection>,
    pool: Arc<PoolInner>,
}

impl Deref for PooledConnection {
    type Target = Connection;

    fn deref(&self) -> &Connection {
        self.conn.as_ref().expect("connection present until drop")
    }
}

impl DerefMut for PooledConnection {
    fn deref_mut(&mut self) -> &mut Connection {
        self.conn.as_mut().expect("connection present until drop")
    }
}

impl Drop for PooledConnection {
    fn drop(&mut self) {
        let Some(conn) = self.conn.take() else {
            return;
        };
        let mut idle = self.pool.lock_idle();
        if idle.len() < self.pool.max_idle {
            idle.push(conn);
        }
    }
}
