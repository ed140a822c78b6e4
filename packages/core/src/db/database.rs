//! Database Connection Management
//!
//! This module provides the connection handling and relation provisioning for
//! forests stored in an embedded libsql database.
//!
//! # Architecture
//!
//! - **Path-agnostic**: Accepts any valid PathBuf
//! - **WAL mode**: Write-Ahead Logging so readers do not block the single writer
//! - **Foreign keys**: Enabled on every connection; the parent reference is
//!   deferred so compound operations may pass through intermediate states
//!   inside their transaction
//! - **Many forests per file**: Each forest is one node relation plus an
//!   optional `<table>_view` closure relation
//!
//! # Database Connection Patterns
//!
//! **ALWAYS use `connect_with_timeout()` in async functions.** It configures the
//! busy timeout and foreign key enforcement for the new connection.
//!
//! ```no_run
//! # use nodeforest_core::db::DatabaseService;
//! # use std::path::PathBuf;
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let db_service = DatabaseService::new(PathBuf::from("./data/forest.db")).await?;
//! let conn = db_service.connect_with_timeout().await?;
//! # Ok(())
//! # }
//! ```

use crate::db::error::DatabaseError;
use libsql::{Builder, Database};
use std::path::PathBuf;
use std::sync::Arc;

/// Name of the closure relation that belongs to `table`
pub fn view_table_name(table: &str) -> String {
    format!("{}_view", table)
}

/// Database service for managing the libsql connection and forest relations
///
/// # Examples
///
/// ```no_run
/// use nodeforest_core::db::DatabaseService;
/// use std::path::PathBuf;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let db_service = DatabaseService::new(PathBuf::from("/path/to/forest.db")).await?;
///     db_service.provision_forest("nodetree").await?;
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct DatabaseService {
    /// libsql database handle (wrapped in Arc for sharing)
    pub db: Arc<Database>,

    /// Path to the database file
    pub db_path: PathBuf,
}

impl DatabaseService {
    /// Open (or create) the database at `db_path`
    ///
    /// This will:
    /// 1. Ensure the parent directory exists (create if needed)
    /// 2. Open/create the database file
    /// 3. Switch the journal to WAL mode
    ///
    /// Node relations are not created here; see [`DatabaseService::provision_forest`].
    pub async fn new(db_path: PathBuf) -> Result<Self, DatabaseError> {
        if db_path.as_os_str().is_empty() {
            return Err(DatabaseError::invalid_path(db_path));
        }

        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    if e.kind() == std::io::ErrorKind::PermissionDenied {
                        DatabaseError::permission_denied(db_path.clone())
                    } else {
                        DatabaseError::DirectoryCreationFailed(e)
                    }
                })?;
            }
        }

        let db = Builder::new_local(&db_path)
            .build()
            .await
            .map_err(|e| DatabaseError::connection_failed(db_path.clone(), e))?;

        let service = Self {
            db: Arc::new(db),
            db_path,
        };

        let conn = service.connect_with_timeout().await?;
        service
            .execute_pragma(&conn, "PRAGMA journal_mode = WAL")
            .await?;

        tracing::debug!("Opened forest database at {}", service.db_path.display());
        Ok(service)
    }

    /// Execute a PRAGMA statement
    ///
    /// PRAGMA statements return rows, so we must use query() instead of execute().
    async fn execute_pragma(
        &self,
        conn: &libsql::Connection,
        pragma: &str,
    ) -> Result<(), DatabaseError> {
        let mut stmt = conn.prepare(pragma).await.map_err(|e| {
            DatabaseError::sql_execution(format!("Failed to execute '{}': {}", pragma, e))
        })?;
        let _ = stmt.query(()).await.map_err(|e| {
            DatabaseError::sql_execution(format!("Failed to execute '{}': {}", pragma, e))
        })?;
        Ok(())
    }

    /// Get a raw connection to the database
    ///
    /// Only for synchronous, single-threaded contexts. Async code should use
    /// `connect_with_timeout()`, which also enables foreign key enforcement.
    pub fn connect(&self) -> Result<libsql::Connection, DatabaseError> {
        self.db.connect().map_err(DatabaseError::LibsqlError)
    }

    /// Get an async connection with busy timeout and foreign keys configured
    ///
    /// Sets a 5-second busy timeout so concurrent operations wait and retry
    /// instead of failing immediately with `SQLITE_BUSY`. Foreign keys are a
    /// per-connection setting in SQLite and cannot be changed inside a
    /// transaction, so they are switched on here.
    pub async fn connect_with_timeout(&self) -> Result<libsql::Connection, DatabaseError> {
        let conn = self.connect()?;

        self.execute_pragma(&conn, "PRAGMA busy_timeout = 5000")
            .await?;
        self.execute_pragma(&conn, "PRAGMA foreign_keys = ON")
            .await?;

        Ok(conn)
    }

    /// Create the node relation for `table` (idempotent)
    ///
    /// # Schema
    ///
    /// - `id`: caller-supplied integer primary key
    /// - `parent_id`: nullable self reference, checked at commit time
    /// - `name`: label
    /// - `weight`: non-negative extra depth of the edge to the parent
    pub async fn provision_forest(&self, table: &str) -> Result<(), DatabaseError> {
        let conn = self.connect_with_timeout().await?;

        conn.execute(
            &format!(
                "CREATE TABLE IF NOT EXISTS {table} (
                    id INTEGER PRIMARY KEY NOT NULL,
                    parent_id INTEGER,
                    name TEXT NOT NULL,
                    weight INTEGER NOT NULL DEFAULT 0 CHECK (weight >= 0),
                    FOREIGN KEY (parent_id) REFERENCES {table}(id) DEFERRABLE INITIALLY DEFERRED
                )",
                table = table
            ),
            (),
        )
        .await
        .map_err(|e| {
            DatabaseError::sql_execution(format!("Failed to create table {}: {}", table, e))
        })?;

        conn.execute(
            &format!(
                "CREATE INDEX IF NOT EXISTS idx_{table}_parent ON {table}(parent_id)",
                table = table
            ),
            (),
        )
        .await
        .map_err(|e| {
            DatabaseError::sql_execution(format!("Failed to create index on {}: {}", table, e))
        })?;

        tracing::info!("Provisioned forest relation '{}'", table);
        Ok(())
    }

    /// Drop the closure relation and the node relation for `table`
    pub async fn drop_forest(&self, table: &str) -> Result<(), DatabaseError> {
        let conn = self.connect_with_timeout().await?;

        for name in [view_table_name(table), table.to_string()] {
            conn.execute(&format!("DROP TABLE IF EXISTS {}", name), ())
                .await
                .map_err(|e| {
                    DatabaseError::sql_execution(format!("Failed to drop {}: {}", name, e))
                })?;
        }

        tracing::info!("Dropped forest relation '{}'", table);
        Ok(())
    }
}

/// Check whether a table named `name` exists on `conn`
pub(crate) async fn table_exists(
    conn: &libsql::Connection,
    name: &str,
) -> Result<bool, DatabaseError> {
    let mut rows = conn
        .query(
            "SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1",
            libsql::params![name],
        )
        .await
        .map_err(|e| {
            DatabaseError::sql_execution(format!("Failed to inspect sqlite_master: {}", e))
        })?;
    Ok(rows.next().await?.is_some())
}
