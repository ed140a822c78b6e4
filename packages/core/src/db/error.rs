//! Database Error Types
//!
//! This module defines error types for relation-store operations: connection
//! and SQL failures, plus the constraint failures the node repository reports
//! (missing node, duplicate id, dangling parent reference).

use crate::models::{NodeId, ValidationError};
use std::path::PathBuf;
use thiserror::Error;

/// Database operation errors
///
/// Covers connection, initialization, and statement failures, together with
/// the repository-level constraint kinds. The engine lifts the constraint
/// kinds into its own error type unchanged.
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// Failed to establish database connection
    #[error("Failed to connect to database at {path}: {source}")]
    ConnectionFailed {
        path: PathBuf,
        source: libsql::Error,
    },

    /// Invalid database path provided
    #[error("Invalid database path: {path}")]
    InvalidPath { path: PathBuf },

    /// Permission denied when accessing database
    #[error("Permission denied for database path: {path}")]
    PermissionDenied { path: PathBuf },

    /// Failed to create parent directory
    #[error("Failed to create parent directory for database: {0}")]
    DirectoryCreationFailed(#[from] std::io::Error),

    /// libsql operation error
    #[error("Database operation failed: {0}")]
    LibsqlError(#[from] libsql::Error),

    /// SQL execution error with context
    #[error("SQL execution failed: {context}")]
    SqlExecutionError { context: String },

    /// A stored row could not be turned into a model value
    #[error("Row conversion failed: {context}")]
    RowConversion { context: String },

    /// Addressed node does not exist
    #[error("Node not found: {id}")]
    NodeNotFound { id: NodeId },

    /// Insert collided with an existing id
    #[error("Node id already exists: {id}")]
    DuplicateId { id: NodeId },

    /// Parent reference does not name an existing node
    #[error("Parent {parent_id} of node {id} does not exist")]
    ForeignKeyViolation { id: NodeId, parent_id: NodeId },

    /// Node failed validation before it was written
    #[error("Node validation failed: {0}")]
    Validation(#[from] ValidationError),
}

impl DatabaseError {
    /// Create a connection failed error
    pub fn connection_failed(path: PathBuf, source: libsql::Error) -> Self {
        Self::ConnectionFailed { path, source }
    }

    /// Create an invalid path error
    pub fn invalid_path(path: PathBuf) -> Self {
        Self::InvalidPath { path }
    }

    /// Create a permission denied error
    pub fn permission_denied(path: PathBuf) -> Self {
        Self::PermissionDenied { path }
    }

    /// Create a SQL execution error with context
    pub fn sql_execution(context: impl Into<String>) -> Self {
        Self::SqlExecutionError {
            context: context.into(),
        }
    }

    /// Create a row conversion error with context
    pub fn row_conversion(context: impl Into<String>) -> Self {
        Self::RowConversion {
            context: context.into(),
        }
    }

    pub fn node_not_found(id: NodeId) -> Self {
        Self::NodeNotFound { id }
    }

    pub fn duplicate_id(id: NodeId) -> Self {
        Self::DuplicateId { id }
    }

    pub fn foreign_key_violation(id: NodeId, parent_id: NodeId) -> Self {
        Self::ForeignKeyViolation { id, parent_id }
    }
}
