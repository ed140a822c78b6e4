//! Service Layer Error Types
//!
//! This module defines the error type returned by every forest operation.
//! Repository constraint failures are lifted into the matching variants so
//! callers can match on one enum regardless of which layer detected the problem.

use crate::db::DatabaseError;
use crate::models::{NodeId, ValidationError};
use thiserror::Error;

/// Forest operation errors
#[derive(Error, Debug)]
pub enum ForestError {
    /// Operation addressed a nonexistent node
    #[error("Node not found: {id}")]
    NodeNotFound { id: NodeId },

    /// Insert collided with an existing id
    #[error("Node id already exists: {id}")]
    DuplicateId { id: NodeId },

    /// Parent reference does not exist at insert time
    #[error("Parent {parent_id} of node {id} does not exist")]
    ForeignKeyViolation { id: NodeId, parent_id: NodeId },

    /// Traversal or closure computation found a parent cycle, or a request would create one
    #[error("Cycle detected at node {id}: {context}")]
    CycleDetected { id: NodeId, context: String },

    /// Nodes exist that cannot be reached from any root
    #[error("Integrity violation: nodes {ids:?} are not connected to any root")]
    IntegrityViolation { ids: Vec<NodeId> },

    /// `view()` was called before any closure was computed
    #[error("Closure view has not been computed; call create_view() first")]
    ViewNotComputed,

    /// Configuration rejected by validation
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Node failed validation
    #[error("Node validation failed: {0}")]
    ValidationFailed(#[from] ValidationError),

    /// Database operation failed
    #[error("Database operation failed: {0}")]
    DatabaseError(DatabaseError),
}

impl ForestError {
    /// Create a node not found error
    pub fn node_not_found(id: NodeId) -> Self {
        Self::NodeNotFound { id }
    }

    /// Create a cycle detected error
    pub fn cycle_detected(id: NodeId, context: impl Into<String>) -> Self {
        Self::CycleDetected {
            id,
            context: context.into(),
        }
    }

    /// Create an integrity violation error
    pub fn integrity_violation(ids: Vec<NodeId>) -> Self {
        Self::IntegrityViolation { ids }
    }

    /// Create an invalid configuration error
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }
}

impl From<DatabaseError> for ForestError {
    fn from(err: DatabaseError) -> Self {
        match err {
            DatabaseError::NodeNotFound { id } => Self::NodeNotFound { id },
            DatabaseError::DuplicateId { id } => Self::DuplicateId { id },
            DatabaseError::ForeignKeyViolation { id, parent_id } => {
                Self::ForeignKeyViolation { id, parent_id }
            }
            DatabaseError::Validation(e) => Self::ValidationFailed(e),
            other => Self::DatabaseError(other),
        }
    }
}

impl From<libsql::Error> for ForestError {
    fn from(err: libsql::Error) -> Self {
        Self::DatabaseError(DatabaseError::LibsqlError(err))
    }
}

pub type Result<T> = std::result::Result<T, ForestError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repository_kinds_are_lifted() {
        assert!(matches!(
            ForestError::from(DatabaseError::duplicate_id(3)),
            ForestError::DuplicateId { id: 3 }
        ));
        assert!(matches!(
            ForestError::from(DatabaseError::foreign_key_violation(3, 9)),
            ForestError::ForeignKeyViolation {
                id: 3,
                parent_id: 9
            }
        ));
        assert!(matches!(
            ForestError::from(DatabaseError::node_not_found(4)),
            ForestError::NodeNotFound { id: 4 }
        ));
    }

    #[test]
    fn test_other_database_errors_are_wrapped() {
        let err = ForestError::from(DatabaseError::sql_execution("boom"));
        assert!(matches!(err, ForestError::DatabaseError(_)));
        assert!(err.to_string().contains("boom"));
    }
}
