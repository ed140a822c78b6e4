//! Node Data Structures
//!
//! This module defines the `Node` struct stored in a forest relation, and the
//! depth-annotated view of a node returned by traversals.
//!
//! # Architecture
//!
//! - **Adjacency List**: Each node stores only a non-owning `parent_id` reference
//! - **Caller-Supplied IDs**: Node ids are chosen by the caller and never reassigned
//! - **Weighted Depth**: `weight` adds extra implicit levels to the edge towards the parent
//!
//! # Examples
//!
//! ```rust
//! use nodeforest_core::models::Node;
//!
//! // A root and a child whose edge counts as three levels
//! let root = Node::root(1, "Catalog");
//! let child = Node::child(2, 1, "Shoes").with_weight(2);
//!
//! assert!(root.is_root());
//! assert_eq!(child.parent_id, Some(1));
//! assert_eq!(child.edge_length(), 3);
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Identifier of a node within one forest relation
pub type NodeId = i64;

/// Validation errors for Node values
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Node {0} cannot be its own parent")]
    SelfParent(NodeId),

    #[error("Invalid weight {weight} for node {id}: weight must be non-negative")]
    InvalidWeight { id: NodeId, weight: i64 },
}

/// A single node of the forest.
///
/// # Fields
///
/// - `id`: Unique, caller-supplied identifier
/// - `parent_id`: Parent node reference, `None` for roots
/// - `name`: Arbitrary label (no uniqueness constraint)
/// - `weight`: Extra depth contributed by the edge from this node to its parent
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    /// Unique identifier, stable for the lifetime of the node
    pub id: NodeId,

    /// Parent node ID (structural reference, not ownership)
    pub parent_id: Option<NodeId>,

    /// Human readable label
    pub name: String,

    /// Number of extra implicit levels the edge to the parent represents
    #[serde(default)]
    pub weight: u32,
}

impl Node {
    /// Create a node with an explicit (optional) parent and zero weight
    pub fn new(id: NodeId, parent_id: Option<NodeId>, name: impl Into<String>) -> Self {
        Self {
            id,
            parent_id,
            name: name.into(),
            weight: 0,
        }
    }

    /// Create a root node (no parent)
    pub fn root(id: NodeId, name: impl Into<String>) -> Self {
        Self::new(id, None, name)
    }

    /// Create a node attached to `parent_id`
    pub fn child(id: NodeId, parent_id: NodeId, name: impl Into<String>) -> Self {
        Self::new(id, Some(parent_id), name)
    }

    /// Builder-style weight setter
    pub fn with_weight(mut self, weight: u32) -> Self {
        self.weight = weight;
        self
    }

    /// Builder-style parent setter
    pub fn with_parent(mut self, parent_id: Option<NodeId>) -> Self {
        self.parent_id = parent_id;
        self
    }

    /// True when the node has no parent
    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }

    /// Depth contributed by the edge between this node and its parent
    pub fn edge_length(&self) -> i64 {
        1 + i64::from(self.weight)
    }

    /// Validate structural sanity of a node before it is written
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.parent_id == Some(self.id) {
            return Err(ValidationError::SelfParent(self.id));
        }
        Ok(())
    }

    /// Convert a stored weight column back into the model type
    pub(crate) fn weight_from_column(id: NodeId, weight: i64) -> Result<u32, ValidationError> {
        u32::try_from(weight).map_err(|_| ValidationError::InvalidWeight { id, weight })
    }
}

/// A node paired with its weighted depth relative to a traversal origin.
///
/// Descendants carry positive depths (`1 + weight` per level below the origin);
/// ancestors carry depths that start at `0` for the direct parent and decrease
/// towards the root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeWithDepth {
    #[serde(flatten)]
    pub node: Node,
    pub depth: i64,
}

impl NodeWithDepth {
    pub fn new(node: Node, depth: i64) -> Self {
        Self { node, depth }
    }

    pub fn id(&self) -> NodeId {
        self.node.id
    }
}
