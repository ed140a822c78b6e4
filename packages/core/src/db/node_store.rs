//! NodeStore Trait - Node Repository Abstraction
//!
//! This module defines the `NodeStore` trait through which the forest engine
//! reaches the relation store. The engine never builds SQL itself; every
//! traversal, mutation, and closure computation is expressed as a sequence of
//! the primitives below.
//!
//! # Design Decisions
//!
//! 1. **Async-First**: All methods are async so a store may suspend on I/O
//! 2. **Scope-Agnostic**: A store is bound to whatever scope it was built on
//!    (plain connection or open transaction); transaction boundaries belong to
//!    the caller, see `ForestService`
//! 3. **Atomic Retarget**: Bulk reparenting is a single primitive instead of an
//!    iteration over fetched children
//! 4. **No Cycle Checks**: Primitives never validate acyclicity; the engine does

use crate::db::DatabaseError;
use crate::models::{ClosureRecord, Node, NodeId};
use async_trait::async_trait;

/// Identity and former parent of a deleted node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeletedNode {
    pub id: NodeId,
    pub parent_id: Option<NodeId>,
}

/// Row predicate for bulk deletes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodePredicate {
    /// The node with exactly this id
    Id(NodeId),

    /// Every node whose closure record lists this id among its ancestors
    HasAncestorInView(NodeId),

    /// Any of the nested predicates holds
    Any(Vec<NodePredicate>),
}

impl NodePredicate {
    /// Predicate selecting `id` and its whole subtree as recorded by the closure view
    pub fn subtree_of(id: NodeId) -> Self {
        Self::Any(vec![Self::Id(id), Self::HasAncestorInView(id)])
    }
}

/// Abstraction layer for the node relation
///
/// Implementations must be `Send + Sync` so futures holding a store can move
/// between runtime threads.
///
/// # Method Categories
///
/// - **Point operations**: get, insert, set_parent, delete_and_return_parent
/// - **Bulk operations**: set_parent_where_parent_equals, delete_where
/// - **Scans**: children, leaves, roots, all
/// - **Closure relation**: replace_closure, read_closure
#[async_trait]
pub trait NodeStore: Send + Sync {
    /// Get node by ID
    ///
    /// - `Ok(Some(node))` if node exists
    /// - `Ok(None)` if node doesn't exist (not an error)
    async fn get_node(&self, id: NodeId) -> Result<Option<Node>, DatabaseError>;

    /// Insert a new node
    ///
    /// # Errors
    ///
    /// - `DuplicateId` if a node with the same id exists
    /// - `ForeignKeyViolation` if `parent_id` names no existing node
    /// - `Validation` if the node names itself as parent
    async fn insert_node(&self, node: Node) -> Result<Node, DatabaseError>;

    /// Point the node `id` at `new_parent_id` (`None` detaches it into a root)
    ///
    /// Fails with `NodeNotFound` if `id` is absent. Does not check for cycles.
    async fn set_parent(
        &self,
        id: NodeId,
        new_parent_id: Option<NodeId>,
    ) -> Result<(), DatabaseError>;

    /// Rewrite every node whose parent is `old_parent_id` to point at `new_parent_id`
    ///
    /// The node whose id equals `new_parent_id` is never rewritten, so a
    /// node cannot become its own parent. Returns the rewritten nodes ordered by id.
    async fn set_parent_where_parent_equals(
        &self,
        old_parent_id: NodeId,
        new_parent_id: Option<NodeId>,
    ) -> Result<Vec<Node>, DatabaseError>;

    /// Remove one node and report what its parent was
    async fn delete_and_return_parent(
        &self,
        id: NodeId,
    ) -> Result<Option<DeletedNode>, DatabaseError>;

    /// Delete every node matching `predicate`, returning the deleted count
    async fn delete_where(&self, predicate: &NodePredicate) -> Result<u64, DatabaseError>;

    /// Direct children of `parent_id`, ordered by id
    async fn scan_children(&self, parent_id: NodeId) -> Result<Vec<Node>, DatabaseError>;

    /// Nodes no other node names as parent, ordered by id
    async fn scan_leaves(&self) -> Result<Vec<Node>, DatabaseError>;

    /// Nodes without a parent, ordered by id
    async fn scan_roots(&self) -> Result<Vec<Node>, DatabaseError>;

    /// Every node, ordered by id
    async fn scan_all(&self) -> Result<Vec<Node>, DatabaseError>;

    /// Replace the persisted closure relation with `records`
    async fn replace_closure(&self, records: &[ClosureRecord]) -> Result<(), DatabaseError>;

    /// Read the persisted closure relation, ordered by id
    ///
    /// Returns `Ok(None)` when no closure has ever been persisted.
    async fn read_closure(&self) -> Result<Option<Vec<ClosureRecord>>, DatabaseError>;
}
