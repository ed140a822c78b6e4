//! Mutation Engine
//!
//! Structural operations expressed as sequences of `NodeStore` primitives.
//! Each function assumes it runs inside one transaction scope owned by the
//! caller; a failure part way through must be rolled back by that caller.
//!
//! Requests that would introduce a parent cycle (moving a node below itself,
//! splicing a node under its own descendant) are rejected with
//! `CycleDetected` before anything is written.

use crate::db::{NodePredicate, NodeStore};
use crate::models::{Node, NodeId};
use crate::services::closure;
use crate::services::error::{ForestError, Result};
use crate::services::traversal::is_ancestor;

/// Insert a new node
pub async fn add_node<S: NodeStore + ?Sized>(store: &S, node: Node) -> Result<Node> {
    Ok(store.insert_node(node).await?)
}

/// Splice `node` into the edge between `x` and `y`
///
/// `node` is inserted with parent `x` (its own `parent_id` is ignored) and `y`
/// is re-pointed at `node`. Whether `y` really was a child of `x` is up to
/// the caller.
pub async fn insert_node<S: NodeStore + ?Sized>(
    store: &S,
    node: Node,
    x: Option<NodeId>,
    y: NodeId,
    max_depth: usize,
) -> Result<Node> {
    if store.get_node(y).await?.is_none() {
        return Err(ForestError::node_not_found(y));
    }
    if let Some(x) = x {
        if store.get_node(x).await?.is_none() {
            return Err(ForestError::node_not_found(x));
        }
        if x == y || is_ancestor(store, y, x, max_depth).await? {
            return Err(ForestError::cycle_detected(
                y,
                format!("cannot splice {} between {} and its ancestor {}", node.id, x, y),
            ));
        }
    }

    let inserted = store.insert_node(node.with_parent(x)).await?;
    store.set_parent(y, Some(inserted.id)).await?;
    Ok(inserted)
}

/// Insert `node` under its parent and hand it all of that parent's previous children
///
/// Returns the absorbed children. A node without a parent is inserted as a
/// root and absorbs nothing.
pub async fn replacing_insert_node<S: NodeStore + ?Sized>(
    store: &S,
    node: Node,
) -> Result<Vec<Node>> {
    let inserted = store.insert_node(node).await?;

    match inserted.parent_id {
        Some(parent_id) => Ok(store
            .set_parent_where_parent_equals(parent_id, Some(inserted.id))
            .await?),
        None => Ok(Vec::new()),
    }
}

/// Re-point `id` at `new_parent_id`; its descendants travel with it
pub async fn move_subtree<S: NodeStore + ?Sized>(
    store: &S,
    id: NodeId,
    new_parent_id: Option<NodeId>,
    max_depth: usize,
) -> Result<()> {
    if store.get_node(id).await?.is_none() {
        return Err(ForestError::node_not_found(id));
    }
    if let Some(parent_id) = new_parent_id {
        if parent_id == id {
            return Err(ForestError::cycle_detected(id, "node cannot be its own parent"));
        }
        if store.get_node(parent_id).await?.is_none() {
            return Err(ForestError::node_not_found(parent_id));
        }
        if is_ancestor(store, id, parent_id, max_depth).await? {
            return Err(ForestError::cycle_detected(
                id,
                format!("cannot move below its own descendant {}", parent_id),
            ));
        }
    }

    Ok(store.set_parent(id, new_parent_id).await?)
}

/// Re-point every direct child of `id` at `new_parent_id`, leaving `id` in place
///
/// Returns the moved children. When `new_parent_id` is itself a child of
/// `id`, it stays put and receives its siblings.
pub async fn move_descendants<S: NodeStore + ?Sized>(
    store: &S,
    id: NodeId,
    new_parent_id: Option<NodeId>,
    max_depth: usize,
) -> Result<Vec<Node>> {
    if store.get_node(id).await?.is_none() {
        return Err(ForestError::node_not_found(id));
    }
    if let Some(parent_id) = new_parent_id {
        let target = store
            .get_node(parent_id)
            .await?
            .ok_or_else(|| ForestError::node_not_found(parent_id))?;

        if parent_id != id
            && target.parent_id != Some(id)
            && is_ancestor(store, id, parent_id, max_depth).await?
        {
            return Err(ForestError::cycle_detected(
                parent_id,
                format!("target lies below a child of {}", id),
            ));
        }
    }

    Ok(store
        .set_parent_where_parent_equals(id, new_parent_id)
        .await?)
}

/// Delete `id` and promote its children to its former parent
///
/// Returns the promoted children.
pub async fn remove_node<S: NodeStore + ?Sized>(store: &S, id: NodeId) -> Result<Vec<Node>> {
    let deleted = store
        .delete_and_return_parent(id)
        .await?
        .ok_or_else(|| ForestError::node_not_found(id))?;

    Ok(store
        .set_parent_where_parent_equals(deleted.id, deleted.parent_id)
        .await?)
}

/// Delete `id` and every transitive descendant
///
/// The closure is recomputed first, inside the same scope, so the delete
/// never works from a stale snapshot. Returns the number of deleted nodes.
pub async fn remove_subtree<S: NodeStore + ?Sized>(store: &S, id: NodeId) -> Result<u64> {
    if store.get_node(id).await?.is_none() {
        return Err(ForestError::node_not_found(id));
    }

    closure::create_view(store).await?;
    Ok(store.delete_where(&NodePredicate::subtree_of(id)).await?)
}

#[cfg(test)]
#[path = "mutation_test.rs"]
mod mutation_test;
