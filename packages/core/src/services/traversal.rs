//! Traversal Engine
//!
//! Computes ancestor chains and descendant subtrees with accumulated weighted
//! depth. Both walks are iterative and bounded: every node may be visited once
//! and no walk may exceed `max_depth` levels, so a corrupted relation that
//! contains a parent cycle produces `CycleDetected` instead of an endless loop.
//!
//! # Depth Conventions
//!
//! - Descendants: the direct children of the origin sit at `1 + child.weight`;
//!   every further level adds `1 + node.weight`.
//! - Ancestors: the direct parent sits at `0`; every further ancestor `a` sits
//!   at `previous - 1 - a.weight`, so depths decrease towards the root.

use crate::db::NodeStore;
use crate::models::{Node, NodeId, NodeWithDepth};
use crate::services::error::{ForestError, Result};
use std::collections::HashSet;

/// Default bound on the number of levels any walk may cover
pub const DEFAULT_MAX_DEPTH: usize = 10_000;

/// All transitive children of `id` in breadth-first order (children ordered by id)
pub async fn get_descendants<S: NodeStore + ?Sized>(
    store: &S,
    id: NodeId,
    max_depth: usize,
) -> Result<Vec<NodeWithDepth>> {
    if store.get_node(id).await?.is_none() {
        return Err(ForestError::node_not_found(id));
    }

    let mut visited = HashSet::from([id]);
    let mut descendants = Vec::new();
    let mut frontier = vec![(id, 0_i64)];
    let mut level = 0_usize;

    while !frontier.is_empty() {
        level += 1;
        let mut next = Vec::new();

        for (parent_id, parent_depth) in frontier {
            for child in store.scan_children(parent_id).await? {
                if level > max_depth {
                    return Err(ForestError::cycle_detected(
                        id,
                        format!("descendants extend beyond {} levels", max_depth),
                    ));
                }
                if !visited.insert(child.id) {
                    return Err(ForestError::cycle_detected(
                        child.id,
                        format!("reached twice while walking descendants of {}", id),
                    ));
                }

                let depth = parent_depth + child.edge_length();
                next.push((child.id, depth));
                descendants.push(NodeWithDepth::new(child, depth));
            }
        }

        frontier = next;
    }

    tracing::debug!("Node {} has {} descendants", id, descendants.len());
    Ok(descendants)
}

/// All ancestors of `id`, nearest first, ending at a root
pub async fn get_ancestors<S: NodeStore + ?Sized>(
    store: &S,
    id: NodeId,
    max_depth: usize,
) -> Result<Vec<NodeWithDepth>> {
    let node = store
        .get_node(id)
        .await?
        .ok_or_else(|| ForestError::node_not_found(id))?;

    let mut visited = HashSet::from([id]);
    let mut ancestors: Vec<NodeWithDepth> = Vec::new();
    let mut child_id = node.id;
    let mut next = node.parent_id;
    let mut depth = 0_i64;

    while let Some(parent_id) = next {
        if ancestors.len() >= max_depth {
            return Err(ForestError::cycle_detected(
                id,
                format!("ancestor chain longer than {} levels", max_depth),
            ));
        }
        if !visited.insert(parent_id) {
            return Err(ForestError::cycle_detected(
                parent_id,
                format!("reached twice while walking ancestors of {}", id),
            ));
        }

        // A dangling reference can only exist if the relation was written around the store
        let parent = store
            .get_node(parent_id)
            .await?
            .ok_or_else(|| ForestError::integrity_violation(vec![child_id]))?;

        if !ancestors.is_empty() {
            depth -= parent.edge_length();
        }
        child_id = parent.id;
        next = parent.parent_id;
        ancestors.push(NodeWithDepth::new(parent, depth));
    }

    Ok(ancestors)
}

/// True when `ancestor` lies on the parent chain of `id` (a node is not its own ancestor)
pub async fn is_ancestor<S: NodeStore + ?Sized>(
    store: &S,
    ancestor: NodeId,
    id: NodeId,
    max_depth: usize,
) -> Result<bool> {
    Ok(get_ancestors(store, id, max_depth)
        .await?
        .iter()
        .any(|a| a.id() == ancestor))
}

/// Nodes that no other node names as parent
pub async fn get_leaves<S: NodeStore + ?Sized>(store: &S) -> Result<Vec<Node>> {
    Ok(store.scan_leaves().await?)
}

/// Nodes without a parent
pub async fn get_roots<S: NodeStore + ?Sized>(store: &S) -> Result<Vec<Node>> {
    Ok(store.scan_roots().await?)
}

// Tests against a real libsql relation
#[cfg(test)]
#[path = "traversal_test.rs"]
mod traversal_test;
