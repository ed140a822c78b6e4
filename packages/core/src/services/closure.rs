//! Closure View
//!
//! Derives, for every node, its full ancestor chain, cumulative weighted depth
//! and a cycle flag. The computation expands from the roots downward until no
//! further node can be reached:
//!
//! 1. Every root gets ancestors `[]`, depth `0`, cycle `false`
//! 2. A node whose parent already has an unflagged record gets
//!    `parent.ancestors + [parent.id]`, depth `parent.depth + 1 + weight`,
//!    and a cycle flag when its parent already appears in that chain
//! 3. Nodes left without a record are disconnected from every root
//!    (cyclic or referencing a missing parent) and are reported
//!
//! The result is a snapshot. It is persisted by `create_view` and read back
//! by `view`; mutations make it stale until `create_view` runs again.

use crate::db::NodeStore;
use crate::models::{ClosureRecord, Node, NodeId};
use crate::services::error::{ForestError, Result};
use std::collections::{HashMap, VecDeque};

/// Compute closure records for `nodes`, ordered by id
///
/// # Errors
///
/// - `CycleDetected` if any expanded record carries the cycle flag
/// - `IntegrityViolation` listing every node that no root reaches
pub fn compute_closure(nodes: &[Node]) -> Result<Vec<ClosureRecord>> {
    let mut children: HashMap<NodeId, Vec<&Node>> = HashMap::new();
    for node in nodes {
        if let Some(parent_id) = node.parent_id {
            children.entry(parent_id).or_default().push(node);
        }
    }

    let mut records: HashMap<NodeId, ClosureRecord> = HashMap::with_capacity(nodes.len());
    let mut queue: VecDeque<NodeId> = VecDeque::new();

    for root in nodes.iter().filter(|n| n.is_root()) {
        records.insert(root.id, ClosureRecord::root(root.id));
        queue.push_back(root.id);
    }

    while let Some(parent_id) = queue.pop_front() {
        let Some(parent) = records.get(&parent_id).cloned() else {
            continue;
        };
        if parent.cycle {
            continue;
        }

        for child in children.get(&parent_id).into_iter().flatten() {
            if records.contains_key(&child.id) {
                continue;
            }

            let mut ancestors = parent.ancestors.clone();
            ancestors.push(parent.id);
            let record = ClosureRecord {
                id: child.id,
                cycle: parent.has_ancestor(parent.id),
                ancestors,
                depth: parent.depth + child.edge_length(),
            };

            if record.cycle {
                return Err(ForestError::cycle_detected(
                    child.id,
                    "parent recurs in its own ancestor chain",
                ));
            }
            records.insert(child.id, record);
            queue.push_back(child.id);
        }
    }

    let unreachable: Vec<NodeId> = nodes
        .iter()
        .filter(|n| !records.contains_key(&n.id))
        .map(|n| n.id)
        .collect();
    if !unreachable.is_empty() {
        tracing::warn!(
            "Closure left {} nodes unreachable from any root: {:?}",
            unreachable.len(),
            unreachable
        );
        return Err(ForestError::integrity_violation(unreachable));
    }

    let mut records: Vec<ClosureRecord> = records.into_values().collect();
    records.sort_by_key(|r| r.id);
    Ok(records)
}

/// Recompute the closure from the current relation and persist it
pub async fn create_view<S: NodeStore + ?Sized>(store: &S) -> Result<Vec<ClosureRecord>> {
    let nodes = store.scan_all().await?;
    let records = compute_closure(&nodes)?;
    store.replace_closure(&records).await?;

    tracing::debug!("Computed closure view with {} records", records.len());
    Ok(records)
}

/// Read the last persisted closure
///
/// Fails with `ViewNotComputed` if `create_view` has never run for this relation.
pub async fn view<S: NodeStore + ?Sized>(store: &S) -> Result<Vec<ClosureRecord>> {
    store
        .read_closure()
        .await?
        .ok_or(ForestError::ViewNotComputed)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: NodeId, ancestors: Vec<NodeId>, depth: i64) -> ClosureRecord {
        ClosureRecord {
            id,
            ancestors,
            depth,
            cycle: false,
        }
    }

    #[test]
    fn test_empty_forest_has_empty_closure() {
        assert!(compute_closure(&[]).unwrap().is_empty());
    }

    #[test]
    fn test_chain_and_siblings() {
        let nodes = vec![
            Node::root(1, "root"),
            Node::child(2, 1, "a"),
            Node::child(3, 1, "b"),
            Node::child(4, 2, "a.a"),
        ];

        assert_eq!(
            compute_closure(&nodes).unwrap(),
            vec![
                ClosureRecord::root(1),
                record(2, vec![1], 1),
                record(3, vec![1], 1),
                record(4, vec![1, 2], 2),
            ]
        );
    }

    #[test]
    fn test_weights_and_multiple_roots() {
        // Root weight does not count: roots always start at depth 0
        let nodes = vec![
            Node::root(10, "r1").with_weight(7),
            Node::child(11, 10, "heavy").with_weight(3),
            Node::root(20, "r2"),
            Node::child(21, 20, "plain"),
        ];

        assert_eq!(
            compute_closure(&nodes).unwrap(),
            vec![
                ClosureRecord::root(10),
                record(11, vec![10], 4),
                ClosureRecord::root(20),
                record(21, vec![20], 1),
            ]
        );
    }

    #[test]
    fn test_input_order_does_not_matter() {
        let nodes = vec![
            Node::child(3, 2, "c"),
            Node::child(2, 1, "b"),
            Node::root(1, "a"),
        ];

        let ids: Vec<NodeId> = compute_closure(&nodes)
            .unwrap()
            .iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn test_detached_cycle_is_integrity_violation() {
        let nodes = vec![
            Node::root(1, "root"),
            Node::child(2, 3, "loop-a"),
            Node::child(3, 2, "loop-b"),
        ];

        match compute_closure(&nodes) {
            Err(ForestError::IntegrityViolation { ids }) => assert_eq!(ids, vec![2, 3]),
            other => panic!("expected integrity violation, got {:?}", other),
        }
    }

    #[test]
    fn test_orphan_is_integrity_violation() {
        let nodes = vec![Node::root(1, "root"), Node::child(2, 42, "orphan")];

        assert!(matches!(
            compute_closure(&nodes),
            Err(ForestError::IntegrityViolation { ids }) if ids == vec![2]
        ));
    }
}
