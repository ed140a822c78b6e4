//! Ancestor-Closure Records
//!
//! A closure record is the materialized ancestor chain of one node, computed
//! for the whole forest at once by the closure view. Records are snapshots:
//! any structural mutation makes them stale until the view is recomputed.

use crate::models::NodeId;
use serde::{Deserialize, Serialize};

/// Full ancestor chain of a node as of the last closure computation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClosureRecord {
    /// Node this record describes
    pub id: NodeId,

    /// Ancestor ids in root-to-parent order (empty for roots)
    pub ancestors: Vec<NodeId>,

    /// Cumulative weighted depth (roots are at depth 0)
    pub depth: i64,

    /// Set when the node's parent already appears earlier in the chain
    pub cycle: bool,
}

impl ClosureRecord {
    /// Record for a root node
    pub fn root(id: NodeId) -> Self {
        Self {
            id,
            ancestors: Vec::new(),
            depth: 0,
            cycle: false,
        }
    }

    /// True when `id` is a (transitive) ancestor of this record's node
    pub fn has_ancestor(&self, id: NodeId) -> bool {
        self.ancestors.contains(&id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_record() {
        let record = ClosureRecord::root(1);
        assert!(record.ancestors.is_empty());
        assert_eq!(record.depth, 0);
        assert!(!record.has_ancestor(1));
    }

    #[test]
    fn test_has_ancestor() {
        let record = ClosureRecord {
            id: 3,
            ancestors: vec![1, 2],
            depth: 2,
            cycle: false,
        };
        assert!(record.has_ancestor(1));
        assert!(!record.has_ancestor(3));
    }
}
