//! Forest Service - transactional facade over one node relation
//!
//! `ForestService` binds a `DatabaseService` to a table name and runs every
//! traversal, mutation and closure operation inside its own libsql
//! transaction:
//!
//! - Mutations take the writer lock up front (`TransactionBehavior::Immediate`)
//! - Reads use a deferred transaction, so a traversal sees one snapshot
//! - `Ok` commits, `Err` rolls back; compound operations (delete then
//!   promote, insert then absorb) are never observed half done
//!
//! # Examples
//!
//! ```no_run
//! # use nodeforest_core::db::DatabaseService;
//! # use nodeforest_core::models::Node;
//! # use nodeforest_core::services::ForestService;
//! # use std::path::PathBuf;
//! # use std::sync::Arc;
//! # #[tokio::main]
//! # async fn main() -> anyhow::Result<()> {
//! let db = Arc::new(DatabaseService::new(PathBuf::from("./forest.db")).await?);
//! let forest = ForestService::new(db, "nodetree");
//! forest.build().await?;
//!
//! forest.add_node(Node::root(1, "root")).await?;
//! forest.add_node(Node::child(2, 1, "child")).await?;
//! let descendants = forest.get_descendants(1).await?;
//! # Ok(())
//! # }
//! ```

use crate::config::ForestConfig;
use crate::db::{DatabaseService, NodeStore, SqlNodeStore};
use crate::models::{ClosureRecord, Node, NodeId, NodeWithDepth};
use crate::services::error::{ForestError, Result};
use crate::services::traversal::DEFAULT_MAX_DEPTH;
use crate::services::{closure, mutation, traversal};
use libsql::{Transaction, TransactionBehavior};
use std::sync::Arc;

/// Transactional entry point for one forest
#[derive(Debug, Clone)]
pub struct ForestService {
    db: Arc<DatabaseService>,
    table: String,
    max_depth: usize,
}

impl ForestService {
    /// Create a service for `table` with the default depth bound
    ///
    /// The table name is interpolated into SQL; use [`ForestService::with_config`]
    /// when it comes from outside the program.
    pub fn new(db: Arc<DatabaseService>, table: impl Into<String>) -> Self {
        Self {
            db,
            table: table.into(),
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    /// Create a service from a validated configuration
    pub fn with_config(db: Arc<DatabaseService>, config: &ForestConfig) -> Result<Self> {
        config.validate().map_err(ForestError::invalid_config)?;

        Ok(Self {
            db,
            table: config.table.clone(),
            max_depth: config.max_depth,
        })
    }

    /// Override the traversal depth bound
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    async fn begin(&self, behavior: TransactionBehavior) -> Result<Transaction> {
        let conn = self.db.connect_with_timeout().await?;
        Ok(conn.transaction_with_behavior(behavior).await?)
    }

    /// Commit on success, roll back on failure
    async fn finish<T>(tx: Transaction, result: Result<T>) -> Result<T> {
        match result {
            Ok(value) => {
                tx.commit().await?;
                Ok(value)
            }
            Err(e) => {
                if let Err(rollback_err) = tx.rollback().await {
                    tracing::warn!("Rollback after '{}' failed: {}", e, rollback_err);
                }
                Err(e)
            }
        }
    }

    // ========================================================================
    // Provisioning
    // ========================================================================

    /// Create the node relation and its index if absent
    pub async fn build(&self) -> Result<()> {
        Ok(self.db.provision_forest(&self.table).await?)
    }

    /// Drop the closure relation and the node relation if present
    pub async fn destroy(&self) -> Result<bool> {
        self.db.drop_forest(&self.table).await?;
        Ok(true)
    }

    // ========================================================================
    // Reads
    // ========================================================================

    /// Fetch a single node
    pub async fn get_node(&self, id: NodeId) -> Result<Option<Node>> {
        let tx = self.begin(TransactionBehavior::Deferred).await?;
        let result = {
            let store = SqlNodeStore::new(&tx, &self.table);
            store.get_node(id).await.map_err(ForestError::from)
        };
        Self::finish(tx, result).await
    }

    /// All transitive descendants of `id` in breadth-first order with weighted depth
    pub async fn get_descendants(&self, id: NodeId) -> Result<Vec<NodeWithDepth>> {
        let tx = self.begin(TransactionBehavior::Deferred).await?;
        let result = {
            let store = SqlNodeStore::new(&tx, &self.table);
            traversal::get_descendants(&store, id, self.max_depth).await
        };
        Self::finish(tx, result).await
    }

    /// The ancestor chain of `id`, parent first, with non-positive weighted depth
    pub async fn get_ancestors(&self, id: NodeId) -> Result<Vec<NodeWithDepth>> {
        let tx = self.begin(TransactionBehavior::Deferred).await?;
        let result = {
            let store = SqlNodeStore::new(&tx, &self.table);
            traversal::get_ancestors(&store, id, self.max_depth).await
        };
        Self::finish(tx, result).await
    }

    /// Nodes without children
    pub async fn get_leaves(&self) -> Result<Vec<Node>> {
        let tx = self.begin(TransactionBehavior::Deferred).await?;
        let result = {
            let store = SqlNodeStore::new(&tx, &self.table);
            traversal::get_leaves(&store).await
        };
        Self::finish(tx, result).await
    }

    /// Nodes without a parent
    pub async fn get_roots(&self) -> Result<Vec<Node>> {
        let tx = self.begin(TransactionBehavior::Deferred).await?;
        let result = {
            let store = SqlNodeStore::new(&tx, &self.table);
            traversal::get_roots(&store).await
        };
        Self::finish(tx, result).await
    }

    /// Read the last persisted closure view
    pub async fn view(&self) -> Result<Vec<ClosureRecord>> {
        let tx = self.begin(TransactionBehavior::Deferred).await?;
        let result = {
            let store = SqlNodeStore::new(&tx, &self.table);
            closure::view(&store).await
        };
        Self::finish(tx, result).await
    }

    // ========================================================================
    // Mutations
    // ========================================================================

    /// Insert a node
    pub async fn add_node(&self, node: Node) -> Result<Node> {
        let tx = self.begin(TransactionBehavior::Immediate).await?;
        let result = {
            let store = SqlNodeStore::new(&tx, &self.table);
            mutation::add_node(&store, node).await
        };
        let added = Self::finish(tx, result).await?;

        tracing::info!("Added node {} under {:?}", added.id, added.parent_id);
        Ok(added)
    }

    /// Splice `node` between `x` and its child `y`
    pub async fn insert_node(&self, node: Node, x: Option<NodeId>, y: NodeId) -> Result<Node> {
        let tx = self.begin(TransactionBehavior::Immediate).await?;
        let result = {
            let store = SqlNodeStore::new(&tx, &self.table);
            mutation::insert_node(&store, node, x, y, self.max_depth).await
        };
        let inserted = Self::finish(tx, result).await?;

        tracing::info!("Spliced node {} above {}", inserted.id, y);
        Ok(inserted)
    }

    /// Insert `node` and hand it every previous child of its parent
    pub async fn replacing_insert_node(&self, node: Node) -> Result<Vec<Node>> {
        let id = node.id;
        let tx = self.begin(TransactionBehavior::Immediate).await?;
        let result = {
            let store = SqlNodeStore::new(&tx, &self.table);
            mutation::replacing_insert_node(&store, node).await
        };
        let absorbed = Self::finish(tx, result).await?;

        tracing::info!("Inserted node {} absorbing {} children", id, absorbed.len());
        Ok(absorbed)
    }

    /// Move `id` and its subtree below `new_parent_id` (or make it a root)
    pub async fn move_subtree(&self, id: NodeId, new_parent_id: Option<NodeId>) -> Result<()> {
        let tx = self.begin(TransactionBehavior::Immediate).await?;
        let result = {
            let store = SqlNodeStore::new(&tx, &self.table);
            mutation::move_subtree(&store, id, new_parent_id, self.max_depth).await
        };
        Self::finish(tx, result).await?;

        tracing::info!("Moved subtree {} under {:?}", id, new_parent_id);
        Ok(())
    }

    /// Move the direct children of `id` below `new_parent_id`
    pub async fn move_descendants(
        &self,
        id: NodeId,
        new_parent_id: Option<NodeId>,
    ) -> Result<Vec<Node>> {
        let tx = self.begin(TransactionBehavior::Immediate).await?;
        let result = {
            let store = SqlNodeStore::new(&tx, &self.table);
            mutation::move_descendants(&store, id, new_parent_id, self.max_depth).await
        };
        let moved = Self::finish(tx, result).await?;

        tracing::info!(
            "Moved {} children of {} under {:?}",
            moved.len(),
            id,
            new_parent_id
        );
        Ok(moved)
    }

    /// Remove `id`, promoting its children to its former parent
    pub async fn remove_node(&self, id: NodeId) -> Result<Vec<Node>> {
        let tx = self.begin(TransactionBehavior::Immediate).await?;
        let result = {
            let store = SqlNodeStore::new(&tx, &self.table);
            mutation::remove_node(&store, id).await
        };
        let promoted = Self::finish(tx, result).await?;

        tracing::info!("Removed node {} promoting {} children", id, promoted.len());
        Ok(promoted)
    }

    /// Remove `id` and all of its descendants
    pub async fn remove_subtree(&self, id: NodeId) -> Result<u64> {
        let tx = self.begin(TransactionBehavior::Immediate).await?;
        let result = {
            let store = SqlNodeStore::new(&tx, &self.table);
            mutation::remove_subtree(&store, id).await
        };
        let deleted = Self::finish(tx, result).await?;

        tracing::info!("Removed subtree {} ({} nodes)", id, deleted);
        Ok(deleted)
    }

    /// Recompute and persist the closure view
    pub async fn create_view(&self) -> Result<Vec<ClosureRecord>> {
        let tx = self.begin(TransactionBehavior::Immediate).await?;
        let result = {
            let store = SqlNodeStore::new(&tx, &self.table);
            closure::create_view(&store).await
        };
        Self::finish(tx, result).await
    }
}
