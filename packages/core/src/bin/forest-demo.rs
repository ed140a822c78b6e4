//! Forest Demo Binary
//!
//! Walks through every forest operation against a scratch relation and logs
//! each intermediate result as JSON.
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin forest-demo
//!
//! # Custom database and relation
//! NODEFOREST_DB_PATH=/tmp/demo.db NODEFOREST_TABLE=demo cargo run --bin forest-demo
//! ```
//!
//! # Environment Variables
//!
//! - `NODEFOREST_DB_PATH`: Database file (default: ./forest.db)
//! - `NODEFOREST_TABLE`: Node relation name (default: nodetree)
//! - `NODEFOREST_MAX_DEPTH`: Traversal depth bound (default: 10000)
//! - `RUST_LOG`: Logging level (e.g., "info", "debug", "trace")

use std::sync::Arc;

use nodeforest_core::db::DatabaseService;
use nodeforest_core::{ForestConfig, ForestService, Node};
use serde::Serialize;

fn log_json<T: Serialize>(label: &str, value: &T) -> anyhow::Result<()> {
    tracing::info!("{}: {}", label, serde_json::to_string(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = ForestConfig::from_env().map_err(|e| anyhow::anyhow!(e))?;
    tracing::info!(
        "Forest '{}' in {}",
        config.table,
        config.database_path.display()
    );

    let db = Arc::new(DatabaseService::new(config.database_path.clone()).await?);
    let forest = ForestService::with_config(db, &config)?;
    forest.build().await?;

    forest.add_node(Node::root(1, "Node1")).await?;
    forest.add_node(Node::child(2, 1, "Node2")).await?;
    forest.add_node(Node::child(3, 1, "Node3")).await?;

    // Each new node takes over its parent's children
    forest.replacing_insert_node(Node::child(4, 1, "Node4")).await?;
    forest.replacing_insert_node(Node::child(5, 4, "Node5")).await?;

    log_json("leaves", &forest.get_leaves().await?)?;
    log_json("roots", &forest.get_roots().await?)?;
    log_json("descendants of 1", &forest.get_descendants(1).await?)?;
    log_json("ancestors of 3", &forest.get_ancestors(3).await?)?;

    forest.create_view().await?;
    log_json("view", &forest.view().await?)?;

    forest.move_subtree(3, Some(2)).await?;
    forest.move_descendants(2, Some(4)).await?;
    forest.remove_node(3).await?;
    forest.remove_subtree(5).await?;

    forest.create_view().await?;
    log_json("view after edits", &forest.view().await?)?;

    forest.destroy().await?;
    tracing::info!("Dropped forest '{}'", forest.table());

    Ok(())
}
