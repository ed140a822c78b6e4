//! NodeForest Core
//!
//! A forest of named, weighted nodes stored as a single self-referencing
//! relation, with bounded traversals, transactional structural mutations and
//! a materialized ancestor closure.
//!
//! # Architecture
//!
//! - **Single relation**: each node stores only its parent; everything else is derived
//! - **Weighted depth**: an edge to a parent counts `1 + weight` levels
//! - **libsql**: embedded SQLite-compatible store, one transaction per operation
//! - **Cycle safe**: every walk is bounded and cyclic requests are rejected
//!
//! # Modules
//!
//! - [`models`] - Data structures (Node, NodeWithDepth, ClosureRecord)
//! - [`db`] - Database layer with libsql integration
//! - [`services`] - Traversal, mutation and closure engine plus `ForestService`
//! - [`config`] - `ForestConfig`

pub mod config;
pub mod db;
pub mod models;
pub mod services;

// Re-export commonly used types
pub use config::ForestConfig;
pub use models::*;
pub use services::*;
