//! Data Models
//!
//! This module contains the data structures shared by the store and the engine:
//!
//! - `Node` - The single stored entity (id, parent reference, name, weight)
//! - `NodeWithDepth` - A node annotated with weighted depth by a traversal
//! - `ClosureRecord` - A node's materialized ancestor chain

mod closure;
mod node;

pub use closure::ClosureRecord;
pub use node::{Node, NodeId, NodeWithDepth, ValidationError};
