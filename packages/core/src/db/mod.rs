//! Database Layer
//!
//! This module handles all relation-store interactions using libsql:
//!
//! - Database initialization and connection management
//! - Provisioning and dropping of per-forest node relations
//! - The `NodeStore` repository trait and its SQL implementation
//! - Persistence of the closure view in `<table>_view`

mod database;
mod error;
mod node_store;
mod sql_store;

pub use database::{view_table_name, DatabaseService};
pub use error::DatabaseError;
pub use node_store::{DeletedNode, NodePredicate, NodeStore};
pub use sql_store::SqlNodeStore;
