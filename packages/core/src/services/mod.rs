//! Forest Services
//!
//! This module contains the forest engine:
//!
//! - `traversal` - Bounded descendant/ancestor walks with weighted depth
//! - `mutation` - Structural operations built from `NodeStore` primitives
//! - `closure` - Ancestor closure computation and the persisted view
//! - `ForestService` - Transactional facade binding the engine to one relation
//!
//! The engine functions are generic over `NodeStore` and take no transaction
//! of their own; `ForestService` owns the transaction scope.

pub mod closure;
pub mod error;
pub mod forest_service;
pub mod mutation;
pub mod traversal;

pub use error::ForestError;
pub use forest_service::ForestService;
pub use traversal::DEFAULT_MAX_DEPTH;
