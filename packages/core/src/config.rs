//! Forest configuration
//!
//! `ForestConfig` says where the database lives, which node relation to use,
//! and how deep any walk may go. It is loaded explicitly (usually with
//! [`ForestConfig::from_env`]) and handed to `ForestService`; nothing in the
//! crate reads the environment on its own.

use crate::services::traversal::DEFAULT_MAX_DEPTH;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Environment variable naming the database file
pub const ENV_DB_PATH: &str = "NODEFOREST_DB_PATH";
/// Environment variable naming the node relation
pub const ENV_TABLE: &str = "NODEFOREST_TABLE";
/// Environment variable bounding traversal depth
pub const ENV_MAX_DEPTH: &str = "NODEFOREST_MAX_DEPTH";

/// Configuration for a forest service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForestConfig {
    /// Path to the libsql database file
    pub database_path: PathBuf,

    /// Name of the node relation (the closure relation is `<table>_view`)
    pub table: String,

    /// Maximum number of levels any traversal may cover before it is treated as a cycle
    pub max_depth: usize,
}

impl Default for ForestConfig {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from("./forest.db"),
            table: "nodetree".to_string(),
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl ForestConfig {
    /// Build a config from `NODEFOREST_*` environment variables, falling back to defaults
    pub fn from_env() -> Result<Self, String> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, String> {
        let mut config = Self::default();

        if let Some(path) = lookup(ENV_DB_PATH) {
            config.database_path = PathBuf::from(path);
        }
        if let Some(table) = lookup(ENV_TABLE) {
            config.table = table;
        }
        if let Some(max_depth) = lookup(ENV_MAX_DEPTH) {
            config.max_depth = max_depth
                .parse()
                .map_err(|e| format!("{} must be a positive integer: {}", ENV_MAX_DEPTH, e))?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.table.is_empty() {
            return Err("table cannot be empty".to_string());
        }

        let mut chars = self.table.chars();
        let starts_ok = chars
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic() || c == '_');
        if !starts_ok || !chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(format!(
                "table '{}' must be a plain SQL identifier (letters, digits, underscore)",
                self.table
            ));
        }

        if self.max_depth == 0 {
            return Err("max_depth must be greater than 0".to_string());
        }

        Ok(())
    }
}
