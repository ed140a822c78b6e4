//! SqlNodeStore - NodeStore Implementation for libsql
//!
//! This module implements the `NodeStore` trait on top of a libsql connection.
//! The store borrows its connection, so the same type serves both plain
//! connections and open transactions (`libsql::Transaction` dereferences to
//! `libsql::Connection`): every primitive issued through a store built on a
//! transaction becomes part of that transaction.
//!
//! # Row Format
//!
//! Node relation columns (in order): `id`, `parent_id`, `name`, `weight`.
//! Closure relation columns: `id`, `ancestors` (JSON array), `depth`, `cycle`.
//!
//! # Examples
//!
//! ```rust,no_run
//! use nodeforest_core::db::{DatabaseService, NodeStore, SqlNodeStore};
//! use nodeforest_core::models::Node;
//! use std::path::PathBuf;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let db = DatabaseService::new(PathBuf::from("./data/forest.db")).await?;
//!     db.provision_forest("nodetree").await?;
//!
//!     let conn = db.connect_with_timeout().await?;
//!     let store = SqlNodeStore::new(&conn, "nodetree");
//!     store.insert_node(Node::root(1, "root")).await?;
//!     Ok(())
//! }
//! ```

use crate::db::database::{table_exists, view_table_name};
use crate::db::node_store::{DeletedNode, NodePredicate, NodeStore};
use crate::db::DatabaseError;
use crate::models::{ClosureRecord, Node, NodeId};
use async_trait::async_trait;
use libsql::params::{IntoParams, Params};
use libsql::{Connection, Row, Value};

const NODE_COLUMNS: &str = "id, parent_id, name, weight";

/// libsql-backed node repository for one forest relation
pub struct SqlNodeStore<'c> {
    conn: &'c Connection,
    table: &'c str,
    view_table: String,
}

impl<'c> SqlNodeStore<'c> {
    /// Bind a store to `conn` (or a transaction) and the relation `table`
    pub fn new(conn: &'c Connection, table: &'c str) -> Self {
        Self {
            conn,
            table,
            view_table: view_table_name(table),
        }
    }

    /// Convert libsql::Row to Node model
    fn row_to_node(row: &Row) -> Result<Node, DatabaseError> {
        let id: i64 = row
            .get(0)
            .map_err(|e| DatabaseError::row_conversion(format!("Failed to get id: {}", e)))?;
        let parent_id: Option<i64> = row.get(1).map_err(|e| {
            DatabaseError::row_conversion(format!("Failed to get parent_id: {}", e))
        })?;
        let name: String = row
            .get(2)
            .map_err(|e| DatabaseError::row_conversion(format!("Failed to get name: {}", e)))?;
        let weight: i64 = row
            .get(3)
            .map_err(|e| DatabaseError::row_conversion(format!("Failed to get weight: {}", e)))?;

        Ok(Node {
            id,
            parent_id,
            name,
            weight: Node::weight_from_column(id, weight)?,
        })
    }

    /// Convert libsql::Row to ClosureRecord
    fn row_to_record(row: &Row) -> Result<ClosureRecord, DatabaseError> {
        let id: i64 = row
            .get(0)
            .map_err(|e| DatabaseError::row_conversion(format!("Failed to get id: {}", e)))?;
        let ancestors_json: String = row.get(1).map_err(|e| {
            DatabaseError::row_conversion(format!("Failed to get ancestors: {}", e))
        })?;
        let depth: i64 = row
            .get(2)
            .map_err(|e| DatabaseError::row_conversion(format!("Failed to get depth: {}", e)))?;
        let cycle: i64 = row
            .get(3)
            .map_err(|e| DatabaseError::row_conversion(format!("Failed to get cycle: {}", e)))?;

        let ancestors: Vec<NodeId> = serde_json::from_str(&ancestors_json).map_err(|e| {
            DatabaseError::row_conversion(format!(
                "Failed to parse ancestors of node {}: {}",
                id, e
            ))
        })?;

        Ok(ClosureRecord {
            id,
            ancestors,
            depth,
            cycle: cycle != 0,
        })
    }

    /// Run a row-returning statement and convert every row into a Node
    async fn query_nodes(
        &self,
        sql: &str,
        params: impl IntoParams + Send,
    ) -> Result<Vec<Node>, DatabaseError> {
        let mut rows = self.conn.query(sql, params).await.map_err(|e| {
            DatabaseError::sql_execution(format!("Failed to execute '{}': {}", sql, e))
        })?;

        let mut nodes = Vec::new();
        while let Some(row) = rows.next().await? {
            nodes.push(Self::row_to_node(&row)?);
        }
        Ok(nodes)
    }
}

fn nullable(id: Option<NodeId>) -> Value {
    id.map_or(Value::Null, Value::Integer)
}

/// Render a predicate as a SQL condition, appending its parameters to `params`
fn predicate_sql(predicate: &NodePredicate, view_table: &str, params: &mut Vec<Value>) -> String {
    match predicate {
        NodePredicate::Id(id) => {
            params.push(Value::Integer(*id));
            format!("id = ?{}", params.len())
        }
        NodePredicate::HasAncestorInView(ancestor) => {
            params.push(Value::Integer(*ancestor));
            format!(
                "id IN (SELECT v.id FROM {} AS v, json_each(v.ancestors) AS a WHERE a.value = ?{})",
                view_table,
                params.len()
            )
        }
        NodePredicate::Any(predicates) if predicates.is_empty() => "0".to_string(),
        NodePredicate::Any(predicates) => {
            let clauses: Vec<String> = predicates
                .iter()
                .map(|p| predicate_sql(p, view_table, params))
                .collect();
            format!("({})", clauses.join(" OR "))
        }
    }
}

#[async_trait]
impl<'c> NodeStore for SqlNodeStore<'c> {
    async fn get_node(&self, id: NodeId) -> Result<Option<Node>, DatabaseError> {
        let sql = format!("SELECT {} FROM {} WHERE id = ?1", NODE_COLUMNS, self.table);
        Ok(self
            .query_nodes(&sql, libsql::params![id])
            .await?
            .into_iter()
            .next())
    }

    async fn insert_node(&self, node: Node) -> Result<Node, DatabaseError> {
        node.validate()?;

        if self.get_node(node.id).await?.is_some() {
            return Err(DatabaseError::duplicate_id(node.id));
        }
        if let Some(parent_id) = node.parent_id {
            if self.get_node(parent_id).await?.is_none() {
                return Err(DatabaseError::foreign_key_violation(node.id, parent_id));
            }
        }

        let sql = format!(
            "INSERT INTO {} ({}) VALUES (?1, ?2, ?3, ?4)",
            self.table, NODE_COLUMNS
        );
        self.conn
            .execute(
                &sql,
                Params::Positional(vec![
                    Value::Integer(node.id),
                    nullable(node.parent_id),
                    Value::Text(node.name.clone()),
                    Value::Integer(i64::from(node.weight)),
                ]),
            )
            .await
            .map_err(|e| {
                DatabaseError::sql_execution(format!("Failed to insert node {}: {}", node.id, e))
            })?;

        tracing::debug!("Inserted node {} under {:?}", node.id, node.parent_id);
        Ok(node)
    }

    async fn set_parent(
        &self,
        id: NodeId,
        new_parent_id: Option<NodeId>,
    ) -> Result<(), DatabaseError> {
        let sql = format!("UPDATE {} SET parent_id = ?2 WHERE id = ?1", self.table);
        let affected = self
            .conn
            .execute(
                &sql,
                Params::Positional(vec![Value::Integer(id), nullable(new_parent_id)]),
            )
            .await
            .map_err(|e| {
                DatabaseError::sql_execution(format!("Failed to reparent node {}: {}", id, e))
            })?;

        if affected == 0 {
            return Err(DatabaseError::node_not_found(id));
        }
        tracing::debug!("Set parent of node {} to {:?}", id, new_parent_id);
        Ok(())
    }

    async fn set_parent_where_parent_equals(
        &self,
        old_parent_id: NodeId,
        new_parent_id: Option<NodeId>,
    ) -> Result<Vec<Node>, DatabaseError> {
        let sql = format!(
            "UPDATE {} SET parent_id = ?2 WHERE parent_id = ?1 AND id IS NOT ?2 RETURNING {}",
            self.table, NODE_COLUMNS
        );
        let mut moved = self
            .query_nodes(
                &sql,
                Params::Positional(vec![Value::Integer(old_parent_id), nullable(new_parent_id)]),
            )
            .await?;
        moved.sort_by_key(|node| node.id);

        tracing::debug!(
            "Retargeted {} children of node {} to {:?}",
            moved.len(),
            old_parent_id,
            new_parent_id
        );
        Ok(moved)
    }

    async fn delete_and_return_parent(
        &self,
        id: NodeId,
    ) -> Result<Option<DeletedNode>, DatabaseError> {
        let sql = format!("DELETE FROM {} WHERE id = ?1 RETURNING id, parent_id", self.table);
        let mut rows = self
            .conn
            .query(&sql, libsql::params![id])
            .await
            .map_err(|e| {
                DatabaseError::sql_execution(format!("Failed to delete node {}: {}", id, e))
            })?;

        let Some(row) = rows.next().await? else {
            return Ok(None);
        };
        let deleted_id: i64 = row
            .get(0)
            .map_err(|e| DatabaseError::row_conversion(format!("Failed to get id: {}", e)))?;
        let parent_id: Option<i64> = row.get(1).map_err(|e| {
            DatabaseError::row_conversion(format!("Failed to get parent_id: {}", e))
        })?;

        tracing::debug!("Deleted node {} (parent {:?})", deleted_id, parent_id);
        Ok(Some(DeletedNode {
            id: deleted_id,
            parent_id,
        }))
    }

    async fn delete_where(&self, predicate: &NodePredicate) -> Result<u64, DatabaseError> {
        let mut params = Vec::new();
        let condition = predicate_sql(predicate, &self.view_table, &mut params);
        let sql = format!("DELETE FROM {} WHERE {}", self.table, condition);

        let deleted = self
            .conn
            .execute(&sql, Params::Positional(params))
            .await
            .map_err(|e| {
                DatabaseError::sql_execution(format!("Failed to execute '{}': {}", sql, e))
            })?;

        tracing::debug!("Deleted {} nodes matching {:?}", deleted, predicate);
        Ok(deleted)
    }

    async fn scan_children(&self, parent_id: NodeId) -> Result<Vec<Node>, DatabaseError> {
        let sql = format!(
            "SELECT {} FROM {} WHERE parent_id = ?1 ORDER BY id",
            NODE_COLUMNS, self.table
        );
        self.query_nodes(&sql, libsql::params![parent_id]).await
    }

    async fn scan_leaves(&self) -> Result<Vec<Node>, DatabaseError> {
        let sql = format!(
            "SELECT {columns} FROM {table}
             WHERE id NOT IN (SELECT parent_id FROM {table} WHERE parent_id IS NOT NULL)
             ORDER BY id",
            columns = NODE_COLUMNS,
            table = self.table
        );
        self.query_nodes(&sql, ()).await
    }

    async fn scan_roots(&self) -> Result<Vec<Node>, DatabaseError> {
        let sql = format!(
            "SELECT {} FROM {} WHERE parent_id IS NULL ORDER BY id",
            NODE_COLUMNS, self.table
        );
        self.query_nodes(&sql, ()).await
    }

    async fn scan_all(&self) -> Result<Vec<Node>, DatabaseError> {
        let sql = format!("SELECT {} FROM {} ORDER BY id", NODE_COLUMNS, self.table);
        self.query_nodes(&sql, ()).await
    }

    async fn replace_closure(&self, records: &[ClosureRecord]) -> Result<(), DatabaseError> {
        self.conn
            .execute(
                &format!(
                    "CREATE TABLE IF NOT EXISTS {} (
                        id INTEGER PRIMARY KEY NOT NULL,
                        ancestors TEXT NOT NULL,
                        depth INTEGER NOT NULL,
                        cycle INTEGER NOT NULL DEFAULT 0
                    )",
                    self.view_table
                ),
                (),
            )
            .await
            .map_err(|e| {
                DatabaseError::sql_execution(format!(
                    "Failed to create {}: {}",
                    self.view_table, e
                ))
            })?;

        self.conn
            .execute(&format!("DELETE FROM {}", self.view_table), ())
            .await
            .map_err(|e| {
                DatabaseError::sql_execution(format!("Failed to clear {}: {}", self.view_table, e))
            })?;

        let insert = format!(
            "INSERT INTO {} (id, ancestors, depth, cycle) VALUES (?1, ?2, ?3, ?4)",
            self.view_table
        );
        for record in records {
            let ancestors = serde_json::to_string(&record.ancestors).map_err(|e| {
                DatabaseError::row_conversion(format!(
                    "Failed to encode ancestors of node {}: {}",
                    record.id, e
                ))
            })?;
            self.conn
                .execute(
                    &insert,
                    libsql::params![record.id, ancestors, record.depth, i64::from(record.cycle)],
                )
                .await
                .map_err(|e| {
                    DatabaseError::sql_execution(format!(
                        "Failed to store closure of node {}: {}",
                        record.id, e
                    ))
                })?;
        }

        tracing::debug!("Stored {} closure records in {}", records.len(), self.view_table);
        Ok(())
    }

    async fn read_closure(&self) -> Result<Option<Vec<ClosureRecord>>, DatabaseError> {
        if !table_exists(self.conn, &self.view_table).await? {
            return Ok(None);
        }

        let sql = format!(
            "SELECT id, ancestors, depth, cycle FROM {} ORDER BY id",
            self.view_table
        );
        let mut rows = self.conn.query(&sql, ()).await.map_err(|e| {
            DatabaseError::sql_execution(format!("Failed to execute '{}': {}", sql, e))
        })?;

        let mut records = Vec::new();
        while let Some(row) = rows.next().await? {
            records.push(Self::row_to_record(&row)?);
        }
        Ok(Some(records))
    }
}
