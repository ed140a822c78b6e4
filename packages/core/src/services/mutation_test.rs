//! Tests for the mutation engine
//!
//! Tests cover:
//! - Insert error kinds (duplicate id, dangling parent)
//! - Splicing and replacing inserts
//! - Subtree and children moves, including cycle rejection
//! - Node removal with promotion and subtree removal

#[cfg(test)]
mod tests {
    use crate::db::{DatabaseService, NodeStore, SqlNodeStore};
    use crate::models::{Node, NodeId};
    use crate::services::error::ForestError;
    use crate::services::mutation::{
        add_node, insert_node, move_descendants, move_subtree, remove_node, remove_subtree,
        replacing_insert_node,
    };
    use crate::services::traversal::DEFAULT_MAX_DEPTH;
    use tempfile::TempDir;

    const TABLE: &str = "nodetree";

    async fn create_test_db() -> (DatabaseService, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let db = DatabaseService::new(temp_dir.path().join("test.db"))
            .await
            .unwrap();
        db.provision_forest(TABLE).await.unwrap();
        (db, temp_dir)
    }

    /// Builds  1 -> {2 -> {4}, 3}
    async fn seed(store: &SqlNodeStore<'_>) {
        for node in [
            Node::root(1, "root"),
            Node::child(2, 1, "a"),
            Node::child(3, 1, "b"),
            Node::child(4, 2, "a.a"),
        ] {
            add_node(store, node).await.unwrap();
        }
    }

    async fn parent_of(store: &SqlNodeStore<'_>, id: NodeId) -> Option<NodeId> {
        store.get_node(id).await.unwrap().unwrap().parent_id
    }

    #[tokio::test]
    async fn test_add_node_errors() {
        let (db, _temp) = create_test_db().await;
        let conn = db.connect_with_timeout().await.unwrap();
        let store = SqlNodeStore::new(&conn, TABLE);
        seed(&store).await;

        assert!(matches!(
            add_node(&store, Node::root(1, "dup")).await,
            Err(ForestError::DuplicateId { id: 1 })
        ));
        assert!(matches!(
            add_node(&store, Node::child(9, 77, "dangling")).await,
            Err(ForestError::ForeignKeyViolation {
                id: 9,
                parent_id: 77
            })
        ));
        assert!(matches!(
            add_node(&store, Node::child(9, 9, "self")).await,
            Err(ForestError::ValidationFailed(_))
        ));
    }

    #[tokio::test]
    async fn test_insert_node_splices_edge() {
        let (db, _temp) = create_test_db().await;
        let conn = db.connect_with_timeout().await.unwrap();
        let store = SqlNodeStore::new(&conn, TABLE);
        seed(&store).await;

        // Parent given on the node itself is replaced by x
        let inserted = insert_node(&store, Node::root(5, "mid"), Some(2), 4, DEFAULT_MAX_DEPTH)
            .await
            .unwrap();

        assert_eq!(inserted.parent_id, Some(2));
        assert_eq!(parent_of(&store, 4).await, Some(5));
        assert_eq!(parent_of(&store, 5).await, Some(2));
    }

    #[tokio::test]
    async fn test_insert_node_rejects_cycle_and_missing_child() {
        let (db, _temp) = create_test_db().await;
        let conn = db.connect_with_timeout().await.unwrap();
        let store = SqlNodeStore::new(&conn, TABLE);
        seed(&store).await;

        // x = 4 lies below y = 2
        assert!(matches!(
            insert_node(&store, Node::root(5, "bad"), Some(4), 2, DEFAULT_MAX_DEPTH).await,
            Err(ForestError::CycleDetected { .. })
        ));
        assert!(matches!(
            insert_node(&store, Node::root(5, "bad"), Some(1), 42, DEFAULT_MAX_DEPTH).await,
            Err(ForestError::NodeNotFound { id: 42 })
        ));
        assert!(store.get_node(5).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_insert_node_missing_parent_is_not_found() {
        let (db, _temp) = create_test_db().await;
        let conn = db.connect_with_timeout().await.unwrap();
        let store = SqlNodeStore::new(&conn, TABLE);
        seed(&store).await;

        assert!(matches!(
            insert_node(&store, Node::root(5, "mid"), Some(77), 2, DEFAULT_MAX_DEPTH).await,
            Err(ForestError::NodeNotFound { id: 77 })
        ));
        assert!(store.get_node(5).await.unwrap().is_none());
        assert_eq!(parent_of(&store, 2).await, Some(1));
    }

    #[tokio::test]
    async fn test_replacing_insert_absorbs_siblings() {
        let (db, _temp) = create_test_db().await;
        let conn = db.connect_with_timeout().await.unwrap();
        let store = SqlNodeStore::new(&conn, TABLE);
        seed(&store).await;

        let absorbed = replacing_insert_node(&store, Node::child(5, 1, "layer"))
            .await
            .unwrap();

        let absorbed_ids: Vec<NodeId> = absorbed.iter().map(|n| n.id).collect();
        assert_eq!(absorbed_ids, vec![2, 3]);
        assert_eq!(parent_of(&store, 5).await, Some(1));
        assert_eq!(parent_of(&store, 2).await, Some(5));
        assert_eq!(parent_of(&store, 3).await, Some(5));
        assert_eq!(parent_of(&store, 4).await, Some(2));
    }

    #[tokio::test]
    async fn test_replacing_insert_of_root_absorbs_nothing() {
        let (db, _temp) = create_test_db().await;
        let conn = db.connect_with_timeout().await.unwrap();
        let store = SqlNodeStore::new(&conn, TABLE);
        seed(&store).await;

        let absorbed = replacing_insert_node(&store, Node::root(5, "new root"))
            .await
            .unwrap();

        assert!(absorbed.is_empty());
        assert_eq!(parent_of(&store, 1).await, None);
    }

    #[tokio::test]
    async fn test_move_subtree() {
        let (db, _temp) = create_test_db().await;
        let conn = db.connect_with_timeout().await.unwrap();
        let store = SqlNodeStore::new(&conn, TABLE);
        seed(&store).await;

        move_subtree(&store, 2, Some(3), DEFAULT_MAX_DEPTH)
            .await
            .unwrap();
        assert_eq!(parent_of(&store, 2).await, Some(3));
        assert_eq!(parent_of(&store, 4).await, Some(2));

        move_subtree(&store, 2, None, DEFAULT_MAX_DEPTH).await.unwrap();
        assert_eq!(parent_of(&store, 2).await, None);
    }

    #[tokio::test]
    async fn test_move_subtree_rejects_own_descendant() {
        let (db, _temp) = create_test_db().await;
        let conn = db.connect_with_timeout().await.unwrap();
        let store = SqlNodeStore::new(&conn, TABLE);
        seed(&store).await;

        assert!(matches!(
            move_subtree(&store, 1, Some(4), DEFAULT_MAX_DEPTH).await,
            Err(ForestError::CycleDetected { id: 1, .. })
        ));
        assert!(matches!(
            move_subtree(&store, 2, Some(2), DEFAULT_MAX_DEPTH).await,
            Err(ForestError::CycleDetected { id: 2, .. })
        ));
        assert!(matches!(
            move_subtree(&store, 2, Some(99), DEFAULT_MAX_DEPTH).await,
            Err(ForestError::NodeNotFound { id: 99 })
        ));
        assert_eq!(parent_of(&store, 1).await, None);
    }

    #[tokio::test]
    async fn test_move_descendants_leaves_node_in_place() {
        let (db, _temp) = create_test_db().await;
        let conn = db.connect_with_timeout().await.unwrap();
        let store = SqlNodeStore::new(&conn, TABLE);
        seed(&store).await;

        let moved = move_descendants(&store, 2, Some(3), DEFAULT_MAX_DEPTH)
            .await
            .unwrap();

        assert_eq!(moved, vec![Node::child(4, 3, "a.a")]);
        assert_eq!(parent_of(&store, 2).await, Some(1));
        assert!(store.scan_children(2).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_move_descendants_onto_child_and_below_child() {
        let (db, _temp) = create_test_db().await;
        let conn = db.connect_with_timeout().await.unwrap();
        let store = SqlNodeStore::new(&conn, TABLE);
        seed(&store).await;

        // Grandchild 4 is below child 2, which would end up below 4
        assert!(matches!(
            move_descendants(&store, 1, Some(4), DEFAULT_MAX_DEPTH).await,
            Err(ForestError::CycleDetected { id: 4, .. })
        ));

        // Direct child 2 keeps its place and adopts sibling 3
        let moved = move_descendants(&store, 1, Some(2), DEFAULT_MAX_DEPTH)
            .await
            .unwrap();
        assert_eq!(moved, vec![Node::child(3, 2, "b")]);
        assert_eq!(parent_of(&store, 2).await, Some(1));
    }

    #[tokio::test]
    async fn test_move_descendants_missing_node_or_target() {
        let (db, _temp) = create_test_db().await;
        let conn = db.connect_with_timeout().await.unwrap();
        let store = SqlNodeStore::new(&conn, TABLE);
        seed(&store).await;
        let before = store.scan_all().await.unwrap();

        assert!(matches!(
            move_descendants(&store, 42, Some(1), DEFAULT_MAX_DEPTH).await,
            Err(ForestError::NodeNotFound { id: 42 })
        ));
        assert!(matches!(
            move_descendants(&store, 1, Some(88), DEFAULT_MAX_DEPTH).await,
            Err(ForestError::NodeNotFound { id: 88 })
        ));

        assert_eq!(store.scan_all().await.unwrap(), before);
    }

    #[tokio::test]
    async fn test_remove_node_promotes_children() {
        let (db, _temp) = create_test_db().await;
        let conn = db.connect_with_timeout().await.unwrap();
        // Deleting before promoting relies on the deferred parent check
        let tx = conn.transaction().await.unwrap();
        let store = SqlNodeStore::new(&tx, TABLE);
        seed(&store).await;
        add_node(&store, Node::child(5, 2, "a.b")).await.unwrap();

        let promoted = remove_node(&store, 2).await.unwrap();

        assert_eq!(
            promoted,
            vec![Node::child(4, 1, "a.a"), Node::child(5, 1, "a.b")]
        );
        assert!(store.get_node(2).await.unwrap().is_none());
        assert!(matches!(
            remove_node(&store, 2).await,
            Err(ForestError::NodeNotFound { id: 2 })
        ));
    }

    #[tokio::test]
    async fn test_remove_root_turns_children_into_roots() {
        let (db, _temp) = create_test_db().await;
        let conn = db.connect_with_timeout().await.unwrap();
        // Deleting before promoting relies on the deferred parent check
        let tx = conn.transaction().await.unwrap();
        let store = SqlNodeStore::new(&tx, TABLE);
        seed(&store).await;

        let promoted = remove_node(&store, 1).await.unwrap();

        assert_eq!(promoted.len(), 2);
        assert!(promoted.iter().all(|n| n.parent_id.is_none()));
    }

    #[tokio::test]
    async fn test_remove_subtree() {
        let (db, _temp) = create_test_db().await;
        let conn = db.connect_with_timeout().await.unwrap();
        let store = SqlNodeStore::new(&conn, TABLE);
        seed(&store).await;

        let deleted = remove_subtree(&store, 2).await.unwrap();

        assert_eq!(deleted, 2);
        let remaining: Vec<NodeId> = store
            .scan_all()
            .await
            .unwrap()
            .iter()
            .map(|n| n.id)
            .collect();
        assert_eq!(remaining, vec![1, 3]);
        assert!(matches!(
            remove_subtree(&store, 2).await,
            Err(ForestError::NodeNotFound { id: 2 })
        ));
    }
}
