//! Storage Module Tests
//!
//! Validates local store mechanics: overwrite semantics, idempotent deletes,
//! snapshot isolation and wholesale replacement.

#[cfg(test)]
mod tests {
    use crate::storage::memory::Store;
    use std::collections::HashMap;
    use std::sync::Arc;

    // ============================================================
    // SET / GET
    // ============================================================

    #[tokio::test]
    async fn test_set_then_get_returns_value() {
        let store = Store::new();
        store.set("name".to_string(), "alice".to_string()).await;

        assert_eq!(store.get("name").await, Some("alice".to_string()));
    }

    #[tokio::test]
    async fn test_get_missing_key_is_none() {
        let store = Store::new();

        assert_eq!(store.get("missing").await, None);
    }

    #[tokio::test]
    async fn test_later_write_overwrites() {
        let store = Store::new();
        store.set("k".to_string(), "v1".to_string()).await;
        store.set("k".to_string(), "v2".to_string()).await;

        assert_eq!(store.get("k").await, Some("v2".to_string()));
        assert_eq!(store.len().await, 1);
    }

    // ============================================================
    // DELETE
    // ============================================================

    #[tokio::test]
    async fn test_delete_removes_key() {
        let store = Store::new();
        store.set("k".to_string(), "v".to_string()).await;

        assert!(store.delete("k").await);
        assert_eq!(store.get("k").await, None);
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let store = Store::new();
        store.set("k".to_string(), "v".to_string()).await;

        assert!(store.delete("k").await);
        assert!(!store.delete("k").await, "Second delete should be a no-op");
        assert!(store.is_empty().await);
    }

    // ============================================================
    // SNAPSHOT / REPLACE
    // ============================================================

    #[tokio::test]
    async fn test_snapshot_is_a_copy() {
        let store = Store::new();
        store.set("a".to_string(), "1".to_string()).await;

        let snapshot = store.snapshot().await;
        store.set("b".to_string(), "2".to_string()).await;

        assert_eq!(snapshot.len(), 1, "Snapshot must not see later writes");
        assert_eq!(store.len().await, 2);
    }

    #[tokio::test]
    async fn test_replace_all_discards_previous_entries() {
        let mut initial = HashMap::new();
        initial.insert("stale".to_string(), "x".to_string());
        let store = Store::with_entries(initial);

        let mut snapshot = HashMap::new();
        snapshot.insert("a".to_string(), "1".to_string());
        snapshot.insert("b".to_string(), "2".to_string());
        store.replace_all(snapshot.clone()).await;

        assert_eq!(store.snapshot().await, snapshot);
        assert_eq!(store.get("stale").await, None);
    }

    // ============================================================
    // CONCURRENCY
    // ============================================================

    #[tokio::test]
    async fn test_concurrent_writers_all_land() {
        let store = Arc::new(Store::new());

        let mut handles = Vec::new();
        for i in 0..50 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store.set(format!("key_{}", i), i.to_string()).await;
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(store.len().await, 50);
        assert_eq!(store.get("key_42").await, Some("42".to_string()));
    }

    #[tokio::test]
    async fn test_readers_see_whole_values() {
        let store = Arc::new(Store::new());
        store.set("k".to_string(), "a".repeat(64)).await;

        let writer = {
            let store = store.clone();
            tokio::spawn(async move {
                for _ in 0..100 {
                    store.set("k".to_string(), "b".repeat(64)).await;
                    store.set("k".to_string(), "a".repeat(64)).await;
                }
            })
        };

        for _ in 0..100 {
            let value = store.get("k").await.unwrap();
            assert!(
                value == "a".repeat(64) || value == "b".repeat(64),
                "Reader observed a partial write: {}",
                value
            );
        }

        writer.await.unwrap();
    }
}
