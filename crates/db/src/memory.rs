//! In-memory storage implementation for tests and local development

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;

use crate::error::{StoreError, StoreResult};
use crate::novel::{Novel, NovelId};
use crate::store::{ensure_assigned, sort_by_title, NovelStore};

struct Shelf {
    next_id: i64,
    novels: HashMap<i64, Novel>,
}

/// Map-backed store guarded by a single mutex.
///
/// Every operation holds the lock for its whole duration, so all calls
/// serialize. Ids come from a counter that is never decremented.
pub struct MemoryStore {
    shelf: Mutex<Option<Shelf>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            shelf: Mutex::new(Some(Shelf {
                next_id: 1,
                novels: HashMap::new(),
            })),
        }
    }

    fn with_shelf<T>(&self, f: impl FnOnce(&mut Shelf) -> StoreResult<T>) -> StoreResult<T> {
        let mut guard = self.shelf.lock().unwrap_or_else(PoisonError::into_inner);
        let shelf = guard.as_mut().ok_or(StoreError::Closed)?;
        f(shelf)
    }

    fn snapshot(&self, owner_id: Option<&str>) -> StoreResult<Vec<Novel>> {
        self.with_shelf(|shelf| {
            let mut novels: Vec<Novel> = shelf
                .novels
                .values()
                .filter(|novel| owner_id.map_or(true, |owner| novel.created_by_id == owner))
                .cloned()
                .collect();
            sort_by_title(&mut novels);
            Ok(novels)
        })
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl NovelStore for MemoryStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn list(&self) -> StoreResult<Vec<Novel>> {
        self.snapshot(None)
    }

    async fn list_created_by(&self, owner_id: &str) -> StoreResult<Vec<Novel>> {
        if owner_id.is_empty() {
            return self.list().await;
        }
        self.snapshot(Some(owner_id))
    }

    async fn get(&self, id: &NovelId) -> StoreResult<Novel> {
        self.with_shelf(|shelf| {
            id.as_sequence()
                .and_then(|key| shelf.novels.get(&key))
                .cloned()
                .ok_or_else(|| StoreError::NotFound(id.clone()))
        })
    }

    async fn add(&self, novel: &mut Novel) -> StoreResult<NovelId> {
        self.with_shelf(|shelf| {
            let key = shelf.next_id;
            shelf.next_id += 1;

            novel.id = NovelId::from(key);
            shelf.novels.insert(key, novel.clone());

            tracing::debug!(id = key, title = %novel.title, "memory store added novel");
            Ok(novel.id.clone())
        })
    }

    async fn update(&self, novel: &Novel) -> StoreResult<()> {
        ensure_assigned(&novel.id, "update")?;
        self.with_shelf(|shelf| {
            let key = novel
                .id
                .as_sequence()
                .ok_or_else(|| StoreError::NotFound(novel.id.clone()))?;
            let slot = shelf
                .novels
                .get_mut(&key)
                .ok_or_else(|| StoreError::NotFound(novel.id.clone()))?;
            *slot = novel.clone();
            slot.id = NovelId::from(key);
            Ok(())
        })
    }

    async fn delete(&self, id: &NovelId) -> StoreResult<()> {
        ensure_assigned(id, "delete")?;
        self.with_shelf(|shelf| {
            id.as_sequence()
                .and_then(|key| shelf.novels.remove(&key))
                .map(|_| ())
                .ok_or_else(|| StoreError::NotFound(id.clone()))
        })
    }

    async fn close(&self) -> StoreResult<()> {
        let mut guard = self.shelf.lock().unwrap_or_else(PoisonError::into_inner);
        if guard.take().is_some() {
            tracing::debug!("memory store closed");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn titles(novels: &[Novel]) -> Vec<&str> {
        novels.iter().map(|n| n.title.as_str()).collect()
    }

    #[tokio::test]
    async fn test_shelf_scenario() {
        let store = MemoryStore::new();

        let mut dune = Novel::titled("Dune");
        let mut emma = Novel::titled("Emma");
        assert_eq!(store.add(&mut dune).await.unwrap(), NovelId::from(1));
        assert_eq!(store.add(&mut emma).await.unwrap(), NovelId::from(2));
        assert_eq!(dune.id, NovelId::from(1));

        assert_eq!(titles(&store.list().await.unwrap()), vec!["Dune", "Emma"]);

        store.delete(&NovelId::from(1)).await.unwrap();
        let err = store.get(&NovelId::from(1)).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(titles(&store.list().await.unwrap()), vec!["Emma"]);
    }

    #[tokio::test]
    async fn test_ids_are_not_reused_after_delete() {
        let store = MemoryStore::new();
        let first = store.add(&mut Novel::titled("a")).await.unwrap();
        store.delete(&first).await.unwrap();
        let second = store.add(&mut Novel::titled("b")).await.unwrap();
        assert_eq!(second, NovelId::from(2));
    }

    #[tokio::test]
    async fn test_add_ignores_caller_id() {
        let store = MemoryStore::new();
        let mut novel = Novel::titled("Kokoro");
        novel.id = NovelId::from(99);
        let id = store.add(&mut novel).await.unwrap();
        assert_eq!(id, NovelId::from(1));
        assert!(store.get(&NovelId::from(99)).await.is_err());
    }

    #[tokio::test]
    async fn test_stored_copy_is_independent_of_caller() {
        let store = MemoryStore::new();
        let mut novel = Novel::titled("Original");
        let id = store.add(&mut novel).await.unwrap();

        novel.title = "Changed locally".to_string();
        assert_eq!(store.get(&id).await.unwrap().title, "Original");
    }

    #[tokio::test]
    async fn test_non_numeric_id_is_not_found() {
        let store = MemoryStore::new();
        let err = store.get(&NovelId::from("abc")).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_id_aliases_do_not_reach_records() {
        let store = MemoryStore::new();
        let mut dune = Novel::titled("Dune");
        store.add(&mut dune).await.unwrap();

        let mut alias = Novel::titled("Dune, revised");
        alias.id = NovelId::from("01");
        let err = store.update(&alias).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);

        let err = store.get(&NovelId::from("+1")).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        let err = store.delete(&NovelId::from("001")).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);

        let stored = store.get(&NovelId::from(1)).await.unwrap();
        assert_eq!(stored.id, NovelId::from(1));
        assert_eq!(stored.title, "Dune");
        let ids: Vec<NovelId> = store.list().await.unwrap().into_iter().map(|n| n.id).collect();
        assert_eq!(ids, vec![NovelId::from(1)]);
    }

    #[tokio::test]
    async fn test_update_keeps_canonical_id() {
        let store = MemoryStore::new();
        let mut dune = Novel::titled("Dune");
        let id = store.add(&mut dune).await.unwrap();

        dune.title = "Dune Messiah".to_string();
        store.update(&dune).await.unwrap();

        let stored = store.get(&id).await.unwrap();
        assert_eq!(stored.id, id);
        assert_eq!(stored.title, "Dune Messiah");
    }

    #[tokio::test]
    async fn test_closed_store_rejects_operations() {
        let store = MemoryStore::new();
        store.add(&mut Novel::titled("x")).await.unwrap();

        store.close().await.unwrap();
        store.close().await.unwrap();

        let err = store.list().await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::FailedPrecondition);
        let err = store.add(&mut Novel::titled("y")).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::FailedPrecondition);
    }
}
