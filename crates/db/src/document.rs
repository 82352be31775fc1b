//! redb-based document store
//!
//! Each novel is a JSON document keyed by a generated string id. A second
//! table keyed by `(title, id)` gives listings their native ascending order.

use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};

use async_trait::async_trait;
use redb::{Database, ReadableTable, TableDefinition};
use uuid::Uuid;

use crate::error::{StoreError, StoreResult};
use crate::novel::{Novel, NovelId};
use crate::store::{ensure_assigned, NovelStore};

const NOVELS_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("novels");
const TITLE_INDEX: TableDefinition<(&str, &str), ()> = TableDefinition::new("novels_by_title");

/// Embedded document backend.
///
/// redb calls block, so every operation runs on the blocking thread pool.
pub struct DocumentStore {
    db: RwLock<Option<Arc<Database>>>,
    path: PathBuf,
}

impl DocumentStore {
    /// Create or open the document file and check it with an empty write
    /// transaction that also creates both tables.
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let db = Database::create(&path)?;

        let write_txn = db.begin_write()?;
        {
            write_txn.open_table(NOVELS_TABLE)?;
            write_txn.open_table(TITLE_INDEX)?;
        }
        write_txn.commit()?;

        tracing::info!(path = %path.display(), "document store opened");

        Ok(Self {
            db: RwLock::new(Some(Arc::new(db))),
            path,
        })
    }

    /// Get the file path of this store
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn database(&self) -> StoreResult<Arc<Database>> {
        self.db
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .ok_or(StoreError::Closed)
    }

    async fn run<T, F>(&self, f: F) -> StoreResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&Database) -> StoreResult<T> + Send + 'static,
    {
        let db = self.database()?;
        tokio::task::spawn_blocking(move || f(&db)).await?
    }
}

#[async_trait]
impl NovelStore for DocumentStore {
    fn backend(&self) -> &'static str {
        "document"
    }

    async fn list(&self) -> StoreResult<Vec<Novel>> {
        self.run(|db| scan_by_title(db, None)).await
    }

    async fn list_created_by(&self, owner_id: &str) -> StoreResult<Vec<Novel>> {
        if owner_id.is_empty() {
            return self.list().await;
        }
        let owner = owner_id.to_string();
        self.run(move |db| scan_by_title(db, Some(&owner))).await
    }

    async fn get(&self, id: &NovelId) -> StoreResult<Novel> {
        let id = id.clone();
        self.run(move |db| {
            let read_txn = db.begin_read()?;
            let docs = read_txn.open_table(NOVELS_TABLE)?;
            let doc = docs
                .get(id.as_str())?
                .ok_or_else(|| StoreError::NotFound(id.clone()))?;
            Ok(serde_json::from_slice(doc.value())?)
        })
        .await
    }

    async fn add(&self, novel: &mut Novel) -> StoreResult<NovelId> {
        let mut doc = novel.clone();
        doc.id = NovelId::new(Uuid::now_v7().simple().to_string());

        let stored = self
            .run(move |db| {
                let write_txn = db.begin_write()?;
                {
                    let bytes = serde_json::to_vec(&doc)?;
                    let mut docs = write_txn.open_table(NOVELS_TABLE)?;
                    docs.insert(doc.id.as_str(), bytes.as_slice())?;

                    let mut index = write_txn.open_table(TITLE_INDEX)?;
                    index.insert((doc.title.as_str(), doc.id.as_str()), ())?;
                }
                write_txn.commit()?;
                Ok(doc)
            })
            .await?;

        tracing::debug!(id = %stored.id, title = %stored.title, "document store added novel");
        novel.id = stored.id;
        Ok(novel.id.clone())
    }

    async fn update(&self, novel: &Novel) -> StoreResult<()> {
        ensure_assigned(&novel.id, "update")?;
        let doc = novel.clone();

        self.run(move |db| {
            let write_txn = db.begin_write()?;
            {
                let mut docs = write_txn.open_table(NOVELS_TABLE)?;
                let previous = docs
                    .get(doc.id.as_str())?
                    .map(|existing| existing.value().to_vec())
                    .ok_or_else(|| StoreError::NotFound(doc.id.clone()))?;
                let previous: Novel = serde_json::from_slice(&previous)?;

                let bytes = serde_json::to_vec(&doc)?;
                docs.insert(doc.id.as_str(), bytes.as_slice())?;

                let mut index = write_txn.open_table(TITLE_INDEX)?;
                index.remove((previous.title.as_str(), doc.id.as_str()))?;
                index.insert((doc.title.as_str(), doc.id.as_str()), ())?;
            }
            write_txn.commit()?;
            Ok(())
        })
        .await
    }

    async fn delete(&self, id: &NovelId) -> StoreResult<()> {
        ensure_assigned(id, "delete")?;
        let id = id.clone();

        self.run(move |db| {
            let write_txn = db.begin_write()?;
            {
                let mut docs = write_txn.open_table(NOVELS_TABLE)?;
                let removed = docs
                    .remove(id.as_str())?
                    .map(|existing| existing.value().to_vec())
                    .ok_or_else(|| StoreError::NotFound(id.clone()))?;
                let removed: Novel = serde_json::from_slice(&removed)?;

                let mut index = write_txn.open_table(TITLE_INDEX)?;
                index.remove((removed.title.as_str(), id.as_str()))?;
            }
            write_txn.commit()?;
            Ok(())
        })
        .await
    }

    async fn close(&self) -> StoreResult<()> {
        let mut guard = self.db.write().unwrap_or_else(PoisonError::into_inner);
        if guard.take().is_some() {
            tracing::info!(path = %self.path.display(), "document store closed");
        }
        Ok(())
    }
}

/// Walk the title index in key order, optionally keeping one owner's novels.
fn scan_by_title(db: &Database, owner_id: Option<&str>) -> StoreResult<Vec<Novel>> {
    let read_txn = db.begin_read()?;
    let index = read_txn.open_table(TITLE_INDEX)?;
    let docs = read_txn.open_table(NOVELS_TABLE)?;

    let mut novels = Vec::new();
    for entry in index.iter()? {
        let (key, _) = entry?;
        let (_, id) = key.value();

        let Some(doc) = docs.get(id)? else {
            tracing::warn!(id, "title index points at a missing document");
            continue;
        };
        let novel: Novel = serde_json::from_slice(doc.value())?;

        if owner_id.map_or(true, |owner| novel.created_by_id == owner) {
            novels.push(novel);
        }
    }

    Ok(novels)
}
