//! The persistence contract every backend implements.

use async_trait::async_trait;

use crate::error::{StoreError, StoreResult};
use crate::novel::{Novel, NovelId};

/// Pluggable novel storage.
///
/// Implementations are shared across request tasks behind an `Arc` and must
/// not require external synchronization. After [`NovelStore::close`] every
/// operation fails with [`StoreError::Closed`].
#[async_trait]
pub trait NovelStore: Send + Sync {
    /// Short backend name for logs
    fn backend(&self) -> &'static str;

    /// All novels, ascending by title (byte-wise).
    async fn list(&self) -> StoreResult<Vec<Novel>>;

    /// Novels whose `created_by_id` equals `owner_id`, ascending by title.
    ///
    /// An empty `owner_id` means no filter.
    async fn list_created_by(&self, owner_id: &str) -> StoreResult<Vec<Novel>>;

    async fn get(&self, id: &NovelId) -> StoreResult<Novel>;

    /// Persist `novel` under a fresh id, ignoring whatever id it carried.
    ///
    /// The new id is written back into `novel` and returned.
    async fn add(&self, novel: &mut Novel) -> StoreResult<NovelId>;

    /// Replace the stored record with the same id. The record must exist.
    async fn update(&self, novel: &Novel) -> StoreResult<()>;

    async fn delete(&self, id: &NovelId) -> StoreResult<()>;

    /// Release backend resources. Calling it again is a no-op.
    async fn close(&self) -> StoreResult<()>;
}

/// Reject unset ids before any storage is touched.
pub(crate) fn ensure_assigned(id: &NovelId, operation: &'static str) -> StoreResult<()> {
    if id.is_unset() {
        return Err(StoreError::UnassignedId(operation));
    }
    Ok(())
}

/// Byte-wise title order; ties fall back to the sequence id, then the raw id.
pub(crate) fn sort_by_title(novels: &mut [Novel]) {
    novels.sort_by(|a, b| {
        a.title
            .cmp(&b.title)
            .then_with(|| a.id.as_sequence().cmp(&b.id.as_sequence()))
            .then_with(|| a.id.cmp(&b.id))
    });
}
