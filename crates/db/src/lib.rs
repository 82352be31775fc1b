//! Novel persistence for novelshelf.
//!
//! [`NovelStore`] is the port the web layer talks to. Three adapters implement
//! it: [`MemoryStore`], [`MySqlStore`] and [`DocumentStore`]. [`connect`] picks
//! one from [`StorageSettings`].

pub mod document;
pub mod error;
pub mod memory;
pub mod mysql;
pub mod novel;
pub mod store;

use std::sync::Arc;

use shelf_kernel::settings::{StorageBackend, StorageSettings};

pub use document::DocumentStore;
pub use error::{ErrorKind, StoreError, StoreResult};
pub use memory::MemoryStore;
pub use mysql::MySqlStore;
pub use novel::{Novel, NovelId, ANONYMOUS};
pub use store::NovelStore;

/// Build the configured backend. Connection failures are returned so startup
/// can abort.
pub async fn connect(settings: &StorageSettings) -> StoreResult<Arc<dyn NovelStore>> {
    let store: Arc<dyn NovelStore> = match settings.backend {
        StorageBackend::Memory => Arc::new(MemoryStore::new()),
        StorageBackend::Mysql => Arc::new(MySqlStore::connect(&settings.mysql).await?),
        StorageBackend::Document => {
            let path = settings.document.path.clone();
            let store = tokio::task::spawn_blocking(move || DocumentStore::open(path)).await??;
            Arc::new(store)
        }
    };

    tracing::info!(backend = store.backend(), "novel store ready");
    Ok(store)
}
