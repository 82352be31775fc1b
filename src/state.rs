use std::sync::Arc;

use shelf_db::NovelStore;

/// Shared state handed to module routers
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn NovelStore>,
}

impl AppState {
    pub fn new(store: Arc<dyn NovelStore>) -> Self {
        Self { store }
    }
}
