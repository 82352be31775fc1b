pub mod novels;

use std::sync::Arc;

use shelf_kernel::ModuleRegistry;

use crate::state::AppState;

/// Register every application module with the registry
pub fn register_all(registry: &mut ModuleRegistry, state: AppState) {
    registry.register(Arc::new(novels::NovelsModule::new(state)));
}
