//! novelshelf application library
//!
//! Wires the configured novel store into the module registry and serves it
//! over HTTP.

pub mod modules;
pub mod state;

use anyhow::Context;
use shelf_kernel::{settings::Settings, InitCtx, ModuleRegistry};

pub use state::AppState;

/// Build a registry holding every application module over `state`.
pub fn build_registry(state: AppState) -> ModuleRegistry {
    let mut registry = ModuleRegistry::new();
    modules::register_all(&mut registry, state);
    registry
}

/// Connect the store, run the module lifecycle around the HTTP server, and
/// close the store on the way out.
pub async fn serve(settings: Settings) -> anyhow::Result<()> {
    let store = shelf_db::connect(&settings.storage)
        .await
        .context("failed to connect novel store")?;

    let registry = build_registry(AppState::new(store.clone()));
    let ctx = InitCtx {
        settings: &settings,
    };

    registry.init_modules(&ctx).await?;
    registry.start_modules(&ctx).await?;

    let served = shelf_http::start_server(&registry, &settings).await;

    registry.stop_modules().await?;
    store.close().await.context("failed to close novel store")?;

    served
}
