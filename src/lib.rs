//! Shelf application library
//!
//! The book catalog: record validation, the file-backed store, the query and
//! statistics engines, and the `books` HTTP module that exposes them.

pub mod modules;

use std::sync::Arc;

use anyhow::Context;
use shelf_kernel::{settings::Settings, InitCtx, ModuleRegistry};

pub use modules::books;

/// Load the catalog, run the module lifecycle and serve HTTP until shutdown.
pub async fn run(settings: Settings) -> anyhow::Result<()> {
    let store = books::open_store(&settings.storage.data_path).with_context(|| {
        format!(
            "failed to open catalog at {}",
            settings.storage.data_path.display()
        )
    })?;

    let mut registry = ModuleRegistry::new();
    modules::register_all(&mut registry, Arc::clone(&store))?;

    let ctx = InitCtx {
        settings: &settings,
    };
    registry.init_all(&ctx).await?;
    registry.start_all(&ctx).await?;

    let served = shelf_http::start_server(&registry, &settings).await;

    registry.stop_all().await?;
    served
}
