//! Bookshelf application library
//!
//! Wires the application modules into the kernel registry and runs the HTTP server.

pub mod modules;

use anyhow::Context;
use bookshelf_kernel::{settings::Settings, InitCtx, ModuleRegistry};

pub use modules::books::{models::Book, store::BookStore, BooksModule};

/// Build a registry holding every application module
pub fn registry() -> anyhow::Result<ModuleRegistry> {
    let mut registry = ModuleRegistry::new();
    modules::register_all(&mut registry).context("failed to register modules")?;
    Ok(registry)
}

/// Initialize and start all modules, serve HTTP until shutdown, then stop the modules.
pub async fn run(settings: Settings) -> anyhow::Result<()> {
    let registry = registry()?;
    let ctx = InitCtx {
        settings: &settings,
    };

    registry.init_all(&ctx).await?;
    registry.start_all(&ctx).await?;

    let served = bookshelf_http::start_server(&registry, &settings).await;

    registry.stop_all().await?;
    served
}
