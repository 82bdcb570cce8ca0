//! Bookstore application library
//!
//! Wires the project modules into the kernel registry and drives the service
//! lifecycle: connect, migrate, init, serve, stop.

pub mod modules;
pub mod utils;

use anyhow::Context;
use bookstore_kernel::{settings::Settings, InitCtx, ModuleRegistry};
use sqlx::SqlitePool;

/// Re-export commonly used types
pub use modules::*;

/// Registry holding every module this application ships
pub fn build_registry() -> ModuleRegistry {
    let mut registry = ModuleRegistry::new();
    modules::register_all(&mut registry);
    registry
}

/// Open the configured database and apply pending migrations
pub async fn prepare_database(
    settings: &Settings,
    registry: &ModuleRegistry,
) -> anyhow::Result<(SqlitePool, usize)> {
    let db = bookstore_db::connect(&settings.database.url, settings.database.max_connections)
        .await
        .context("failed to open database")?;

    let applied = bookstore_db::run_migrations(&db, &registry.collect_migrations())
        .await
        .context("failed to apply migrations")?;

    Ok((db, applied))
}

/// Apply pending migrations and exit
pub async fn migrate(settings: &Settings) -> anyhow::Result<usize> {
    let registry = build_registry();
    let (db, applied) = prepare_database(settings, &registry).await?;
    db.close().await;

    tracing::info!(applied, "migrations complete");
    Ok(applied)
}

/// Run the HTTP service until a shutdown signal arrives
pub async fn serve(settings: &Settings) -> anyhow::Result<()> {
    let registry = build_registry();
    let (db, applied) = prepare_database(settings, &registry).await?;
    tracing::info!(applied, "database ready");

    let ctx = InitCtx {
        settings,
        db: &db,
    };

    registry.init_modules(&ctx).await?;
    registry.start_modules(&ctx).await?;

    let served = bookstore_http::start_server(&registry, &ctx).await;

    registry.stop_modules().await?;
    db.close().await;

    served
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_contains_books_module() {
        let registry = build_registry();
        let books = registry.get_module("books").unwrap();
        assert_eq!(books.mount_path(), "/");
    }

    #[tokio::test]
    async fn migrate_creates_books_table_once() {
        let path = std::env::temp_dir().join(format!("bookstore-migrate-{}.db", std::process::id()));
        let _ = std::fs::remove_file(&path);

        let mut settings = Settings::default();
        settings.database.url = format!("sqlite://{}", path.display());

        assert_eq!(migrate(&settings).await.unwrap(), 1);
        assert_eq!(migrate(&settings).await.unwrap(), 0);

        let _ = std::fs::remove_file(&path);
    }
}
