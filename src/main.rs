use anyhow::Context;

use bookshelf_kernel::settings::Settings;
use bookshelf_kernel::{InitCtx, ModuleRegistry};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::load().with_context(|| "failed to load bookshelf settings")?;

    bookshelf_telemetry::init(&settings.telemetry);

    tracing::info!(
        env = ?settings.environment,
        db = %settings.database.uri,
        "bookshelf-app bootstrap starting"
    );

    let db = bookshelf_db::connect(&settings.database).await?;

    let mut registry = ModuleRegistry::new();
    bookshelf_app::modules::register_all(&mut registry, &db, &settings);

    let ctx = InitCtx {
        settings: &settings,
    };
    registry.init_all(&ctx).await?;
    registry.start_all(&ctx).await?;

    // Blocks until a shutdown signal arrives.
    bookshelf_http::start_server(&registry, &settings).await?;

    registry.stop_all().await?;

    tracing::info!("bookshelf-app shutdown complete");
    Ok(())
}
