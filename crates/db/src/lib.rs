//! MongoDB connection bootstrap.
//!
//! The connection is opened once at process start and the resulting
//! [`mongodb::Database`] handle is shared by every request; the driver's
//! own pooling handles concurrent access.

use anyhow::Context;
use mongodb::bson::doc;
use mongodb::{Client, Database};

use bookshelf_kernel::settings::DatabaseSettings;

/// Establish the MongoDB connection described by `settings`.
///
/// Issues a `ping` so a dead backend fails startup instead of the first
/// request.
pub async fn connect(settings: &DatabaseSettings) -> anyhow::Result<Database> {
    let client = Client::with_uri_str(&settings.uri)
        .await
        .with_context(|| format!("failed to create MongoDB client for '{}'", settings.uri))?;

    let database = client.database(&settings.database);

    database
        .run_command(doc! { "ping": 1 })
        .await
        .with_context(|| format!("failed to reach MongoDB at '{}'", settings.uri))?;

    tracing::info!(
        target: "bookshelf-db",
        uri = %settings.uri,
        database = %settings.database,
        "connected to MongoDB"
    );

    Ok(database)
}
