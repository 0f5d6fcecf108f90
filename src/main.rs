use std::sync::Arc;

use receivable_service::config::AppConfig;
use receivable_service::observability::init_tracing;
use receivable_service::services::auth_client::AuthClient;
use receivable_service::services::database::Database;
use receivable_service::services::documents::StubDocumentStorage;
use receivable_service::startup::Application;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing("info,sqlx=warn");

    let config = AppConfig::load()?;

    let database = Database::new(
        &config.database.url,
        config.database.max_connections,
        config.database.min_connections,
    )
    .await?;
    database.run_migrations().await?;

    let users = Arc::new(AuthClient::new(config.auth_service.clone()));

    let app = Application::build(
        &config,
        Arc::new(database),
        Arc::new(StubDocumentStorage),
        users,
    )
    .await?;

    tracing::info!(port = app.port(), "Receivable service started");
    app.run_until_stopped().await?;

    Ok(())
}
