use std::sync::Arc;

use prk_todos::adapters::HttpServer;
use prk_todos::config::ServerConfig;
use prk_todos::core::ToDoService;
use prk_todos::storage::SqliteStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()))
        .init();

    let config = ServerConfig::from_env()?;
    let store = SqliteStore::connect(&config.database_url, config.max_connections).await?;
    let todo_service = ToDoService::new(Arc::new(store));

    let http_server = HttpServer::new(todo_service, &config).await?;
    http_server.run().await?;
    Ok(())
}
