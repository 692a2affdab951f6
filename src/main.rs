use school_api::{app, ensure_database_exists, ensure_tables, AppConfig, AppState, MemoryStore, PgStore, StoreKind};
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("school_api=info")),
        )
        .init();

    let config = AppConfig::from_env()?;
    let state = match config.store {
        StoreKind::Postgres => {
            ensure_database_exists(&config.database_url).await?;
            let pool = sqlx::postgres::PgPoolOptions::new()
                .max_connections(config.max_connections)
                .connect(&config.database_url)
                .await?;
            ensure_tables(&pool, &config.schema).await?;
            AppState::new(PgStore::new(pool, config.schema.clone()))
        }
        StoreKind::Memory => {
            tracing::warn!("using in-memory store; data is lost on exit");
            AppState::new(MemoryStore::new())
        }
    };

    let listener = TcpListener::bind(config.bind_addr).await?;
    tracing::info!(addr = %listener.local_addr()?, store = ?config.store, "school api listening");
    axum::serve(listener, app(state)).await?;
    Ok(())
}
