use std::net::SocketAddr;

use tracing::info;

use quill_api::config::Config;
use quill_api::state::AppStateInner;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "quill=debug,quill_api=debug,quill_db=info,tower_http=debug".into()),
        )
        .init();

    // Config
    let config = Config::from_env()?;

    // Init database
    let db = quill_db::Database::open(&config.db_path)?;

    // Shared state
    let state = AppStateInner::new(db, config.auth.clone());
    let app = quill_api::router(state);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    info!("quill listening on {}{}", addr, quill_api::API_PREFIX);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
