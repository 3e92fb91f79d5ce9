use std::sync::Arc;

use anyhow::Context;
use skillswap::{
    AppState, app,
    config::Config,
    identity::{FirebaseIdentity, IdentityProvider, MemoryIdentity},
    store::{DocumentStore, MemoryStore, SqliteStore},
};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_filter)),
        )
        .init();

    let store: Arc<dyn DocumentStore> = match &config.database_url {
        Some(url) => {
            tracing::info!(url = %url, "documents stored in sqlite");
            Arc::new(SqliteStore::connect(url).await?)
        }
        None => {
            tracing::warn!("DATABASE_URL is not set, documents are kept in memory");
            Arc::new(MemoryStore::new())
        }
    };

    let identity: Arc<dyn IdentityProvider> = match &config.firebase_api_key {
        Some(key) => {
            tracing::info!(url = %config.firebase_identity_url, "accounts managed by firebase");
            Arc::new(FirebaseIdentity::new(key, &config.firebase_identity_url)?)
        }
        None => {
            tracing::warn!("FIREBASE_API_KEY is not set, accounts are kept in memory");
            Arc::new(MemoryIdentity::new())
        }
    };

    let app = app(AppState { store, identity }, config.session_idle, config.cors()?);

    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("cannot bind {}", config.bind))?;
    tracing::info!(addr = %config.bind, "listening");
    axum::serve(listener, app).await?;
    Ok(())
}
