use std::sync::Arc;

use sigil_api::app::{AppState, build_router};
use sigil_api::config::{self, StorageConfig};
use sigil_auth::AuthService;
use sigil_core::CredentialStore;
use sigil_storage::{MemoryStore, PgStore, SqliteStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    sigil_observability::init();

    let cfg = config::load()?;

    let store: Arc<dyn CredentialStore> = match &cfg.storage {
        StorageConfig::Postgres { url } => {
            let pool = sqlx::PgPool::connect(url).await?;
            Arc::new(PgStore::new(pool))
        }
        StorageConfig::Sqlite { path } => {
            let store = SqliteStore::open(path).await?;
            store.seed_defaults().await?;
            Arc::new(store)
        }
        StorageConfig::Memory => {
            let store = MemoryStore::new();
            store.seed_defaults().await?;
            // A volatile store has no out-of-band application provisioning,
            // so seed one for local development.
            let secret = std::env::var("SIGIL_APP_SECRET").unwrap_or_else(|_| {
                tracing::warn!("SIGIL_APP_SECRET not set; using insecure dev default");
                "dev-secret".to_string()
            });
            store.insert_application("local", &secret).await?;
            Arc::new(store)
        }
    };

    let auth = Arc::new(AuthService::new(
        store,
        chrono::Duration::seconds(cfg.token_ttl_secs as i64),
    ));

    let app = build_router(AppState { auth });

    let listener = tokio::net::TcpListener::bind(&cfg.http.address).await?;
    tracing::info!(environment = %cfg.environment, address = %listener.local_addr()?, "listening");

    axum::serve(listener, app).await?;

    Ok(())
}
