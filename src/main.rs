use std::sync::Arc;

use otakushelf_api::config::Config;
use otakushelf_api::db::{self, PgProfileStore};
use otakushelf_api::routes::{create_router, AppState};
use otakushelf_api::services::providers::{AnilistProvider, JikanProvider};
use otakushelf_api::services::AnimeProvider;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("otakushelf_api=debug,tower_http=info,info")),
        )
        .init();

    let config = Config::from_env()?;

    // Redis-backed provider cache with its background writer
    let redis_client = db::create_redis_client(&config.redis_url)?;
    let (cache, _cache_writer) = db::Cache::new(redis_client);

    // Postgres-backed profile store
    let pool = db::create_pool(&config.database_url).await?;
    let profile_store = Arc::new(PgProfileStore::new(pool));

    let provider: Arc<dyn AnimeProvider> = match config.metadata_provider.as_str() {
        "jikan" => Arc::new(JikanProvider::new(cache, config.jikan_api_url.clone())),
        _ => Arc::new(AnilistProvider::new(cache, config.anilist_api_url.clone())),
    };

    tracing::info!(provider = provider.name(), "Metadata provider configured");

    let state = Arc::new(AppState::new(provider, profile_store));
    let app = create_router(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(addr = %addr, "OtakuShelf API listening");
    axum::serve(listener, app).await?;

    Ok(())
}
