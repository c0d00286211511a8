use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{middleware, web, App, HttpServer};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use kindred_match::config::Settings;
use kindred_match::routes::{self, AppState};
use kindred_match::services::{
    AiClientConfig, AnthropicClient, CacheManager, CachedStorage, InMemoryStore, MatchService,
    MatchServiceConfig, PostgresStore, ProfileService, Storage,
};

fn init_tracing(level: &str, format: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_level(true);

    if format == "pretty" {
        subscriber.pretty().init();
    } else {
        subscriber.json().init();
    }
}

fn startup_error(context: &str, e: impl std::fmt::Display) -> std::io::Error {
    error!("{}: {}", context, e);
    std::io::Error::new(std::io::ErrorKind::Other, format!("{}: {}", context, e))
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load .env file if present
    dotenv::dotenv().ok();

    let settings = match Settings::load() {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            return Err(std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string()));
        }
    };

    init_tracing(&settings.logging.level, &settings.logging.format);
    info!("Starting Kindred matching service...");

    // Cache: Redis when configured, otherwise in-process only
    let cache = match &settings.cache.redis_url {
        Some(url) => match CacheManager::new(url, settings.cache.l1_cache_size, settings.cache.ttl_secs).await {
            Ok(c) => {
                info!("Cache manager initialized with Redis (TTL: {}s)", settings.cache.ttl_secs);
                c
            }
            Err(e) => {
                error!("Failed to connect to Redis ({}), using in-process cache only", e);
                CacheManager::in_memory(settings.cache.l1_cache_size, settings.cache.ttl_secs)
            }
        },
        None => CacheManager::in_memory(settings.cache.l1_cache_size, settings.cache.ttl_secs),
    };
    let cache = Arc::new(cache);

    let dimensions = settings.matching.embedding_dimensions;
    let store: Arc<dyn Storage> = match &settings.database.url {
        Some(url) => {
            let postgres = PostgresStore::from_settings(
                url,
                settings.database.max_connections,
                settings.database.min_connections,
                settings.database.acquire_timeout_secs,
                settings.database.idle_timeout_secs,
                dimensions,
            )
            .await
            .map_err(|e| startup_error("PostgreSQL connection error", e))?;
            info!("PostgreSQL store initialized");
            Arc::new(CachedStorage::new(postgres, cache))
        }
        None => {
            info!("No database configured, using in-memory store");
            Arc::new(CachedStorage::new(InMemoryStore::new(), cache))
        }
    };

    if settings.ai.api_key.is_empty() {
        error!("AI API key is empty; profile analysis and explanations will fail");
    }
    let ai = Arc::new(AnthropicClient::new(AiClientConfig {
        base_url: settings.ai.base_url.clone(),
        api_key: settings.ai.api_key.clone(),
        analysis_model: settings.ai.analysis_model.clone(),
        embedding_model: settings.ai.embedding_model.clone(),
        timeout_secs: settings.ai.timeout_secs,
        max_retries: settings.ai.max_retries,
    }));

    let matches = Arc::new(MatchService::new(
        store.clone(),
        ai.clone(),
        MatchServiceConfig::from(settings.matching.clone()),
    ));
    let profiles = Arc::new(ProfileService::new(store.clone(), ai, dimensions));

    info!(
        "Matcher initialized (limit: {}, max: {}, dimensions: {})",
        settings.matching.default_limit, settings.matching.max_limit, dimensions
    );

    let app_state = AppState {
        store,
        matches,
        profiles,
    };

    // Configure HTTP server
    let host = settings.server.host.clone();
    let port = settings.server.port;
    let workers = settings.server.workers.unwrap_or(4);

    info!("Starting HTTP server on {}:{}", host, port);

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .app_data(web::Data::new(app_state.clone()))
            .app_data(routes::json_config())
            .app_data(routes::query_config())
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .wrap(middleware::Compress::default())
            .configure(routes::configure_routes)
    })
    .workers(workers)
    .bind((host, port))?
    .run()
    .await
}
