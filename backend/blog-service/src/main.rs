use actix_cors::Cors;
use actix_web::{web, App, HttpServer};
use anyhow::Context;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use blog_service::cache::{HomePageCache, MemoryPageCache, PageCacheBackend, RedisPageCache};
use blog_service::config::StorageBackend;
use blog_service::db::Repositories;
use blog_service::middleware::{MetricsMiddleware, TokenVerifier};
use blog_service::{configure, AppState, Config};

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,blog_service=debug".into());
    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

async fn build_repositories(config: &Config) -> anyhow::Result<Repositories> {
    match (config.storage, &config.database) {
        (StorageBackend::Postgres, Some(db_config)) => {
            db_config.log_config();
            let pool = db_pool::create_pool(db_config.clone())
                .await
                .context("failed to create database pool")?;

            sqlx::migrate!("./migrations")
                .run(&pool)
                .await
                .context("failed to run migrations")?;
            tracing::info!("database migrations applied");

            Ok(Repositories::postgres(pool))
        }
        (StorageBackend::Postgres, None) => {
            anyhow::bail!("postgres storage selected without database configuration")
        }
        (StorageBackend::Memory, _) => {
            tracing::warn!("using in-memory storage; data is lost on restart");
            Ok(Repositories::memory())
        }
    }
}

async fn build_cache_backend(config: &Config) -> Arc<dyn PageCacheBackend> {
    if let Some(url) = &config.cache.redis_url {
        match RedisPageCache::connect(url).await {
            Ok(cache) => {
                tracing::info!("home page cache backed by Redis");
                return Arc::new(cache);
            }
            Err(e) => {
                tracing::warn!(error = %e, "Redis unavailable, using in-process page cache");
            }
        }
    }
    Arc::new(MemoryPageCache::new())
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = Config::from_env()
        .map_err(|e| anyhow::anyhow!(e))
        .context("invalid configuration")?;
    tracing::info!(env = %config.app.env, storage = ?config.storage, "starting blog-service");

    let repos = build_repositories(&config).await?;
    let home_cache = HomePageCache::new(
        build_cache_backend(&config).await,
        Duration::from_secs(config.cache.home_ttl_secs),
    );

    let state = web::Data::new(AppState::new(
        repos,
        home_cache,
        config.feed.items_per_page,
    ));
    let verifier = web::Data::new(TokenVerifier::new(&config.auth.jwt_secret));

    let bind_address = format!("{}:{}", config.app.host, config.app.port);
    tracing::info!("Starting HTTP server at {}", bind_address);

    let allowed_origins = config.cors.allowed_origins.clone();
    HttpServer::new(move || {
        let mut cors = Cors::default();
        for origin in allowed_origins.split(',') {
            let origin = origin.trim();
            if origin == "*" {
                cors = cors.allow_any_origin();
            } else if !origin.is_empty() {
                cors = cors.allowed_origin(origin);
            }
        }
        cors = cors.allow_any_method().allow_any_header().max_age(3600);

        App::new()
            .app_data(state.clone())
            .app_data(verifier.clone())
            .wrap(MetricsMiddleware)
            .wrap(cors)
            .wrap(tracing_actix_web::TracingLogger::default())
            .configure(configure)
    })
    .bind(&bind_address)
    .with_context(|| format!("failed to bind {}", bind_address))?
    .run()
    .await
    .context("server error")?;

    Ok(())
}
