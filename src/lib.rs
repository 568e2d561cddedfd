pub mod cache;
pub mod config;
pub mod controllers;
pub mod database;
pub mod error;
pub mod middleware;
pub mod models;
pub mod redis_client;
pub mod services;

use std::sync::Arc;
use tokio::task;

// Shared state for the whole application
#[derive(Clone)]
pub struct AppState {
    pub db: database::Database,
    pub redis: redis_client::RedisClient,
    pub cache: cache::CacheService,
    pub config: config::Config,
}

impl AppState {
    pub async fn new(config: config::Config) -> Result<Arc<Self>, Box<dyn std::error::Error>> {
        let db = database::Database::connect(&config.database).await?;

        db.run_migrations().await?;

        let redis = redis_client::RedisClient::connect(&config.redis).await?;
        let cache = cache::CacheService::new(redis.clone(), db.clone());
        let state = Arc::new(Self {
            db,
            redis,
            cache,
            config,
        });

        let state_for_bg = state.clone();
        task::spawn(async move {
            // warm the cache in the background
            state_for_bg.cache.warmup_cache().await;
        });

        Ok(state)
    }
}
