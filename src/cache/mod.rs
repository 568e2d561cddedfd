use crate::{database::Database, redis_client::RedisClient};
use tracing::info;

pub mod seats;
pub mod shows;

/// Read-through cache over Redis for the read-mostly lists (static seat
/// inventory per hall, the show catalog). Per-show booking status is never
/// cached; availability is always answered from Postgres.
#[derive(Clone)]
pub struct CacheService {
    redis: RedisClient,
    db: Database,
}

impl CacheService {
    pub fn new(redis: RedisClient, db: Database) -> Self {
        Self { redis, db }
    }

    // Warm the show catalog at startup
    pub async fn warmup_cache(&self) {
        info!("Starting cache warmup...");
        let _ = self.get_shows().await;
        info!("Cache warmup done");
    }
}
