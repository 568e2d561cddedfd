use redis::aio::MultiplexedConnection;
use tracing::info;

use crate::config::RedisConfig;

/// Shared Redis connection used by the seat and show caches. A single
/// multiplexed connection is enough here; cached reads are small and the
/// hot booking path never touches Redis.
#[derive(Clone)]
pub struct RedisClient {
    pub conn: MultiplexedConnection,
}

impl RedisClient {
    pub async fn connect(config: &RedisConfig) -> Result<Self, redis::RedisError> {
        let client = redis::Client::open(config.url.as_str())?;
        let conn = client.get_multiplexed_async_connection().await?;
        info!("connected to Redis cache");
        Ok(RedisClient { conn })
    }
}
