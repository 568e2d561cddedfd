use redis::AsyncCommands;

use crate::cache::CacheService;
use crate::models::Show;

const SHOWS_KEY: &str = "shows:all";
const SHOWS_TTL_SECS: u64 = 3600;

impl CacheService {
    /// The show catalog, cache-first with a DB fallback.
    pub async fn get_shows(&self) -> Result<Vec<Show>, sqlx::Error> {
        if let Ok(Some(shows)) = self.shows_from_cache().await {
            return Ok(shows);
        }

        let shows = self.load_shows_from_db().await?;
        let _ = self.save_shows_to_cache(&shows).await;
        Ok(shows)
    }

    /// Dropped on any show create/update/delete so the next read refills.
    pub async fn invalidate_shows(&self) {
        let mut conn = self.redis.conn.clone();
        let result: Result<(), redis::RedisError> = conn.del(SHOWS_KEY).await;
        if let Err(e) = result {
            tracing::warn!("failed to invalidate show cache: {:?}", e);
        }
    }

    async fn load_shows_from_db(&self) -> Result<Vec<Show>, sqlx::Error> {
        sqlx::query_as::<_, Show>(
            "SELECT id, hall_id, name, starts_at, duration_minutes, description, status,
                    created_at, updated_at
             FROM shows
             ORDER BY starts_at",
        )
        .fetch_all(&self.db.pool)
        .await
    }

    async fn shows_from_cache(&self) -> Result<Option<Vec<Show>>, redis::RedisError> {
        let mut conn = self.redis.conn.clone();
        let data: Option<String> = conn.get(SHOWS_KEY).await?;
        match data {
            Some(json) => Ok(serde_json::from_str(&json).ok()),
            None => Ok(None),
        }
    }

    async fn save_shows_to_cache(&self, shows: &[Show]) -> Result<(), redis::RedisError> {
        let data = serde_json::to_string(shows).map_err(|_| {
            redis::RedisError::from((redis::ErrorKind::TypeError, "Serialize error"))
        })?;
        let mut conn = self.redis.conn.clone();
        conn.set_ex(SHOWS_KEY, data, SHOWS_TTL_SECS).await
    }
}
