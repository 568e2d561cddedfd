use redis::AsyncCommands;

use crate::cache::CacheService;
use crate::models::Seat;

const SEATS_TTL_SECS: u64 = 3600;

fn seats_key(hall_id: i64) -> String {
    format!("seats:hall:{}", hall_id)
}

impl CacheService {
    /// Static seat inventory for a hall, cache-first. Booking state is
    /// per-show and deliberately not part of this payload.
    pub async fn get_hall_seats(&self, hall_id: i64) -> Result<Vec<Seat>, sqlx::Error> {
        if let Ok(Some(seats)) = self.seats_from_cache(hall_id).await {
            return Ok(seats);
        }

        let seats = self.load_seats_from_db(hall_id).await?;
        let _ = self.save_seats_to_cache(hall_id, &seats).await;
        Ok(seats)
    }

    /// Dropped whenever the hall's inventory is regenerated or the hall is
    /// deleted.
    pub async fn invalidate_hall_seats(&self, hall_id: i64) {
        let mut conn = self.redis.conn.clone();
        let result: Result<(), redis::RedisError> = conn.del(seats_key(hall_id)).await;
        if let Err(e) = result {
            tracing::warn!("failed to invalidate seat cache for hall {}: {:?}", hall_id, e);
        }
    }

    async fn load_seats_from_db(&self, hall_id: i64) -> Result<Vec<Seat>, sqlx::Error> {
        sqlx::query_as::<_, Seat>(
            "SELECT id, hall_id, seat_no, category, is_available
             FROM seats
             WHERE hall_id = $1
             ORDER BY id",
        )
        .bind(hall_id)
        .fetch_all(&self.db.pool)
        .await
    }

    async fn seats_from_cache(&self, hall_id: i64) -> Result<Option<Vec<Seat>>, redis::RedisError> {
        let mut conn = self.redis.conn.clone();
        let data: Option<String> = conn.get(seats_key(hall_id)).await?;
        match data {
            Some(json) => Ok(serde_json::from_str(&json).ok()),
            None => Ok(None),
        }
    }

    async fn save_seats_to_cache(
        &self,
        hall_id: i64,
        seats: &[Seat],
    ) -> Result<(), redis::RedisError> {
        let data = serde_json::to_string(seats).map_err(|_| {
            redis::RedisError::from((redis::ErrorKind::TypeError, "Serialize error"))
        })?;
        let mut conn = self.redis.conn.clone();
        conn.set_ex(seats_key(hall_id), data, SEATS_TTL_SECS).await
    }
}
